//! Policy measures that keep persons at home during the day.
use rand::Rng;

use crate::demography::Demography;
use crate::log::info;
use crate::population::Population;

/// Sends up to `count` working persons who are not yet staying home into home stay, visiting
/// the population in a fresh random order. Returns how many were sent home.
pub fn work_from_home<R: Rng + ?Sized>(
    population: &mut Population,
    count: usize,
    rng: &mut R,
) -> usize {
    population.randomize_order(rng);
    let mut sent_home = 0;
    if count > 0 {
        population.for_each_until(|_, person| {
            if person.demography.is_working() && !person.home_stay {
                person.home_stay = true;
                sent_home += 1;
            }
            sent_home < count
        });
    }
    info!("intervention: {sent_home} working persons now work from home");
    sent_home
}

/// Keeps every child at home, plus up to `homeschooling_parents` middle-aged workers who were
/// not already home. Returns the number of parents sent home.
pub fn close_schools<R: Rng + ?Sized>(
    population: &mut Population,
    homeschooling_parents: usize,
    rng: &mut R,
) -> usize {
    population.par_for_each_matching(
        |person| person.demography.is_child(),
        |person| person.home_stay = true,
    );

    population.randomize_order(rng);
    let mut parents = 0;
    if homeschooling_parents > 0 {
        population.for_each_until(|_, person| {
            if person.demography == Demography::MiddleAgeWorking && !person.home_stay {
                person.home_stay = true;
                parents += 1;
            }
            parents < homeschooling_parents
        });
    }
    info!("intervention: schools closed, {parents} parents stay home to homeschool");
    parents
}

/// Number of persons an intervention targeting `fraction` of `population_size` applies to.
pub fn intervention_size(fraction: f64, population_size: usize) -> usize {
    (fraction * population_size as f64).round().max(0.0) as usize
}
