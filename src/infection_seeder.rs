//! Introduction of the first cases from a table of observed infections per municipality and day.
//!
//! At midnight of every day covered by the table, each home municipality gets
//! `table[day][m] / agent_to_person_ratio` new infectious agents, with the fractional part
//! carried over to the next day. Each new infectious agent comes with
//! `initial_exposed_infected_ratio` exposed ones. Infectious agents are only introduced once the
//! simulation has run longer than the typical incubation period, so the exposed agents of the
//! first days have time to turn infectious on their own.
use rand::rngs::SmallRng;

use crate::data_loader::read_column;
use crate::demography::{EpidemicState, HOURS_PER_DAY};
use crate::error::ModelError;
use crate::infection_manager::{seed_person, ProgressionDistributions};
use crate::log::{debug, trace};
use crate::parameters::Parameters;
use crate::population::Population;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedingSummary {
    pub infectious: usize,
    pub exposed: usize,
}

#[derive(Debug, Clone)]
pub struct InfectionSeeder {
    /// Day-major: `table[day * num_municipalities + m]`.
    table: Vec<f64>,
    num_municipalities: usize,
    carry: Vec<f64>,
    exposed_per_infected: f64,
    /// Infectious agents are only seeded after this hour.
    incubation_delay: f64,
    rng: SmallRng,
    order_randomized: bool,
}

impl InfectionSeeder {
    pub fn new(
        table: Vec<f64>,
        num_municipalities: usize,
        exposed_per_infected: f64,
        incubation_delay: f64,
        rng: SmallRng,
    ) -> Result<Self, ModelError> {
        if num_municipalities == 0 || table.len() % num_municipalities != 0 {
            return Err(ModelError::InvalidParameter(format!(
                "seeding table has {} entries, not a multiple of {num_municipalities} municipalities",
                table.len()
            )));
        }
        Ok(InfectionSeeder {
            table,
            num_municipalities,
            carry: vec![0.0; num_municipalities],
            exposed_per_infected,
            incubation_delay,
            rng,
            order_randomized: false,
        })
    }

    pub fn load(
        parameters: &Parameters,
        num_municipalities: usize,
        rng: SmallRng,
    ) -> Result<Self, ModelError> {
        let path = parameters.data_path(&parameters.files.initial_infected);
        let table: Vec<f64> = read_column(&path, 0, true)?;
        let seeder = Self::new(
            table,
            num_municipalities,
            parameters.initial_exposed_infected_ratio,
            parameters.incubation.scale,
            rng,
        )?;
        debug!("seeding table covers {} days", seeder.num_days());
        Ok(seeder)
    }

    pub fn num_days(&self) -> usize {
        self.table.len() / self.num_municipalities
    }

    /// Seeds the cases for `hour`. Does nothing except at midnight of a day in the table.
    pub fn seed(
        &mut self,
        hour: usize,
        agent_to_person_ratio: f64,
        population: &mut Population,
        distributions: &ProgressionDistributions,
    ) -> SeedingSummary {
        if !self.order_randomized {
            population.randomize_order(&mut self.rng);
            self.order_randomized = true;
        }
        if hour % HOURS_PER_DAY != 0 {
            return SeedingSummary::default();
        }
        let day = hour / HOURS_PER_DAY;
        if day >= self.num_days() {
            return SeedingSummary::default();
        }

        let seed_infectious = hour as f64 > self.incubation_delay;
        let mut infectious_target = vec![0usize; self.num_municipalities];
        let mut exposed_target = vec![0usize; self.num_municipalities];
        for m in 0..self.num_municipalities {
            let observed = self.table[day * self.num_municipalities + m];
            let agents = observed / agent_to_person_ratio + self.carry[m];
            let whole = agents.floor().max(0.0);
            self.carry[m] = agents - whole;
            let whole = whole as usize;
            if seed_infectious {
                infectious_target[m] = whole;
            }
            exposed_target[m] = (whole as f64 * self.exposed_per_infected).round() as usize;
        }

        let mut summary = SeedingSummary::default();
        let rng = &mut self.rng;
        population.for_each_matching(
            |person| person.state == EpidemicState::Susceptible,
            |_, person| {
                let home = usize::from(person.home_location);
                let Some(remaining) = infectious_target.get_mut(home) else {
                    return;
                };
                if *remaining > 0 {
                    *remaining -= 1;
                    seed_person(person, EpidemicState::Infectious, distributions, rng);
                    summary.infectious += 1;
                } else if exposed_target[home] > 0 {
                    exposed_target[home] -= 1;
                    seed_person(person, EpidemicState::Exposed, distributions, rng);
                    summary.exposed += 1;
                }
            },
        );
        trace!(
            "seeding day {day}: {} infectious, {} exposed",
            summary.infectious,
            summary.exposed
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_rng;
    use crate::demography::{Demography, Gender};
    use crate::person::Person;
    use crate::random::named_rng;

    define_rng!(SeederTestRng);

    fn population(per_municipality: usize, municipalities: u16) -> Population {
        let mut population = Population::new();
        for m in 0..municipalities {
            for _ in 0..per_municipality {
                population.add_person(Person::new(Demography::Elderly, 70, Gender::Male, m));
            }
        }
        population
    }

    fn count_at(population: &Population, m: u16, state: EpidemicState) -> usize {
        population
            .iter()
            .filter(|p| p.home_location == m && p.state == state)
            .count()
    }

    fn distributions() -> ProgressionDistributions {
        ProgressionDistributions::new(&Parameters::default()).unwrap()
    }

    #[test]
    fn seeds_only_at_midnight_within_table() {
        let rng = named_rng::<SeederTestRng>(1);
        let mut seeder =
            InfectionSeeder::new(vec![2.0, 1.0, 2.0, 1.0], 2, 3.0, 0.0, rng).unwrap();
        let mut population = population(100, 2);
        let dists = distributions();

        assert_eq!(
            seeder.seed(5, 1.0, &mut population, &dists),
            SeedingSummary::default()
        );
        let first = seeder.seed(24, 1.0, &mut population, &dists);
        assert_eq!(first.infectious, 3);
        assert_eq!(first.exposed, 9);
        assert_eq!(count_at(&population, 0, EpidemicState::Infectious), 2);
        assert_eq!(count_at(&population, 0, EpidemicState::Exposed), 6);
        assert_eq!(count_at(&population, 1, EpidemicState::Infectious), 1);
        assert_eq!(count_at(&population, 1, EpidemicState::Exposed), 3);

        // Day 2 is past the end of the table.
        assert_eq!(
            seeder.seed(48, 1.0, &mut population, &dists),
            SeedingSummary::default()
        );
    }

    #[test]
    fn no_infectious_before_incubation_delay() {
        let rng = named_rng::<SeederTestRng>(2);
        let mut seeder = InfectionSeeder::new(vec![4.0], 1, 3.0, 110.4, rng).unwrap();
        let mut population = population(50, 1);
        let summary = seeder.seed(0, 1.0, &mut population, &distributions());
        assert_eq!(summary.infectious, 0);
        assert_eq!(summary.exposed, 12);
    }

    #[test]
    fn fractions_carry_over() {
        let rng = named_rng::<SeederTestRng>(3);
        let table = vec![5.0, 5.0, 5.0, 5.0];
        let mut seeder = InfectionSeeder::new(table, 1, 0.0, 0.0, rng).unwrap();
        let mut population = population(100, 1);
        let dists = distributions();
        let seeded: Vec<usize> = (1..4)
            .map(|day| seeder.seed(day * 24, 10.0, &mut population, &dists).infectious)
            .collect();
        // Half an agent per day: nothing, then the carried half completes one.
        assert_eq!(seeded, vec![0, 1, 0]);
    }

    #[test]
    fn seeded_persons_get_thresholds() {
        let rng = named_rng::<SeederTestRng>(4);
        let mut seeder = InfectionSeeder::new(vec![3.0], 1, 1.0, 0.0, rng).unwrap();
        let mut population = population(10, 1);
        seeder.seed(0, 0.5, &mut population, &distributions());
        // 0 is not past a delay of 0, so only exposed persons.
        for person in population.iter().filter(|p| p.state == EpidemicState::Exposed) {
            assert!(person.progression.drawn);
            let progress = person.progression;
            assert!(progress.incubation_time < progress.incubation_threshold);
        }
        assert_eq!(population.count_in_state(EpidemicState::Exposed), 6);
    }

    #[test]
    fn fractional_exposed_ratio() {
        let rng = named_rng::<SeederTestRng>(6);
        let mut seeder = InfectionSeeder::new(vec![3.0], 1, 2.5, 0.0, rng).unwrap();
        let mut population = population(20, 1);
        let summary = seeder.seed(0, 1.0, &mut population, &distributions());
        // 3 * 2.5 = 7.5 rounds to 8.
        assert_eq!(summary.exposed, 8);
    }

    #[test]
    fn rejects_ragged_table() {
        let rng = named_rng::<SeederTestRng>(5);
        assert!(InfectionSeeder::new(vec![1.0, 2.0, 3.0], 2, 3.0, 0.0, rng).is_err());
    }
}
