//! Creation of the agent population, either synthetic or from a person register.
//!
//! Both variants build the persons' fixed attributes sequentially, then hand them to
//! [`Context::set_population`], which draws the remaining random attributes and the weekly
//! schedules in parallel.
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;
use strum::IntoEnumIterator;

use crate::context::Context;
use crate::data_loader::read_records;
use crate::define_rng;
use crate::demography::{
    Demography, Gender, Municipality, HOURS_PER_DAY, NATIONAL_FRACTION, NUM_DEMOGRAPHIES,
};
use crate::error::ModelError;
use crate::log::{debug, info};
use crate::mobility::MobilityModel;
use crate::person::Person;

define_rng!(PopulationShuffleRng);

const REGISTER_MUNICIPALITY_COLUMN: usize = 2;
const REGISTER_WORKSTATUS_COLUMN: usize = 4;
const REGISTER_GENDER_COLUMN: usize = 8;
const REGISTER_AGE_COLUMN: usize = 9;

/// Demography of a register entry from its age and CBS work status code.
pub fn workstatus_to_demography(workstatus: i32, age: u8) -> Demography {
    let working = (11..=15).contains(&workstatus);
    match age {
        0..=4 => Demography::PreSchoolChildren,
        5..=11 => Demography::PrimarySchoolChildren,
        12..=16 => Demography::SecondarySchoolChildren,
        17..=24 if workstatus == 26 || workstatus == 31 => Demography::Students,
        17..=24 => Demography::NonStudyingAdolescents,
        25..=54 if working => Demography::MiddleAgeWorking,
        25..=54 => Demography::MiddleAgeUnemployed,
        55..=67 if working => Demography::HigherAgeWorking,
        55..=67 => Demography::HigherAgeUnemployed,
        68..=80 => Demography::Elderly,
        _ => Demography::Eldest,
    }
}

/// Number of agents per demography for a population of `size`. The last group takes whatever
/// rounding leaves over, so the counts always sum to `size`.
pub fn demography_counts(size: usize) -> [usize; NUM_DEMOGRAPHIES] {
    let mut counts = [0; NUM_DEMOGRAPHIES];
    let mut assigned = 0;
    for demography in Demography::iter() {
        let d = demography.index();
        counts[d] = if d == NUM_DEMOGRAPHIES - 1 {
            size.saturating_sub(assigned)
        } else {
            (NATIONAL_FRACTION[d] * size as f64).round() as usize
        };
        assigned += counts[d];
    }
    counts
}

/// Agents per home municipality, proportional to the inhabitants. The difference caused by
/// rounding is settled in the most populous municipality.
pub fn agents_per_municipality(
    population: &[u64],
    agent_to_person_ratio: f64,
    num_agents: usize,
    most_populous: usize,
) -> Result<Vec<usize>, ModelError> {
    let mut agents: Vec<i64> = population
        .iter()
        .map(|inhabitants| (*inhabitants as f64 / agent_to_person_ratio).round() as i64)
        .collect();
    let difference = agents.iter().sum::<i64>() - num_agents as i64;
    if let Some(largest) = agents.get_mut(most_populous) {
        *largest -= difference;
    }
    if agents.iter().any(|a| *a < 0) || agents.iter().sum::<i64>() != num_agents as i64 {
        return Err(ModelError::ModelError(format!(
            "cannot distribute {num_agents} agents over the municipalities (difference {difference})"
        )));
    }
    Ok(agents.into_iter().map(|a| a as usize).collect())
}

fn draw_attributes(person: &mut Person, mobility: &MobilityModel, rng: &mut SmallRng) {
    let (min_age, max_age) = person.demography.age_limits();
    person.age = rng.random_range(min_age..=max_age);
    person.gender = if rng.random_bool(0.5) {
        Gender::Female
    } else {
        Gender::Male
    };
    draw_schedule(person, mobility, rng);
}

fn draw_schedule(person: &mut Person, mobility: &MobilityModel, rng: &mut SmallRng) {
    person.schedule = mobility.weekly_schedule(
        person.traveler_type,
        person.demography,
        person.home_location,
        rng,
    );
}

/// Synthetic population of `population_size` agents with national demography fractions and
/// homes proportional to municipality size.
pub fn init_random_population(context: &mut Context) -> Result<(), ModelError> {
    let size = context.parameters().population_size;
    if size == 0 {
        return Err(ModelError::InvalidParameter(
            "a random population needs population_size > 0".to_string(),
        ));
    }
    let mobility = context.mobility();
    let most_populous = mobility
        .most_populous()
        .ok_or_else(|| ModelError::ModelError("no municipalities loaded".to_string()))?;
    let homes = agents_per_municipality(
        mobility.population(),
        context.parameters().agent_to_person_ratio(size),
        size,
        usize::from(most_populous),
    )?;

    let mut demographies: Vec<Demography> = demography_counts(size)
        .iter()
        .zip(Demography::iter())
        .flat_map(|(count, demography)| std::iter::repeat_n(demography, *count))
        .collect();
    let mut rng = crate::random::named_rng::<PopulationShuffleRng>(context.base_seed());
    demographies.shuffle(&mut rng);

    let persons: Vec<Person> = homes
        .iter()
        .enumerate()
        .flat_map(|(m, count)| std::iter::repeat_n(m as Municipality, *count))
        .zip(demographies)
        .map(|(home, demography)| Person::new(demography, 0, Gender::Male, home))
        .collect();

    info!("initializing random population of {} agents", persons.len());
    context.set_population(persons, draw_attributes);
    log_people_not_home(context);
    Ok(())
}

/// Population from a headerless register CSV (municipality code in column 2, work status in 4,
/// gender in 8 as 1/2, age in 9). Rows are taken in random order; `population_size` of them, or
/// all when it is 0.
pub fn init_register_population(
    context: &mut Context,
    register: &std::path::Path,
) -> Result<(), ModelError> {
    let records = read_records(register)?;
    let requested = context.parameters().population_size;
    let num_agents = if requested == 0 {
        records.len()
    } else {
        requested
    };
    if num_agents > records.len() {
        return Err(ModelError::InvalidParameter(format!(
            "population_size {num_agents} exceeds the {} register rows",
            records.len()
        )));
    }

    let mut order: Vec<usize> = (0..records.len()).collect();
    let mut rng = crate::random::named_rng::<PopulationShuffleRng>(context.base_seed());
    order.shuffle(&mut rng);

    let parse = |row: usize, column: usize| -> Result<i64, ModelError> {
        let value = records[row].get(column).unwrap_or_default();
        value.parse::<i64>().map_err(|_| ModelError::ParseError {
            path: register.to_path_buf(),
            row,
            column,
            value: value.to_string(),
        })
    };

    let mobility = context.mobility();
    let mut persons = Vec::with_capacity(num_agents);
    for &row in order.iter().take(num_agents) {
        let code = parse(row, REGISTER_MUNICIPALITY_COLUMN)?;
        let workstatus = parse(row, REGISTER_WORKSTATUS_COLUMN)?;
        let gender = parse(row, REGISTER_GENDER_COLUMN)?;
        let age = parse(row, REGISTER_AGE_COLUMN)?.clamp(0, i64::from(u8::MAX)) as u8;

        let code = u32::try_from(code).map_err(|_| ModelError::ParseError {
            path: register.to_path_buf(),
            row,
            column: REGISTER_MUNICIPALITY_COLUMN,
            value: code.to_string(),
        })?;
        let home = mobility.municipality_to_location(code)?;
        let gender = match gender {
            1 => Gender::Male,
            2 => Gender::Female,
            other => {
                return Err(ModelError::ParseError {
                    path: register.to_path_buf(),
                    row,
                    column: REGISTER_GENDER_COLUMN,
                    value: other.to_string(),
                })
            }
        };
        let demography = workstatus_to_demography(workstatus as i32, age);
        persons.push(Person::new(demography, age, gender, home));
    }

    info!(
        "initializing population of {num_agents} agents from {}",
        register.display()
    );
    context.set_population(persons, draw_schedule);
    log_people_not_home(context);
    Ok(())
}

/// Logs, per hour of the first day, the fraction of agents scheduled away from home.
fn log_people_not_home(context: &Context) {
    let population = context.population();
    let mut away = [0usize; HOURS_PER_DAY];
    for person in population.iter() {
        for (hour, count) in away.iter_mut().enumerate() {
            if person
                .schedule
                .location_at(hour)
                .is_some_and(|m| m != person.home_location)
            {
                *count += 1;
            }
        }
    }
    let total = population.len().max(1) as f64;
    let fractions: Vec<String> = away
        .iter()
        .map(|count| format!("{:.3}", *count as f64 / total))
        .collect();
    debug!("fraction not home per hour: {}", fractions.join(" "));
}
