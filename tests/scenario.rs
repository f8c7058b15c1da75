use std::path::PathBuf;

use mobility_seir::context::{Context, Phase};
use mobility_seir::demography::EpidemicState;
use mobility_seir::parameters::Parameters;
use mobility_seir::population_loader::init_random_population;
use mobility_seir::runner::run_scenario;

fn parameters() -> Parameters {
    let mut parameters = Parameters {
        population_size: 1200,
        total_population_size: 201_390,
        init_infection_time: 48,
        phase_hours: [24, 24, 24, 24],
        num_threads: 3,
        data_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data"),
        export_affected: true,
        export_infected_per_timestep_frequency: 24,
        ..Parameters::default()
    };
    parameters.files.initial_infected = "initial_infected_large.csv".to_string();
    parameters
}

fn run(seed: u64) -> Context {
    let mut context = Context::new(parameters(), seed).unwrap();
    init_random_population(&mut context).unwrap();
    run_scenario(&mut context).unwrap();
    context
}

#[test]
fn scenario_visits_every_phase() {
    let context = run(11);
    assert_eq!(context.phase(), Phase::Relaxation);
    assert_eq!(context.get_current_hour(), 48 + 4 * 24);
    assert_eq!(context.reports().time_series().len(), 48 + 4 * 24);
    // 6 municipalities at hours 0, 24, ..., 120
    assert_eq!(context.reports().municipality_counts().len(), 6 * 6);
}

#[test]
fn seeding_infects_someone() {
    let context = run(5);
    let susceptible = context.population().count_in_state(EpidemicState::Susceptible);
    assert!(susceptible < context.population().len());
    assert!(context
        .reports()
        .time_series()
        .iter()
        .any(|row| row.exposed > 0.0));
}

#[test]
fn interventions_keep_people_home() {
    let context = run(2);
    let staying = context
        .population()
        .iter()
        .filter(|person| person.home_stay)
        .count();
    assert!(staying > 0);
    for person in context.population().iter().filter(|p| p.demography.is_child()) {
        assert!(person.home_stay);
    }
}

#[test]
fn runs_are_reproducible() {
    let first = run(21);
    let second = run(21);
    assert_eq!(first.reports().time_series(), second.reports().time_series());
    assert_eq!(
        first.reports().municipality_counts(),
        second.reports().municipality_counts()
    );
}
