//! The simulation context: owns the population, the models, the worker pool and the random
//! streams, and advances the simulation one hour at a time.
//!
//! Each hour runs these stages in order, each one a full pass over the population:
//!
//! 1. population statistics (sharded, parallel)
//! 2. initial-outbreak seeding, while a seeder is installed (sequential)
//! 3. situation update (parallel)
//! 4. epidemic state update (parallel, per-worker random streams)
//! 5. travel to the location of the weekly schedule (parallel)
//! 6. report collection
use rand::rngs::SmallRng;
use rayon::{ThreadPool, ThreadPoolBuilder};
use strum::{Display, EnumIter, FromRepr};

use crate::define_rng;
use crate::error::ModelError;
use crate::infection_manager::{advance, ProgressionDistributions};
use crate::infection_seeder::InfectionSeeder;
use crate::interventions::{close_schools, intervention_size, work_from_home};
use crate::log::{info, trace};
use crate::mixing::MixingModel;
use crate::mobility::MobilityModel;
use crate::parameters::Parameters;
use crate::person::Person;
use crate::population::Population;
use crate::random::{named_rng, RngStreams};
use crate::report::ReportCollector;
use crate::situation::update_situation;
use crate::statistics::{PopulationStatistics, StatisticsAggregator};
use crate::transmission::ForceOfInfection;

define_rng!(CreationRng);
define_rng!(InfectionRng);
define_rng!(SeedingRng);
define_rng!(InterventionRng);

/// Stage of the epidemic response. The index selects the transmission rate and which mixing
/// reductions are applied on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumIter, FromRepr)]
#[repr(u8)]
pub enum Phase {
    Baseline,
    EarlyMeasures,
    Lockdown,
    Relaxation,
}

impl Phase {
    pub fn index(self) -> usize {
        self as usize
    }
}

pub struct Context {
    parameters: Parameters,
    base_seed: u64,
    hour: usize,
    phase: Phase,
    population: Population,
    mixing: MixingModel,
    mobility: MobilityModel,
    statistics: StatisticsAggregator,
    distributions: ProgressionDistributions,
    force: ForceOfInfection,
    workers: usize,
    pool: ThreadPool,
    infection_rngs: RngStreams,
    intervention_rng: SmallRng,
    seeder: Option<InfectionSeeder>,
    reports: ReportCollector,
}

impl Context {
    /// Loads the mixing and mobility data named in `parameters`.
    pub fn new(parameters: Parameters, base_seed: u64) -> Result<Context, ModelError> {
        let mixing = MixingModel::load(&parameters)?;
        let mobility = MobilityModel::load(&parameters)?;
        Self::with_models(parameters, mixing, mobility, base_seed)
    }

    pub fn with_models(
        parameters: Parameters,
        mixing: MixingModel,
        mobility: MobilityModel,
        base_seed: u64,
    ) -> Result<Context, ModelError> {
        parameters.validate()?;
        let mut builder = ThreadPoolBuilder::new()
            .thread_name(|index| format!("mobility-seir-worker-{index}"));
        if parameters.num_threads != 0 {
            builder = builder.num_threads(parameters.num_threads);
        }
        let pool = builder.build()?;
        let workers = pool.current_num_threads();
        info!("using {workers} worker threads");

        Ok(Context {
            statistics: StatisticsAggregator::new(mobility.num_municipalities(), workers),
            distributions: ProgressionDistributions::new(&parameters)?,
            force: ForceOfInfection::for_phase(&parameters, Phase::Baseline.index()),
            infection_rngs: RngStreams::new::<InfectionRng>(base_seed, workers),
            intervention_rng: named_rng::<InterventionRng>(base_seed),
            reports: ReportCollector::new(&parameters),
            seeder: None,
            population: Population::new(),
            hour: 0,
            phase: Phase::Baseline,
            parameters,
            base_seed,
            mixing,
            mobility,
            workers,
            pool,
        })
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    pub fn get_current_hour(&self) -> usize {
        self.hour
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    pub fn mixing(&self) -> &MixingModel {
        &self.mixing
    }

    pub fn mobility(&self) -> &MobilityModel {
        &self.mobility
    }

    pub fn statistics(&self) -> &PopulationStatistics {
        self.statistics.statistics()
    }

    pub fn distributions(&self) -> &ProgressionDistributions {
        &self.distributions
    }

    pub fn reports(&self) -> &ReportCollector {
        &self.reports
    }

    pub fn agent_to_person_ratio(&self) -> f64 {
        self.parameters.agent_to_person_ratio(self.population.len())
    }

    /// Replaces the population. `init` runs once per person on the worker pool, with the
    /// creation stream of the worker handling that person; it typically draws ages and weekly
    /// schedules.
    pub fn set_population<F>(&mut self, persons: Vec<Person>, init: F)
    where
        F: Fn(&mut Person, &MobilityModel, &mut SmallRng) + Sync + Send,
    {
        let mut population = Population::from_persons(persons);
        let mut rngs = RngStreams::new::<CreationRng>(self.base_seed, self.workers);
        let mobility = &self.mobility;
        self.pool.install(|| {
            population.par_for_each_with_rng(&mut rngs, |person, rng| init(person, mobility, rng));
        });
        self.population = population;
        info!(
            "population of {} agents, 1 agent = {} persons",
            self.population.len(),
            self.agent_to_person_ratio()
        );
    }

    /// Starts seeding cases from the configured table.
    pub fn enable_seeding(&mut self) -> Result<(), ModelError> {
        let rng = named_rng::<SeedingRng>(self.base_seed);
        self.seeder = Some(InfectionSeeder::load(
            &self.parameters,
            self.mobility.num_municipalities(),
            rng,
        )?);
        Ok(())
    }

    pub fn disable_seeding(&mut self) {
        self.seeder = None;
    }

    pub fn is_seeding(&self) -> bool {
        self.seeder.is_some()
    }

    /// Enters `phase`: applies the mixing reductions configured for it and switches the
    /// transmission rate.
    pub fn advance_phase(&mut self, phase: Phase) -> Result<(), ModelError> {
        let files: Vec<String> = self
            .parameters
            .mixing_reductions
            .iter()
            .filter(|reduction| reduction.phase == phase.index())
            .map(|reduction| reduction.file.clone())
            .collect();
        for file in files {
            self.mixing.apply_reduction_file(&self.parameters, &file)?;
        }
        self.phase = phase;
        self.force = ForceOfInfection::for_phase(&self.parameters, phase.index());
        info!(
            "hour {}: entering phase {} ({phase}), beta = {}",
            self.hour,
            phase.index(),
            self.force.beta()
        );
        Ok(())
    }

    /// Sends `fraction` of the population size into home stay, taken from working persons.
    pub fn work_from_home(&mut self, fraction: f64) -> usize {
        let count = intervention_size(fraction, self.population.len());
        work_from_home(&mut self.population, count, &mut self.intervention_rng)
    }

    /// Closes schools and keeps `parents_fraction` of the population size of working parents
    /// at home.
    pub fn close_schools(&mut self, parents_fraction: f64) -> usize {
        let parents = intervention_size(parents_fraction, self.population.len());
        let population = &mut self.population;
        let rng = &mut self.intervention_rng;
        self.pool.install(|| close_schools(population, parents, rng))
    }

    /// Runs one hour of the simulation.
    pub fn execute_hour(&mut self) {
        let hour = self.hour;
        let ratio = self.agent_to_person_ratio();

        {
            let statistics = &mut self.statistics;
            let persons = self.population.persons();
            self.pool.install(|| statistics.update(persons));
        }
        trace!("hour {hour}: statistics updated");

        if let Some(seeder) = self.seeder.as_mut() {
            seeder.seed(hour, ratio, &mut self.population, &self.distributions);
        }

        let population = &mut self.population;
        self.pool
            .install(|| population.par_for_each(|person| update_situation(person, hour)));

        let force = &self.force;
        let mixing = &self.mixing;
        let statistics = self.statistics.statistics();
        let distributions = &self.distributions;
        let rngs = &mut self.infection_rngs;
        self.pool.install(|| {
            population.par_for_each_with_rng(rngs, |person, rng| {
                advance(
                    person,
                    distributions,
                    |p| force.hazard(p, hour, mixing, statistics),
                    rng,
                );
            });
        });

        self.pool
            .install(|| population.par_for_each(|person| person.travel(hour)));

        self.reports.collect(hour, ratio, population, statistics, mixing);
        trace!("hour {hour}: done");
        self.hour += 1;
    }

    /// Runs `hours` hours.
    pub fn simulate(&mut self, hours: usize) {
        for _ in 0..hours {
            self.execute_hour();
        }
    }

    /// Runs hours until `done` returns true. `done` is checked before every hour.
    pub fn simulate_until<F>(&mut self, mut done: F)
    where
        F: FnMut(&Context) -> bool,
    {
        while !done(self) {
            self.execute_hour();
        }
    }

    /// Logs how many persons are in each epidemic state.
    pub fn log_state_distribution(&self) {
        let counts = self.population.count_states();
        let total = self.population.len().max(1) as f64;
        info!(
            "hour {}: state fractions S {:.4} E {:.4} I {:.4} R {:.4}, hospitalized {}",
            self.hour,
            counts[0] as f64 / total,
            counts[1] as f64 / total,
            counts[2] as f64 / total,
            counts[3] as f64 / total,
            self.population.count_hospitalized()
        );
    }
}
