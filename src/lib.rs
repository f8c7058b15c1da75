//! An hourly agent-based SEIR model of an epidemic spreading through the municipalities of a
//! country.
//!
//! Every agent belongs to one of eleven demographies, lives in a home municipality and follows
//! a weekly schedule of hourly locations drawn from commuting tables. Each simulated hour the
//! [`context::Context`] runs a fixed pipeline:
//! * aggregate per-municipality statistics of who is present and who is infectious,
//! * seed new cases while the seeding window is open,
//! * classify each agent's situation (home, work, school, ...),
//! * advance each agent's infection using a force of infection built from the mixing matrices,
//! * move every agent to the next slot of their schedule,
//! * collect the hourly report row.
//!
//! The [`runner`] wraps this in a four-phase scenario (baseline, early measures, lockdown,
//! relaxation) with work-from-home and school-closure interventions, and writes the reports.
pub mod context;
pub mod data_loader;
pub mod demography;
pub mod error;
pub mod infection_manager;
pub mod infection_seeder;
pub mod interventions;
pub mod log;
pub mod mixing;
pub mod mobility;
pub mod parameters;
pub mod person;
pub mod population;
pub mod population_loader;
pub mod random;
pub mod report;
pub mod runner;
pub mod situation;
pub mod statistics;
pub mod transmission;

pub use context::{Context, Phase};
pub use error::ModelError;
pub use parameters::Parameters;
pub use runner::{run_with_args, BaseArgs};

// Re-exported for `define_rng!`.
pub use rand;
