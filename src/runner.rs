use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Command, FromArgMatches as _};

use crate::context::{Context, Phase};
use crate::error::ModelError;
use crate::log::{info, set_log_level, LevelFilter};
use crate::parameters::Parameters;
use crate::population_loader::{init_random_population, init_register_population};
use crate::report::write_parameters;

/// Command line arguments of the model
#[derive(Args, Debug, Clone, Default)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path to a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for report output
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(short, long)]
    pub log_level: Option<LevelFilter>,

    /// Headerless person register CSV to build the population from
    #[arg(long, conflicts_with = "random_init")]
    pub register: Option<PathBuf>,

    /// Build a synthetic population of `population_size` agents
    #[arg(long)]
    pub random_init: bool,

    /// Log the wall time of initialization and simulation
    #[arg(long)]
    pub print_timings: bool,
}

fn create_cli() -> Command {
    let cli = Command::new("mobility-seir")
        .about("Hourly agent-based SEIR model with mobility between municipalities");
    BaseArgs::augment_args(cli)
}

/// Parses the command line and runs the full scenario.
///
/// # Errors
/// Returns an error if argument parsing, loading the inputs or writing the reports fails.
pub fn run_with_args() -> Result<Context, Box<dyn std::error::Error>> {
    let matches = create_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args_internal(args)?)
}

/// Runs the model for already parsed arguments.
///
/// # Errors
/// Fails when no population source is given, or when loading or writing fails.
pub fn run_with_args_internal(args: BaseArgs) -> Result<Context, ModelError> {
    if let Some(level) = args.log_level {
        set_log_level(level);
    }
    if args.register.is_none() && !args.random_init {
        return Err(ModelError::InvalidParameter(
            "either --register <csv> or --random-init is required".to_string(),
        ));
    }

    let parameters = match &args.config {
        Some(path) => {
            info!("loading parameters from {}", path.display());
            Parameters::load_from_json(path)?
        }
        None => Parameters::default(),
    };

    let start = Instant::now();
    let mut context = Context::new(parameters, args.random_seed)?;
    match &args.register {
        Some(register) => init_register_population(&mut context, register)?,
        None => init_random_population(&mut context)?,
    }
    let initialized = Instant::now();
    if args.print_timings {
        info!(
            "initialization took {}",
            humantime::format_duration(initialized - start)
        );
    }

    run_scenario(&mut context)?;
    if args.print_timings {
        info!(
            "simulation of {} hours took {}",
            context.get_current_hour(),
            humantime::format_duration(initialized.elapsed())
        );
    }

    let written = context.reports().write(&args.output_dir)?;
    let parameters_file = write_parameters(&args.output_dir, context.parameters())?;
    info!(
        "wrote {} report files and {}",
        written.len(),
        parameters_file.display()
    );
    Ok(context)
}

/// Seeds the epidemic and runs the four intervention phases.
///
/// # Errors
/// Fails when the seeding table or a mixing reduction file cannot be loaded.
pub fn run_scenario(context: &mut Context) -> Result<(), ModelError> {
    let parameters = context.parameters().clone();
    let [baseline, early, lockdown, relaxation] = parameters.phase_hours;

    context.enable_seeding()?;
    let seeding_end = parameters.init_infection_time;
    context.simulate_until(|c| c.get_current_hour() >= seeding_end);
    context.disable_seeding();
    context.log_state_distribution();

    context.simulate(baseline);
    context.log_state_distribution();

    context.advance_phase(Phase::EarlyMeasures)?;
    let home = context.work_from_home(parameters.phase_2_mobility_reduction);
    let closed = context.close_schools(parameters.phase_2_homeschooling_parents);
    info!("work from home: {home} agents, school closure: {closed} agents");
    context.simulate(early);
    context.log_state_distribution();

    context.advance_phase(Phase::Lockdown)?;
    let additional = (parameters.phase_3_mobility_reduction
        - parameters.phase_2_mobility_reduction)
        .max(0.0);
    let home = context.work_from_home(additional);
    info!("work from home: {home} additional agents");
    context.simulate(lockdown);
    context.log_state_distribution();

    context.advance_phase(Phase::Relaxation)?;
    context.simulate(relaxation);
    context.log_state_distribution();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{PARAMETERS_FILE, TIME_SERIES_FILE};
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn config(population_size: usize) -> NamedTempFile {
        let data_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data");
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        let json = serde_json::json!({
            "population_size": population_size,
            "total_population_size": 201390,
            "init_infection_time": 30,
            "phase_hours": [6, 6, 6, 6],
            "num_threads": 2,
            "data_dir": data_dir,
            "tracked_municipalities": { "Groningen": 2 }
        });
        write!(file, "{json}").unwrap();
        file
    }

    #[test]
    fn needs_population_source() {
        let result = run_with_args_internal(BaseArgs::default());
        assert!(matches!(result, Err(ModelError::InvalidParameter(_))));
    }

    #[test]
    fn runs_random_scenario() {
        let config = config(300);
        let output = tempdir().unwrap();
        let args = BaseArgs {
            random_seed: 3,
            config: Some(config.path().to_path_buf()),
            output_dir: output.path().to_path_buf(),
            random_init: true,
            ..BaseArgs::default()
        };
        let context = run_with_args_internal(args).unwrap();
        assert_eq!(context.get_current_hour(), 30 + 24);
        assert_eq!(context.phase(), Phase::Relaxation);
        assert_eq!(context.population().len(), 300);
        assert_eq!(context.reports().time_series().len(), 54);
        assert!(output.path().join(TIME_SERIES_FILE).exists());
        assert!(output.path().join(PARAMETERS_FILE).exists());
    }

    #[test]
    fn runs_register_scenario() {
        let config = config(0);
        let output = tempdir().unwrap();
        let register = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/register.csv");
        let args = BaseArgs {
            config: Some(config.path().to_path_buf()),
            output_dir: output.path().to_path_buf(),
            register: Some(register),
            ..BaseArgs::default()
        };
        let context = run_with_args_internal(args).unwrap();
        assert_eq!(context.population().len(), 40);
        assert!(!context.is_seeding());
    }

    #[test]
    fn missing_config_fails() {
        let args = BaseArgs {
            config: Some(PathBuf::from("does/not/exist.json")),
            random_init: true,
            ..BaseArgs::default()
        };
        let result = run_with_args_internal(args);
        assert!(matches!(result, Err(ModelError::FileNotFound(_))));
    }
}
