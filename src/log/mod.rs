//! Logging for the model. This is diagnostic output about the running simulation (phase changes,
//! interventions, load warnings) and is separate from the time-series _reports_ written at the
//! end of a run.
//!
//! The five `log` macros are re-exported so model code can simply `use crate::log::info;`.
//! Logging is _off_ by default. It is switched on from the command line with
//! `--log-level <level>` or programmatically:
//!
//! ```rust
//! use mobility_seir::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! // Phase changes and interventions are logged at `info`.
//! set_log_level(LevelFilter::Info);
//! // Per-hour stage tracing for the mobility model only.
//! set_module_filter("mobility_seir::mobility", LevelFilter::Trace);
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};

use std::collections::BTreeMap;
use std::sync::{LazyLock, Mutex, MutexGuard};

#[cfg(feature = "logging")]
use log4rs::Handle;

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// Global logging state: the root level, per-module overrides keyed by module path, and the
/// handle of the installed logger so it can be reconfigured in place.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_filters: BTreeMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_filters: BTreeMap::new(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    fn set_module_filter(&mut self, module: &str, level: LevelFilter) {
        if self.module_filters.get(module) == Some(&level) {
            return;
        }
        self.module_filters.insert(module.to_string(), level);
        self.set_config();
    }

    fn remove_module_filter(&mut self, module: &str) {
        if self.module_filters.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// Turns on every log message. Equivalent to `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Turns logging off completely.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the root log level. `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Overrides the level for a single module path, e.g. `"mobility_seir::interventions"`.
pub fn set_module_filter(module_path: &str, level: LevelFilter) {
    get_log_configuration().set_module_filter(module_path, level);
}

/// Drops a module override so the root level applies again.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::{get_log_configuration, remove_module_filter, set_log_level, set_module_filter};
    use log::{error, trace, LevelFilter};
    use std::sync::{LazyLock, Mutex};

    // Logging state is global, so these tests must not interleave.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn test_set_log_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Error);
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Error);
            error!("test_set_log_level: global set to error");
            trace!("test_set_log_level: NOT EMITTED");
        }
        set_log_level(LevelFilter::Off);
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Off);
    }

    #[test]
    fn test_set_remove_module_filter() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Warn);
        set_module_filter("mobility_seir::mobility", LevelFilter::Trace);
        set_module_filter("mobility_seir::statistics", LevelFilter::Debug);
        {
            let config = get_log_configuration();
            assert_eq!(
                config.module_filters.get("mobility_seir::mobility"),
                Some(&LevelFilter::Trace)
            );
            assert_eq!(config.module_filters.len(), 2);
        }

        remove_module_filter("mobility_seir::mobility");
        remove_module_filter("mobility_seir::statistics");
        assert!(get_log_configuration().module_filters.is_empty());
        set_log_level(LevelFilter::Off);
    }
}
