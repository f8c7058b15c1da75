use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::log::LogConfiguration;

// ISO 8601 timestamp, color coded level, thread name
const DEFAULT_LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {T} {t} - {m}{n}";

impl LogConfiguration {
    /// Installs (or reconfigures) the global `log4rs` logger to match this configuration.
    pub(in crate::log) fn set_config(&mut self) {
        let encoder = Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN));
        let stdout = ConsoleAppender::builder().encoder(encoder).build();

        let loggers = self
            .module_filters
            .iter()
            .map(|(module, level)| Logger::builder().build(module.clone(), *level));

        let root = Root::builder()
            .appender("stdout")
            .build(self.global_log_level);
        let new_config = match Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .loggers(loggers)
            .build(root)
        {
            Err(e) => {
                panic!("failed to build config: {e}");
            }
            Ok(config) => config,
        };

        match self.root_handle {
            Some(ref mut handle) => handle.set_config(new_config),
            None => {
                self.root_handle =
                    Some(log4rs::init_config(new_config).expect("a logger is already installed"));
            }
        }
    }
}
