//! Logging for applications printing a summary.
//!
//! Output verbosity is controlled with `-v` and `-q`, and an optional log file is enabled
//! with `--log-file` and its level raised with `-g`:
//!
//! | flags     | output  | flags   | log file |
//! |-----------|---------|---------|----------|
//! | (none)    | info    | (none)  | warn     |
//! | `-q`      | warn    | `-g`    | info     |
//! | `-v`      | debug   | `-gg`   | debug    |
//! | `-vv`     | trace   | `-ggg`  | trace    |

use simplelog::*;
use std::fs::File;
use std::path::PathBuf;

use crate::config::SummaryConfiguration;

impl SummaryConfiguration {
    /// Level of messages written to the terminal.
    pub fn output_level(&self) -> LevelFilter {
        match self.verbose {
            0 => match self.quiet {
                0 => LevelFilter::Info,
                _ => LevelFilter::Warn,
            },
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Level of messages written to the log file.
    pub fn log_file_level(&self) -> LevelFilter {
        match self.log_level {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Install the global logger. Only the first call has any effect.
    pub fn initialize_logger(&self) {
        let output_level = self.output_level();
        let log_file_level = self.log_file_level();

        let mut loggers: Vec<Box<dyn SharedLogger>> =
            vec![SimpleLogger::new(output_level, Config::default())];

        // Open the log file if configured.
        let log_file: Option<PathBuf> = if !self.log_file.is_empty() {
            Some(PathBuf::from(&self.log_file))
        } else {
            None
        };
        let mut log_file_error = None;
        if let Some(path) = log_file.as_ref() {
            match File::create(path) {
                Ok(file) => loggers.push(WriteLogger::new(log_file_level, Config::default(), file)),
                Err(e) => log_file_error = Some(e),
            }
        }

        if let Err(e) = CombinedLogger::init(loggers) {
            info!("failed to initialize CombinedLogger: {}", e);
        }

        if let Some(path) = log_file.as_ref() {
            match log_file_error {
                Some(e) => warn!("failed to create log file {}: {}", path.display(), e),
                None => info!("Writing to log file: {}", path.display()),
            }
        }
        info!("Output verbosity level: {}", output_level);
        info!("Logfile verbosity level: {}", log_file_level);
    }
}
