//! Logging setup for the flight control executables
//!
//! Every line goes to the terminal and to the session's log file, prefixed
//! with the session time, the level and the name of the thread which logged
//! it. Debug and trace lines also carry their target module, since at those
//! levels several modules log every tick.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must be at least as verbose as INFO, found {0}")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Unknown log level name `{0}`, expected info, debug or trace")]
    UnknownLevelName(String),

    #[error("Could not open the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been installed: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` may not hide info messages, as arming and fail-safe
/// transitions are logged at that level or above.
///
/// Only one logger can be installed per process, a second call fails.
pub fn logger_init(
    min_level: LevelFilter,
    session: &Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {} {}]{} {}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                std::thread::current().name().unwrap_or("?"),
                target_suffix(record),
                message
            ))
        })
        .level(min_level)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Parse a log level name as given on the command line.
pub fn parse_level(name: &str) -> Result<LevelFilter, LoggerInitError> {
    match name.to_ascii_lowercase().as_str() {
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        _ => Err(LoggerInitError::UnknownLevelName(name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Three letter, coloured tag for a level.
fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info  => "INF".normal(),
        Level::Warn  => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}

/// The target module, for debug and trace lines only.
fn target_suffix(record: &Record) -> String {
    if record.level() > Level::Info {
        format!(" {}:", record.target())
    }
    else {
        String::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("trace").unwrap(), LevelFilter::Trace);
        assert!(parse_level("warn").is_err());
    }

    #[test]
    fn test_target_only_when_verbose() {
        let info = Record::builder()
            .args(format_args!("tick"))
            .level(Level::Info)
            .target("fc_lib::supervisor")
            .build();
        assert_eq!(target_suffix(&info), "");

        let debug = Record::builder()
            .args(format_args!("tick"))
            .level(Level::Debug)
            .target("fc_lib::supervisor")
            .build();
        assert_eq!(target_suffix(&debug), " fc_lib::supervisor:");
    }
}
