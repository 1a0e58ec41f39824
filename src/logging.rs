use std::fs::OpenOptions;
use std::str::FromStr;

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use crate::config::LoggingConfig;
use crate::eval::Ruling;

/// Command text kept in a decision record.
const RECORD_COMMAND_CHARS: usize = 200;

/// Parse a level name; unknown or empty values fall back to `warn`.
pub fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Warn)
}

/// Install the global logger.
///
/// stderr never gets more than warnings, since the wrapped tool owns the
/// terminal. The optional file log records at least `debug`. Best-effort:
/// an unwritable log file or an already-installed logger is not fatal.
pub fn init(config: &LoggingConfig) {
    let level = parse_level(&config.level);
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level.min(LevelFilter::Warn),
        ConfigBuilder::new().set_time_level(LevelFilter::Off).build(),
        TerminalMode::Stderr,
        ColorChoice::Never,
    )];

    if !config.file.is_empty() {
        let path = shellexpand::tilde(&config.file).into_owned();
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => loggers.push(WriteLogger::new(
                level.max(LevelFilter::Debug),
                ConfigBuilder::new().set_time_format_rfc3339().build(),
                file,
            )),
            Err(e) => eprintln!("cc-permgate: cannot open log file {path}: {e}"),
        }
    }

    let _ = CombinedLogger::init(loggers);
}

/// Single-line `verdict<TAB>command<TAB>reason` record.
pub fn decision_record(command: &str, ruling: &Ruling) -> String {
    let cmd: String = command.chars().take(RECORD_COMMAND_CHARS).collect();
    let reason = ruling.reason.replace('\n', "; ");
    format!("{}\t{cmd}\t{reason}", ruling.verdict.label())
}

/// Log a ruling at info level.
pub fn log_ruling(command: &str, ruling: &Ruling) {
    log::info!("{}", decision_record(command, ruling));
}
