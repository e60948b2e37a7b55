use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Directory holding compile.log, tilde-expanded at init.
const LOG_DIR: &str = "~/.local/share/deploy-gate";

/// Install the global logger: stderr at `level`, plus Info+ records appended
/// to ~/.local/share/deploy-gate/compile.log.
/// Best-effort: a missing HOME or unwritable log file only drops the file
/// logger.
pub fn init(level: LevelFilter) {
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));
    if let Some(file) = open_log_file() {
        loggers.push(WriteLogger::new(LevelFilter::Info, config, file));
    }

    // Already initialized (e.g. by a test harness) is fine.
    let _ = CombinedLogger::init(loggers);
}

fn open_log_file() -> Option<std::fs::File> {
    if std::env::var_os("HOME").is_none() {
        return None;
    }
    let log_dir = std::path::PathBuf::from(shellexpand::tilde(LOG_DIR).as_ref());
    std::fs::create_dir_all(&log_dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("compile.log"))
        .ok()
}

/// Map `-q` / `-v` counts to a level filter. Default is Warn.
pub fn level_from_flags(quiet: bool, verbose: u8) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
