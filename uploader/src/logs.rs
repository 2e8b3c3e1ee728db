//! Progress logging.
//!
//! Thin helpers over the `log` facade so the batch driver reports progress
//! the same way everywhere. The binary installs `env_logger` as the backend;
//! library users can plug in any `log` implementation.

/// Display level for a progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Info => "",
            LogLevel::Success => "✓ ",
            LogLevel::Warning => "⚠️  ",
            LogLevel::Error => "❌ ",
        }
    }

    fn level(self) -> log::Level {
        match self {
            LogLevel::Info | LogLevel::Success => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// Emit one progress line, indented by `indent` steps.
pub fn log_line(level: LogLevel, message: impl AsRef<str>, indent: u8) {
    let pad = "   ".repeat(indent as usize);
    log::log!(level.level(), "{}{}{}", pad, level.prefix(), message.as_ref());
}

pub fn log_info(msg: impl AsRef<str>) {
    log_line(LogLevel::Info, msg, 0);
}

pub fn log_success(msg: impl AsRef<str>) {
    log_line(LogLevel::Success, msg, 0);
}

pub fn log_warning(msg: impl AsRef<str>) {
    log_line(LogLevel::Warning, msg, 0);
}

pub fn log_error(msg: impl AsRef<str>) {
    log_line(LogLevel::Error, msg, 0);
}

pub fn log_info_indent(msg: impl AsRef<str>, indent: u8) {
    log_line(LogLevel::Info, msg, indent);
}

/// Install `env_logger`, defaulting to `info` (or `debug`/`trace` with
/// higher verbosity). `RUST_LOG` still takes precedence.
pub fn init(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_target(false)
        .try_init();
}
