use crate::domain::model::LogLevel;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_directive(level: LogLevel, verbose: bool) -> &'static str {
    match (level, verbose) {
        (LogLevel::Off, false) => "off",
        (LogLevel::Verbose, _) | (_, true) => "assembly_info=debug,info",
        (LogLevel::Normal, false) => "assembly_info=info",
    }
}

fn filter(level: LogLevel, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level, verbose)))
}

/// Human readable log lines on stderr. `--verbose` wins over `log_level = "off"`.
pub fn init_cli_logger(level: LogLevel, verbose: bool) {
    tracing_subscriber::registry()
        .with(filter(level, verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON log lines, for build agents that collect structured logs.
pub fn init_json_logger(level: LogLevel) {
    tracing_subscriber::registry()
        .with(filter(level, false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
