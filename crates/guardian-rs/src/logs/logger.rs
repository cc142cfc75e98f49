//! Logger configuration driven by the `logging:` config section.
//!
//! Formats a structured line per record with aligned timestamp, level and
//! target columns. Colors follow the terminal unless `NO_COLOR` is set; the
//! `json` log format emits one JSON object per line instead.

use crate::models::gateway::LoggingSettings;
use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;
use serde_json::json;
use std::env;
use std::fs::OpenOptions;
use std::io::Write;

/// Visible width of the `[LEVEL]` column including padding.
const LEVEL_FIELD_WIDTH: usize = 8;

/// Configures and initializes the process logger from the config section.
///
/// - `log_level` selects the filter (`error`..`trace`); `RUST_LOG` overrides.
/// - `log_format: json` switches to JSON lines.
/// - `log_file` redirects output to a file (appended); stderr otherwise.
/// - `enabled: false` silences everything except errors.
///
/// Call once at startup; later calls are ignored by `env_logger`.
pub fn configure_logger(settings: &LoggingSettings) {
    let level = if !settings.enabled {
        LevelFilter::Error
    } else {
        parse_level(&settings.log_level)
    };

    let json_format = settings.log_format.eq_ignore_ascii_case("json");
    let no_color = env::var("NO_COLOR").is_ok() || settings.log_file.is_some();

    let mut builder = Builder::new();
    builder.format(move |buf, record| {
        if json_format {
            return writeln!(
                buf,
                "{}",
                json!({
                    "timestamp": Local::now().to_rfc3339(),
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "message": record.args().to_string(),
                })
            );
        }

        let level_plain = record.level().to_string();
        let colored_level = if no_color {
            level_plain.clone()
        } else {
            let code = match record.level() {
                log::Level::Error => "31",
                log::Level::Warn => "33",
                log::Level::Info => "32",
                log::Level::Debug => "34",
                log::Level::Trace => "35",
            };
            format!("\x1b[{}m{}\x1b[0m", code, level_plain)
        };

        // Pad on the plain width so color escapes don't break alignment.
        let padding = LEVEL_FIELD_WIDTH.saturating_sub(level_plain.len() + 2).max(1);

        writeln!(
            buf,
            "{} | [{}]{}| {} | {}",
            Local::now().format("%b %d %y %I:%M:%S %p"),
            colored_level,
            " ".repeat(padding),
            record.target(),
            record.args(),
        )
    });
    builder.filter_level(level);

    if let Some(path) = settings.log_file.as_deref().filter(|p| !p.is_empty()) {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Cannot open log file '{}': {}; logging to stderr", path, e),
        }
    }

    // RUST_LOG wins over the config level when present.
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    // Ignore the error if a logger is already installed (tests).
    let _ = builder.try_init();
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
