use std::{str::FromStr, time::SystemTime};

use anyhow::Result;
use colored::{Color, Colorize};
use log::LevelFilter;

const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

fn level_color(level: log::Level) -> Color {
    match level {
        log::Level::Error => Color::Red,
        log::Level::Warn => Color::Yellow,
        log::Level::Info => Color::Green,
        log::Level::Debug => Color::Blue,
        log::Level::Trace => Color::Magenta,
    }
}

pub fn setup_logger() -> Result<()> {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|raw| LevelFilter::from_str(&raw).ok())
        .unwrap_or(LevelFilter::Info);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                record
                    .level()
                    .to_string()
                    .color(level_color(record.level())),
                record.target(),
                message
            ))
        })
        .level(level)
        // hyper and reqwest are chatty on debug
        .level_for("hyper", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()?;

    Ok(())
}
