// Tue Jan 13 2026 - Alex

use colored::*;
use log::{Level, LevelFilter};
use std::io::Write;

pub struct LoggingUtils;

impl LoggingUtils {
    /// Installs the console logger. `RUST_LOG` overrides `verbosity`.
    pub fn init(verbosity: u8) {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(Self::level_from_verbosity(verbosity));
        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }

        builder
            .format(|buf, record| {
                writeln!(buf, "{} {}", Self::level_tag(record.level()), record.args())
            })
            .try_init()
            .ok();
    }

    pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
        match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn level_tag(level: Level) -> ColoredString {
        match level {
            Level::Error => "[!]".red().bold(),
            Level::Warn => "[!]".yellow(),
            Level::Info => "[*]".blue(),
            Level::Debug => "[.]".cyan(),
            Level::Trace => "[.]".dimmed(),
        }
    }
}
