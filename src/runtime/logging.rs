use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use log::LevelFilter;

use crate::utils::expand_and_resolve_path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevel(pub LevelFilter);
impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" | "warning" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" | "none" => LevelFilter::Off,
            _ => return Err(format!("Invalid log level: {}", s)),
        };
        Ok(LogLevel(level))
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        level.0
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel(LevelFilter::Info)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogMode {
    Both,
    Path,
    #[default]
    Terminal,
    Discard,
}
impl std::str::FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.to_lowercase().as_str() {
            "both" => LogMode::Both,
            "path" | "file" => LogMode::Path,
            "terminal" | "term" | "cli" => LogMode::Terminal,
            "discard" | "none" => LogMode::Discard,
            _ => return Err(format!("Invalid log mode: {}", s)),
        };
        Ok(mode)
    }
}

/// Writes every log line to stderr and to the log file.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        std::io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stderr().flush()?;
        self.file.flush()
    }
}

fn open_log_file(log_path: PathBuf) -> anyhow::Result<File> {
    let path = expand_and_resolve_path(log_path)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

pub fn setup_global_logger(
    log_level: LogLevel,
    log_output: LogMode,
    log_path: PathBuf,
) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.format_timestamp_secs();

    match log_output {
        LogMode::Discard => {
            builder.filter_level(LevelFilter::Off);
        }

        LogMode::Terminal => {
            builder
                .filter_level(log_level.into())
                .target(env_logger::Target::Stderr);
        }

        LogMode::Path => {
            let file = open_log_file(log_path)?;
            builder
                .filter_level(log_level.into())
                .write_style(env_logger::WriteStyle::Never)
                .target(env_logger::Target::Pipe(Box::new(file)));
        }

        LogMode::Both => {
            let file = open_log_file(log_path)?;
            builder
                .filter_level(log_level.into())
                .write_style(env_logger::WriteStyle::Never)
                .target(env_logger::Target::Pipe(Box::new(TeeWriter { file })));
        }
    };

    builder
        .try_init()
        .context("A global logger has already been installed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_levels() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap().0, LevelFilter::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap().0, LevelFilter::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn parse_log_modes() {
        assert_eq!("file".parse::<LogMode>().unwrap(), LogMode::Path);
        assert_eq!("cli".parse::<LogMode>().unwrap(), LogMode::Terminal);
        assert_eq!("none".parse::<LogMode>().unwrap(), LogMode::Discard);
        assert!("syslog".parse::<LogMode>().is_err());
    }
}
