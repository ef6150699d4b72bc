use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::debug;

use scjobs::runtime::setup_global_logger;
use scjobs::runtime::Commands;
use scjobs::runtime::Config;
use scjobs::runtime::LogLevel;
use scjobs::runtime::LogMode;
use scjobs::runtime::Settings;
use scjobs::utils::expand_and_resolve_path;

pub const DEFAULT_LOG_PATH: &str = "scjobs.log";

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// trace, debug, info, warn, error or off
    #[arg(long = "log-level", global = true, env = "SCJOBS_LOG_LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// terminal, file, both or discard
    #[arg(long = "log-mode", global = true, default_value = "terminal")]
    log_mode: LogMode,

    #[arg(long = "log-path", global = true, default_value = DEFAULT_LOG_PATH)]
    log_path: PathBuf,

    /// TOML file with tool paths and SLURM defaults
    #[arg(long = "config", global = true, env = "SCJOBS_CONFIG")]
    config: Option<PathBuf>,

    /// Print the external commands instead of running them
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

fn try_main(mut cli: Cli) -> anyhow::Result<()> {
    setup_global_logger(cli.log_level, cli.log_mode, cli.log_path.clone())?;

    let settings_path = cli.config.as_ref().map(expand_and_resolve_path).transpose()?;
    let settings = Settings::load(settings_path.as_deref())?;
    Config::init(Config {
        log_level: cli.log_level,
        log_mode: cli.log_mode,
        log_path: cli.log_path.clone(),
        dry_run: cli.dry_run,
        settings,
        settings_path: settings_path.filter(|p| p.exists()),
    });
    debug!("Running {:?}", cli.command);

    cli.command.try_execute()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = try_main(cli) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn log_mode_help_lists_accepted_values() {
        let cmd = Cli::command();
        let arg = cmd
            .get_arguments()
            .find(|a| a.get_id() == "log_mode")
            .unwrap();
        let help = arg.get_help().unwrap().to_string();
        for mode in ["terminal", "file", "both", "discard"] {
            assert!(help.contains(mode), "{}", help);
            mode.parse::<LogMode>().unwrap();
        }
    }
}
