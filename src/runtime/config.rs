use std::sync::OnceLock;

use crate::runtime;
use crate::runtime::Settings;

///////////////////////////////
/// Global Config Options
pub static CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub log_level: runtime::LogLevel,
    pub log_mode: runtime::LogMode,
    pub log_path: std::path::PathBuf,
    pub dry_run: bool,
    pub settings: Settings,
    /// Absolute path of the settings file that was loaded, if any
    pub settings_path: Option<std::path::PathBuf>,
}

impl Config {
    /// Install the config for the rest of the run. Only the first call has an effect
    pub fn init(config: Config) -> &'static Config {
        CONFIG.get_or_init(|| config)
    }

    /// The installed config, or the defaults if main never installed one (library use, tests)
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::default)
    }
}
