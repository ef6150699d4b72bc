mod commands;
mod config;
mod error;
mod logging;
mod settings;

pub use commands::Commands;
pub use config::*;
pub use error::Error;
pub use logging::*;
pub use settings::*;
