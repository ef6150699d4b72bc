mod command;
mod runner;

pub mod bbduk;
pub mod bowtie2;
pub mod featurecounts;
pub mod kb;
pub mod petriseq;
pub mod samtools;
pub mod seqspec;

pub use command::ToolCommand;
pub use command::ToolPipe;

pub use runner::RecordingRunner;
pub use runner::SystemRunner;
pub use runner::ToolRunner;

use crate::runtime::Config;

/// The runner the CLI should use: recording in dry-run mode, real processes otherwise
pub fn runner_from_config() -> Box<dyn ToolRunner> {
    if Config::get().dry_run {
        Box::new(RecordingRunner::echoing())
    } else {
        Box::new(SystemRunner::new())
    }
}
