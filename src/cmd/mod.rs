pub mod bulk_cmd;
pub mod kb_cmd;
pub mod matq_cmd;
pub mod petriseq_cmd;
pub mod remultiplex_cmd;
pub mod sample_args;
pub mod sbatch_cmd;

pub use bulk_cmd::BulkCMD;
pub use kb_cmd::KbCountCMD;
pub use kb_cmd::KbRefCMD;
pub use matq_cmd::MatqCMD;
pub use petriseq_cmd::PetriseqCMD;
pub use remultiplex_cmd::RemultiplexCMD;
pub use sample_args::SampleArgs;
pub use sbatch_cmd::SbatchCMD;
