pub mod bulk;
pub mod kb;
pub mod matq;
pub mod petriseq;
pub mod remultiplex;
pub mod sbatch;

pub use remultiplex::Remultiplex;
pub use remultiplex::RemultiplexParams;
pub use remultiplex::RemultiplexSummary;

pub use kb::KbCount;
pub use kb::KbCountParams;
pub use kb::KbRef;
pub use kb::KbRefParams;
pub use kb::TechnologySource;

pub use bulk::BulkAlign;
pub use bulk::BulkAlignParams;

pub use matq::MatqCount;
pub use matq::MatqCountParams;

pub use petriseq::Petriseq;
pub use petriseq::PetriseqParams;

pub use sbatch::Sbatch;
pub use sbatch::SbatchParams;
