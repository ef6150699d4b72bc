use std::fmt;

use clap::Subcommand;

use crate::cmd;

///////////////////////////////
/// Possible subcommands to parse
#[derive(Subcommand)]
pub enum Commands {
    /// Merge per-cell FASTQs into one file, tagging each read with a cell barcode
    Remultiplex(cmd::RemultiplexCMD),
    /// Build a kallisto index with kb ref
    KbRef(cmd::KbRefCMD),
    /// Quantify samples with kb count
    KbCount(cmd::KbCountCMD),
    /// Trim, align with bowtie2 and count with featureCounts
    Bulk(cmd::BulkCMD),
    /// Remultiplex MATQ-seq cells and quantify them with kb count
    Matq(cmd::MatqCMD),
    /// Run the PETRI-seq pipeline script per sample
    Petriseq(cmd::PetriseqCMD),
    /// Wrap another subcommand in a SLURM batch script
    Sbatch(cmd::SbatchCMD),
}

impl Commands {
    pub fn try_execute(&mut self) -> anyhow::Result<()> {
        match self {
            Commands::Remultiplex(cmd) => cmd.try_execute(),
            Commands::KbRef(cmd) => cmd.try_execute(),
            Commands::KbCount(cmd) => cmd.try_execute(),
            Commands::Bulk(cmd) => cmd.try_execute(),
            Commands::Matq(cmd) => cmd.try_execute(),
            Commands::Petriseq(cmd) => cmd.try_execute(),
            Commands::Sbatch(cmd) => cmd.try_execute(),
        }
    }
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = match self {
            Commands::Remultiplex(_) => "Remultiplex",
            Commands::KbRef(_) => "KbRef",
            Commands::KbCount(_) => "KbCount",
            Commands::Bulk(_) => "Bulk",
            Commands::Matq(_) => "Matq",
            Commands::Petriseq(_) => "Petriseq",
            Commands::Sbatch(_) => "Sbatch",
        };
        write!(f, "{}", cmd)
    }
}
