use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::info;
use log::warn;

use crate::command::remultiplex::default_cores;
use crate::command::remultiplex::normalize_output_path;
use crate::command::remultiplex::DEFAULT_BARCODE_LENGTH;
use crate::command::remultiplex::DEFAULT_CHUNK_SIZE;
use crate::command::Remultiplex;
use crate::command::RemultiplexParams;
use crate::runtime::Config;
use crate::utils::expand_and_resolve_path;

#[derive(Args)]
pub struct RemultiplexCMD {
    /// Directory with one FASTQ file per cell
    #[arg(value_parser)]
    pub path_in: PathBuf,

    /// Output FASTQ; .fastq.gz is appended if missing
    #[arg(value_parser)]
    pub path_out: PathBuf,

    #[arg(long = "barcode-length", default_value_t = DEFAULT_BARCODE_LENGTH)]
    pub barcode_length: usize,

    /// Worker threads; all cores up to 16 by default
    #[arg(long = "cores", env = "SLURM_CPUS_PER_TASK")]
    pub cores: Option<usize>,

    /// Records per batch handed to the writer
    #[arg(long = "chunk-size", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Stop reading a file after this many records
    #[arg(long = "max-reads-per-file")]
    pub max_reads_per_file: Option<u64>,
}

impl RemultiplexCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let path_in = expand_and_resolve_path(&self.path_in)?;
        let path_out = expand_and_resolve_path(normalize_output_path(&self.path_out))?;

        let mut params = RemultiplexParams::new(path_in, path_out);
        params.barcode_length = self.barcode_length;
        params.threads_work = self.cores.unwrap_or_else(default_cores);
        params.chunk_size = self.chunk_size;
        params.max_reads_per_file = self.max_reads_per_file;
        params.show_progress = true;

        if Config::get().dry_run {
            println!(
                "remultiplex {} -> {} (mapping {})",
                params.path_in.display(),
                params.path_out.display(),
                params.path_mapping().display()
            );
            return Ok(());
        }

        let summary = Remultiplex::run(&params)?;
        if summary.files_failed > 0 {
            warn!("{} file(s) could not be processed", summary.files_failed);
        }
        info!(
            "{} files processed, {} empty, {} sequences in {:.1}s",
            summary.files_processed,
            summary.files_empty,
            summary.total_sequences,
            summary.elapsed.as_secs_f64()
        );
        Ok(())
    }
}
