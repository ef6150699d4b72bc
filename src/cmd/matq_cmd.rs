use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::info;

use crate::cmd::kb_cmd::DEFAULT_KB_MEMORY;
use crate::command::remultiplex::DEFAULT_BARCODE_LENGTH;
use crate::command::remultiplex::DEFAULT_CHUNK_SIZE;
use crate::command::MatqCount;
use crate::command::MatqCountParams;
use crate::runtime::Config;
use crate::runtime::Error;
use crate::tools::runner_from_config;
use crate::utils::expand_and_resolve_path;
use crate::utils::resolve_threads;

#[derive(Args)]
pub struct MatqCMD {
    /// Directory with one FASTQ file per cell
    #[arg(short = 'I', long = "input-dir")]
    pub path_in: PathBuf,

    #[arg(short = 'o', long = "out-dir")]
    pub path_out: PathBuf,

    #[arg(short = 'i', long = "index")]
    pub index: PathBuf,

    #[arg(short = 'g', long = "t2g")]
    pub t2g: PathBuf,

    #[arg(long = "barcode-length", default_value_t = DEFAULT_BARCODE_LENGTH)]
    pub barcode_length: usize,

    #[arg(long = "chunk-size", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    #[arg(short = 'm', long = "memory", default_value = DEFAULT_KB_MEMORY)]
    pub memory: String,

    #[arg(long = "h5ad")]
    pub h5ad: bool,

    #[arg(short = '@', long = "threads", env = "SLURM_CPUS_PER_TASK")]
    pub threads: Option<usize>,
}

impl MatqCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let path_in = expand_and_resolve_path(&self.path_in)?;
        if !path_in.is_dir() {
            return Err(Error::file_not_found(&path_in).into());
        }

        let threads = resolve_threads(self.threads);
        info!("Using threads {}", threads);

        let config = Config::get();
        let mut params = MatqCountParams::new(
            path_in,
            expand_and_resolve_path(&self.path_out)?,
            expand_and_resolve_path(&self.index)?,
            expand_and_resolve_path(&self.t2g)?,
        );
        params.barcode_length = self.barcode_length;
        params.threads = threads;
        params.memory = self.memory.clone();
        params.chunk_size = self.chunk_size;
        params.h5ad = self.h5ad;
        params.dry_run = config.dry_run;
        params.tools = config.settings.tools.clone();

        let runner = runner_from_config();
        let out_dir = MatqCount::run(&params, runner.as_ref())?;
        info!("Counts in {}", out_dir.display());
        Ok(())
    }
}
