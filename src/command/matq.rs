use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use log::info;

use crate::command::remultiplex::Remultiplex;
use crate::command::remultiplex::RemultiplexParams;
use crate::command::remultiplex::DEFAULT_BARCODE_LENGTH;
use crate::command::remultiplex::DEFAULT_CHUNK_SIZE;
use crate::fileformat::barcode_mapping::write_whitelist;
use crate::runtime::Error;
use crate::runtime::ToolPaths;
use crate::tools::kb::barcode_prefix_technology;
use crate::tools::kb::KbCountArgs;
use crate::tools::kb::KbWorkflow;
use crate::tools::ToolRunner;

#[derive(Clone, Debug)]
pub struct MatqCountParams {
    /// One FASTQ per cell
    pub path_in: PathBuf,
    pub path_out: PathBuf,
    pub index: PathBuf,
    pub t2g: PathBuf,
    pub barcode_length: usize,
    pub threads: usize,
    pub memory: String,
    pub chunk_size: usize,
    pub h5ad: bool,
    /// Only print what would run
    pub dry_run: bool,
    pub tools: ToolPaths,
}

impl MatqCountParams {
    pub fn new(path_in: PathBuf, path_out: PathBuf, index: PathBuf, t2g: PathBuf) -> MatqCountParams {
        MatqCountParams {
            path_in,
            path_out,
            index,
            t2g,
            barcode_length: DEFAULT_BARCODE_LENGTH,
            threads: 1,
            memory: "4G".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            h5ad: false,
            dry_run: false,
            tools: ToolPaths::default(),
        }
    }

    pub fn path_remultiplexed(&self) -> PathBuf {
        self.path_out.join("remultiplexed.fastq.gz")
    }

    pub fn path_whitelist(&self) -> PathBuf {
        self.path_out.join("whitelist.txt")
    }

    pub fn path_kb(&self) -> PathBuf {
        self.path_out.join("kb")
    }
}

/// Per-cell MATQ-seq FASTQs to a single kb count run. Each cell gets a
/// synthetic barcode so kb can tell the cells apart
pub struct MatqCount {}

impl MatqCount {
    pub fn run(params: &MatqCountParams, runner: &dyn ToolRunner) -> anyhow::Result<PathBuf> {
        runner.check_available(&params.tools.kb, "")?;

        let path_remux = params.path_remultiplexed();
        let path_whitelist = params.path_whitelist();

        if params.dry_run {
            info!(
                "Would remultiplex {} into {} and write {}",
                params.path_in.display(),
                path_remux.display(),
                path_whitelist.display()
            );
        } else {
            fs::create_dir_all(&params.path_out)
                .with_context(|| format!("Failed to create {}", params.path_out.display()))?;

            let mut remux = RemultiplexParams::new(params.path_in.clone(), path_remux.clone());
            remux.barcode_length = params.barcode_length;
            remux.threads_work = params.threads;
            remux.chunk_size = params.chunk_size;
            let summary = Remultiplex::run(&remux)?;
            if summary.output.is_none() {
                return Err(Error::file_not_valid(
                    &params.path_in,
                    Some("no FASTQ files to remultiplex"),
                )
                .into());
            }
            if summary.files_failed > 0 {
                return Err(Error::file_not_valid(
                    &params.path_in,
                    Some(format!("{} FASTQ file(s) could not be read", summary.files_failed)),
                )
                .into());
            }

            write_whitelist(&path_whitelist, &summary.assignments)?;
            info!(
                "Whitelist of {} barcodes written to {}",
                summary.assignments.len(),
                path_whitelist.display()
            );
        }

        let out_dir = params.path_kb();
        let args = KbCountArgs {
            index: params.index.clone(),
            t2g: params.t2g.clone(),
            technology: barcode_prefix_technology(params.barcode_length),
            out_dir: out_dir.clone(),
            threads: params.threads,
            memory: params.memory.clone(),
            whitelist: Some(path_whitelist),
            workflow: KbWorkflow::Standard,
            nac: None,
            parity: Some("single".to_string()),
            strand: None,
            h5ad: params.h5ad,
            loom: false,
            fastqs: vec![path_remux],
        };
        runner.run(&args.to_command(&params.tools.kb)?)?;

        info!("MATQ-seq counting has finished succesfully");
        Ok(out_dir)
    }
}
