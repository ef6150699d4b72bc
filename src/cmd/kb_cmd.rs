use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::info;

use crate::cmd::SampleArgs;
use crate::command::KbCount;
use crate::command::KbCountParams;
use crate::command::KbRef;
use crate::command::KbRefParams;
use crate::command::TechnologySource;
use crate::fileformat::verify_input_file;
use crate::fileformat::DetectedFileformat;
use crate::runtime::Config;
use crate::runtime::Error;
use crate::tools::kb::KbRefArgs;
use crate::tools::kb::KbWorkflow;
use crate::tools::kb::NacFiles;
use crate::tools::runner_from_config;
use crate::utils::expand_and_resolve_path;
use crate::utils::resolve_threads;

pub const DEFAULT_KB_MEMORY: &str = "4G";
pub const DEFAULT_MODALITY: &str = "rna";

#[derive(Args)]
pub struct KbRefCMD {
    /// Index to create
    #[arg(short = 'i', long = "index")]
    pub index: PathBuf,

    /// Transcript-to-gene map to create
    #[arg(short = 'g', long = "t2g")]
    pub t2g: PathBuf,

    /// cDNA FASTA to create
    #[arg(long = "f1")]
    pub cdna: PathBuf,

    #[arg(long = "genome")]
    pub genome: PathBuf,

    #[arg(long = "gtf")]
    pub gtf: PathBuf,

    #[arg(long = "workflow", default_value = "standard")]
    pub workflow: KbWorkflow,

    /// Intron FASTA to create (nac)
    #[arg(long = "f2")]
    pub f2: Option<PathBuf>,

    /// cDNA transcripts-to-capture (nac)
    #[arg(long = "c1")]
    pub c1: Option<PathBuf>,

    /// Intron transcripts-to-capture (nac)
    #[arg(long = "c2")]
    pub c2: Option<PathBuf>,

    #[arg(short = 'k', long = "kmer-size")]
    pub kmer_size: Option<usize>,

    #[arg(long = "overwrite")]
    pub overwrite: bool,

    #[arg(short = '@', long = "threads", env = "SLURM_CPUS_PER_TASK")]
    pub threads: Option<usize>,
}

impl KbRefCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let genome = expand_and_resolve_path(&self.genome)?;
        let gtf = expand_and_resolve_path(&self.gtf)?;
        verify_input_file(&genome, DetectedFileformat::FASTA)?;
        verify_input_file(&gtf, DetectedFileformat::GTF)?;

        let nac = match (&self.f2, &self.c1, &self.c2) {
            (Some(f2), Some(c1), Some(c2)) => Some(NacFiles {
                f2: expand_and_resolve_path(f2)?,
                c1: expand_and_resolve_path(c1)?,
                c2: expand_and_resolve_path(c2)?,
            }),
            (None, None, None) => None,
            _ => {
                return Err(Error::config_not_valid("--f2, --c1 and --c2 go together").into());
            }
        };

        let threads = resolve_threads(self.threads);
        info!("Using threads {}", threads);

        let config = Config::get();
        let params = KbRefParams {
            args: KbRefArgs {
                index: expand_and_resolve_path(&self.index)?,
                t2g: expand_and_resolve_path(&self.t2g)?,
                cdna: expand_and_resolve_path(&self.cdna)?,
                genome,
                gtf,
                workflow: self.workflow,
                nac,
                kmer_size: self.kmer_size,
                threads,
                overwrite: self.overwrite,
            },
            tools: config.settings.tools.clone(),
        };
        let runner = runner_from_config();
        KbRef::run(&params, runner.as_ref())
    }
}

#[derive(Args)]
pub struct KbCountCMD {
    #[command(flatten)]
    pub input: SampleArgs,

    #[arg(short = 'i', long = "index")]
    pub index: PathBuf,

    #[arg(short = 'g', long = "t2g")]
    pub t2g: PathBuf,

    /// kb technology string, e.g. 10XV3 or 0,0,16:0,16,28:1,0,0
    #[arg(short = 'x', long = "technology")]
    pub technology: Option<String>,

    /// seqspec file to derive the technology from
    #[arg(long = "seqspec")]
    pub seqspec: Option<PathBuf>,

    #[arg(long = "modality", default_value = DEFAULT_MODALITY)]
    pub modality: String,

    /// One subdirectory per sample is created in here
    #[arg(short = 'o', long = "out-dir")]
    pub path_out: PathBuf,

    #[arg(short = 'm', long = "memory", default_value = DEFAULT_KB_MEMORY)]
    pub memory: String,

    #[arg(short = 'w', long = "whitelist")]
    pub whitelist: Option<PathBuf>,

    #[arg(long = "workflow", default_value = "standard")]
    pub workflow: KbWorkflow,

    #[arg(long = "c1", requires = "c2")]
    pub c1: Option<PathBuf>,

    #[arg(long = "c2", requires = "c1")]
    pub c2: Option<PathBuf>,

    #[arg(long = "parity")]
    pub parity: Option<String>,

    #[arg(long = "strand")]
    pub strand: Option<String>,

    #[arg(long = "h5ad")]
    pub h5ad: bool,

    #[arg(long = "loom")]
    pub loom: bool,

    #[arg(short = '@', long = "threads", env = "SLURM_CPUS_PER_TASK")]
    pub threads: Option<usize>,
}

impl KbCountCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let samples = self.input.resolve()?;
        let technology = TechnologySource::resolve(
            self.technology.clone(),
            self.seqspec.as_ref().map(expand_and_resolve_path).transpose()?,
            &self.modality,
        )?;

        let nac = match (&self.c1, &self.c2) {
            (Some(c1), Some(c2)) => Some((expand_and_resolve_path(c1)?, expand_and_resolve_path(c2)?)),
            _ => None,
        };

        let threads = resolve_threads(self.threads);
        info!("Using threads {}", threads);

        let config = Config::get();
        let params = KbCountParams {
            samples,
            index: expand_and_resolve_path(&self.index)?,
            t2g: expand_and_resolve_path(&self.t2g)?,
            technology,
            path_out: expand_and_resolve_path(&self.path_out)?,
            threads,
            memory: self.memory.clone(),
            whitelist: self.whitelist.as_ref().map(expand_and_resolve_path).transpose()?,
            workflow: self.workflow,
            nac,
            parity: self.parity.clone(),
            strand: self.strand.clone(),
            h5ad: self.h5ad,
            loom: self.loom,
            tools: config.settings.tools.clone(),
        };
        let runner = runner_from_config();
        KbCount::run(&params, runner.as_ref())?;
        Ok(())
    }
}
