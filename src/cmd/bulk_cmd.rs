use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::info;

use crate::cmd::SampleArgs;
use crate::command::bulk::DEFAULT_ATTRIBUTE;
use crate::command::bulk::DEFAULT_FEATURE_TYPE;
use crate::command::BulkAlign;
use crate::command::BulkAlignParams;
use crate::fileformat::verify_input_file;
use crate::fileformat::DetectedFileformat;
use crate::runtime::Config;
use crate::tools::runner_from_config;
use crate::utils::expand_and_resolve_path;
use crate::utils::resolve_threads;

#[derive(Args)]
pub struct BulkCMD {
    #[command(flatten)]
    pub input: SampleArgs,

    #[arg(short = 'o', long = "out-dir")]
    pub path_out: PathBuf,

    /// Genome FASTA; a bowtie2 index is built from it unless --bowtie2-index is given
    #[arg(long = "genome", required_unless_present = "bowtie2_index")]
    pub genome: Option<PathBuf>,

    #[arg(long = "gtf")]
    pub gtf: PathBuf,

    /// Adapter FASTA for BBDuk
    #[arg(long = "adapters", required_unless_present = "skip_trim")]
    pub adapters: Option<PathBuf>,

    #[arg(long = "skip-trim")]
    pub skip_trim: bool,

    /// Prefix of an existing bowtie2 index
    #[arg(long = "bowtie2-index")]
    pub bowtie2_index: Option<PathBuf>,

    #[arg(long = "feature-type", default_value = DEFAULT_FEATURE_TYPE)]
    pub feature_type: String,

    #[arg(long = "attribute", default_value = DEFAULT_ATTRIBUTE)]
    pub attribute: String,

    /// featureCounts strandedness: 0, 1 or 2
    #[arg(short = 's', long = "strand", value_parser = clap::value_parser!(u8).range(0..=2))]
    pub strand: Option<u8>,

    #[arg(short = '@', long = "threads", env = "SLURM_CPUS_PER_TASK")]
    pub threads: Option<usize>,
}

impl BulkCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let samples = self.input.resolve()?;

        let gtf = expand_and_resolve_path(&self.gtf)?;
        verify_input_file(&gtf, DetectedFileformat::GTF)?;
        let genome = self.genome.as_ref().map(expand_and_resolve_path).transpose()?;
        if let (Some(g), None) = (&genome, &self.bowtie2_index) {
            verify_input_file(g, DetectedFileformat::FASTA)?;
        }
        let adapters = match &self.adapters {
            Some(a) if !self.skip_trim => {
                let a = expand_and_resolve_path(a)?;
                verify_input_file(&a, DetectedFileformat::FASTA)?;
                Some(a)
            }
            _ => None,
        };

        let threads = resolve_threads(self.threads);
        info!("Using threads {}", threads);

        let params = BulkAlignParams {
            samples,
            path_out: expand_and_resolve_path(&self.path_out)?,
            genome,
            gtf,
            adapters,
            skip_trim: self.skip_trim,
            bowtie2_index: self.bowtie2_index.as_ref().map(expand_and_resolve_path).transpose()?,
            feature_type: self.feature_type.clone(),
            attribute: self.attribute.clone(),
            strand: self.strand,
            threads,
            tools: Config::get().settings.tools.clone(),
        };
        let runner = runner_from_config();
        BulkAlign::run(&params, runner.as_ref())?;
        Ok(())
    }
}
