use std::path::PathBuf;

use clap::Args;
use log::info;

use crate::fileformat::discover_samples;
use crate::fileformat::read_sample_sheet;
use crate::fileformat::select_samples;
use crate::fileformat::verify_input_fq_file;
use crate::fileformat::FastqSample;
use crate::utils::expand_and_resolve_path;

/// Where the FASTQ files of a job come from
#[derive(Args, Debug, Clone)]
pub struct SampleArgs {
    /// Directory with the FASTQ files; samples are paired up from the file names
    #[arg(short = 'I', long = "input-dir", required_unless_present = "sample_sheet")]
    pub input_dir: Option<PathBuf>,

    /// Tab-separated sheet: sample, R1, optional R2
    #[arg(long = "sample-sheet", conflicts_with = "input_dir")]
    pub sample_sheet: Option<PathBuf>,

    /// Only process these samples (comma separated)
    #[arg(long = "samples", value_delimiter = ',')]
    pub samples: Vec<String>,
}

impl SampleArgs {
    pub fn resolve(&self) -> anyhow::Result<Vec<FastqSample>> {
        let samples = match (&self.sample_sheet, &self.input_dir) {
            (Some(sheet), _) => {
                let samples = read_sample_sheet(&expand_and_resolve_path(sheet)?)?;
                for f in samples.iter().flat_map(|s| s.r1.iter().chain(s.r2.iter())) {
                    verify_input_fq_file(f)?;
                }
                samples
            }
            (None, Some(dir)) => discover_samples(&expand_and_resolve_path(dir)?)?,
            (None, None) => Vec::new(),
        };
        let samples = select_samples(samples, &self.samples)?;
        for s in &samples {
            info!(
                "Sample {}: {} lane(s), {}",
                s.name,
                s.r1.len(),
                if s.is_paired() { "paired" } else { "single-end" }
            );
        }
        Ok(samples)
    }
}
