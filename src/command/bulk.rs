use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use itertools::Itertools;
use log::info;

use crate::fileformat::FastqSample;
use crate::runtime::Error;
use crate::runtime::ToolPaths;
use crate::tools::bbduk::BbdukTrim;
use crate::tools::bowtie2::Bowtie2Align;
use crate::tools::bowtie2::Bowtie2Build;
use crate::tools::featurecounts::FeatureCounts;
use crate::tools::samtools;
use crate::tools::ToolPipe;
use crate::tools::ToolRunner;
use crate::utils::file_stem_no_gz;

pub const DEFAULT_FEATURE_TYPE: &str = "exon";
pub const DEFAULT_ATTRIBUTE: &str = "gene_id";

#[derive(Clone, Debug)]
pub struct BulkAlignParams {
    pub samples: Vec<FastqSample>,
    pub path_out: PathBuf,
    /// Only needed when no prebuilt index is given
    pub genome: Option<PathBuf>,
    pub gtf: PathBuf,
    pub adapters: Option<PathBuf>,
    pub skip_trim: bool,
    pub bowtie2_index: Option<PathBuf>,
    pub feature_type: String,
    pub attribute: String,
    pub strand: Option<u8>,
    pub threads: usize,
    pub tools: ToolPaths,
}

/// Output files of a bulk run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkAlignOutput {
    pub index_prefix: PathBuf,
    pub bams: Vec<PathBuf>,
    pub counts: PathBuf,
}

/// Trim, align and count plate-based libraries as bulk samples
pub struct BulkAlign {}

impl BulkAlign {
    pub fn run(params: &BulkAlignParams, runner: &dyn ToolRunner) -> anyhow::Result<BulkAlignOutput> {
        if params.samples.is_empty() {
            return Err(Error::config_not_valid("no samples to align").into());
        }
        let adapters = match (&params.adapters, params.skip_trim) {
            (_, true) => None,
            (Some(a), false) => Some(a.clone()),
            (None, false) => {
                return Err(Error::config_not_valid(
                    "trimming needs an adapter FASTA (--adapters), or pass --skip-trim",
                )
                .into())
            }
        };

        let tools = &params.tools;
        if adapters.is_some() {
            runner.check_available(&tools.bbduk, "--version")?;
        }
        if params.bowtie2_index.is_none() {
            runner.check_available(&tools.bowtie2_build, "--version")?;
        }
        runner.check_available(&tools.bowtie2, "--version")?;
        runner.check_available(&tools.samtools, "--version")?;
        runner.check_available(&tools.featurecounts, "-v")?;

        let dir_trimmed = params.path_out.join("trimmed");
        let dir_index = params.path_out.join("index");
        let dir_bam = params.path_out.join("bam");
        let dir_counts = params.path_out.join("counts");
        for d in [&dir_bam, &dir_counts] {
            create_dir(d)?;
        }

        //Trimming
        let samples = match &adapters {
            Some(adapters) => {
                create_dir(&dir_trimmed)?;
                params
                    .samples
                    .iter()
                    .map(|s| trim_sample(s, adapters, &dir_trimmed, params.threads, tools, runner))
                    .collect::<anyhow::Result<Vec<_>>>()?
            }
            None => {
                info!("Skipping adapter trimming");
                params.samples.clone()
            }
        };

        //Index, built once for all samples
        let index_prefix = match &params.bowtie2_index {
            Some(prefix) => {
                info!("Using bowtie2 index {}", prefix.display());
                prefix.clone()
            }
            None => {
                let Some(genome) = &params.genome else {
                    return Err(Error::config_not_valid(
                        "a genome FASTA or a prebuilt bowtie2 index is needed",
                    )
                    .into());
                };
                create_dir(&dir_index)?;
                let genome_name = genome
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "genome".to_string());
                let prefix = dir_index.join(file_stem_no_gz(&genome_name));
                info!("Building bowtie2 index {}", prefix.display());
                let build = Bowtie2Build {
                    fasta: genome.clone(),
                    prefix: prefix.clone(),
                    threads: params.threads,
                };
                runner.run(&build.to_command(&tools.bowtie2_build))?;
                prefix
            }
        };

        //Alignment
        let mut bams = Vec::with_capacity(samples.len());
        for sample in &samples {
            let bam = dir_bam.join(format!("{}.bam", sample.name));
            info!("Aligning sample {}", sample.name);
            let align = Bowtie2Align {
                index_prefix: index_prefix.clone(),
                r1: comma_joined(&sample.r1),
                r2: sample.is_paired().then(|| comma_joined(&sample.r2)),
                threads: params.threads,
                read_group: Some(sample.name.clone()),
                log: Some(dir_bam.join(format!("{}.bowtie2.log", sample.name))),
            };
            let pipe = ToolPipe::new(align.to_command(&tools.bowtie2))
                .pipe(samtools::view_bam_from_stdin(&tools.samtools, params.threads))
                .pipe(samtools::sort_from_stdin(&tools.samtools, params.threads, &bam));
            runner
                .run_pipe(&pipe)
                .with_context(|| format!("alignment failed for sample {}", sample.name))?;
            runner.run(&samtools::index(&tools.samtools, &bam))?;
            bams.push(bam);
        }

        //Counting over all BAMs at once
        let counts = dir_counts.join("featurecounts.txt");
        let fc = FeatureCounts {
            annotation: params.gtf.clone(),
            out: counts.clone(),
            feature_type: params.feature_type.clone(),
            attribute: params.attribute.clone(),
            strand: params.strand,
            paired: samples.iter().all(|s| s.is_paired()),
            threads: params.threads,
            bams: bams.clone(),
        };
        runner.run(&fc.to_command(&tools.featurecounts)?)?;

        info!("Bulk alignment has finished succesfully; counts in {}", counts.display());
        Ok(BulkAlignOutput {
            index_prefix,
            bams,
            counts,
        })
    }
}

fn create_dir(d: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(d).with_context(|| format!("Failed to create {}", d.display()))
}

/// bowtie2 accepts several files per mate as a comma separated list
fn comma_joined(files: &[PathBuf]) -> PathBuf {
    PathBuf::from(files.iter().map(|f| f.to_string_lossy()).join(","))
}

/// Trim every lane of a sample into `dir/<sample>`; returns the sample pointing at the trimmed files
fn trim_sample(
    sample: &FastqSample,
    adapters: &Path,
    dir: &Path,
    threads: usize,
    tools: &ToolPaths,
    runner: &dyn ToolRunner,
) -> anyhow::Result<FastqSample> {
    info!("Trimming sample {}", sample.name);
    let dir = dir.join(&sample.name);
    create_dir(&dir)?;
    let lanes = sample.lanes();
    let multi_lane = lanes.len() > 1;
    let mut trimmed = FastqSample {
        name: sample.name.clone(),
        r1: Vec::new(),
        r2: Vec::new(),
    };
    for (lane, (r1, r2)) in lanes.into_iter().enumerate() {
        let lane = multi_lane.then_some(lane + 1);
        let out1 = trimmed_path(&dir, lane, &r1);
        let out2 = r2.as_ref().map(|r2| trimmed_path(&dir, lane, r2));
        let mut trim = BbdukTrim::new(r1, r2, out1.clone(), out2.clone(), adapters.to_path_buf());
        trim.threads = threads;
        runner.run(&trim.to_command(&tools.bbduk))?;
        trimmed.r1.push(out1);
        trimmed.r2.extend(out2);
    }
    Ok(trimmed)
}

/// Lanes of one sample sheet row may share a file name, so they get an `L<n>_` prefix
fn trimmed_path(dir: &Path, lane: Option<usize>, input: &Path) -> PathBuf {
    let name = input.file_name().unwrap_or(input.as_os_str());
    match lane {
        Some(n) => {
            let mut prefixed = OsString::from(format!("L{}_", n));
            prefixed.push(name);
            dir.join(prefixed)
        }
        None => dir.join(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_are_comma_joined() {
        let p = comma_joined(&["a_L001_R1.fq.gz".into(), "a_L002_R1.fq.gz".into()]);
        assert_eq!(p, PathBuf::from("a_L001_R1.fq.gz,a_L002_R1.fq.gz"));
    }

    #[test]
    fn trimmed_files_keep_their_name() {
        assert_eq!(
            trimmed_path(Path::new("out/trimmed/S1"), None, Path::new("/data/S1_R1.fastq.gz")),
            PathBuf::from("out/trimmed/S1/S1_R1.fastq.gz")
        );
        assert_eq!(
            trimmed_path(Path::new("out/trimmed/S1"), Some(2), Path::new("/run2/S1_R1.fastq.gz")),
            PathBuf::from("out/trimmed/S1/L2_S1_R1.fastq.gz")
        );
    }
}
