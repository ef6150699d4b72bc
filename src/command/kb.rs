use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use log::info;
use log::warn;

use crate::fileformat::FastqSample;
use crate::runtime::Error;
use crate::runtime::ToolPaths;
use crate::tools::kb::KbCountArgs;
use crate::tools::kb::KbRefArgs;
use crate::tools::kb::KbWorkflow;
use crate::tools::seqspec::SeqspecIndex;
use crate::tools::ToolRunner;

fn create_parent_dir(p: &Path) -> anyhow::Result<()> {
    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct KbRefParams {
    pub args: KbRefArgs,
    pub tools: ToolPaths,
}

/// Build the kallisto index and t2g map once per reference
pub struct KbRef {}

impl KbRef {
    pub fn run(params: &KbRefParams, runner: &dyn ToolRunner) -> anyhow::Result<()> {
        runner.check_available(&params.tools.kb, "")?;

        let cmd = params.args.to_command(&params.tools.kb)?;
        create_parent_dir(&params.args.index)?;
        create_parent_dir(&params.args.t2g)?;
        if let Some(nac) = &params.args.nac {
            for p in [&nac.f2, &nac.c1, &nac.c2] {
                create_parent_dir(p)?;
            }
        }

        runner.run(&cmd)?;
        info!("kb ref has finished succesfully");
        Ok(())
    }
}

/// Where the kb technology string comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TechnologySource {
    Fixed(String),
    Seqspec { spec: PathBuf, modality: String },
}

impl TechnologySource {
    /// An explicit technology wins over a seqspec file; one of them is required
    pub fn resolve(
        technology: Option<String>,
        seqspec: Option<PathBuf>,
        modality: &str,
    ) -> anyhow::Result<TechnologySource> {
        match (technology, seqspec) {
            (Some(t), Some(spec)) => {
                warn!(
                    "Both a technology ({}) and a seqspec ({}) were given; using the technology",
                    t,
                    spec.display()
                );
                Ok(TechnologySource::Fixed(t))
            }
            (Some(t), None) => Ok(TechnologySource::Fixed(t)),
            (None, Some(spec)) => Ok(TechnologySource::Seqspec {
                spec,
                modality: modality.to_string(),
            }),
            (None, None) => Err(Error::config_not_valid(
                "kb count needs either a technology (-x) or a seqspec file",
            )
            .into()),
        }
    }

    pub fn technology(&self, tools: &ToolPaths, runner: &dyn ToolRunner) -> anyhow::Result<String> {
        match self {
            TechnologySource::Fixed(t) => Ok(t.clone()),
            TechnologySource::Seqspec { spec, modality } => {
                let cmd = SeqspecIndex {
                    spec: spec.clone(),
                    modality: modality.clone(),
                }
                .to_command(&tools.seqspec);
                let tech = runner.capture(&cmd)?;
                let tech = tech.lines().last().unwrap_or("").trim().to_string();
                if tech.is_empty() {
                    return Err(Error::parse_error(
                        format!("seqspec index output for {}", spec.display()),
                        Some("no technology string"),
                    )
                    .into());
                }
                info!("Technology from seqspec: {}", tech);
                Ok(tech)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct KbCountParams {
    pub samples: Vec<FastqSample>,
    pub index: PathBuf,
    pub t2g: PathBuf,
    pub technology: TechnologySource,
    pub path_out: PathBuf,
    pub threads: usize,
    pub memory: String,
    pub whitelist: Option<PathBuf>,
    pub workflow: KbWorkflow,
    pub nac: Option<(PathBuf, PathBuf)>,
    pub parity: Option<String>,
    pub strand: Option<String>,
    pub h5ad: bool,
    pub loom: bool,
    pub tools: ToolPaths,
}

/// kb count, one output directory per sample
pub struct KbCount {}

impl KbCount {
    pub fn run(params: &KbCountParams, runner: &dyn ToolRunner) -> anyhow::Result<Vec<PathBuf>> {
        if params.samples.is_empty() {
            return Err(Error::config_not_valid("no samples to count").into());
        }
        runner.check_available(&params.tools.kb, "")?;
        if let TechnologySource::Seqspec { .. } = params.technology {
            runner.check_available(&params.tools.seqspec, "--version")?;
        }

        let technology = params.technology.technology(&params.tools, runner)?;

        fs::create_dir_all(&params.path_out)
            .with_context(|| format!("Failed to create {}", params.path_out.display()))?;

        let mut out_dirs = Vec::with_capacity(params.samples.len());
        for (i, sample) in params.samples.iter().enumerate() {
            info!(
                "Counting sample {} ({}/{})",
                sample.name,
                i + 1,
                params.samples.len()
            );
            let out_dir = params.path_out.join(&sample.name);
            let args = KbCountArgs {
                index: params.index.clone(),
                t2g: params.t2g.clone(),
                technology: technology.clone(),
                out_dir: out_dir.clone(),
                threads: params.threads,
                memory: params.memory.clone(),
                whitelist: params.whitelist.clone(),
                workflow: params.workflow,
                nac: params.nac.clone(),
                parity: params.parity.clone(),
                strand: params.strand.clone(),
                h5ad: params.h5ad,
                loom: params.loom,
                fastqs: sample.interleaved(),
            };
            let cmd = args.to_command(&params.tools.kb)?;
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            runner
                .run(&cmd)
                .with_context(|| format!("kb count failed for sample {}", sample.name))?;
            out_dirs.push(out_dir);
        }

        info!("kb count has finished succesfully for {} samples", out_dirs.len());
        Ok(out_dirs)
    }
}
