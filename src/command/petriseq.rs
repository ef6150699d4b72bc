use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use log::info;

use crate::runtime::Error;
use crate::runtime::ToolPaths;
use crate::tools::petriseq::PetriseqRun;
use crate::tools::ToolRunner;

#[derive(Clone, Debug)]
pub struct PetriseqParams {
    /// Sample prefixes as the vendor script expects them
    pub samples: Vec<String>,
    pub work_dir: PathBuf,
    pub extra_args: Vec<String>,
    pub tools: ToolPaths,
}

/// Drives the PETRI-seq analysis script, once per sample prefix
pub struct Petriseq {}

impl Petriseq {
    pub fn run(params: &PetriseqParams, runner: &dyn ToolRunner) -> anyhow::Result<()> {
        if params.samples.is_empty() {
            return Err(Error::config_not_valid("no PETRI-seq sample prefixes given").into());
        }
        if !params.work_dir.is_dir() {
            return Err(Error::file_not_found(&params.work_dir).into());
        }

        // The script is never run as a check; it only has to exist when given as a path
        let script = &params.tools.petriseq;
        if script.contains('/') && !Path::new(script).exists() {
            return Err(Error::utility_not_executable(script).into());
        }

        for (i, sample) in params.samples.iter().enumerate() {
            info!(
                "Running PETRI-seq pipeline on {} ({}/{})",
                sample,
                i + 1,
                params.samples.len()
            );
            let run = PetriseqRun {
                sample: sample.clone(),
                work_dir: params.work_dir.clone(),
                extra_args: params.extra_args.clone(),
            };
            runner
                .run(&run.to_command(script))
                .with_context(|| format!("PETRI-seq pipeline failed for {}", sample))?;
        }
        info!("PETRI-seq pipeline has finished succesfully");
        Ok(())
    }
}
