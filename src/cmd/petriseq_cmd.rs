use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::command::Petriseq;
use crate::command::PetriseqParams;
use crate::runtime::Config;
use crate::tools::runner_from_config;
use crate::utils::expand_and_resolve_path;

#[derive(Args)]
pub struct PetriseqCMD {
    /// Directory holding the PETRI-seq pipeline files and FASTQs
    #[arg(short = 'd', long = "work-dir")]
    pub work_dir: PathBuf,

    /// Sample prefixes (comma separated)
    #[arg(long = "samples", value_delimiter = ',', required = true)]
    pub samples: Vec<String>,

    /// Passed on to the pipeline script after the sample prefix
    #[arg(last = true)]
    pub extra_args: Vec<String>,
}

impl PetriseqCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let params = PetriseqParams {
            samples: self.samples.clone(),
            work_dir: expand_and_resolve_path(&self.work_dir)?,
            extra_args: self.extra_args.clone(),
            tools: Config::get().settings.tools.clone(),
        };
        let runner = runner_from_config();
        Petriseq::run(&params, runner.as_ref())
    }
}
