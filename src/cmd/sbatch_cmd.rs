use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::command::Sbatch;
use crate::command::SbatchParams;
use crate::runtime::Config;
use crate::tools::runner_from_config;
use crate::utils::expand_and_resolve_path;

#[derive(Args)]
pub struct SbatchCMD {
    /// Defaults to the wrapped subcommand
    #[arg(short = 'J', long = "job-name")]
    pub job_name: Option<String>,

    #[arg(short = 'c', long = "cpus")]
    pub cpus: Option<usize>,

    #[arg(long = "mem")]
    pub mem: Option<String>,

    #[arg(short = 't', long = "time")]
    pub time: Option<String>,

    #[arg(short = 'p', long = "partition")]
    pub partition: Option<String>,

    #[arg(short = 'A', long = "account")]
    pub account: Option<String>,

    #[arg(long = "mail-user")]
    pub mail_user: Option<String>,

    #[arg(long = "mail-type")]
    pub mail_type: Option<String>,

    /// Directory for the job's stdout/stderr
    #[arg(long = "log-dir")]
    pub log_dir: Option<String>,

    /// Environment module to load; repeatable
    #[arg(long = "module")]
    pub modules: Vec<String>,

    #[arg(long = "conda-env")]
    pub conda_env: Option<String>,

    /// Write the script here instead of stdout
    #[arg(short = 'o', long = "output")]
    pub path_out: Option<PathBuf>,

    /// Submit the written script with sbatch
    #[arg(long = "submit", requires = "path_out")]
    pub submit: bool,

    /// The scjobs subcommand to run in the job
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

impl SbatchCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let config = Config::get();

        let program = std::env::current_exe()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string());
        let mut params = SbatchParams::from_defaults(&config.settings.slurm, program, self.command.clone());

        // Command line wins over the settings file
        params.job_name = self.job_name.clone();
        if let Some(c) = self.cpus {
            params.cpus = c;
        }
        if let Some(m) = &self.mem {
            params.mem = m.clone();
        }
        if let Some(t) = &self.time {
            params.time = t.clone();
        }
        if self.partition.is_some() {
            params.partition = self.partition.clone();
        }
        if self.account.is_some() {
            params.account = self.account.clone();
        }
        if self.mail_user.is_some() {
            params.mail_user = self.mail_user.clone();
        }
        if let Some(t) = &self.mail_type {
            params.mail_type = t.clone();
        }
        if let Some(d) = &self.log_dir {
            params.log_dir = d.clone();
        }
        params.modules.extend(self.modules.iter().cloned());
        if self.conda_env.is_some() {
            params.conda_env = self.conda_env.clone();
        }
        params.path_out = self.path_out.as_ref().map(expand_and_resolve_path).transpose()?;
        params.submit = self.submit;
        params.config = config.settings_path.clone();

        let runner = runner_from_config();
        Sbatch::run(&params, &config.settings.tools.sbatch, runner.as_ref())?;
        Ok(())
    }
}
