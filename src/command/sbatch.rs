use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use log::info;
use log::warn;

use crate::runtime::Error;
use crate::runtime::SlurmDefaults;
use crate::tools::ToolCommand;
use crate::tools::ToolRunner;
use crate::utils::shell_quote;

/// Global scjobs options that take a value; they can precede the subcommand
const GLOBAL_VALUE_OPTIONS: &[&str] = &["--log-level", "--log-mode", "--log-path", "--config"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SbatchParams {
    pub job_name: Option<String>,
    pub cpus: usize,
    pub mem: String,
    pub time: String,
    pub partition: Option<String>,
    pub account: Option<String>,
    pub mail_user: Option<String>,
    pub mail_type: String,
    pub log_dir: String,
    pub modules: Vec<String>,
    pub conda_env: Option<String>,

    /// Where to write the script; stdout if None
    pub path_out: Option<PathBuf>,
    pub submit: bool,

    /// The scjobs executable the job will call
    pub program: String,
    /// Settings file the job should load, unless the command names its own
    pub config: Option<PathBuf>,
    /// Subcommand and its arguments
    pub command: Vec<String>,
}

impl SbatchParams {
    /// Start from the site defaults in the settings file
    pub fn from_defaults(defaults: &SlurmDefaults, program: String, command: Vec<String>) -> SbatchParams {
        SbatchParams {
            job_name: None,
            cpus: defaults.cpus,
            mem: defaults.mem.clone(),
            time: defaults.time.clone(),
            partition: defaults.partition.clone(),
            account: defaults.account.clone(),
            mail_user: defaults.mail_user.clone(),
            mail_type: defaults.mail_type.clone(),
            log_dir: defaults.log_dir.clone(),
            modules: defaults.modules.clone(),
            conda_env: defaults.conda_env.clone(),
            path_out: None,
            submit: false,
            program,
            config: None,
            command,
        }
    }

    /// The explicit job name, else the embedded subcommand
    pub fn job_name(&self) -> Option<&str> {
        match &self.job_name {
            Some(n) => Some(n.as_str()),
            None => {
                let mut args = self.command.iter();
                while let Some(a) = args.next() {
                    if GLOBAL_VALUE_OPTIONS.contains(&a.as_str()) {
                        args.next();
                    } else if !a.starts_with('-') {
                        return Some(a.as_str());
                    }
                }
                None
            }
        }
    }

    /// The scjobs arguments of the job, with `--config` added when the submitting run had one
    pub fn job_args(&self) -> Vec<String> {
        let sets_config = self
            .command
            .iter()
            .any(|a| a == "--config" || a.starts_with("--config="));
        match &self.config {
            Some(c) if !sets_config => ["--config".to_string(), c.to_string_lossy().into_owned()]
                .into_iter()
                .chain(self.command.iter().cloned())
                .collect(),
            _ => self.command.clone(),
        }
    }

    /// Render the complete batch script
    pub fn render(&self) -> anyhow::Result<String> {
        if self.command.is_empty() {
            return Err(Error::config_not_valid("no scjobs subcommand given to wrap in a batch script").into());
        }
        let Some(job_name) = self.job_name() else {
            return Err(Error::config_not_valid("could not determine a job name; pass --job-name").into());
        };
        if self.cpus == 0 {
            return Err(Error::config_not_valid("a job needs at least one CPU").into());
        }

        let mut s = String::new();
        writeln!(s, "#!/bin/bash")?;
        writeln!(s, "#SBATCH --job-name={}", job_name)?;
        writeln!(s, "#SBATCH --cpus-per-task={}", self.cpus)?;
        writeln!(s, "#SBATCH --mem={}", self.mem)?;
        writeln!(s, "#SBATCH --time={}", self.time)?;
        if let Some(p) = &self.partition {
            writeln!(s, "#SBATCH --partition={}", p)?;
        }
        if let Some(a) = &self.account {
            writeln!(s, "#SBATCH --account={}", a)?;
        }
        writeln!(s, "#SBATCH --output={}/%x_%j.out", self.log_dir)?;
        writeln!(s, "#SBATCH --error={}/%x_%j.err", self.log_dir)?;
        if let Some(u) = &self.mail_user {
            writeln!(s, "#SBATCH --mail-type={}", self.mail_type)?;
            writeln!(s, "#SBATCH --mail-user={}", u)?;
        }
        writeln!(s)?;
        writeln!(s, "set -euo pipefail")?;
        writeln!(s)?;

        for m in &self.modules {
            writeln!(s, "module load {}", shell_quote(m))?;
        }
        if let Some(env) = &self.conda_env {
            writeln!(s, "source activate {}", shell_quote(env))?;
        }
        if !self.modules.is_empty() || self.conda_env.is_some() {
            writeln!(s)?;
        }

        let line = std::iter::once(self.program.clone())
            .chain(self.job_args())
            .map(|a| shell_quote(&a))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(s, "{}", line)?;
        Ok(s)
    }
}

/// Render, write and optionally submit a SLURM batch script
pub struct Sbatch {}

impl Sbatch {
    pub fn run(params: &SbatchParams, sbatch_program: &str, runner: &dyn ToolRunner) -> anyhow::Result<String> {
        if params.submit && params.path_out.is_none() {
            return Err(Error::config_not_valid("--submit needs the script written to a file (--output)").into());
        }
        let script = params.render()?;

        match &params.path_out {
            Some(p) => {
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                fs::write(p, &script).with_context(|| format!("Failed to write {}", p.display()))?;
                make_executable(p)?;
                info!("Batch script written to {}", p.display());
            }
            None => print!("{}", script),
        }

        // sbatch does not create the log directory and the job fails silently without it
        if params.submit || params.path_out.is_some() {
            if let Err(e) = fs::create_dir_all(&params.log_dir) {
                warn!("Could not create log directory {}: {}", params.log_dir, e);
            }
        }

        if let (true, Some(p)) = (params.submit, &params.path_out) {
            runner.check_available(sbatch_program, "--version")?;
            let out = runner.capture(&ToolCommand::new(sbatch_program).arg(p))?;
            info!("{}", out);
        }
        Ok(script)
    }
}

#[cfg(unix)]
fn make_executable(p: &std::path::Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perm = fs::metadata(p)?.permissions();
    perm.set_mode(perm.mode() | 0o111);
    fs::set_permissions(p, perm)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_p: &std::path::Path) -> anyhow::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::RecordingRunner;

    fn params(command: &[&str]) -> SbatchParams {
        SbatchParams::from_defaults(
            &SlurmDefaults::default(),
            "/opt/scjobs/bin/scjobs".to_string(),
            command.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn renders_defaults() {
        let script = params(&["kb-count", "-i", "in dir", "--threads", "8"]).render().unwrap();
        assert_eq!(
            script,
            "#!/bin/bash\n\
             #SBATCH --job-name=kb-count\n\
             #SBATCH --cpus-per-task=8\n\
             #SBATCH --mem=32G\n\
             #SBATCH --time=24:00:00\n\
             #SBATCH --output=logs/%x_%j.out\n\
             #SBATCH --error=logs/%x_%j.err\n\
             \n\
             set -euo pipefail\n\
             \n\
             /opt/scjobs/bin/scjobs kb-count -i 'in dir' --threads 8\n"
        );
    }

    #[test]
    fn optional_directives() {
        let mut p = params(&["--dry-run", "bulk"]);
        p.partition = Some("core".to_string());
        p.account = Some("snic2024".to_string());
        p.mail_user = Some("me@example.org".to_string());
        p.modules = vec!["bioinfo-tools".to_string(), "samtools/1.20".to_string()];
        p.conda_env = Some("scjobs".to_string());
        let script = p.render().unwrap();
        assert!(script.contains("#SBATCH --job-name=bulk\n"));
        assert!(script.contains("#SBATCH --partition=core\n#SBATCH --account=snic2024\n"));
        assert!(script.contains("#SBATCH --mail-type=FAIL\n#SBATCH --mail-user=me@example.org\n"));
        assert!(script.contains("module load bioinfo-tools\nmodule load samtools/1.20\nsource activate scjobs\n"));
    }

    #[test]
    fn job_name_skips_global_options() {
        let p = params(&["--log-level", "debug", "kb-count", "-I", "fq"]);
        assert_eq!(p.job_name(), Some("kb-count"));
        assert!(p.render().unwrap().contains("#SBATCH --job-name=kb-count\n"));

        let p = params(&["--config", "site.toml", "--dry-run", "--log-path=x.log", "bulk"]);
        assert_eq!(p.job_name(), Some("bulk"));

        let p = params(&["--log-mode", "file"]);
        assert!(p.render().is_err());
    }

    #[test]
    fn job_inherits_the_settings_file() {
        let mut p = params(&["bulk", "-I", "fq"]);
        p.config = Some(PathBuf::from("/etc/scjobs/site settings.toml"));
        let script = p.render().unwrap();
        assert!(script.ends_with(
            "/opt/scjobs/bin/scjobs --config '/etc/scjobs/site settings.toml' bulk -I fq\n"
        ));

        // An explicit --config in the wrapped command is left alone
        let mut p = params(&["--config=other.toml", "bulk"]);
        p.config = Some(PathBuf::from("/etc/scjobs/site.toml"));
        assert!(p.render().unwrap().ends_with("/opt/scjobs/bin/scjobs --config=other.toml bulk\n"));
    }

    #[test]
    fn empty_command_is_an_error() {
        assert!(params(&[]).render().is_err());
    }

    #[test]
    fn submit_needs_an_output_file() {
        let mut p = params(&["matq"]);
        p.submit = true;
        let runner = RecordingRunner::new();
        assert!(Sbatch::run(&p, "sbatch", &runner).is_err());
        assert!(runner.lines().is_empty());
    }

    #[test]
    fn submit_calls_sbatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = params(&["matq"]);
        p.submit = true;
        p.log_dir = dir.path().join("logs").to_string_lossy().into_owned();
        let script_path = dir.path().join("job.sh");
        p.path_out = Some(script_path.clone());

        let runner = RecordingRunner::new().with_output("sbatch", "Submitted batch job 42");
        Sbatch::run(&p, "sbatch", &runner).unwrap();

        assert!(script_path.exists());
        assert!(dir.path().join("logs").is_dir());
        assert_eq!(runner.lines(), vec![format!("sbatch {}", script_path.display())]);
    }
}
