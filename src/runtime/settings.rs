use std::path::Path;

use anyhow::Context;
use log::warn;
use serde::Deserialize;

/// Executables for the external tools. Bare names are resolved through $PATH
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolPaths {
    pub kb: String,
    pub bbduk: String,
    pub bowtie2: String,
    pub bowtie2_build: String,
    pub samtools: String,
    pub featurecounts: String,
    pub seqspec: String,
    pub petriseq: String,
    pub sbatch: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            kb: "kb".to_string(),
            bbduk: "bbduk.sh".to_string(),
            bowtie2: "bowtie2".to_string(),
            bowtie2_build: "bowtie2-build".to_string(),
            samtools: "samtools".to_string(),
            featurecounts: "featureCounts".to_string(),
            seqspec: "seqspec".to_string(),
            petriseq: "pipeline.sh".to_string(),
            sbatch: "sbatch".to_string(),
        }
    }
}

/// Site defaults for rendered batch scripts
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SlurmDefaults {
    pub partition: Option<String>,
    pub account: Option<String>,
    pub cpus: usize,
    pub time: String,
    pub mem: String,
    pub mail_user: Option<String>,
    pub mail_type: String,
    pub log_dir: String,
    pub modules: Vec<String>,
    pub conda_env: Option<String>,
}

impl Default for SlurmDefaults {
    fn default() -> Self {
        SlurmDefaults {
            partition: None,
            account: None,
            cpus: 8,
            time: "24:00:00".to_string(),
            mem: "32G".to_string(),
            mail_user: None,
            mail_type: "FAIL".to_string(),
            log_dir: "logs".to_string(),
            modules: Vec::new(),
            conda_env: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub tools: ToolPaths,
    pub slurm: SlurmDefaults,
}

impl Settings {
    /// Load settings from a TOML file. A missing file falls back to defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Settings> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        if !path.exists() {
            warn!(
                "could not find settings at {}, falling back to defaults",
                path.display()
            );
            return Ok(Settings::default());
        }
        let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        Settings::from_toml(&s).with_context(|| path.display().to_string())
    }

    pub fn from_toml(s: &str) -> anyhow::Result<Settings> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_defaults() {
        let settings = Settings::from_toml(
            r#"
            [tools]
            kb = "/opt/kb/bin/kb"

            [slurm]
            partition = "core"
            modules = ["bioinfo-tools", "samtools/1.20"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.tools.kb, "/opt/kb/bin/kb");
        assert_eq!(settings.tools.bowtie2, "bowtie2");
        assert_eq!(settings.slurm.partition.as_deref(), Some("core"));
        assert_eq!(settings.slurm.modules.len(), 2);
        assert_eq!(settings.slurm.mail_type, "FAIL");
    }

    #[test]
    fn unknown_tool_is_rejected() {
        assert!(Settings::from_toml("[tools]\nstar = \"STAR\"\n").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let settings = Settings::load(Some(Path::new("/nonexistent/scjobs.toml"))).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        std::fs::write(&path, "[slurm]\ncpus = \"many\"\n").unwrap();

        let e = Settings::load(Some(&path)).unwrap_err();
        assert!(e.to_string().contains(&path.display().to_string()), "{}", e);
    }
}
