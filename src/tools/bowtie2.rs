use std::path::PathBuf;

use crate::tools::ToolCommand;

/// `bowtie2-build`
#[derive(Clone, Debug)]
pub struct Bowtie2Build {
    pub fasta: PathBuf,
    pub prefix: PathBuf,
    pub threads: usize,
}

impl Bowtie2Build {
    pub fn to_command(&self, program: &str) -> ToolCommand {
        ToolCommand::new(program)
            .flag_value("--threads", self.threads.to_string())
            .arg(&self.fasta)
            .arg(&self.prefix)
    }
}

/// `bowtie2` alignment writing SAM to stdout
#[derive(Clone, Debug)]
pub struct Bowtie2Align {
    pub index_prefix: PathBuf,
    pub r1: PathBuf,
    pub r2: Option<PathBuf>,
    pub threads: usize,
    pub read_group: Option<String>,
    pub log: Option<PathBuf>,
}

impl Bowtie2Align {
    pub fn to_command(&self, program: &str) -> ToolCommand {
        let mut cmd = ToolCommand::new(program)
            .flag_value("-p", self.threads.to_string())
            .flag_value("-x", &self.index_prefix);
        cmd = match &self.r2 {
            Some(r2) => cmd.flag_value("-1", &self.r1).flag_value("-2", r2),
            None => cmd.flag_value("-U", &self.r1),
        };
        if let Some(rg) = &self.read_group {
            cmd = cmd.flag_value("--rg-id", rg).arg("--rg").arg(format!("SM:{}", rg));
        }
        if let Some(log) = &self.log {
            cmd = cmd.stderr_to(log);
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_index() {
        let b = Bowtie2Build {
            fasta: "genome.fa".into(),
            prefix: "index/genome".into(),
            threads: 6,
        };
        assert_eq!(
            b.to_command("bowtie2-build").argv_string(),
            "bowtie2-build --threads 6 genome.fa index/genome"
        );
    }

    #[test]
    fn align_single_and_paired() {
        let mut a = Bowtie2Align {
            index_prefix: "index/genome".into(),
            r1: "cell1.fq.gz".into(),
            r2: None,
            threads: 2,
            read_group: None,
            log: None,
        };
        assert_eq!(
            a.to_command("bowtie2").argv_string(),
            "bowtie2 -p 2 -x index/genome -U cell1.fq.gz"
        );

        a.r2 = Some("cell1_R2.fq.gz".into());
        a.read_group = Some("cell1".to_string());
        assert_eq!(
            a.to_command("bowtie2").argv_string(),
            "bowtie2 -p 2 -x index/genome -1 cell1.fq.gz -2 cell1_R2.fq.gz --rg-id cell1 --rg SM:cell1"
        );
    }
}
