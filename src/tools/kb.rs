use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::runtime::Error;
use crate::tools::ToolCommand;

/// kb-python quantification workflow
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KbWorkflow {
    #[default]
    Standard,
    /// Nascent + ambiguous + mature; needs the intron/cDNA-to-capture lists
    Nac,
}

impl fmt::Display for KbWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KbWorkflow::Standard => write!(f, "standard"),
            KbWorkflow::Nac => write!(f, "nac"),
        }
    }
}

impl FromStr for KbWorkflow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(KbWorkflow::Standard),
            "nac" => Ok(KbWorkflow::Nac),
            _ => Err(format!("Unknown kb workflow: {}", s)),
        }
    }
}

/// Extra files produced/consumed by the nac workflow
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NacFiles {
    pub f2: PathBuf,
    pub c1: PathBuf,
    pub c2: PathBuf,
}

/// `kb ref`: build a pseudoalignment index and transcript-to-gene map
#[derive(Clone, Debug)]
pub struct KbRefArgs {
    pub index: PathBuf,
    pub t2g: PathBuf,
    pub cdna: PathBuf,
    pub genome: PathBuf,
    pub gtf: PathBuf,
    pub workflow: KbWorkflow,
    pub nac: Option<NacFiles>,
    pub kmer_size: Option<usize>,
    pub threads: usize,
    pub overwrite: bool,
}

impl KbRefArgs {
    pub fn to_command(&self, program: &str) -> anyhow::Result<ToolCommand> {
        let mut cmd = ToolCommand::new(program)
            .arg("ref")
            .flag_value("-i", &self.index)
            .flag_value("-g", &self.t2g)
            .flag_value("-f1", &self.cdna);

        if self.workflow == KbWorkflow::Nac {
            let Some(nac) = &self.nac else {
                return Err(Error::config_not_valid(
                    "kb ref with the nac workflow needs -f2, -c1 and -c2 paths",
                )
                .into());
            };
            cmd = cmd
                .flag_value("--workflow", self.workflow.to_string())
                .flag_value("-f2", &nac.f2)
                .flag_value("-c1", &nac.c1)
                .flag_value("-c2", &nac.c2);
        }

        Ok(cmd
            .opt_flag_value("-k", self.kmer_size.map(|k| k.to_string()))
            .flag_value("-t", self.threads.to_string())
            .switch("--overwrite", self.overwrite)
            .arg(&self.genome)
            .arg(&self.gtf))
    }
}

/// `kb count` for one sample
#[derive(Clone, Debug)]
pub struct KbCountArgs {
    pub index: PathBuf,
    pub t2g: PathBuf,
    pub technology: String,
    pub out_dir: PathBuf,
    pub threads: usize,
    pub memory: String,
    pub whitelist: Option<PathBuf>,
    pub workflow: KbWorkflow,
    pub nac: Option<(PathBuf, PathBuf)>,
    pub parity: Option<String>,
    pub strand: Option<String>,
    pub h5ad: bool,
    pub loom: bool,
    pub fastqs: Vec<PathBuf>,
}

impl KbCountArgs {
    pub fn to_command(&self, program: &str) -> anyhow::Result<ToolCommand> {
        if self.fastqs.is_empty() {
            return Err(Error::config_not_valid("kb count needs at least one FASTQ").into());
        }
        if self.technology.trim().is_empty() {
            return Err(Error::config_not_valid("kb count needs a technology string").into());
        }

        let mut cmd = ToolCommand::new(program)
            .arg("count")
            .flag_value("-i", &self.index)
            .flag_value("-g", &self.t2g)
            .flag_value("-x", &self.technology)
            .flag_value("-o", &self.out_dir)
            .flag_value("-t", self.threads.to_string())
            .flag_value("-m", &self.memory)
            .opt_flag_value("-w", self.whitelist.as_ref());

        if self.workflow == KbWorkflow::Nac {
            let Some((c1, c2)) = &self.nac else {
                return Err(Error::config_not_valid(
                    "kb count with the nac workflow needs -c1 and -c2 paths",
                )
                .into());
            };
            cmd = cmd
                .flag_value("--workflow", self.workflow.to_string())
                .flag_value("-c1", c1)
                .flag_value("-c2", c2);
        }

        Ok(cmd
            .opt_flag_value("--parity", self.parity.as_ref())
            .opt_flag_value("--strand", self.strand.as_ref())
            .switch("--h5ad", self.h5ad)
            .switch("--loom", self.loom)
            .args(&self.fastqs))
    }
}

/// kb technology string for reads carrying a cell barcode in front of the cDNA
/// and no UMI, e.g. "0,0,8:-1:0,8,0"
pub fn barcode_prefix_technology(barcode_length: usize) -> String {
    format!("0,0,{bl}:-1:0,{bl},0", bl = barcode_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb_ref() -> KbRefArgs {
        KbRefArgs {
            index: PathBuf::from("ref/index.idx"),
            t2g: PathBuf::from("ref/t2g.txt"),
            cdna: PathBuf::from("ref/cdna.fa"),
            genome: PathBuf::from("GRCm39.fa"),
            gtf: PathBuf::from("genes.gtf"),
            workflow: KbWorkflow::Standard,
            nac: None,
            kmer_size: None,
            threads: 8,
            overwrite: false,
        }
    }

    #[test]
    fn kb_ref_standard() {
        let cmd = kb_ref().to_command("kb").unwrap();
        assert_eq!(
            cmd.argv_string(),
            "kb ref -i ref/index.idx -g ref/t2g.txt -f1 ref/cdna.fa -t 8 GRCm39.fa genes.gtf"
        );
    }

    #[test]
    fn kb_ref_nac_requires_files() {
        let mut r = kb_ref();
        r.workflow = KbWorkflow::Nac;
        assert!(r.to_command("kb").is_err());

        r.nac = Some(NacFiles {
            f2: "ref/nascent.fa".into(),
            c1: "ref/cdna.t2c".into(),
            c2: "ref/nascent.t2c".into(),
        });
        r.kmer_size = Some(31);
        let cmd = r.to_command("kb").unwrap();
        assert_eq!(
            cmd.argv_string(),
            "kb ref -i ref/index.idx -g ref/t2g.txt -f1 ref/cdna.fa --workflow nac -f2 ref/nascent.fa \
             -c1 ref/cdna.t2c -c2 ref/nascent.t2c -k 31 -t 8 GRCm39.fa genes.gtf"
        );
    }

    #[test]
    fn kb_count_paired() {
        let count = KbCountArgs {
            index: "index.idx".into(),
            t2g: "t2g.txt".into(),
            technology: "10XV3".to_string(),
            out_dir: "out/S1".into(),
            threads: 4,
            memory: "16G".to_string(),
            whitelist: None,
            workflow: KbWorkflow::Standard,
            nac: None,
            parity: None,
            strand: Some("forward".to_string()),
            h5ad: true,
            loom: false,
            fastqs: vec!["S1_R1.fastq.gz".into(), "S1_R2.fastq.gz".into()],
        };
        assert_eq!(
            count.to_command("kb").unwrap().argv_string(),
            "kb count -i index.idx -g t2g.txt -x 10XV3 -o out/S1 -t 4 -m 16G --strand forward --h5ad \
             S1_R1.fastq.gz S1_R2.fastq.gz"
        );
    }

    #[test]
    fn technology_for_prefix_barcodes() {
        assert_eq!(barcode_prefix_technology(8), "0,0,8:-1:0,8,0");
    }
}
