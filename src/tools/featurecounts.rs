use std::path::PathBuf;

use crate::runtime::Error;
use crate::tools::ToolCommand;

/// Gene-level read counting over a set of BAM files
#[derive(Clone, Debug)]
pub struct FeatureCounts {
    pub annotation: PathBuf,
    pub out: PathBuf,
    pub feature_type: String,
    pub attribute: String,
    /// 0 unstranded, 1 stranded, 2 reversely stranded
    pub strand: Option<u8>,
    pub paired: bool,
    pub threads: usize,
    pub bams: Vec<PathBuf>,
}

impl FeatureCounts {
    pub fn to_command(&self, program: &str) -> anyhow::Result<ToolCommand> {
        if self.bams.is_empty() {
            return Err(Error::config_not_valid("featureCounts needs at least one BAM").into());
        }
        if let Some(s) = self.strand {
            if s > 2 {
                return Err(Error::config_not_valid(format!(
                    "featureCounts strandedness must be 0, 1 or 2, got {}",
                    s
                ))
                .into());
            }
        }
        Ok(ToolCommand::new(program)
            .flag_value("-T", self.threads.to_string())
            .flag_value("-a", &self.annotation)
            .flag_value("-o", &self.out)
            .flag_value("-t", &self.feature_type)
            .flag_value("-g", &self.attribute)
            .opt_flag_value("-s", self.strand.map(|s| s.to_string()))
            .switch("-p", self.paired)
            .switch("--countReadPairs", self.paired)
            .args(&self.bams))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fc() -> FeatureCounts {
        FeatureCounts {
            annotation: "genes.gtf".into(),
            out: "counts/featurecounts.txt".into(),
            feature_type: "exon".to_string(),
            attribute: "gene_id".to_string(),
            strand: None,
            paired: true,
            threads: 8,
            bams: vec!["bam/a.bam".into(), "bam/b.bam".into()],
        }
    }

    #[test]
    fn paired_counts() {
        assert_eq!(
            fc().to_command("featureCounts").unwrap().argv_string(),
            "featureCounts -T 8 -a genes.gtf -o counts/featurecounts.txt -t exon -g gene_id -p --countReadPairs \
             bam/a.bam bam/b.bam"
        );
    }

    #[test]
    fn invalid_strand_is_rejected() {
        let mut f = fc();
        f.strand = Some(3);
        assert!(f.to_command("featureCounts").is_err());
        f.strand = Some(2);
        assert!(f.to_command("featureCounts").unwrap().args.iter().any(|a| a == "-s"));
    }
}
