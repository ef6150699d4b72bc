use std::fs::File;
use std::path::Path;

use log::warn;

use crate::runtime::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedFileformat {
    FASTQ,
    FASTA,
    GTF,
    BAM,
    SampleSheet,
    Other,
}

const FASTQ_SUFFIXES: [&str; 4] = [".fastq", ".fastq.gz", ".fq", ".fq.gz"];

pub fn is_fastq_name(name: &str) -> bool {
    FASTQ_SUFFIXES.iter().any(|s| name.ends_with(s))
}

pub fn detect_format(p: &Path) -> DetectedFileformat {
    let p_string = match p.file_name() {
        Some(n) => n.to_string_lossy(),
        None => return DetectedFileformat::Other,
    };
    let name = p_string.strip_suffix(".gz").unwrap_or(&p_string);

    if is_fastq_name(&p_string) {
        DetectedFileformat::FASTQ
    } else if name.ends_with(".fa") | name.ends_with(".fasta") | name.ends_with(".fna") {
        DetectedFileformat::FASTA
    } else if name.ends_with(".gtf") | name.ends_with(".gff") | name.ends_with(".gff3") {
        DetectedFileformat::GTF
    } else if name.ends_with(".bam") | name.ends_with(".cram") {
        DetectedFileformat::BAM
    } else if name.ends_with(".tsv") {
        DetectedFileformat::SampleSheet
    } else {
        DetectedFileformat::Other
    }
}

/// Check that an input exists and has the expected kind of name. Empty files only warn
pub fn verify_input_file(path_in: &Path, expected: DetectedFileformat) -> anyhow::Result<()> {
    let file = File::open(path_in).map_err(|_| Error::file_not_found(path_in))?;
    if detect_format(path_in) != expected {
        return Err(Error::file_not_valid(
            path_in,
            Some(format!("expected a {:?} file", expected)),
        )
        .into());
    }
    if file.metadata()?.len() == 0 {
        warn!("input file {} is empty", path_in.display());
    }
    Ok(())
}

/////// Check that the specified file is a FASTQ file
pub fn verify_input_fq_file(path_in: &Path) -> anyhow::Result<()> {
    verify_input_file(path_in, DetectedFileformat::FASTQ)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        assert_eq!(detect_format(Path::new("a/S1_R1.fq.gz")), DetectedFileformat::FASTQ);
        assert_eq!(detect_format(Path::new("GRCh38.fa.gz")), DetectedFileformat::FASTA);
        assert_eq!(detect_format(Path::new("genes.gtf")), DetectedFileformat::GTF);
        assert_eq!(detect_format(Path::new("x.bam")), DetectedFileformat::BAM);
        assert_eq!(detect_format(Path::new("x.sam")), DetectedFileformat::Other);
    }

    #[test]
    fn verify_rejects_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("genes.gtf");
        std::fs::write(&p, "chr1\t.\texon\n").unwrap();
        verify_input_file(&p, DetectedFileformat::GTF).unwrap();
        assert!(verify_input_fq_file(&p).is_err());
        assert!(verify_input_fq_file(&dir.path().join("missing.fq")).is_err());
    }
}
