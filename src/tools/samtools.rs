use std::path::Path;

use crate::tools::ToolCommand;

/// `samtools view -b -`: SAM on stdin to BAM on stdout
pub fn view_bam_from_stdin(program: &str, threads: usize) -> ToolCommand {
    ToolCommand::new(program)
        .arg("view")
        .flag_value("-@", threads.to_string())
        .arg("-b")
        .arg("-")
}

/// `samtools sort -o OUT -`: coordinate sort from stdin
pub fn sort_from_stdin(program: &str, threads: usize, out: &Path) -> ToolCommand {
    ToolCommand::new(program)
        .arg("sort")
        .flag_value("-@", threads.to_string())
        .flag_value("-o", out)
        .arg("-")
}

pub fn index(program: &str, bam: &Path) -> ToolCommand {
    ToolCommand::new(program).arg("index").arg(bam)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samtools_commands() {
        assert_eq!(view_bam_from_stdin("samtools", 2).argv_string(), "samtools view -@ 2 -b -");
        assert_eq!(
            sort_from_stdin("samtools", 4, Path::new("bam/S1.bam")).argv_string(),
            "samtools sort -@ 4 -o bam/S1.bam -"
        );
        assert_eq!(index("samtools", Path::new("bam/S1.bam")).argv_string(), "samtools index bam/S1.bam");
    }
}
