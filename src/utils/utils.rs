use std::thread;

use log::warn;

/// Threads to hand to an external tool. Falls back to what the machine reports
pub fn resolve_threads(requested: Option<usize>) -> usize {
    match requested {
        Some(n) if n > 0 => n,
        _ => {
            let available_threads = thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            if available_threads < 2 {
                warn!("less than two threads reported to be available");
            }
            available_threads
        }
    }
}

/// Strip .gz then the FASTQ/FASTA extension: "S1_R1.fastq.gz" gives "S1_R1"
pub fn file_stem_no_gz(name: &str) -> &str {
    let name = name.strip_suffix(".gz").unwrap_or(name);
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_threads_win() {
        assert_eq!(resolve_threads(Some(12)), 12);
        assert!(resolve_threads(Some(0)) >= 1);
        assert!(resolve_threads(None) >= 1);
    }

    #[test]
    fn stems() {
        assert_eq!(file_stem_no_gz("S1_R1.fastq.gz"), "S1_R1");
        assert_eq!(file_stem_no_gz("GRCh38.fa"), "GRCh38");
        assert_eq!(file_stem_no_gz("plain"), "plain");
        assert_eq!(file_stem_no_gz(".hidden"), ".hidden");
    }
}
