use std::path::PathBuf;

use crate::tools::ToolCommand;

/// Adapter and quality trimming with BBDuk. Defaults follow the BBTools
/// recommendations for Illumina adapters
#[derive(Clone, Debug)]
pub struct BbdukTrim {
    pub in1: PathBuf,
    pub in2: Option<PathBuf>,
    pub out1: PathBuf,
    pub out2: Option<PathBuf>,
    pub adapters: PathBuf,
    pub kmer: usize,
    pub min_kmer: usize,
    pub hamming_distance: usize,
    pub trim_quality: usize,
    pub min_length: usize,
    pub threads: usize,
    pub stats: Option<PathBuf>,
}

impl BbdukTrim {
    pub fn new(
        in1: PathBuf,
        in2: Option<PathBuf>,
        out1: PathBuf,
        out2: Option<PathBuf>,
        adapters: PathBuf,
    ) -> BbdukTrim {
        BbdukTrim {
            in1,
            in2,
            out1,
            out2,
            adapters,
            kmer: 23,
            min_kmer: 11,
            hamming_distance: 1,
            trim_quality: 10,
            min_length: 20,
            threads: 1,
            stats: None,
        }
    }

    pub fn to_command(&self, program: &str) -> ToolCommand {
        let mut cmd = ToolCommand::new(program).key_path("in", &self.in1);
        if let Some(in2) = &self.in2 {
            cmd = cmd.key_path("in2", in2);
        }
        cmd = cmd.key_path("out", &self.out1);
        if let Some(out2) = &self.out2 {
            cmd = cmd.key_path("out2", out2);
        }
        cmd = cmd
            .key_path("ref", &self.adapters)
            .key_value("ktrim", "r")
            .key_value("k", self.kmer)
            .key_value("mink", self.min_kmer)
            .key_value("hdist", self.hamming_distance);

        // Pair-aware trimming only makes sense with two inputs
        if self.in2.is_some() {
            cmd = cmd.arg("tpe").arg("tbo");
        }

        cmd = cmd
            .key_value("qtrim", "rl")
            .key_value("trimq", self.trim_quality)
            .key_value("minlen", self.min_length)
            .key_value("threads", self.threads);
        if let Some(stats) = &self.stats {
            cmd = cmd.key_path("stats", stats);
        }
        cmd
    }
}
