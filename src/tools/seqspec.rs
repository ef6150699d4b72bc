use std::path::PathBuf;

use crate::tools::ToolCommand;

/// `seqspec index -m MODALITY -t kb -s SPEC`; prints the kb technology string
/// for the modality, e.g. "0,0,16:0,16,28:1,0,102"
#[derive(Clone, Debug)]
pub struct SeqspecIndex {
    pub spec: PathBuf,
    pub modality: String,
}

impl SeqspecIndex {
    pub fn to_command(&self, program: &str) -> ToolCommand {
        ToolCommand::new(program)
            .arg("index")
            .flag_value("-m", &self.modality)
            .flag_value("-t", "kb")
            .flag_value("-s", &self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_for_kb() {
        let s = SeqspecIndex {
            spec: "spec.yaml".into(),
            modality: "rna".to_string(),
        };
        assert_eq!(
            s.to_command("seqspec").argv_string(),
            "seqspec index -m rna -t kb -s spec.yaml"
        );
    }
}
