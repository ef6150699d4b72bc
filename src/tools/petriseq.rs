use std::path::PathBuf;

use crate::tools::ToolCommand;

/// One run of the vendor PETRI-seq analysis script on a sample prefix
#[derive(Clone, Debug)]
pub struct PetriseqRun {
    pub sample: String,
    pub work_dir: PathBuf,
    pub extra_args: Vec<String>,
}

impl PetriseqRun {
    pub fn to_command(&self, program: &str) -> ToolCommand {
        ToolCommand::new(program)
            .arg(&self.sample)
            .args(&self.extra_args)
            .current_dir(&self.work_dir)
    }
}
