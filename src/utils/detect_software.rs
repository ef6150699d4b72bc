use log::debug;
use log::info;
use std::process::Command;
use std::process::Stdio;

use crate::runtime::Error;

/// Check that a program can be spawned. The exit status is not inspected since
/// several tools (bbduk.sh, featureCounts) exit non-zero on a version query
pub fn check_tool(program: &str, version_arg: &str) -> anyhow::Result<()> {
    debug!("Checking for {}", program);
    let mut cmd = Command::new(program);
    if !version_arg.is_empty() {
        cmd.arg(version_arg);
    }
    match cmd.stdout(Stdio::null()).stderr(Stdio::null()).status() {
        Ok(_) => {
            info!("Found {}", program);
            Ok(())
        }
        Err(_) => Err(Error::utility_not_executable(program).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_reported() {
        let e = check_tool("scjobs-no-such-tool", "--version").unwrap_err();
        assert!(e.to_string().contains("scjobs-no-such-tool"));
    }
}
