use std::collections::HashMap;
use std::fs::File;
use std::io::ErrorKind;
use std::process::Child;
use std::process::Output;
use std::process::Stdio;
use std::sync::Mutex;

use anyhow::Context;
use log::debug;
use log::info;

use crate::runtime::Error;
use crate::tools::ToolCommand;
use crate::tools::ToolPipe;
use crate::utils::check_tool;
use crate::utils::command_to_string;

/// Lines of stderr kept in the error message of a failed tool
const STDERR_TAIL_LINES: usize = 20;

/// Executes tool invocations. Jobs only ever talk to external programs through this
pub trait ToolRunner {
    /// Run one command to completion. A non-zero exit is an error
    fn run(&self, cmd: &ToolCommand) -> anyhow::Result<()>;

    /// Run a pipe; every member is awaited and the first failing one, in pipe order, is reported
    fn run_pipe(&self, pipe: &ToolPipe) -> anyhow::Result<()>;

    /// Run one command and return its stdout with trailing whitespace removed
    fn capture(&self, cmd: &ToolCommand) -> anyhow::Result<String>;

    /// Fail early if a program cannot be spawned
    fn check_available(&self, program: &str, version_arg: &str) -> anyhow::Result<()>;
}

///////////////////////////////
/// Spawns real processes
#[derive(Debug, Default, Clone)]
pub struct SystemRunner {}

impl SystemRunner {
    pub fn new() -> SystemRunner {
        SystemRunner {}
    }
}

fn spawn_error(cmd: &ToolCommand, e: std::io::Error) -> anyhow::Error {
    if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::PermissionDenied {
        Error::utility_not_executable(&cmd.program).into()
    } else {
        Error::utility_execution_error(&cmd.program, cmd.to_string(), Some(e.to_string())).into()
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let from = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[from..].join("\n")
}

fn open_redirect(path: &std::path::Path) -> anyhow::Result<Stdio> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create redirect file {}", path.display()))?;
    Ok(Stdio::from(file))
}

impl SystemRunner {
    fn output(&self, cmd: &ToolCommand, capture_stdout: bool) -> anyhow::Result<Output> {
        let mut std_cmd = cmd.to_std();
        std_cmd.stdin(Stdio::null());
        match &cmd.stdout {
            Some(p) => std_cmd.stdout(open_redirect(p)?),
            None if capture_stdout => std_cmd.stdout(Stdio::piped()),
            None => std_cmd.stdout(Stdio::inherit()),
        };
        match &cmd.stderr {
            Some(p) => std_cmd.stderr(open_redirect(p)?),
            None => std_cmd.stderr(Stdio::piped()),
        };

        debug!("Spawning {}", command_to_string(&std_cmd));
        let output = std_cmd.output().map_err(|e| spawn_error(cmd, e))?;
        if !output.status.success() {
            let mut msg = output.status.to_string();
            let tail = stderr_tail(&output.stderr);
            if !tail.is_empty() {
                msg = format!("{}\n{}", msg, tail);
            } else if let Some(p) = &cmd.stderr {
                msg = format!("{}, see {}", msg, p.display());
            }
            return Err(Error::utility_execution_error(&cmd.program, cmd.to_string(), Some(msg)).into());
        }
        if !output.stderr.is_empty() {
            debug!("{} stderr:\n{}", cmd.program, String::from_utf8_lossy(&output.stderr));
        }
        Ok(output)
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, cmd: &ToolCommand) -> anyhow::Result<()> {
        info!("Running: {}", cmd);
        self.output(cmd, false)?;
        Ok(())
    }

    fn run_pipe(&self, pipe: &ToolPipe) -> anyhow::Result<()> {
        info!("Running: {}", pipe);

        let n = pipe.commands.len();

        // Redirect files are opened before anything is spawned, so a bad path leaves no child behind
        let mut std_cmds = Vec::with_capacity(n);
        for (i, cmd) in pipe.commands.iter().enumerate() {
            let is_last = i + 1 == n;
            let mut std_cmd = cmd.to_std();
            if !is_last {
                std_cmd.stdout(Stdio::piped());
            } else if let Some(p) = &cmd.stdout {
                std_cmd.stdout(open_redirect(p)?);
            }
            // Unread stderr pipes can stall a long pipe, so it goes to our stderr unless redirected
            if let Some(p) = &cmd.stderr {
                std_cmd.stderr(open_redirect(p)?);
            }
            std_cmds.push(std_cmd);
        }

        let mut children: Vec<(&ToolCommand, Child)> = Vec::with_capacity(n);
        let mut prev_stdout: Option<std::process::ChildStdout> = None;
        for (cmd, mut std_cmd) in pipe.commands.iter().zip(std_cmds) {
            match prev_stdout.take() {
                Some(out) => std_cmd.stdin(Stdio::from(out)),
                None => std_cmd.stdin(Stdio::null()),
            };
            debug!("Spawning {}", command_to_string(&std_cmd));
            match std_cmd.spawn() {
                Ok(mut child) => {
                    prev_stdout = child.stdout.take();
                    children.push((cmd, child));
                }
                Err(e) => {
                    for (_, mut child) in children {
                        let _ = child.kill();
                        let _ = child.wait();
                    }
                    return Err(spawn_error(cmd, e));
                }
            }
        }
        drop(prev_stdout);

        // Every child is reaped before an error is returned
        let mut first_failure: Option<anyhow::Error> = None;
        for (cmd, mut child) in children {
            let failure: Option<anyhow::Error> = match child.wait() {
                Ok(status) if status.success() => None,
                Ok(status) => Some(
                    Error::utility_execution_error(
                        &cmd.program,
                        pipe.to_string(),
                        Some(status.to_string()),
                    )
                    .into(),
                ),
                Err(e) => Some(
                    anyhow::Error::new(e).context(format!("Failed waiting for {}", cmd.program)),
                ),
            };
            if first_failure.is_none() {
                first_failure = failure;
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn capture(&self, cmd: &ToolCommand) -> anyhow::Result<String> {
        info!("Running: {}", cmd);
        let output = self.output(cmd, true)?;
        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            Error::parse_error(format!("output of {}", cmd.program), Some(e.to_string()))
        })?;
        Ok(stdout.trim_end().to_string())
    }

    fn check_available(&self, program: &str, version_arg: &str) -> anyhow::Result<()> {
        check_tool(program, version_arg)
    }
}

///////////////////////////////
/// Records commands instead of running them. Backs --dry-run and the tests
#[derive(Debug, Default)]
pub struct RecordingRunner {
    echo: bool,
    outputs: HashMap<String, String>,
    fail_on: Option<String>,
    lines: Mutex<Vec<String>>,
    commands: Mutex<Vec<ToolCommand>>,
}

impl RecordingRunner {
    pub fn new() -> RecordingRunner {
        RecordingRunner::default()
    }

    /// Print each command line on stdout as it is recorded
    pub fn echoing() -> RecordingRunner {
        RecordingRunner {
            echo: true,
            ..Default::default()
        }
    }

    /// Canned stdout returned by `capture` for a program
    pub fn with_output<P: Into<String>, O: Into<String>>(mut self, program: P, output: O) -> Self {
        self.outputs.insert(program.into(), output.into());
        self
    }

    /// Make every invocation of a program fail
    pub fn failing_on<P: Into<String>>(mut self, program: P) -> Self {
        self.fail_on = Some(program.into());
        self
    }

    /// Rendered lines, one per run/run_pipe/capture call
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Every command seen, pipe members flattened in order
    pub fn commands(&self) -> Vec<ToolCommand> {
        self.commands.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, line: String, cmds: &[ToolCommand]) -> anyhow::Result<()> {
        if self.echo {
            println!("{}", line);
        } else {
            info!("Recorded: {}", line);
        }
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).push(line.clone());
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(cmds.iter().cloned());

        if let Some(fail) = &self.fail_on {
            if let Some(cmd) = cmds.iter().find(|c| &c.program == fail) {
                return Err(Error::utility_execution_error(
                    &cmd.program,
                    line,
                    Some("exit status: 1"),
                )
                .into());
            }
        }
        Ok(())
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&self, cmd: &ToolCommand) -> anyhow::Result<()> {
        self.record(cmd.to_string(), std::slice::from_ref(cmd))
    }

    fn run_pipe(&self, pipe: &ToolPipe) -> anyhow::Result<()> {
        self.record(pipe.to_string(), &pipe.commands)
    }

    fn capture(&self, cmd: &ToolCommand) -> anyhow::Result<String> {
        self.record(cmd.to_string(), std::slice::from_ref(cmd))?;
        Ok(self
            .outputs
            .get(&cmd.program)
            .cloned()
            .unwrap_or_else(|| format!("<output of {}>", cmd.program)))
    }

    fn check_available(&self, _program: &str, _version_arg: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_runner_keeps_order() {
        let runner = RecordingRunner::new().with_output("seqspec", "0,0,16:0,16,28:1,0,102");
        runner.run(&ToolCommand::new("samtools").arg("index").arg("a.bam")).unwrap();
        let tech = runner
            .capture(&ToolCommand::new("seqspec").arg("index"))
            .unwrap();
        assert_eq!(tech, "0,0,16:0,16,28:1,0,102");
        assert_eq!(runner.lines(), vec!["samtools index a.bam", "seqspec index"]);
    }

    #[test]
    fn recording_runner_can_fail() {
        let runner = RecordingRunner::new().failing_on("samtools");
        let pipe = ToolPipe::new(ToolCommand::new("bowtie2"))
            .pipe(ToolCommand::new("samtools").arg("sort"));
        let e = runner.run_pipe(&pipe).unwrap_err();
        assert!(e.to_string().contains("samtools"));
        assert_eq!(runner.commands().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_failure() {
        let runner = SystemRunner::new();
        runner.run(&ToolCommand::new("true")).unwrap();
        let e = runner
            .run(&ToolCommand::new("sh").arg("-c").arg("echo broken index >&2; exit 3"))
            .unwrap_err();
        let msg = e.to_string();
        assert!(msg.contains("broken index"), "{}", msg);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_stdout() {
        let runner = SystemRunner::new();
        let out = runner
            .capture(&ToolCommand::new("sh").arg("-c").arg("printf '1,0,8:-1:0,8,0\\n\\n'"))
            .unwrap();
        assert_eq!(out, "1,0,8:-1:0,8,0");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_pipe_is_pipefail() {
        let runner = SystemRunner::new();
        let ok = ToolPipe::new(ToolCommand::new("printf").arg("a\\nb\\n"))
            .pipe(ToolCommand::new("wc").arg("-l").stdout_to(std::env::temp_dir().join("scjobs_pipe_ok.txt")));
        runner.run_pipe(&ok).unwrap();

        let failing_head = ToolPipe::new(ToolCommand::new("false"))
            .pipe(ToolCommand::new("cat").stdout_to(std::env::temp_dir().join("scjobs_pipe_fail.txt")));
        let e = runner.run_pipe(&failing_head).unwrap_err();
        assert!(e.to_string().contains("'false'"), "{}", e);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_pipe_spawns_nothing_when_a_redirect_fails() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("head_ran");
        let pipe = ToolPipe::new(
            ToolCommand::new("sh")
                .arg("-c")
                .arg(format!("touch {}", marker.display())),
        )
        .pipe(ToolCommand::new("cat").stdout_to(dir.path().join("no/such/dir/out.txt")));

        let e = SystemRunner::new().run_pipe(&pipe).unwrap_err();
        assert!(e.to_string().contains("Failed to create redirect file"), "{}", e);
        assert!(!marker.exists());
    }

    #[test]
    fn missing_program_is_not_executable() {
        let runner = SystemRunner::new();
        let e = runner
            .run(&ToolCommand::new("scjobs-no-such-tool"))
            .unwrap_err();
        assert!(e.to_string().contains("Make sure it is in your $PATH"));
    }
}
