use std::ffi::OsStr;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use crate::utils::shell_quote;

/// One invocation of an external tool. Owns its argv so it can be logged,
/// recorded and compared before anything is spawned
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    /// Kept as OsString so non-UTF-8 paths reach the tool unchanged
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new<S: Into<String>>(program: S) -> ToolCommand {
        ToolCommand {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: Vec::new(),
            stdout: None,
            stderr: None,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for a in args {
            self = self.arg(a);
        }
        self
    }

    /// `-x value` style option
    pub fn flag_value<V: AsRef<OsStr>>(self, flag: &str, value: V) -> Self {
        self.arg(flag).arg(value)
    }

    /// Optional `-x value`; nothing is added for None
    pub fn opt_flag_value<V: AsRef<OsStr>>(self, flag: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.flag_value(flag, v),
            None => self,
        }
    }

    /// Bare flag added only when `set`
    pub fn switch(self, flag: &str, set: bool) -> Self {
        if set {
            self.arg(flag)
        } else {
            self
        }
    }

    /// BBTools style `key=value`
    pub fn key_value<V: fmt::Display>(self, key: &str, value: V) -> Self {
        self.arg(format!("{}={}", key, value))
    }

    pub fn key_path(self, key: &str, value: &Path) -> Self {
        let mut kv = OsString::from(format!("{}=", key));
        kv.push(value.as_os_str());
        self.arg(kv)
    }

    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdout_to<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.stdout = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn stderr_to<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.stderr = Some(path.as_ref().to_path_buf());
        self
    }

    /// The std Command without any stdio configuration; the runner decides that
    pub fn to_std(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd
    }

    /// Just the program and its arguments, shell-quoted. Only for display;
    /// non-UTF-8 bytes are shown lossily
    pub fn argv_string(&self) -> String {
        std::iter::once(shell_quote(&self.program))
            .chain(self.args.iter().map(|a| shell_quote(&a.to_string_lossy())))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dir) = &self.current_dir {
            write!(f, "cd {} && ", shell_quote(&dir.to_string_lossy()))?;
        }
        for (k, v) in &self.env {
            write!(f, "{}={} ", k, shell_quote(v))?;
        }
        write!(f, "{}", self.argv_string())?;
        if let Some(out) = &self.stdout {
            write!(f, " > {}", shell_quote(&out.to_string_lossy()))?;
        }
        if let Some(err) = &self.stderr {
            write!(f, " 2> {}", shell_quote(&err.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// Commands connected stdout to stdin, run with pipefail semantics
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPipe {
    pub commands: Vec<ToolCommand>,
}

impl ToolPipe {
    pub fn new(first: ToolCommand) -> ToolPipe {
        ToolPipe {
            commands: vec![first],
        }
    }

    pub fn pipe(mut self, next: ToolCommand) -> Self {
        self.commands.push(next);
        self
    }
}

impl fmt::Display for ToolPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.commands.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_args() {
        let cmd = ToolCommand::new("kb")
            .arg("count")
            .flag_value("-i", "index.idx")
            .opt_flag_value("-w", None::<&str>)
            .switch("--h5ad", true)
            .switch("--loom", false)
            .key_value("threads", 4);
        assert_eq!(
            cmd.args,
            vec!["count", "-i", "index.idx", "--h5ad", "threads=4"]
        );
    }

    #[test]
    fn display_renders_shell_line() {
        let cmd = ToolCommand::new("bowtie2")
            .flag_value("-x", "ref/my genome")
            .stderr_to("logs/s1.bowtie2.log")
            .current_dir("/work");
        assert_eq!(
            cmd.to_string(),
            "cd /work && bowtie2 -x 'ref/my genome' 2> logs/s1.bowtie2.log"
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_are_passed_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"/data/cell\xff.fastq");
        let cmd = ToolCommand::new("bbduk.sh")
            .arg(raw)
            .key_path("in", Path::new(raw));
        assert_eq!(cmd.args[0].as_os_str(), raw);
        assert_eq!(cmd.args[1].as_bytes(), b"in=/data/cell\xff.fastq");

        let std_cmd = cmd.to_std();
        let spawned: Vec<&OsStr> = std_cmd.get_args().collect();
        assert_eq!(spawned, vec![raw, cmd.args[1].as_os_str()]);
    }

    #[test]
    fn pipe_display() {
        let pipe = ToolPipe::new(ToolCommand::new("bowtie2").arg("-p").arg("2"))
            .pipe(ToolCommand::new("samtools").args(["view", "-b", "-"]));
        assert_eq!(pipe.to_string(), "bowtie2 -p 2 | samtools view -b -");
    }
}
