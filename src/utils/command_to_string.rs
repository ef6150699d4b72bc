pub fn command_to_string(cmd: &std::process::Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args = cmd
        .get_args()
        .map(|arg| shell_quote(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ");
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", shell_quote(&program), args)
    }
}

/// Quote a word for a POSIX shell. Words made only of safe characters are returned as-is
pub fn shell_quote(word: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "-_./:=,+@%^".contains(c);
    if !word.is_empty() && word.chars().all(safe) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("ktrim=r"), "ktrim=r");
        assert_eq!(shell_quote("0,0,8:-1:0,8,0"), "0,0,8:-1:0,8,0");
        assert_eq!(shell_quote("my reads.fq"), "'my reads.fq'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("%x_%j.out"), "%x_%j.out");
    }

    #[test]
    fn test_command_to_string() {
        let mut cmd = std::process::Command::new("samtools");
        cmd.arg("index").arg("out dir/a.bam");
        assert_eq!(command_to_string(&cmd), "samtools index 'out dir/a.bam'");
    }
}
