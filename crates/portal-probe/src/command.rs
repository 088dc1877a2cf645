//! Running external commands with capped output.

use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

/// Maximum length of captured command output, in bytes.
pub const MAX_CMD_OUTPUT_SIZE: usize = 64 * 1024;

/// Exit code and captured output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; -1 if the process was killed by a signal.
    pub code: i32,
    /// Stdout on success, stderr on a non-zero exit.
    pub output: Vec<u8>,
}

/// Run `command` with `args` and wait for it to finish.
///
/// A non-zero exit is not an error: the code and stderr are returned so the
/// caller can decide. Failing to start the command is an error.
pub fn run_command(command: &str, args: &[&str]) -> Result<CommandOutput> {
    let out = Command::new(command)
        .args(args)
        .output()
        .with_context(|| format!("command {command:?} failed"))?;

    let code = out.status.code().unwrap_or(-1);
    let mut output = if out.status.success() {
        out.stdout
    } else {
        out.stderr
    };
    output.truncate(MAX_CMD_OUTPUT_SIZE);

    debug!(command, code, bytes = output.len(), "command finished");
    Ok(CommandOutput { code, output })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_success_captures_stdout() {
        let out = run_command("sh", &["-c", "echo hello"]).unwrap();
        assert_eq!(out.code, 0);
        assert_eq!(out.output, b"hello\n");
    }

    #[test]
    fn test_failure_returns_code_and_stderr() {
        let out = run_command("sh", &["-c", "echo oops >&2; echo ignored; exit 3"]).unwrap();
        assert_eq!(out.code, 3);
        assert_eq!(out.output, b"oops\n");
    }

    #[test]
    fn test_output_is_truncated() {
        let out = run_command("sh", &["-c", "head -c 70000 /dev/zero"]).unwrap();
        assert_eq!(out.code, 0);
        assert_eq!(out.output.len(), MAX_CMD_OUTPUT_SIZE);
    }

    #[test]
    fn test_missing_command_is_an_error() {
        let err = run_command("portal-probe-no-such-command", &[]).unwrap_err();
        assert!(err.to_string().contains("portal-probe-no-such-command"));
    }
}
