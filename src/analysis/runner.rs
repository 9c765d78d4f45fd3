use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{AgentConfig, DEFAULT_TOOL_ARGS, DEFAULT_TOOL_COMMAND};
use crate::error::AgentError;

/// One round-trip to the external analysis tool.
pub trait PassRunner {
    /// Name shown in `ToolUnavailable`.
    fn tool_name(&self) -> &str;

    /// Whether the tool can be resolved at all.
    fn is_available(&self) -> bool;

    /// Run the tool once with `instruction` against `directory` and return its
    /// combined output.
    fn run_pass(
        &self,
        instruction: &str,
        directory: &Path,
    ) -> impl Future<Output = Result<String, AgentError>> + Send;
}

/// Runs the analysis CLI as a child process:
/// `<command> <args...> --prompt <instruction> --directory <dir>`.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    command: String,
    args: Vec<String>,
}

impl ToolRunner {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.tool_command.clone(), config.tool_args.clone())
    }

    fn build_command(&self, instruction: &str, directory: &Path) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg("--prompt")
            .arg(instruction)
            .arg("--directory")
            .arg(directory)
            .current_dir(directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        cmd.creation_flags(0x0800_0000); // CREATE_NO_WINDOW
        cmd
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new(
            DEFAULT_TOOL_COMMAND,
            DEFAULT_TOOL_ARGS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl PassRunner for ToolRunner {
    fn tool_name(&self) -> &str {
        &self.command
    }

    fn is_available(&self) -> bool {
        find_on_path(&self.command).is_some()
    }

    async fn run_pass(&self, instruction: &str, directory: &Path) -> Result<String, AgentError> {
        debug!(
            "Running {} in {:?} ({} byte instruction)",
            self.command,
            directory,
            instruction.len()
        );

        let mut child = self
            .build_command(instruction, directory)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AgentError::ToolUnavailable(self.command.clone()),
                _ => AgentError::Io(e),
            })?;

        let stdout = child.stdout.take().map(BufReader::new);
        let stderr = child.stderr.take().map(BufReader::new);
        let output = collect_interleaved(stdout, stderr).await;

        let status = child.wait().await?;
        if !status.success() {
            info!("{} exited with {}", self.command, status);
            return Err(AgentError::ToolInvocation {
                status: status.to_string(),
                output,
            });
        }

        Ok(output)
    }
}

/// Read stdout and stderr concurrently, appending whole lines to one buffer in
/// the order they arrive.
async fn collect_interleaved<O, E>(mut stdout: Option<O>, mut stderr: Option<E>) -> String
where
    O: AsyncBufRead + Unpin,
    E: AsyncBufRead + Unpin,
{
    let mut combined = String::new();
    // Partial lines survive a lost select race because read_until appends here.
    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            res = read_line(&mut stdout, &mut out_buf) => {
                if drain_line(res, &mut out_buf, &mut combined) {
                    stdout = None;
                }
            }
            res = read_line(&mut stderr, &mut err_buf) => {
                if drain_line(res, &mut err_buf, &mut combined) {
                    stderr = None;
                }
            }
        }
    }

    combined
}

async fn read_line<R: AsyncBufRead + Unpin>(
    reader: &mut Option<R>,
    buf: &mut Vec<u8>,
) -> std::io::Result<usize> {
    match reader {
        Some(r) => r.read_until(b'\n', buf).await,
        None => std::future::pending().await,
    }
}

/// Move `buf` into `combined`; returns true once the stream is exhausted.
fn drain_line(res: std::io::Result<usize>, buf: &mut Vec<u8>, combined: &mut String) -> bool {
    if !buf.is_empty() {
        combined.push_str(&String::from_utf8_lossy(buf));
        buf.clear();
    }
    !matches!(res, Ok(n) if n > 0)
}

/// Resolve `command` the way a shell would: paths are checked directly, bare
/// names are searched on `PATH`.
pub fn find_on_path(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let full = dir.join(command);
        if full.is_file() {
            return Some(full);
        }
        #[cfg(windows)]
        {
            let exe = dir.join(format!("{}.exe", command));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

pub fn install_instructions() -> &'static str {
    "Claude Code CLI not found. Install it with:

  Web:     https://claude.ai/cli
  macOS:   brew install claude-ai/tap/claude
  Linux:   curl -fsSL https://claude.ai/install.sh | sh
  Windows: Download from https://claude.ai/cli/download

After installation, run: claude auth login"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_on_path_missing() {
        assert!(find_on_path("definitely-not-a-real-binary-4f1c").is_none());
        assert!(find_on_path("/no/such/dir/tool").is_none());
    }

    #[tokio::test]
    async fn test_collect_interleaved_reads_both_streams() {
        let out: &[u8] = b"first\nsecond\n";
        let err: &[u8] = b"warning: partial";
        let combined = collect_interleaved(Some(out), Some(err)).await;
        assert!(combined.contains("first\n"));
        assert!(combined.contains("second\n"));
        assert!(combined.contains("warning: partial"));
        assert_eq!(combined.len(), out.len() + err.len());
    }

    #[tokio::test]
    async fn test_collect_interleaved_no_streams() {
        let combined = collect_interleaved::<&[u8], &[u8]>(None, None).await;
        assert!(combined.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_pass_captures_output() {
        let runner = ToolRunner::new("sh", vec!["-c".into(), "echo ok; echo oops >&2".into(), "sh".into()]);
        let dir = std::env::temp_dir();
        let output = runner.run_pass("ignored", &dir).await.unwrap();
        assert!(output.contains("ok"));
        assert!(output.contains("oops"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_pass_nonzero_exit_carries_output() {
        let runner = ToolRunner::new("sh", vec!["-c".into(), "echo broken; exit 3".into(), "sh".into()]);
        let dir = std::env::temp_dir();
        match runner.run_pass("ignored", &dir).await {
            Err(AgentError::ToolInvocation { output, .. }) => assert!(output.contains("broken")),
            other => panic!("expected ToolInvocation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_pass_missing_tool() {
        let runner = ToolRunner::new("definitely-not-a-real-binary-4f1c", vec![]);
        assert!(!runner.is_available());
        let dir = std::env::temp_dir();
        match runner.run_pass("x", &dir).await {
            Err(AgentError::ToolUnavailable(name)) => {
                assert_eq!(name, "definitely-not-a-real-binary-4f1c")
            }
            other => panic!("expected ToolUnavailable, got {:?}", other),
        }
    }
}
