//! External tool execution.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Bytes of stderr kept in [`ToolError::Failed`].
const STDERR_TAIL: usize = 800;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{} not found in PATH", .0.display())]
    NotFound(PathBuf),

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("failed to run {}: {source}", tool.display())]
    Io {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run `tool` with `args`, optionally feeding `stdin`, and return its stdout.
///
/// The child is spawned `kill_on_drop`, so dropping the returned future
/// (timeout, cancellation) also terminates the process.
pub async fn run_tool<I, S>(tool: &Path, args: I, stdin: Option<&[u8]>) -> Result<Vec<u8>, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(tool);
    cmd.args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    log::debug!("exec: {cmd:?}");

    let io_err = |source| ToolError::Io {
        tool: tool.to_path_buf(),
        source,
    };

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ToolError::NotFound(tool.to_path_buf()),
        _ => io_err(e),
    })?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input).await.map_err(io_err)?;
        // Dropping the pipe closes the child's stdin.
        drop(pipe);
    }

    let output = child.wait_with_output().await.map_err(io_err)?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(ToolError::Failed {
            tool: tool.display().to_string(),
            status: output.status.to_string(),
            stderr: stderr_tail(&output.stderr),
        })
    }
}

/// Last [`STDERR_TAIL`] bytes of `stderr`, lossily decoded and trimmed.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("…{}", &text[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_tail_keeps_the_end() {
        let long = "x".repeat(STDERR_TAIL) + "END";
        let tail = stderr_tail(long.as_bytes());
        assert!(tail.ends_with("END"));
        assert!(tail.starts_with('…'));
        assert_eq!(stderr_tail(b"  short\n"), "short");
    }

    #[tokio::test]
    async fn missing_tool_is_not_found() {
        let err = run_tool(Path::new("/nonexistent/bin/tool"), ["-version"], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        assert!(err.to_string().contains("not found in PATH"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_failed() {
        let err = run_tool(Path::new("false"), Vec::<&str>::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Failed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdin_is_forwarded() {
        let out = run_tool(Path::new("cat"), Vec::<&str>::new(), Some(b"hola"))
            .await
            .unwrap();
        assert_eq!(out, b"hola");
    }
}
