use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

pub async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, ProbeError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|source| ProbeError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ProbeError::Timeout {
            program: program.to_string(),
            timeout,
        })?
        .map_err(|source| ProbeError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        debug!("probe {} {:?} failed: {}", program, args, stderr);
        return Err(ProbeError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr,
        });
    }

    Ok(CommandOutput { stdout, stderr })
}

pub async fn read_text(path: &Path, timeout: Duration) -> Result<String, ProbeError> {
    let read = tokio::fs::read(path);
    let bytes = tokio::time::timeout(timeout, read)
        .await
        .map_err(|_| ProbeError::Timeout {
            program: path.display().to_string(),
            timeout,
        })?
        .map_err(|source| ProbeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// Reads no more than the last `max_bytes` of the file, then keeps the last
// `max_lines` complete lines of that window.
pub async fn read_tail(
    path: &Path,
    max_lines: usize,
    max_bytes: u64,
    timeout: Duration,
) -> Result<String, ProbeError> {
    let read = async {
        let mut file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let start = len.saturating_sub(max_bytes);
        // one byte of lead-in shows whether the window opens on a line start
        let from = start.saturating_sub(1);
        file.seek(SeekFrom::Start(from)).await?;
        let mut bytes = Vec::new();
        file.take(len - from).read_to_end(&mut bytes).await?;
        Ok::<_, std::io::Error>((start, bytes))
    };
    let (start, bytes) = tokio::time::timeout(timeout, read)
        .await
        .map_err(|_| ProbeError::Timeout {
            program: path.display().to_string(),
            timeout,
        })?
        .map_err(|source| ProbeError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let text = String::from_utf8_lossy(&bytes);
    let window = if start > 0 {
        text.split_once('\n').map(|(_, rest)| rest).unwrap_or("")
    } else {
        &text
    };
    Ok(tail_lines(window, max_lines))
}

pub fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let err = run_command("rca-agent-no-such-binary", &[], DEFAULT_PROBE_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_output_and_failure() {
        let out = run_command("sh", &["-c", "echo hello"], DEFAULT_PROBE_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");

        let err = run_command("sh", &["-c", "echo nope >&2; exit 3"], DEFAULT_PROBE_TIMEOUT)
            .await
            .unwrap_err();
        match err {
            ProbeError::Failed { stderr, .. } => assert_eq!(stderr, "nope"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_command_times_out() {
        let err = run_command("sleep", &["5"], Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_read_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loadavg");
        std::fs::write(&path, "0.10 0.20 0.30 1/100 42\n").unwrap();
        assert_eq!(
            read_text(&path, DEFAULT_PROBE_TIMEOUT).await.unwrap().trim(),
            "0.10 0.20 0.30 1/100 42"
        );
        assert!(matches!(
            read_text(&dir.path().join("missing"), DEFAULT_PROBE_TIMEOUT).await,
            Err(ProbeError::Read { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_tail_stays_inside_byte_window() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages");
        let lines: Vec<String> = (0..100).map(|i| format!("line {i:03}")).collect();
        std::fs::write(&path, lines.join("\n")).unwrap();

        // 8 bytes per line plus newline; 30 bytes cuts into "line 096"
        let tail = read_tail(&path, 1000, 30, DEFAULT_PROBE_TIMEOUT).await.unwrap();
        assert_eq!(tail, "line 097\nline 098\nline 099");

        let tail = read_tail(&path, 2, 1 << 20, DEFAULT_PROBE_TIMEOUT).await.unwrap();
        assert_eq!(tail, "line 098\nline 099");

        let whole = read_tail(&path, 1000, 1 << 20, DEFAULT_PROBE_TIMEOUT).await.unwrap();
        assert!(whole.starts_with("line 000\n"));
        assert!(matches!(
            read_tail(&dir.path().join("gone"), 10, 10, DEFAULT_PROBE_TIMEOUT).await,
            Err(ProbeError::Read { .. })
        ));
    }

    #[test]
    fn test_tail_lines() {
        assert_eq!(tail_lines("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail_lines("a\nb", 10), "a\nb");
    }
}
