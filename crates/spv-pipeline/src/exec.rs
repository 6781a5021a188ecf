//! Process execution and artifact lookup seams
//!
//! The pipeline talks to the outside world only through [`ProcessRunner`] and
//! [`ArtifactStore`]. The tokio-backed implementations below are what the CLI
//! uses; tests substitute scripted ones.

use crate::{PipelineError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

pub const DEFAULT_MAX_OUTPUT: usize = 1024 * 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const TRUNCATED_MARKER: &str = "[Truncated]";
const TIMEOUT_MESSAGE: &str = "Killed - processing time exceeded";

/// Execution context shared by every stage of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOptions {
    /// Working directory of the spawned process
    pub custom_cwd: Option<PathBuf>,
    /// Per-stream byte limit; anything beyond is discarded
    pub max_output: usize,
    pub timeout: Duration,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            custom_cwd: None,
            max_output: DEFAULT_MAX_OUTPUT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ExecOptions {
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.custom_cwd = Some(cwd.into());
        self
    }

    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }
}

/// Outcome of one external process invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub truncated: bool,
    pub exec_time: Duration,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Stand-in output for a process that could not be started
    pub fn spawn_failure(error: &PipelineError) -> Self {
        Self {
            code: -1,
            stderr: error.to_string(),
            ..Self::default()
        }
    }
}

/// Spawns a process, waits for it and captures both streams
pub trait ProcessRunner {
    async fn exec(&self, exe: &Path, args: &[String], options: &ExecOptions) -> Result<ExecOutput>;
}

/// Filesystem view of the stage artifacts
pub trait ArtifactStore {
    async fn exists(&self, path: &Path) -> bool;
    async fn read_text(&self, path: &Path) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    async fn exec(&self, exe: &Path, args: &[String], options: &ExecOptions) -> Result<ExecOutput> {
        let mut cmd = Command::new(exe);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &options.custom_cwd {
            cmd.current_dir(cwd);
        }

        debug!("Running command: {:?}", cmd);

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|source| PipelineError::Spawn {
            exe: exe.to_path_buf(),
            source,
        })?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = options.max_output;

        let finished = tokio::time::timeout(options.timeout, async {
            let (stdout, stderr, status) = tokio::join!(
                read_capped(stdout, limit),
                read_capped(stderr, limit),
                child.wait()
            );
            Ok::<_, std::io::Error>((stdout?, stderr?, status?))
        })
        .await;

        match finished {
            Ok(Ok(((stdout, out_truncated), (stderr, err_truncated), status))) => {
                let truncated = out_truncated || err_truncated;
                Ok(ExecOutput {
                    code: status.code().unwrap_or(-1),
                    stdout: decode(stdout, out_truncated),
                    stderr: decode(stderr, err_truncated),
                    timed_out: false,
                    truncated,
                    exec_time: started.elapsed(),
                })
            }
            Ok(Err(err)) => Err(PipelineError::IoError(err)),
            Err(_) => {
                warn!(
                    "{} exceeded the {:?} timeout, killing it",
                    exe.display(),
                    options.timeout
                );
                if let Err(err) = child.kill().await {
                    warn!("Failed to kill {}: {}", exe.display(), err);
                }
                Ok(ExecOutput {
                    code: -1,
                    stdout: String::new(),
                    stderr: TIMEOUT_MESSAGE.to_string(),
                    timed_out: true,
                    truncated: false,
                    exec_time: started.elapsed(),
                })
            }
        }
    }
}

/// Reads the whole stream but keeps at most `limit` bytes, so a chatty child
/// never blocks on a full pipe
async fn read_capped<R: AsyncRead + Unpin>(
    reader: Option<R>,
    limit: usize,
) -> std::io::Result<(Vec<u8>, bool)> {
    let Some(mut reader) = reader else {
        return Ok((Vec::new(), false));
    };
    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        if read > room {
            kept.extend_from_slice(&chunk[..room]);
            truncated = true;
        } else {
            kept.extend_from_slice(&chunk[..read]);
        }
    }
    Ok((kept, truncated))
}

fn decode(bytes: Vec<u8>, truncated: bool) -> String {
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if truncated {
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(TRUNCATED_MARKER);
    }
    text
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalArtifactStore;

impl ArtifactStore for LocalArtifactStore {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read_text(&self, path: &Path) -> Result<String> {
        Ok(tokio::fs::read_to_string(path).await?)
    }
}
