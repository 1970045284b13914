//! Process spawning
//!
//! Spawned servers run in their own process group and are detached from
//! the spawning host: the child handle is dropped right after launch. A
//! server given a log file writes its output there rather than into pipes,
//! so it keeps running after the host exits and stops reading.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};

use crate::error::ProcessError;
use crate::signal::is_running;
use crate::Result;

/// How often a followed log is checked for new output
const LOG_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Append stdout and stderr here instead of piping them to the host
    pub log: Option<PathBuf>,
}

impl SpawnOptions {
    pub fn with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            log: None,
        }
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn log(mut self, log: impl Into<PathBuf>) -> Self {
        self.log = Some(log.into());
        self
    }
}

/// A launched process. Only its pid and output streams survive launch.
///
/// With a log file, `stdout` follows that file (both streams interleaved)
/// and `stderr` is `None`.
pub struct SpawnedProcess {
    pub pid: u32,
    pub stdout: OutputStream,
    pub stderr: Option<OutputStream>,
}

impl std::fmt::Debug for SpawnedProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnedProcess")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

pub trait ProcessSpawner: Send + Sync {
    fn spawn(&self, program: &str, options: &SpawnOptions) -> Result<SpawnedProcess>;
}

/// Spawns real OS processes through tokio. Must be called inside a runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpawner;

impl ProcessSpawner for SystemSpawner {
    fn spawn(&self, program: &str, options: &SpawnOptions) -> Result<SpawnedProcess> {
        let spawn_error = |reason: String| ProcessError::Spawn {
            program: program.to_string(),
            reason,
        };

        // opened before the child so only its output is followed
        let log = match &options.log {
            Some(path) => Some(open_log(path).map_err(|e| {
                spawn_error(format!("cannot open log {}: {}", path.display(), e))
            })?),
            None => None,
        };

        let mut command = tokio::process::Command::new(program);
        command.args(&options.args).stdin(Stdio::null());

        match &log {
            Some((writer, _)) => {
                let stdout = writer.try_clone().map_err(|e| spawn_error(e.to_string()))?;
                let stderr = writer.try_clone().map_err(|e| spawn_error(e.to_string()))?;
                command.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));
            }
            None => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }

        // pgid == pid, so the whole server tree can be hung up later
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| spawn_error(e.to_string()))?;

        let pid = child
            .id()
            .ok_or_else(|| spawn_error("process exited during launch".to_string()))?;

        let (stdout, stderr) = match log {
            Some((_, reader)) => (follow_log(pid, reader), None),
            None => {
                let stdout = child
                    .stdout
                    .take()
                    .ok_or_else(|| spawn_error("stdout was not captured".to_string()))?;
                let stderr = child.stderr.take();
                (
                    Box::new(stdout) as OutputStream,
                    stderr.map(|s| Box::new(s) as OutputStream),
                )
            }
        };

        // Dropping the handle leaves the process running; tokio reaps it if it exits.
        drop(child);

        tracing::debug!(pid, program = %program, args = ?options.args, log = ?options.log, "Spawned detached process");

        Ok(SpawnedProcess {
            pid,
            stdout,
            stderr,
        })
    }
}

/// Open `path` for appending, plus a reader positioned at its current end.
fn open_log(path: &Path) -> std::io::Result<(File, File)> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let writer = OpenOptions::new().create(true).append(true).open(path)?;
    let mut reader = File::open(path)?;
    reader.seek(SeekFrom::End(0))?;

    Ok((writer, reader))
}

/// Stream what `pid` appends to its log. Ends once the log is drained and
/// the process is gone, or when the returned stream is dropped.
fn follow_log(pid: u32, log: File) -> OutputStream {
    let (mut writer, reader) = tokio::io::duplex(8 * 1024);

    tokio::spawn(async move {
        let mut log = tokio::fs::File::from_std(log);
        let mut chunk = vec![0u8; 4096];
        // one more read after exit picks up output written just before it
        let mut exited = false;

        loop {
            match log.read(&mut chunk).await {
                Ok(0) if exited => break,
                Ok(0) if is_running(pid) => tokio::time::sleep(LOG_POLL_INTERVAL).await,
                Ok(0) => exited = true,
                Ok(n) => {
                    if writer.write_all(&chunk[..n]).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::trace!(pid, error = %e, "Log follow failed");
                    break;
                }
            }
        }
    });

    Box::new(reader)
}

/// Forward every line of `stream` to the log until it closes.
pub fn forward_output(pid: u32, label: &'static str, stream: OutputStream) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => tracing::debug!(pid, stream = label, "{}", line),
                Ok(None) => break,
                Err(e) => {
                    tracing::trace!(pid, stream = label, error = %e, "Output stream failed");
                    break;
                }
            }
        }
    })
}
