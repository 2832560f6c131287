//! Blocking execution of external tools with a wall-clock timeout and a
//! cap on captured output.

use crate::error::ExtractorErrorKind;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// How long output readers get to finish after a killed child.
const READER_GRACE: Duration = Duration::from_secs(1);

/// A command to run.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: Duration::from_secs(600),
            max_output_bytes: 100 * 1024 * 1024,
        }
    }

    #[must_use]
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = limit;
        self
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run a command to completion.
///
/// The child is killed when `timeout` elapses. Output beyond
/// `max_output_bytes` on either stream is an error; the stream is still
/// drained so the child never blocks on a full pipe.
pub fn run_command(spec: &CommandSpec) -> Result<CommandOutput, ExtractorErrorKind> {
    let program_path =
        which::which(&spec.program).map_err(|_| ExtractorErrorKind::ToolMissing(spec.program.clone()))?;

    let mut command = Command::new(program_path);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }

    let mut child = command.spawn().map_err(|e| ExtractorErrorKind::Spawn {
        program: spec.program.clone(),
        reason: e.to_string(),
    })?;

    let limit = spec.max_output_bytes;
    let stdout_reader = child.stdout.take().map(|pipe| spawn_capture(pipe, limit));
    let stderr_reader = child.stderr.take().map(|pipe| spawn_capture(pipe, limit));

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= spec.timeout => {
                let _ = child.kill();
                let _ = child.wait();
                reap_captures([stdout_reader, stderr_reader]);
                return Err(ExtractorErrorKind::Timeout {
                    program: spec.program.clone(),
                    secs: spec.timeout.as_secs(),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                reap_captures([stdout_reader, stderr_reader]);
                return Err(ExtractorErrorKind::Spawn {
                    program: spec.program.clone(),
                    reason: e.to_string(),
                });
            }
        }
    };

    let capture_failed = |reason| ExtractorErrorKind::Capture {
        program: spec.program.clone(),
        reason,
    };
    let stdout = join_capture(stdout_reader).map_err(capture_failed)?;
    let stderr = join_capture(stderr_reader).map_err(capture_failed)?;
    if stdout.overflowed || stderr.overflowed {
        return Err(ExtractorErrorKind::OutputTooLarge {
            program: spec.program.clone(),
            limit,
        });
    }

    Ok(CommandOutput {
        code: status.code(),
        success: status.success(),
        stdout: String::from_utf8_lossy(&stdout.bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr.bytes).into_owned(),
    })
}

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    overflowed: bool,
    error: Option<String>,
}

/// Read up to `limit` bytes of `pipe`, then drain the rest.
fn capture<R: Read>(pipe: R, limit: usize) -> Captured {
    let mut bytes = Vec::new();
    let mut limited = pipe.take(limit as u64 + 1);
    let error = limited.read_to_end(&mut bytes).err().map(|e| e.to_string());
    let overflowed = bytes.len() > limit;
    if overflowed {
        bytes.truncate(limit);
        let _ = io::copy(&mut limited.into_inner(), &mut io::sink());
    }
    Captured {
        bytes,
        overflowed,
        error,
    }
}

fn spawn_capture<R: Read + Send + 'static>(pipe: R, limit: usize) -> thread::JoinHandle<Captured> {
    thread::spawn(move || capture(pipe, limit))
}

fn join_capture(handle: Option<thread::JoinHandle<Captured>>) -> Result<Captured, String> {
    let Some(handle) = handle else {
        return Ok(Captured::default());
    };
    let captured = handle
        .join()
        .map_err(|_| "output reader panicked".to_string())?;
    match captured.error {
        Some(error) => Err(error),
        None => Ok(captured),
    }
}

/// Join readers of a killed child. A reader still blocked after the grace
/// period (a grandchild holding the pipe open) is left detached.
fn reap_captures(handles: [Option<thread::JoinHandle<Captured>>; 2]) {
    let deadline = Instant::now() + READER_GRACE;
    for handle in handles.into_iter().flatten() {
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }
        if handle.is_finished() {
            let _ = handle.join();
        } else {
            tracing::debug!("Output reader still blocked after kill; detaching it");
        }
    }
}
