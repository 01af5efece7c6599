//! Host-side supervisor for the detection service process

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};
use wellbeing::DetectionOutcome;

use crate::protocol::parse_outcome;
use crate::ServiceError;

/// Grace period between `QUIT` and a forced kill
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to start service process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Service process not started")]
    NotStarted,

    #[error("Service pipe error: {0}")]
    Pipe(#[from] std::io::Error),

    #[error("Service closed its output")]
    Exited,

    #[error("Malformed service response: {0}")]
    Response(#[from] ServiceError),
}

struct RunningService {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Spawns the service and speaks the line protocol to it.
///
/// Diagnostics written by the service to stderr are inherited by the host.
pub struct ServiceClient {
    program: OsString,
    args: Vec<OsString>,
    shutdown_grace: Duration,
    process: Option<RunningService>,
}

impl ServiceClient {
    pub fn new<I, S>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            process: None,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    /// Spawn the service. No-op when already running.
    pub fn start(&mut self) -> Result<(), ClientError> {
        if self.process.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(ClientError::Spawn)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ClientError::Spawn(std::io::Error::other("stdio not piped")));
        };

        info!("Emotion service started with PID {}", child.id());
        self.process = Some(RunningService {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        });
        Ok(())
    }

    /// Request one detection cycle and wait for its response line
    pub fn detect(&mut self) -> Result<DetectionOutcome, ClientError> {
        let process = self.process.as_mut().ok_or(ClientError::NotStarted)?;

        process.stdin.write_all(b"DETECT\n")?;
        process.stdin.flush()?;

        let mut line = String::new();
        if process.stdout.read_line(&mut line)? == 0 {
            return Err(ClientError::Exited);
        }
        Ok(parse_outcome(&line)?)
    }

    /// Ask the service to quit; kill it if it outlives the grace period
    pub fn stop(&mut self) -> Result<(), ClientError> {
        let Some(RunningService {
            mut child,
            mut stdin,
            stdout,
        }) = self.process.take()
        else {
            return Ok(());
        };

        info!("Stopping emotion service");
        if let Err(e) = stdin.write_all(b"QUIT\n").and_then(|_| stdin.flush()) {
            warn!("Failed to send QUIT to emotion service: {}", e);
        }
        drop(stdin);
        drop(stdout);

        let deadline = Instant::now() + self.shutdown_grace;
        while Instant::now() < deadline {
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!("Emotion service exited with status {}", status);
                    return Ok(());
                }
                Ok(None) => thread::sleep(EXIT_POLL_INTERVAL),
                Err(e) => {
                    warn!("Error checking emotion service status: {}", e);
                    break;
                }
            }
        }

        warn!("Emotion service did not exit in time, killing it");
        child.kill()?;
        child.wait()?;
        Ok(())
    }
}

impl Drop for ServiceClient {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Error stopping emotion service: {}", e);
        }
    }
}
