//! Command loop serving the host over a line protocol

use std::any::Any;
use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, info, warn};
use wellbeing::{DetectionOutcome, WellbeingMonitor};

use crate::protocol::{write_outcome, Command};
use crate::ServiceError;

/// Why the command loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Host sent `QUIT`
    Quit,
    /// Host closed its end of the pipe
    EndOfInput,
}

/// Strictly serial command loop: one command is fully answered before the
/// next line is read.
pub struct CommandLoop {
    monitor: WellbeingMonitor,
}

impl CommandLoop {
    pub fn new(monitor: WellbeingMonitor) -> Self {
        Self { monitor }
    }

    /// Serve commands until `QUIT`, end of input, or an I/O failure.
    ///
    /// The camera is released exactly once whichever way the loop ends.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<LoopExit, ServiceError> {
        info!("Emotion service started");
        let result = self.serve(input, &mut output);
        if let Err(e) = &result {
            error!("Error in emotion service: {}", e);
        }
        self.monitor.release_camera();
        info!("Emotion service stopped");
        result
    }

    fn serve<R: BufRead, W: Write>(&mut self, mut input: R, output: &mut W) -> Result<LoopExit, ServiceError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                info!("Input closed, shutting down emotion service");
                return Ok(LoopExit::EndOfInput);
            }

            match Command::parse(&String::from_utf8_lossy(&buf)) {
                Command::Detect => {
                    let outcome = self.detect();
                    write_outcome(output, &outcome)?;
                }
                Command::Quit => {
                    info!("Shutting down emotion service");
                    return Ok(LoopExit::Quit);
                }
                Command::Blank => {}
                Command::Unknown(text) => warn!("Unknown command: {}", text),
            }
        }
    }

    /// Run one cycle; a panicking detector or classifier still yields a
    /// response line.
    fn detect(&mut self) -> DetectionOutcome {
        let monitor = &mut self.monitor;
        match panic::catch_unwind(AssertUnwindSafe(|| monitor.run_detection_cycle())) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Detection cycle panicked: {}", message);
                DetectionOutcome::error(format!("Detection error: {}", message))
            }
        }
    }

    pub fn monitor(&self) -> &WellbeingMonitor {
        &self.monitor
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
