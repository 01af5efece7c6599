//! Line protocol between the host and the service

use std::io::Write;

use wellbeing::DetectionOutcome;

use crate::ServiceError;

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Detect,
    Quit,
    Blank,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Command::Blank,
            "DETECT" => Command::Detect,
            "QUIT" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Write one outcome as a single JSON line and flush
pub fn write_outcome<W: Write>(out: &mut W, outcome: &DetectionOutcome) -> Result<(), ServiceError> {
    serde_json::to_writer(&mut *out, outcome)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Parse one response line written by [`write_outcome`]
pub fn parse_outcome(line: &str) -> Result<DetectionOutcome, ServiceError> {
    Ok(serde_json::from_str(line.trim())?)
}
