//! On-disk record format.
//!
//! One record per line, UTF-8, append-only:
//!
//! ```text
//! sequence,timestamp,payload_hex,status
//! ```
//!
//! Parsing is lenient by design: recovery and analysis skip malformed
//! lines (torn trailing writes included) instead of failing.

use std::fmt;

use serde::Serialize;

/// Delivery status recorded with each journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// Written in sequence order.
    Ok,
    /// Written below the highest sequence already on disk (an inversion).
    Late,
    /// Written while a retransmission request for it was outstanding.
    Retransmit,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Late => "LATE",
            Status::Retransmit => "RETRANSMIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OK" => Some(Status::Ok),
            "LATE" => Some(Status::Late),
            "RETRANSMIT" => Some(Status::Retransmit),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully parsed journal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub sequence: u64,
    pub timestamp: String,
    pub payload: Vec<u8>,
    pub status: Status,
}

impl LogRecord {
    /// Render the on-disk line, without the trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.sequence,
            self.timestamp,
            hex::encode(&self.payload),
            self.status
        )
    }

    /// Parse one journal line. Returns `None` for malformed lines
    /// (wrong field count, non-numeric sequence, bad hex, unknown
    /// status) so callers can skip them.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.splitn(4, ',');
        let sequence = parts.next()?.parse().ok()?;
        let timestamp = parts.next()?.to_string();
        let payload = hex::decode(parts.next()?).ok()?;
        let status = Status::parse(parts.next()?.trim_end())?;
        Some(Self {
            sequence,
            timestamp,
            payload,
            status,
        })
    }
}

/// Extract just the sequence number from a journal line.
///
/// Recovery only needs the sequence, so this tolerates undecodable
/// payloads and unknown status words as long as the field count and the
/// sequence itself are intact.
pub fn parse_sequence(line: &str) -> Option<u64> {
    let mut parts = line.splitn(4, ',');
    let sequence = parts.next()?.parse().ok()?;
    parts.next()?;
    parts.next()?;
    parts.next()?;
    Some(sequence)
}
