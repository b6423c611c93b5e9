//! relog: a durable, crash-recoverable ordered event log receiver.
//!
//! Consumes packets from an unreliable [`Channel`] (loss, duplication,
//! corruption, reordering, abrupt termination) and produces a single
//! append-only journal file containing each sequence number at most once
//! per run. The journal doubles as the recovery source: on startup the
//! receiver replays it to resume exactly where the previous process
//! stopped.

pub mod channel;
pub mod error;
pub mod fixtures;
pub mod journal;
pub mod logger;
pub mod packet;
pub mod record;
pub mod stats;

pub use channel::{Channel, Recv};
pub use error::{LoggerError, Result};
pub use logger::{EventLogger, LoggerConfig};
pub use packet::Packet;
pub use record::{LogRecord, Status};
pub use stats::LoggerStats;
