//! Run statistics.

use serde::Serialize;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoggerStats {
    /// Packets pulled from the channel, including corrupted duplicates.
    pub packets_received: u64,
    /// Records durably appended to the journal.
    pub packets_written: u64,
    pub duplicates_discarded: u64,
    /// Packets dropped on checksum failure.
    pub corrupted_packets: u64,
    /// Retransmission requests issued to the channel.
    pub retransmit_requests: u64,
    /// Requested sequences that subsequently arrived.
    pub retransmits_received: u64,
    /// Writes below the highest sequence already on disk.
    pub inversions: u64,
    /// Sequence numbers missing from the journal at the end of the run.
    pub gaps: u64,
    pub buffer_flushes: u64,
    /// Packets still buffered when termination arrived, written only by
    /// the unconditional final drain.
    pub drained_at_finalize: u64,
}
