//! The event logger.
//!
//! Owns recovery, packet admission, reorder buffering, the flush
//! policy, retransmission bookkeeping, and final gap accounting. One
//! instance exclusively owns its journal file for the duration of a
//! run; only the journal survives a crash, the in-memory state below
//! is rebuilt from it on the next start.

use crate::channel::{Channel, Recv};
use crate::error::Result;
use crate::journal::{self, Journal};
use crate::packet::Packet;
use crate::record::{LogRecord, Status};
use crate::stats::LoggerStats;

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::path::Path;

/// Tuning for the reorder buffer and gap hysteresis.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Max packets buffered before a flush is forced.
    pub buffer_capacity: usize,
    /// Admissions tolerated without progress before the missing
    /// expected sequence is proactively requested.
    pub gap_patience: u32,
}

impl LoggerConfig {
    /// Capacity with the derived patience of `max(5, capacity / 2)`.
    pub fn with_capacity(buffer_capacity: usize) -> Self {
        Self {
            buffer_capacity,
            gap_patience: (buffer_capacity as u32 / 2).max(5),
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_capacity(30)
    }
}

/// Ordered event log receiver.
pub struct EventLogger<C: Channel> {
    channel: C,
    journal: Journal,
    config: LoggerConfig,

    /// Admitted but not yet written, keyed by sequence. At most one
    /// entry per sequence; never exceeds `buffer_capacity` once an
    /// admission+flush cycle completes.
    buffer: BTreeMap<u64, Packet>,
    /// Sequences durably written, by this run or a recovered prior one.
    seen: FxHashSet<u64>,
    /// Sequences with an outstanding retransmission request.
    pending_retransmits: FxHashSet<u64>,
    /// Highest sequence ever written; monotonically non-decreasing.
    last_written: Option<u64>,
    /// Lowest sequence not yet written. Equals `last_written + 1`
    /// immediately after every write.
    expected_seq: u64,
    gap_wait: u32,

    stats: LoggerStats,
}

impl<C: Channel> EventLogger<C> {
    /// Open the journal and rebuild `seen`/`expected` from it.
    ///
    /// Recovery never fails: malformed lines are skipped and an
    /// unreadable journal degrades to an empty state. Only opening the
    /// journal for appending can error.
    pub fn new(channel: C, log_path: impl AsRef<Path>, config: LoggerConfig) -> Result<Self> {
        let log_path = log_path.as_ref();

        let replay = journal::replay(log_path);
        if !replay.seen.is_empty() {
            tracing::info!(
                sequences = replay.seen.len(),
                skipped = replay.skipped_lines,
                last_written = replay.last_written,
                "recovered receiver state from journal"
            );
        }

        let journal = Journal::open(log_path)?;
        let expected_seq = replay.last_written.map_or(0, |s| s + 1);

        Ok(Self {
            channel,
            journal,
            config,
            buffer: BTreeMap::new(),
            seen: replay.seen,
            pending_retransmits: FxHashSet::default(),
            last_written: replay.last_written,
            expected_seq,
            gap_wait: 0,
            stats: LoggerStats::default(),
        })
    }

    /// Blocking receive loop.
    ///
    /// Runs until the channel ends the stream or terminates abruptly;
    /// both routes drain the buffer and compute final statistics.
    pub fn run(&mut self) -> Result<LoggerStats> {
        loop {
            match self.channel.receive() {
                Recv::Packet(packet) => {
                    self.stats.packets_received += 1;
                    self.admit(packet);
                    if self.should_flush() {
                        self.flush()?;
                    }
                }
                Recv::EndOfStream => {
                    self.finalize()?;
                    return Ok(self.stats.clone());
                }
                Recv::Terminated => {
                    tracing::warn!("channel terminated abruptly");
                    self.finalize()?;
                    return Ok(self.stats.clone());
                }
            }
        }
    }

    /// Classify one packet and admit it to the reorder buffer.
    fn admit(&mut self, packet: Packet) {
        if !self.channel.verify_checksum(&packet) {
            self.stats.corrupted_packets += 1;
            tracing::debug!(sequence = packet.sequence, "checksum failure, dropping packet");
            self.request_retransmit(packet.sequence);
            return;
        }

        if self.seen.contains(&packet.sequence) || self.buffer.contains_key(&packet.sequence) {
            self.stats.duplicates_discarded += 1;
            return;
        }

        // The pending flag itself is cleared only when the packet is
        // written, so a second copy of the expected sequence arriving
        // before the durable write is not misattributed.
        if self.pending_retransmits.contains(&packet.sequence) {
            self.stats.retransmits_received += 1;
        }

        self.buffer.insert(packet.sequence, packet);

        if self.buffer.contains_key(&self.expected_seq) {
            self.gap_wait = 0;
        } else {
            self.gap_wait += 1;
            if self.gap_wait >= self.config.gap_patience {
                self.request_retransmit(self.expected_seq);
                self.gap_wait = 0;
            }
        }
    }

    /// A flush is warranted when progress is possible (the expected
    /// sequence is buffered) or under memory pressure (buffer at
    /// capacity).
    fn should_flush(&self) -> bool {
        self.buffer.contains_key(&self.expected_seq)
            || self.buffer.len() >= self.config.buffer_capacity
    }

    /// Drain the contiguous prefix starting at the expected sequence,
    /// then relieve memory pressure with a single forced eviction if
    /// draining made no room.
    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut wrote_any = false;
        while let Some((&smallest, _)) = self.buffer.first_key_value() {
            if smallest != self.expected_seq {
                break;
            }
            if let Some((_, packet)) = self.buffer.pop_first() {
                self.append(packet)?;
                wrote_any = true;
            }
            self.expected_seq = self.next_expected();
            self.gap_wait = 0;
        }
        if wrote_any {
            self.stats.buffer_flushes += 1;
        }

        // Stuck on a gap with a full buffer: evict the smallest
        // sequence so a persistently missing packet cannot stall the
        // pipeline. Costs an out-of-order entry, bounds memory.
        if self.buffer.len() >= self.config.buffer_capacity {
            if let Some((_, packet)) = self.buffer.pop_first() {
                self.append(packet)?;
                self.stats.buffer_flushes += 1;
                self.expected_seq = self.next_expected();
            }
        }

        Ok(())
    }

    /// Durably write one buffered packet, classifying its status.
    fn append(&mut self, packet: Packet) -> Result<()> {
        let sequence = packet.sequence;
        let inverted = self.last_written.is_some_and(|w| sequence < w);

        let status = if self.pending_retransmits.contains(&sequence) {
            Status::Retransmit
        } else if inverted {
            Status::Late
        } else {
            Status::Ok
        };
        // A late retransmit is written RETRANSMIT but still counts as
        // an inversion.
        if inverted {
            self.stats.inversions += 1;
        }

        self.journal.append(&LogRecord {
            sequence,
            timestamp: packet.timestamp,
            payload: packet.payload,
            status,
        })?;

        self.seen.insert(sequence);
        if self.last_written.is_none_or(|w| sequence > w) {
            self.last_written = Some(sequence);
        }
        self.pending_retransmits.remove(&sequence);
        self.stats.packets_written += 1;
        Ok(())
    }

    /// Deduplicated fire-and-forget retransmission request.
    fn request_retransmit(&mut self, sequence: u64) {
        if self.seen.contains(&sequence) || self.pending_retransmits.contains(&sequence) {
            return;
        }
        self.channel.request_retransmit(sequence);
        self.pending_retransmits.insert(sequence);
        self.stats.retransmit_requests += 1;
    }

    /// Drain everything and compute final statistics. Both graceful
    /// end-of-stream and abrupt termination land here.
    fn finalize(&mut self) -> Result<()> {
        if self.should_flush() {
            self.flush()?;
        }

        if !self.buffer.is_empty() {
            self.stats.drained_at_finalize = self.buffer.len() as u64;
            while let Some((_, packet)) = self.buffer.pop_first() {
                self.append(packet)?;
            }
            self.stats.buffer_flushes += 1;
        }

        self.stats.gaps = self.count_gaps();
        tracing::info!(
            written = self.stats.packets_written,
            gaps = self.stats.gaps,
            flushes = self.stats.buffer_flushes,
            "run finalized"
        );
        Ok(())
    }

    /// Missing sequences in `[0, max(last_written, hint - 1)]`. Zero
    /// when nothing was ever written.
    fn count_gaps(&self) -> u64 {
        let Some(last) = self.last_written else {
            return 0;
        };

        let mut upper = last;
        if let Some(total) = self.channel.total_expected() {
            if total > 0 {
                upper = upper.max(total - 1);
            }
        }

        (0..=upper).filter(|seq| !self.seen.contains(seq)).count() as u64
    }

    fn next_expected(&self) -> u64 {
        self.last_written.map_or(0, |s| s + 1)
    }

    /// Lowest sequence not yet written.
    pub fn expected_seq(&self) -> u64 {
        self.expected_seq
    }

    /// Highest sequence ever written, including recovered runs.
    pub fn last_written(&self) -> Option<u64> {
        self.last_written
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> &LoggerStats {
        &self.stats
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}
