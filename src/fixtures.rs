//! Scripted channels for tests.
//!
//! Fabricates the delivery behaviors the receiver has to survive:
//! reordering, duplication, corruption, abrupt termination, and
//! retransmission.

use crate::channel::{Channel, Recv};
use crate::packet::Packet;

use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Build a packet with a synthetic timestamp and payload derived from
/// the sequence number.
pub fn packet(sequence: u64) -> Packet {
    Packet {
        sequence,
        timestamp: format!("t{sequence}"),
        payload: sequence.to_be_bytes().to_vec(),
    }
}

/// A channel that replays a fixed script of outcomes.
///
/// Sequences marked corrupt fail checksum verification until a
/// retransmission is requested for them. Requests are recorded in
/// arrival order; with [`ScriptedChannel::redeliver_on_request`] a
/// clean copy of the requested packet is queued ahead of the script's
/// terminating outcome.
pub struct ScriptedChannel {
    script: VecDeque<Recv>,
    corrupt: FxHashSet<u64>,
    redeliver: bool,
    total: Option<u64>,
    /// Every retransmission request received, in order.
    pub requested: Vec<u64>,
}

impl ScriptedChannel {
    pub fn new(outcomes: impl IntoIterator<Item = Recv>) -> Self {
        Self {
            script: outcomes.into_iter().collect(),
            corrupt: FxHashSet::default(),
            redeliver: false,
            total: None,
            requested: Vec::new(),
        }
    }

    /// Deliver `sequences` in order, then end the stream gracefully.
    pub fn from_sequences(sequences: impl IntoIterator<Item = u64>) -> Self {
        let mut script: VecDeque<Recv> = sequences
            .into_iter()
            .map(|s| Recv::Packet(packet(s)))
            .collect();
        script.push_back(Recv::EndOfStream);
        Self::new(script)
    }

    /// Make every delivered copy of `sequence` fail its checksum until
    /// a retransmission is requested for it.
    pub fn corrupting(mut self, sequence: u64) -> Self {
        self.corrupt.insert(sequence);
        self
    }

    /// Queue a clean copy of every requested sequence behind the
    /// remaining script (but ahead of its terminating outcome).
    pub fn redeliver_on_request(mut self) -> Self {
        self.redeliver = true;
        self
    }

    /// Advertise a total packet count for the gap-bound computation.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

impl Channel for ScriptedChannel {
    fn receive(&mut self) -> Recv {
        self.script.pop_front().unwrap_or(Recv::EndOfStream)
    }

    fn verify_checksum(&self, packet: &Packet) -> bool {
        !self.corrupt.contains(&packet.sequence)
    }

    fn request_retransmit(&mut self, sequence: u64) {
        self.requested.push(sequence);
        // The retransmitted copy is freshly checksummed.
        self.corrupt.remove(&sequence);

        if self.redeliver {
            let at = match self.script.back() {
                Some(Recv::EndOfStream | Recv::Terminated) => self.script.len() - 1,
                _ => self.script.len(),
            };
            self.script.insert(at, Recv::Packet(packet(sequence)));
        }
    }

    fn total_expected(&self) -> Option<u64> {
        self.total
    }
}
