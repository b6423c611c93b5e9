//! Receiving side of the unreliable channel.

use crate::packet::Packet;

/// Outcome of a single receive call.
///
/// Abrupt termination is modeled as a value rather than a panic so that
/// every way a run can end routes through the same finalize path.
#[derive(Debug)]
pub enum Recv {
    /// A packet arrived. It may be corrupted, duplicated, or reordered.
    Packet(Packet),
    /// Graceful end of stream; no more packets will arrive.
    EndOfStream,
    /// The channel terminated abruptly, possibly mid-stream.
    Terminated,
}

/// Capability set the receiver consumes.
///
/// The channel may lose, duplicate, corrupt, and reorder packets at
/// will. Checksum verification is delegated back to the channel.
pub trait Channel {
    /// Block until the next outcome is available.
    fn receive(&mut self) -> Recv;

    /// Verify the checksum the channel attached to `packet`.
    fn verify_checksum(&self, packet: &Packet) -> bool;

    /// Fire-and-forget retransmission request for `sequence`.
    fn request_retransmit(&mut self, sequence: u64);

    /// Total packet count the channel intends to deliver, when known.
    /// Used only to bound the final gap computation.
    fn total_expected(&self) -> Option<u64> {
        None
    }
}
