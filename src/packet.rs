//! Packets as delivered by the channel.

/// One packet from the unreliable channel.
///
/// The sequence number is channel-assigned and not unique across
/// retransmissions: a retransmitted copy carries the same sequence as
/// the original. The checksum is implicit and can only be verified
/// through [`crate::Channel::verify_checksum`]; the receiver never
/// computes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub sequence: u64,
    /// Opaque timestamp, recorded verbatim in the journal.
    pub timestamp: String,
    pub payload: Vec<u8>,
}
