//! Wire envelope exchanged between nodes and the transport capabilities.
use serde::{Deserialize, Serialize};

use crate::error::PacketError;

/// Size in bytes of the fixed packet header: origin, level and payload length.
pub const PACKET_HEADER_SIZE: usize = 4 + 1 + 4;

/// Multi-signature sent by `origin` for the given level.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Packet {
    /// Index of the sender.
    pub origin: u32,
    /// Level the multi-signature is sent for.
    pub level: u8,
    /// Encoded `MultiSignature`.
    pub multi_sig: Vec<u8>,
}

impl Packet {
    /// Convert a `Packet` into bytes.
    ///
    /// # Layout
    /// * origin as big-endian `u32`
    /// * level as `u8`
    /// * multi-signature length as big-endian `u32`
    /// * multi-signature
    pub fn to_bytes(&self) -> Result<Vec<u8>, PacketError> {
        let length = u32::try_from(self.multi_sig.len())
            .map_err(|_| PacketError::PayloadOverflow(self.multi_sig.len()))?;
        let mut output = Vec::with_capacity(PACKET_HEADER_SIZE + self.multi_sig.len());
        output.extend_from_slice(&self.origin.to_be_bytes());
        output.push(self.level);
        output.extend_from_slice(&length.to_be_bytes());
        output.extend_from_slice(&self.multi_sig);
        Ok(output)
    }

    /// Extract a `Packet` from a byte slice holding exactly one packet.
    pub fn from_bytes(bytes: &[u8]) -> Result<Packet, PacketError> {
        let mut origin = [0u8; 4];
        origin.copy_from_slice(bytes.get(0..4).ok_or(PacketError::Truncated)?);
        let level = *bytes.get(4).ok_or(PacketError::Truncated)?;
        let mut length = [0u8; 4];
        length.copy_from_slice(bytes.get(5..9).ok_or(PacketError::Truncated)?);

        let end = PACKET_HEADER_SIZE
            .checked_add(u32::from_be_bytes(length) as usize)
            .ok_or(PacketError::Truncated)?;
        let multi_sig = bytes
            .get(PACKET_HEADER_SIZE..end)
            .ok_or(PacketError::Truncated)?
            .to_vec();
        if bytes.len() != end {
            return Err(PacketError::TrailingBytes);
        }

        Ok(Packet {
            origin: u32::from_be_bytes(origin),
            level,
            multi_sig,
        })
    }
}

/// Outbound side of the transport.
pub trait Network: Send + Sync {
    /// Deliver `packet` to the participants at the given indices. Delivery is
    /// best effort: failures are the transport's concern.
    fn send(&self, to: &[u32], packet: &Packet);
}

/// Inbound side of the transport: receives every packet addressed to a node.
pub trait Listener: Send + Sync {
    fn new_packet(&self, packet: &Packet);
}
