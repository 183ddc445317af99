//! Transport Boundary
//!
//! Types shared with the transport/session layer that physically moves
//! packets between visors. Transports themselves live outside this crate;
//! the router talks to them only through the packet channels defined here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

// ============================================================================
// Transport Identifiers
// ============================================================================

/// Size of a transport identifier on the wire.
pub const TRANSPORT_ID_SIZE: usize = 16;

/// Identifier of a transport between this visor and a neighbour.
///
/// Transport IDs are UUIDs agreed on by both ends of the transport, so a
/// forward rule can name its outgoing transport in 16 bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportId(Uuid);

impl TransportId {
    /// The nil transport ID.
    pub const NIL: TransportId = TransportId(Uuid::nil());

    /// Create a new random transport ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; TRANSPORT_ID_SIZE]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; TRANSPORT_ID_SIZE] {
        self.0.as_bytes()
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransportId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ============================================================================
// Packet Channel Types
// ============================================================================

/// A packet received from a transport.
#[derive(Clone, Debug)]
pub struct ReceivedPacket {
    /// Which transport received this packet.
    pub transport_id: TransportId,
    /// Raw packet bytes (header and payload).
    pub data: Vec<u8>,
    /// Receipt timestamp (Unix milliseconds).
    pub timestamp_ms: u64,
}

impl ReceivedPacket {
    /// Create a new received packet with current timestamp.
    pub fn new(transport_id: TransportId, data: Vec<u8>) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            transport_id,
            data,
            timestamp_ms,
        }
    }
}

/// A packet the router hands to a transport for delivery to the next hop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundPacket {
    /// Transport to send on.
    pub transport_id: TransportId,
    /// Encoded packet bytes.
    pub data: Vec<u8>,
}

/// Channel sender for received packets.
pub type PacketTx = tokio::sync::mpsc::Sender<ReceivedPacket>;

/// Channel receiver for received packets.
pub type PacketRx = tokio::sync::mpsc::Receiver<ReceivedPacket>;

/// Channel sender for outbound packets.
pub type OutboundTx = tokio::sync::mpsc::Sender<OutboundPacket>;

/// Channel receiver for outbound packets.
pub type OutboundRx = tokio::sync::mpsc::Receiver<OutboundPacket>;

/// Create a packet channel with the given buffer size.
pub fn packet_channel(buffer: usize) -> (PacketTx, PacketRx) {
    tokio::sync::mpsc::channel(buffer)
}

/// Create an outbound channel with the given buffer size.
pub fn outbound_channel(buffer: usize) -> (OutboundTx, OutboundRx) {
    tokio::sync::mpsc::channel(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_id_bytes_roundtrip() {
        let id = TransportId::generate();
        let back = TransportId::from_bytes(*id.as_bytes());
        assert_eq!(id, back);
    }

    #[test]
    fn test_transport_id_display_parse() {
        let id = TransportId::generate();
        let parsed: TransportId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_transport_id_nil() {
        assert_eq!(TransportId::NIL.as_bytes(), &[0u8; 16]);
        assert_eq!(TransportId::default(), TransportId::NIL);
    }

    #[test]
    fn test_received_packet_timestamp() {
        let packet = ReceivedPacket::new(TransportId::NIL, vec![1, 2, 3]);
        assert!(packet.timestamp_ms > 0);
        assert_eq!(packet.data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_outbound_channel() {
        let (tx, mut rx) = outbound_channel(4);
        let packet = OutboundPacket {
            transport_id: TransportId::generate(),
            data: vec![0xAB],
        };
        tx.send(packet.clone()).await.unwrap();
        assert_eq!(rx.recv().await, Some(packet));
    }
}
