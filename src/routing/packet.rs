//! Hop-by-hop packet envelope.
//!
//! ## Wire Format
//!
//! | Offset | Field    | Size    | Notes                    |
//! |--------|----------|---------|--------------------------|
//! | 0      | length   | 2 bytes | payload length, u16 BE   |
//! | 2      | route_id | 4 bytes | u32 BE                   |
//! | 6      | payload  | length  | opaque                   |
//!
//! Framing is the transport's job: [`Packet::decode`] expects exactly one
//! whole packet.

use super::{RouteId, RoutingError};

/// Size of the packet header (length + route id).
pub const PACKET_HEADER_SIZE: usize = 6;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// An encoded packet.
#[derive(Clone, PartialEq, Eq)]
pub struct Packet(Vec<u8>);

impl Packet {
    /// Encode a packet from a route id and payload.
    ///
    /// Payloads longer than [`MAX_PAYLOAD_SIZE`] are rejected, never
    /// truncated.
    pub fn new(route_id: RouteId, payload: &[u8]) -> Result<Self, RoutingError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(RoutingError::PayloadTooLarge {
                max: MAX_PAYLOAD_SIZE,
                got: payload.len(),
            });
        }

        let mut buf = Vec::with_capacity(PACKET_HEADER_SIZE + payload.len());
        buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        buf.extend_from_slice(&route_id.to_be_bytes());
        buf.extend_from_slice(payload);
        Ok(Self(buf))
    }

    /// Decode a complete packet, validating the header against the buffer.
    pub fn decode(bytes: &[u8]) -> Result<Self, RoutingError> {
        if bytes.len() < PACKET_HEADER_SIZE {
            return Err(RoutingError::CorruptPacket(format!(
                "expected at least {} bytes, got {}",
                PACKET_HEADER_SIZE,
                bytes.len()
            )));
        }

        let declared = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
        let actual = bytes.len() - PACKET_HEADER_SIZE;
        if declared != actual {
            return Err(RoutingError::CorruptPacket(format!(
                "declared payload length {} but {} bytes follow the header",
                declared, actual
            )));
        }

        Ok(Self(bytes.to_vec()))
    }

    /// Route id carried in the header.
    pub fn route_id(&self) -> RouteId {
        RouteId::from_be_bytes([self.0[2], self.0[3], self.0[4], self.0[5]])
    }

    /// Payload length from the header.
    pub fn size(&self) -> usize {
        u16::from_be_bytes([self.0[0], self.0[1]]) as usize
    }

    /// Payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.0[PACKET_HEADER_SIZE..]
    }

    /// Full encoded packet.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Consume into the route id and payload.
    pub fn into_parts(self) -> (RouteId, Vec<u8>) {
        let route_id = self.route_id();
        let mut bytes = self.0;
        let payload = bytes.split_off(PACKET_HEADER_SIZE);
        (route_id, payload)
    }
}

impl std::fmt::Debug for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packet")
            .field("route_id", &self.route_id())
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_packet_layout() {
        let packet = Packet::new(RouteId::new(2), &[0xAA, 0xBB, 0xCC]).unwrap();

        assert_eq!(
            packet.as_bytes(),
            &[0x00, 0x03, 0x00, 0x00, 0x00, 0x02, 0xAA, 0xBB, 0xCC]
        );
        assert_eq!(packet.size(), 3);
        assert_eq!(packet.route_id(), RouteId::new(2));
        assert_eq!(packet.payload(), &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_packet_empty_payload() {
        let packet = Packet::new(RouteId::new(9), &[]).unwrap();
        assert_eq!(packet.as_bytes().len(), PACKET_HEADER_SIZE);
        assert!(packet.payload().is_empty());

        let decoded = Packet::decode(packet.as_bytes()).unwrap();
        assert_eq!(decoded.route_id(), RouteId::new(9));
    }

    #[test]
    fn test_packet_max_payload() {
        let payload = vec![7u8; MAX_PAYLOAD_SIZE];
        let packet = Packet::new(RouteId::new(1), &payload).unwrap();
        assert_eq!(packet.size(), MAX_PAYLOAD_SIZE);

        let (route_id, decoded) = Packet::decode(packet.as_bytes()).unwrap().into_parts();
        assert_eq!(route_id, RouteId::new(1));
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_packet_payload_too_large() {
        let payload = vec![0u8; MAX_PAYLOAD_SIZE + 1];
        let result = Packet::new(RouteId::new(1), &payload);

        assert!(matches!(
            result,
            Err(RoutingError::PayloadTooLarge { max: 65535, got: 65536 })
        ));
    }

    #[test]
    fn test_packet_decode_short_header() {
        let result = Packet::decode(&[0x00, 0x01, 0x00]);
        assert!(matches!(result, Err(RoutingError::CorruptPacket(_))));
    }

    #[test]
    fn test_packet_decode_truncated_payload() {
        // Declares 4 payload bytes, carries 2
        let bytes = [0x00, 0x04, 0x00, 0x00, 0x00, 0x01, 0xAA, 0xBB];
        let result = Packet::decode(&bytes);
        assert!(matches!(result, Err(RoutingError::CorruptPacket(_))));
    }

    #[test]
    fn test_packet_decode_trailing_bytes() {
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0xAA, 0xBB];
        let result = Packet::decode(&bytes);
        assert!(matches!(result, Err(RoutingError::CorruptPacket(_))));
    }

    proptest! {
        #[test]
        fn prop_packet_roundtrip(
            route_id in any::<u32>(),
            payload in proptest::collection::vec(any::<u8>(), 0..2048),
        ) {
            let packet = Packet::new(RouteId::new(route_id), &payload).unwrap();
            let (rid, body) = Packet::decode(packet.as_bytes()).unwrap().into_parts();
            prop_assert_eq!(rid, RouteId::new(route_id));
            prop_assert_eq!(body, payload);
        }
    }
}
