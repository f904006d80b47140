//! Echo Request construction and Echo Reply validation.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Type      |     Code      |          Checksum             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           Identifier          |        Sequence Number        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Data ...
//! +-+-+-+-+-
//! ```
use pnet_packet::icmp::echo_reply::EchoReplyPacket;
use pnet_packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet_packet::icmp::{IcmpCode, IcmpTypes};
use pnet_packet::Packet;

pub const ECHO_HEADER_LEN: usize = 8;
pub const ECHO_REQUEST: u8 = 8;
pub const ECHO_REPLY: u8 = 0;

/// One's-complement sum of big-endian 16-bit words with end-around carry,
/// complemented. A trailing odd byte is summed as if followed by a zero byte.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    if let [last] = words.remainder() {
        sum += u32::from(*last) << 8;
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    #[allow(clippy::cast_possible_truncation)]
    let folded = sum as u16;
    !folded
}

/// An ICMP Echo Request. Immutable once built; the checksum is derived from
/// the other fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EchoRequest {
    identifier: u16,
    sequence: u16,
    payload: Vec<u8>,
    checksum: u16,
}

impl EchoRequest {
    pub fn new(identifier: u16, sequence: u16, payload: &[u8]) -> Self {
        let unsigned = encode(identifier, sequence, 0, payload);
        EchoRequest {
            identifier,
            sequence,
            payload: payload.to_vec(),
            checksum: checksum(&unsigned),
        }
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode(self.identifier, self.sequence, self.checksum, &self.payload)
    }
}

fn encode(identifier: u16, sequence: u16, checksum: u16, payload: &[u8]) -> Vec<u8> {
    let buf = vec![0u8; EchoRequestPacket::minimum_packet_size() + payload.len()];
    let mut packet = MutableEchoRequestPacket::owned(buf).expect("buffer holds at least an echo header");
    packet.set_icmp_type(IcmpTypes::EchoRequest);
    packet.set_icmp_code(IcmpCode::new(0));
    packet.set_checksum(checksum);
    packet.set_identifier(identifier);
    packet.set_sequence_number(sequence);
    packet.set_payload(payload);
    packet.packet().to_vec()
}

/// Header + payload of an Echo Request with its checksum filled in.
pub fn build_echo_request(identifier: u16, sequence: u16, payload: &[u8]) -> Vec<u8> {
    EchoRequest::new(identifier, sequence, payload).to_bytes()
}

/// The fixed header of a received ICMP message. The IP header must already
/// be stripped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EchoReply {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
}

impl EchoReply {
    /// Type and code must be Echo Reply and the identifier must be ours.
    /// Checksum and sequence number are deliberately not compared.
    pub fn matches(&self, identifier: u16) -> bool {
        self.icmp_type == ECHO_REPLY && self.code == 0 && self.identifier == identifier
    }
}

/// Returns `None` when `bytes` is too short to hold an ICMP echo header.
pub fn parse_echo_reply(bytes: &[u8]) -> Option<EchoReply> {
    let packet = EchoReplyPacket::new(bytes)?;
    Some(EchoReply {
        icmp_type: packet.get_icmp_type().0,
        code: packet.get_icmp_code().0,
        checksum: packet.get_checksum(),
        identifier: packet.get_identifier(),
        sequence: packet.get_sequence_number(),
    })
}

pub fn is_matching_reply(reply: &EchoReply, expected_identifier: u16) -> bool {
    reply.matches(expected_identifier)
}
