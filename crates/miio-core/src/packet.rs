//! miIO packet framing.
//!
//! Every datagram starts with a fixed 32-byte header (all integers
//! big-endian):
//!
//! ```text
//! offset  size  field
//! 0       2     magic (0x2131)
//! 2       2     total packet length, header included
//! 4       4     reserved (zero)
//! 8       4     device id
//! 12      4     stamp
//! 16      16    checksum
//! 32      N     encrypted payload
//! ```
//!
//! The checksum is `md5(header[0..16] || token || payload)`, so only a peer
//! holding the token can produce or verify it.
//!
//! The hello packet used for discovery is a bare header with the length set
//! to 32 and every other byte set to `0xFF`.

use crate::{crypto::md5, discovery::DeviceIdentity, error::Error, token::Token};

/// Magic number opening every miIO packet.
pub const MAGIC: u16 = 0x2131;

/// Length of the packet header in bytes.
pub const HEADER_LEN: usize = 32;

/// Byte range of the checksum within the header.
const CHECKSUM_RANGE: std::ops::Range<usize> = 16..32;

/// Builds the 32-byte hello packet.
///
/// # Example
///
/// ```
/// use miio_core::packet::hello_packet;
///
/// let hello = hello_packet();
/// assert_eq!(&hello[..4], &[0x21, 0x31, 0x00, 0x20]);
/// assert!(hello[4..].iter().all(|&b| b == 0xff));
/// ```
pub fn hello_packet() -> [u8; HEADER_LEN] {
    let mut packet = [0xffu8; HEADER_LEN];
    packet[0..2].copy_from_slice(&MAGIC.to_be_bytes());
    packet[2..4].copy_from_slice(&(HEADER_LEN as u16).to_be_bytes());
    packet
}

/// Frames an encrypted payload into a packet addressed to `identity`.
///
/// # Errors
///
/// Returns [`Error::EncodingFailed`] if the packet would not fit the 16-bit
/// length field.
pub fn build_packet(
    token: &Token,
    identity: &DeviceIdentity,
    encrypted_payload: &[u8],
) -> Result<Vec<u8>, Error> {
    let total_len = HEADER_LEN + encrypted_payload.len();
    let length = u16::try_from(total_len).map_err(|_| {
        Error::EncodingFailed(format!("packet too large ({} bytes)", total_len))
    })?;

    let mut packet = Vec::with_capacity(total_len);
    packet.extend_from_slice(&MAGIC.to_be_bytes());
    packet.extend_from_slice(&length.to_be_bytes());
    packet.extend_from_slice(&[0u8; 4]);
    packet.extend_from_slice(&identity.device_id);
    packet.extend_from_slice(&identity.stamp);
    packet.extend_from_slice(&[0u8; 16]);
    packet.extend_from_slice(encrypted_payload);

    // Checksum goes in last, once every other header field is set.
    let checksum = checksum(&packet[..16], token, encrypted_payload);
    packet[CHECKSUM_RANGE].copy_from_slice(&checksum);

    Ok(packet)
}

/// Computes the packet checksum over the first half of the header, the
/// token and the encrypted payload.
pub fn checksum(header_prefix: &[u8], token: &Token, encrypted_payload: &[u8]) -> [u8; 16] {
    md5(&[header_prefix, token.expose(), encrypted_payload])
}

/// Returns the encrypted payload of a reply, i.e. everything after the
/// header.
///
/// # Errors
///
/// Returns [`Error::ReplyTooShort`] if the reply is shorter than a header.
pub fn payload_of(reply: &[u8]) -> Result<&[u8], Error> {
    if reply.len() < HEADER_LEN {
        return Err(Error::ReplyTooShort(reply.len()));
    }
    Ok(&reply[HEADER_LEN..])
}

/// Decoded view of a packet header.
///
/// Replies are never rejected on header contents; this view exists for
/// logging and for checking what the client produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Magic number (0x2131 for well-formed packets).
    pub magic: u16,
    /// Declared total length.
    pub length: u16,
    /// Reserved word.
    pub reserved: u32,
    /// Device identity echoed in the header.
    pub identity: DeviceIdentity,
    /// Checksum field.
    pub checksum: [u8; 16],
}

impl PacketHeader {
    /// Parses the first 32 bytes of `data`.
    ///
    /// Returns `None` if fewer than 32 bytes are available.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let header: &[u8; HEADER_LEN] = data.get(..HEADER_LEN)?.try_into().ok()?;

        let mut device_id = [0u8; 4];
        let mut stamp = [0u8; 4];
        let mut checksum = [0u8; 16];
        device_id.copy_from_slice(&header[8..12]);
        stamp.copy_from_slice(&header[12..16]);
        checksum.copy_from_slice(&header[CHECKSUM_RANGE]);

        Some(Self {
            magic: u16::from_be_bytes([header[0], header[1]]),
            length: u16::from_be_bytes([header[2], header[3]]),
            reserved: u32::from_be_bytes([header[4], header[5], header[6], header[7]]),
            identity: DeviceIdentity { device_id, stamp },
            checksum,
        })
    }

    /// Returns `true` if the checksum matches `token` and the payload that
    /// followed this header in `packet`.
    pub fn verify(&self, packet: &[u8], token: &Token) -> bool {
        match payload_of(packet) {
            Ok(payload) => checksum(&packet[..16], token, payload) == self.checksum,
            Err(_) => false,
        }
    }
}
