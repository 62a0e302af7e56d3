use crate::error::{ClientError, DecodeErrorKind, Result};

/// Size of the RTP fixed header (RFC 3550 §5.1), without CSRCs or extension.
pub const RTP_HEADER_LEN: usize = 12;

/// Decoded RTP fixed header (RFC 3550 §5.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             SSRC                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Only `sequence_number` drives the receive pipeline; the remaining
/// fields are decoded so callers can inspect them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpHeader {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub csrc_count: u8,
    pub marker: bool,
    /// RTP payload type (7-bit, RFC 3551). MJPEG is 26.
    pub payload_type: u8,
    /// 16-bit, wraps modulo 65536.
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

/// A decoded RTP datagram borrowing its payload from the receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket<'a> {
    pub header: RtpHeader,
    /// Media bytes after the header, CSRC list and extension, with any
    /// trailing padding removed.
    pub payload: &'a [u8],
}

impl<'a> RtpPacket<'a> {
    /// Decode one datagram.
    ///
    /// Fails fast with [`DecodeErrorKind::Truncated`] when the buffer is
    /// shorter than the fixed header, or shorter than the CSRC list and
    /// header extension the fixed header announces.
    pub fn decode(buf: &'a [u8]) -> Result<Self> {
        let truncated = |needed: usize| {
            ClientError::decode(DecodeErrorKind::Truncated {
                needed,
                actual: buf.len(),
            })
        };

        if buf.len() < RTP_HEADER_LEN {
            return Err(truncated(RTP_HEADER_LEN));
        }

        let header = RtpHeader {
            version: buf[0] >> 6,
            padding: buf[0] & 0x20 != 0,
            extension: buf[0] & 0x10 != 0,
            csrc_count: buf[0] & 0x0f,
            marker: buf[1] & 0x80 != 0,
            payload_type: buf[1] & 0x7f,
            sequence_number: u16::from_be_bytes([buf[2], buf[3]]),
            timestamp: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            ssrc: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
        };

        let mut offset = RTP_HEADER_LEN + 4 * header.csrc_count as usize;
        if buf.len() < offset {
            return Err(truncated(offset));
        }

        // Extension header (RFC 3550 §5.3.1): profile id, then length in 32-bit words.
        if header.extension {
            if buf.len() < offset + 4 {
                return Err(truncated(offset + 4));
            }
            let words = u16::from_be_bytes([buf[offset + 2], buf[offset + 3]]) as usize;
            offset += 4 + 4 * words;
            if buf.len() < offset {
                return Err(truncated(offset));
            }
        }

        let mut end = buf.len();
        if header.padding {
            let pad = buf[end - 1] as usize;
            if pad == 0 || pad > end - offset {
                return Err(ClientError::decode(DecodeErrorKind::InvalidPadding));
            }
            end -= pad;
        }

        Ok(Self {
            header,
            payload: &buf[offset..end],
        })
    }

    pub fn sequence_number(&self) -> u16 {
        self.header.sequence_number
    }
}

/// RTP header writer for the sending side.
///
/// Manages per-stream state:
/// - **Sequence number**: 16-bit, wrapping, incremented on every packet.
/// - **Timestamp**: u64 internally, lower 32 bits on the wire.
/// - **SSRC**: random per RFC 3550 §8.1 unless given explicitly.
///
/// Version is always 2. Padding, extension, and CSRC count are always 0.
#[derive(Debug)]
pub struct RtpSequencer {
    pub payload_type: u8,
    pub ssrc: u32,
    sequence: u16,
    timestamp: u64,
}

impl RtpSequencer {
    pub fn new(payload_type: u8, ssrc: u32, first_sequence: u16) -> Self {
        tracing::debug!(
            payload_type,
            ssrc = format_args!("{:#010X}", ssrc),
            first_sequence,
            "RTP sequencer created"
        );
        Self {
            payload_type,
            ssrc,
            sequence: first_sequence,
            timestamp: 0,
        }
    }

    /// Create with a random SSRC, starting at sequence number 1.
    pub fn with_random_ssrc(payload_type: u8) -> Self {
        Self::new(payload_type, rand::random::<u32>(), 1)
    }

    /// Sequence number the next [`packet`](Self::packet) call will carry.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Jump to an arbitrary sequence number (e.g. to simulate loss).
    pub fn set_sequence(&mut self, sequence: u16) {
        self.sequence = sequence;
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Serialize a 12-byte header and advance the sequence number.
    pub fn write_header(&mut self, marker: bool) -> [u8; RTP_HEADER_LEN] {
        let mut header = [0u8; RTP_HEADER_LEN];
        header[0] = 2 << 6;
        header[1] = ((marker as u8) << 7) | (self.payload_type & 0x7f);
        header[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        header[4..8].copy_from_slice(&(self.timestamp as u32).to_be_bytes());
        header[8..12].copy_from_slice(&self.ssrc.to_be_bytes());

        self.sequence = self.sequence.wrapping_add(1);
        header
    }

    /// Build a complete datagram (header + payload) for one frame.
    pub fn packet(&mut self, payload: &[u8], marker: bool) -> Vec<u8> {
        let mut datagram = Vec::with_capacity(RTP_HEADER_LEN + payload.len());
        datagram.extend_from_slice(&self.write_header(marker));
        datagram.extend_from_slice(payload);
        datagram
    }

    pub fn advance_timestamp(&mut self, increment: u32) {
        self.timestamp = self.timestamp.wrapping_add(increment as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datagram(seq: u16, payload: &[u8]) -> Vec<u8> {
        RtpSequencer::new(26, 0xAABBCCDD, seq).packet(payload, true)
    }

    #[test]
    fn decodes_fixed_header_fields() {
        let mut seq = RtpSequencer::new(26, 0xAABBCCDD, 7);
        seq.advance_timestamp(3000);
        let buf = seq.packet(b"jpeg", true);

        let pkt = RtpPacket::decode(&buf).unwrap();
        assert_eq!(pkt.header.version, 2);
        assert!(!pkt.header.padding);
        assert!(!pkt.header.extension);
        assert_eq!(pkt.header.csrc_count, 0);
        assert!(pkt.header.marker);
        assert_eq!(pkt.header.payload_type, 26);
        assert_eq!(pkt.sequence_number(), 7);
        assert_eq!(pkt.header.timestamp, 3000);
        assert_eq!(pkt.header.ssrc, 0xAABBCCDD);
        assert_eq!(pkt.payload, b"jpeg");
    }

    #[test]
    fn header_only_datagram_has_empty_payload() {
        let buf = datagram(1, b"");
        let pkt = RtpPacket::decode(&buf).unwrap();
        assert!(pkt.payload.is_empty());
    }

    #[test]
    fn truncated_header_fails() {
        let err = RtpPacket::decode(&[0x80, 26, 0, 1]).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Decode {
                kind: DecodeErrorKind::Truncated {
                    needed: 12,
                    actual: 4
                }
            }
        ));
        assert!(RtpPacket::decode(&[]).is_err());
    }

    #[test]
    fn csrc_list_is_skipped() {
        let mut buf = datagram(3, b"");
        buf[0] |= 0x02;
        buf.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 2]);
        buf.extend_from_slice(b"data");

        let pkt = RtpPacket::decode(&buf).unwrap();
        assert_eq!(pkt.header.csrc_count, 2);
        assert_eq!(pkt.payload, b"data");
    }

    #[test]
    fn csrc_list_longer_than_datagram_fails() {
        let mut buf = datagram(3, b"");
        buf[0] |= 0x03;
        assert!(matches!(
            RtpPacket::decode(&buf),
            Err(ClientError::Decode {
                kind: DecodeErrorKind::Truncated { needed: 24, .. }
            })
        ));
    }

    #[test]
    fn extension_is_skipped() {
        let mut buf = datagram(4, b"");
        buf[0] |= 0x10;
        buf.extend_from_slice(&[0xBE, 0xDE, 0x00, 0x01, 1, 2, 3, 4]);
        buf.extend_from_slice(b"xyz");

        let pkt = RtpPacket::decode(&buf).unwrap();
        assert!(pkt.header.extension);
        assert_eq!(pkt.payload, b"xyz");
    }

    #[test]
    fn padding_is_stripped() {
        let mut buf = datagram(5, b"abc");
        buf[0] |= 0x20;
        buf.extend_from_slice(&[0, 0, 3]);

        let pkt = RtpPacket::decode(&buf).unwrap();
        assert_eq!(pkt.payload, b"abc");
    }

    #[test]
    fn oversized_padding_fails() {
        let mut buf = datagram(5, b"a");
        buf[0] |= 0x20;
        buf.push(9);
        assert!(matches!(
            RtpPacket::decode(&buf),
            Err(ClientError::Decode {
                kind: DecodeErrorKind::InvalidPadding
            })
        ));
    }

    #[test]
    fn sequencer_wraps() {
        let mut s = RtpSequencer::new(26, 1, u16::MAX);
        let first = s.packet(b"", false);
        assert_eq!(RtpPacket::decode(&first).unwrap().sequence_number(), u16::MAX);
        assert_eq!(s.sequence(), 0);
    }

    #[test]
    fn random_ssrc_differs() {
        let a = RtpSequencer::with_random_ssrc(26);
        let b = RtpSequencer::with_random_ssrc(26);
        assert_ne!(a.ssrc, b.ssrc);
        assert_eq!(a.sequence(), 1);
    }
}
