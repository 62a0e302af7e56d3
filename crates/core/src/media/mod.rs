//! Media packet codec and frame source.
//!
//! ## RTP overview (RFC 3550)
//!
//! Every datagram on the data channel is one RTP packet: a 12-byte fixed
//! header ([`rtp::RtpHeader`]) followed by the payload for one media frame.
//! The header carries:
//!
//! - **Sequence number** (16-bit, wrapping): ordering and loss detection.
//! - **Timestamp** (32-bit): media clock.
//! - **SSRC** (32-bit): identifies the sender.
//! - **Marker bit**: last packet of a frame.
//!
//! The client only decodes ([`rtp::RtpPacket::decode`]). The encoder
//! ([`rtp::RtpSequencer`]) and the length-prefixed file reader
//! ([`stream::VideoStream`]) belong to the serving side and are used by
//! test servers.

pub mod rtp;
pub mod stream;

pub use rtp::{RtpHeader, RtpPacket, RtpSequencer};
pub use stream::VideoStream;
