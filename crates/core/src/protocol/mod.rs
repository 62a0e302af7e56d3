//! RTSP control-channel wire format.
//!
//! The client speaks a line-oriented subset of RTSP (RFC 2326) over TCP.
//!
//! ## Requests
//!
//! ```text
//! PLAY movie.Mjpeg RTSP/1.0\n
//! CSeq: 2\n
//! Session: 77\n
//! \n
//! ```
//!
//! SETUP carries `Transport: RTP/UDP; client_port: <port>` in place of the
//! `Session` line.
//!
//! ## Replies
//!
//! ```text
//! RTSP/1.0 200 OK\n
//! CSeq: 2\n
//! Session: 77\n
//! \n
//! ```
//!
//! Replies are correlated to requests purely by CSeq (RFC 2326 §12.17).
//! A DESCRIBE reply additionally carries a `Content-Length` body whose
//! last two lines name the protocol and media type.
//!
//! | Method | RFC section | Purpose |
//! |--------|-------------|---------|
//! | DESCRIBE | §10.2 | Report stream metadata |
//! | SETUP | §10.4 | Negotiate the RTP port, obtain a session id |
//! | PLAY | §10.5 | Start media delivery |
//! | PAUSE | §10.6 | Suspend media delivery |
//! | TEARDOWN | §10.7 | Destroy session |

pub mod framing;
pub mod request;
pub mod response;

pub use framing::ReplyFramer;
pub use request::{Method, MethodHeader, RtspRequest};
pub use response::{DescribeInfo, RtspReply};
