//! Network transport for the two channels of a session.
//!
//! RTSP uses a split transport model:
//!
//! - **TCP** ([`tcp`]): reliable, ordered request/reply signaling. A
//!   dedicated thread runs the reply loop; requests are written from the
//!   caller's thread.
//!
//! - **UDP** ([`udp`]): unreliable RTP media. A dedicated thread polls the
//!   socket with a bounded wait and feeds accepted frames to the renderer.
//!
//! Each socket is owned by exactly one side and closed exactly once;
//! repeated closes are no-ops.

pub mod tcp;
pub mod udp;

pub use tcp::{ControlReader, ControlWriter};
pub use udp::DataReceiver;
