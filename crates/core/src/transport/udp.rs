use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Instant;

use crate::client::Shared;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::media::RtpPacket;
use crate::session::SessionState;
use crate::stats::Acceptance;

/// Owner of the RTP socket.
///
/// Bound when SETUP is acknowledged and parked until PLAY starts a receive
/// thread. [`run`](Self::run) hands the receiver back on pause so the next
/// PLAY reuses the same socket; on teardown it is dropped, which closes
/// the socket.
pub struct DataReceiver {
    socket: UdpSocket,
    buf: Vec<u8>,
    local_addr: SocketAddr,
}

impl DataReceiver {
    /// Bind the RTP socket with the configured poll timeout.
    pub fn bind(config: &ClientConfig) -> Result<Self> {
        let addr = config.rtp_bind_addr();
        let socket = UdpSocket::bind(addr).map_err(|e| ClientError::bind(addr, e))?;
        socket.set_read_timeout(Some(config.receive_timeout))?;
        let local_addr = socket.local_addr()?;

        tracing::info!(%local_addr, "RTP socket bound");
        Ok(Self {
            socket,
            buf: vec![0u8; config.datagram_capacity],
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receive until pause or teardown is signalled.
    ///
    /// Signals are checked only after a receive times out or fails, never
    /// while a datagram is being handled. Returns `Some(self)` on pause and
    /// `None` on teardown (socket closed).
    pub(crate) fn run(mut self, shared: &Shared) -> Option<Self> {
        tracing::debug!(local_addr = %self.local_addr, "RTP receive loop started");
        loop {
            let edge = match self.socket.recv(&mut self.buf) {
                Ok(len) => {
                    handle_datagram(&self.buf[..len], shared);
                    continue;
                }
                Err(e) => e,
            };

            if !matches!(edge.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) {
                tracing::trace!(error = %edge, "RTP receive error");
            }

            if shared.signals.teardown_acknowledged() {
                tracing::info!(local_addr = %self.local_addr, "RTP receiver closing after teardown");
                return None;
            }
            if shared.signals.pause_requested() {
                tracing::debug!("RTP receive loop paused");
                return Some(self);
            }
        }
    }
}

/// Decode one datagram, update statistics and forward accepted frames.
fn handle_datagram(datagram: &[u8], shared: &Shared) {
    let packet = match RtpPacket::decode(datagram) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::trace!(error = %e, bytes = datagram.len(), "dropping undecodable datagram");
            return;
        }
    };

    let seq = packet.sequence_number();
    if shared.session.lock().state() != SessionState::Playing {
        tracing::trace!(seq, "datagram outside PLAYING dropped");
        return;
    }

    let verdict = {
        let mut stats = shared.stats.lock();
        stats.record_datagram(seq, datagram.len(), Instant::now());
        stats.accept(seq)
    };

    match verdict {
        Acceptance::Accepted { loss } => {
            if loss {
                tracing::debug!(seq, "sequence gap before accepted packet");
            }
            tracing::trace!(seq, bytes = packet.payload.len(), "frame accepted");
            shared.listener.on_frame(seq, packet.payload);
        }
        Acceptance::Stale => tracing::trace!(seq, "stale packet discarded"),
    }
}

/// Body of the RTP receive thread.
pub(crate) fn receive_loop(receiver: DataReceiver, shared: Arc<Shared>) {
    let Some(receiver) = receiver.run(&shared) else {
        return;
    };

    // Teardown may have been acknowledged while this thread was winding
    // down on pause; the parked slot lock orders the two.
    let mut parked = shared.parked.lock();
    if shared.signals.teardown_acknowledged() {
        drop(receiver);
        tracing::info!("RTP receiver closed after teardown");
    } else {
        *parked = Some(receiver);
    }
}
