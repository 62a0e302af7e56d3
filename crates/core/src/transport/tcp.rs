use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::client::Shared;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::protocol::{ReplyFramer, RtspReply, RtspRequest};

const READ_CHUNK: usize = 1024;

/// Open the control connection and split it into its two halves.
pub fn connect(config: &ClientConfig) -> Result<(ControlWriter, ControlReader)> {
    let addr = &config.server_addr;
    let stream = match config.connect_timeout {
        Some(timeout) => {
            let target = addr
                .to_socket_addrs()
                .map_err(|e| ClientError::connect(addr, e))?
                .next()
                .ok_or_else(|| ClientError::Unresolved(addr.clone()))?;
            TcpStream::connect_timeout(&target, timeout)
        }
        None => TcpStream::connect(addr),
    }
    .map_err(|e| ClientError::connect(addr, e))?;

    let peer_addr = stream.peer_addr()?;
    let reader_stream = stream.try_clone()?;
    tracing::info!(%peer_addr, "control channel connected");

    Ok((
        ControlWriter {
            stream: Mutex::new(stream),
            closed: AtomicBool::new(false),
        },
        ControlReader {
            stream: reader_stream,
            framer: ReplyFramer::new(),
            buf: [0u8; READ_CHUNK],
        },
    ))
}

/// Sending half of the control connection.
///
/// Writes are serialized so a request issued by the control thread (the
/// TEARDOWN synthesized after a not-found reply) cannot interleave with
/// one issued by the caller.
pub struct ControlWriter {
    stream: Mutex<TcpStream>,
    closed: AtomicBool,
}

impl ControlWriter {
    /// Transmit one request. Fire-and-forget: the reply is handled by
    /// [`receive_loop`].
    pub fn send(&self, request: &RtspRequest) -> Result<()> {
        let wire = request.serialize();
        self.stream.lock().write_all(wire.as_bytes())?;
        tracing::debug!(method = %request.method, cseq = request.cseq, "request sent");
        Ok(())
    }

    /// Shut the connection down in both directions, waking the reader.
    /// Later calls are no-ops.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.stream.lock().shutdown(Shutdown::Both) {
            Ok(()) => tracing::debug!("control channel closed"),
            Err(e) if e.kind() == ErrorKind::NotConnected => {}
            Err(e) => tracing::debug!(error = %e, "control channel shutdown failed"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Receiving half of the control connection.
pub struct ControlReader {
    stream: TcpStream,
    framer: ReplyFramer,
    buf: [u8; READ_CHUNK],
}

impl ControlReader {
    /// Block until the next complete reply record arrives.
    ///
    /// Returns `Ok(None)` once the server closed the connection and no
    /// buffered bytes remain. A malformed record yields
    /// [`ClientError::Parse`]; the reader stays usable.
    pub fn next_reply(&mut self) -> Result<Option<RtspReply>> {
        loop {
            if let Some(record) = self
                .framer
                .next_record()
                .or_else(|| self.framer.take_unterminated())
            {
                return RtspReply::parse(&record).map(Some);
            }

            let n = match self.stream.read(&mut self.buf) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if n == 0 {
                return match self.framer.finish() {
                    Some(record) => RtspReply::parse(&record).map(Some),
                    None => Ok(None),
                };
            }
            self.framer.push(&self.buf[..n]);
        }
    }
}

/// Control receive loop (one thread per client).
///
/// Hands every reply to the session and exits once the last request sent
/// was TEARDOWN and it has been answered, or when the connection ends.
/// The connection is closed on exit.
pub(crate) fn receive_loop(mut reader: ControlReader, shared: Arc<Shared>) {
    let reason = loop {
        match reader.next_reply() {
            Ok(Some(reply)) => {
                tracing::debug!(
                    status = reply.status_code,
                    cseq = reply.cseq,
                    session = ?reply.session,
                    "reply"
                );
                if shared.handle_reply(&reply) {
                    break "teardown answered";
                }
            }
            Ok(None) if shared.control.is_closed() => break "control channel closed locally",
            Ok(None) => break "connection closed by server",
            Err(ClientError::Parse { kind }) => {
                tracing::warn!(%kind, "dropping malformed reply");
            }
            Err(e) => {
                if shared.control.is_closed() {
                    break "control channel closed locally";
                }
                tracing::warn!(error = %e, "control channel read failed");
                break "read error";
            }
        }
    };

    shared.control.close();
    tracing::info!(reason, "control receive loop exited");
}
