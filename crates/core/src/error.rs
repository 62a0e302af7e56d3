//! Error types for the RTSP client library.

use std::fmt;
use std::net::SocketAddr;

/// Errors that can occur in the RTSP client library.
///
/// Variants map to specific failure modes across the stack:
///
/// - **Connection**: [`Connect`](Self::Connect), [`Bind`](Self::Bind): a
///   socket could not be established. Fatal to the session, never retried.
/// - **Transport**: [`Io`](Self::Io): socket/network failures after setup.
/// - **Control channel**: [`Parse`](Self::Parse): malformed reply record.
/// - **Data channel**: [`Decode`](Self::Decode): malformed RTP datagram.
/// - **Media source**: [`Frame`](Self::Frame): corrupt length prefix in a
///   [`VideoStream`](crate::media::stream::VideoStream) file.
///
/// Protocol mismatches (stale CSeq, foreign session, non-200 status) are not
/// errors; they surface as [`ReplyOutcome::Ignored`](crate::session::ReplyOutcome::Ignored).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The control connection to the server could not be established.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The local RTP socket could not be bound.
    #[error("failed to bind RTP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The configured server address did not resolve to any socket address.
    #[error("server address did not resolve: {0}")]
    Unresolved(String),

    /// Failed to parse an RTSP reply record.
    #[error("RTSP parse error: {kind}")]
    Parse { kind: ParseErrorKind },

    /// Failed to decode an RTP datagram (RFC 3550 §5.1).
    #[error("RTP decode error: {kind}")]
    Decode { kind: DecodeErrorKind },

    /// A media source record had a malformed length prefix.
    #[error("invalid frame record: {0}")]
    Frame(String),
}

/// Specific kind of RTSP reply parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input was empty (no status line).
    EmptyReply,
    /// Status line did not have the expected `Version Code Text` format.
    InvalidStatusLine,
    /// A header line did not contain a colon separator.
    InvalidHeader,
    /// The reply carried no (numeric) CSeq header.
    MissingCSeq,
    /// The Session header value was not an integer.
    InvalidSessionId,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyReply => write!(f, "empty reply"),
            Self::InvalidStatusLine => write!(f, "invalid status line"),
            Self::InvalidHeader => write!(f, "invalid header"),
            Self::MissingCSeq => write!(f, "missing CSeq"),
            Self::InvalidSessionId => write!(f, "invalid session id"),
        }
    }
}

/// Specific kind of RTP decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Datagram shorter than the header it claims to carry.
    Truncated { needed: usize, actual: usize },
    /// Padding count exceeds the bytes left after the header.
    InvalidPadding,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, actual } => {
                write!(f, "truncated datagram: need {needed} bytes, got {actual}")
            }
            Self::InvalidPadding => write!(f, "invalid padding length"),
        }
    }
}

impl ClientError {
    pub(crate) fn parse(kind: ParseErrorKind) -> Self {
        Self::Parse { kind }
    }

    pub(crate) fn decode(kind: DecodeErrorKind) -> Self {
        Self::Decode { kind }
    }

    pub(crate) fn connect(addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connect {
            addr: addr.into(),
            source,
        }
    }

    pub(crate) fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind {
            port: addr.port(),
            source,
        }
    }
}

/// Convenience alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;
