use std::fmt;

/// RTSP methods the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Setup,
    Play,
    Pause,
    Teardown,
    Describe,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "SETUP",
            Self::Play => "PLAY",
            Self::Pause => "PAUSE",
            Self::Teardown => "TEARDOWN",
            Self::Describe => "DESCRIBE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one method-specific header line each request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodHeader {
    /// SETUP: `Transport: <transport>; client_port: <port>`.
    Transport { transport: String, client_port: u16 },
    /// Everything else: `Session: <id>`.
    Session(u64),
}

impl fmt::Display for MethodHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport {
                transport,
                client_port,
            } => write!(f, "Transport: {transport}; client_port: {client_port}"),
            Self::Session(id) => write!(f, "Session: {id}"),
        }
    }
}

/// An outgoing RTSP request.
///
/// Serializes to the line-oriented wire format:
///
/// ```text
/// SETUP movie.Mjpeg RTSP/1.0\n
/// CSeq: 1\n
/// Transport: RTP/UDP; client_port: 25000\n
/// \n
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct RtspRequest {
    pub method: Method,
    pub resource: String,
    pub version: String,
    pub cseq: u32,
    pub header: MethodHeader,
}

impl RtspRequest {
    /// Serialize to the wire format. The record ends with an empty line.
    pub fn serialize(&self) -> String {
        format!(
            "{} {} {}\nCSeq: {}\n{}\n\n",
            self.method, self.resource, self.version, self.cseq, self.header
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_setup() {
        let req = RtspRequest {
            method: Method::Setup,
            resource: "movie.Mjpeg".to_string(),
            version: "RTSP/1.0".to_string(),
            cseq: 1,
            header: MethodHeader::Transport {
                transport: "RTP/UDP".to_string(),
                client_port: 25000,
            },
        };
        assert_eq!(
            req.serialize(),
            "SETUP movie.Mjpeg RTSP/1.0\nCSeq: 1\nTransport: RTP/UDP; client_port: 25000\n\n"
        );
    }

    #[test]
    fn serialize_play_carries_session() {
        let req = RtspRequest {
            method: Method::Play,
            resource: "movie.Mjpeg".to_string(),
            version: "RTSP/1.0".to_string(),
            cseq: 2,
            header: MethodHeader::Session(77),
        };
        let s = req.serialize();
        assert!(s.starts_with("PLAY movie.Mjpeg RTSP/1.0\n"));
        assert!(s.contains("CSeq: 2\n"));
        assert!(s.contains("Session: 77\n"));
        assert!(s.ends_with("\n\n"));
    }

    #[test]
    fn method_names() {
        assert_eq!(Method::Teardown.to_string(), "TEARDOWN");
        assert_eq!(Method::Describe.as_str(), "DESCRIBE");
    }
}
