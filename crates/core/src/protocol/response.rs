use crate::error::{ClientError, ParseErrorKind, Result};

/// Status code of a successful reply (RFC 2326 §7.1.1).
pub const STATUS_OK: u16 = 200;

/// Status code the server uses when the requested resource does not exist.
pub const STATUS_NOT_FOUND: u16 = 404;

/// Metadata a server reports in a DESCRIBE reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeInfo {
    pub protocol: String,
    pub media_type: String,
}

/// A parsed RTSP reply.
///
/// ```text
/// RTSP/1.0 200 OK\n
/// CSeq: 2\n
/// Session: 77\n
/// Content-Length: 43\n
/// \n
/// v=0\n...
/// ```
///
/// Header lookup is case-insensitive per RFC 2326 §4.2. The body is
/// whatever followed the empty line in the framed record.
#[derive(Debug, Clone)]
pub struct RtspReply {
    pub version: String,
    pub status_code: u16,
    pub status_text: String,
    /// Headers as ordered (name, value) pairs.
    pub headers: Vec<(String, String)>,
    pub cseq: u32,
    /// Session id with any `;timeout=` suffix removed. `None` when the
    /// server omitted the header.
    pub session: Option<u64>,
    pub body: String,
}

impl RtspReply {
    /// Parse one framed reply record.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut lines = raw.lines().skip_while(|line| line.trim().is_empty());

        let status_line = lines
            .next()
            .ok_or(ClientError::parse(ParseErrorKind::EmptyReply))?;

        let mut parts = status_line.trim().splitn(3, ' ');
        let version = parts.next().unwrap_or_default().to_string();
        let status_code: u16 = parts
            .next()
            .and_then(|code| code.trim().parse().ok())
            .ok_or(ClientError::parse(ParseErrorKind::InvalidStatusLine))?;
        let status_text = parts.next().unwrap_or_default().trim().to_string();

        let mut headers = Vec::new();
        for line in lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or(ClientError::parse(ParseErrorKind::InvalidHeader))?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        let body: Vec<&str> = lines.collect();
        let body = body.join("\n");

        let find = |name: &str| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        };

        let cseq = find("CSeq")
            .and_then(|v| v.parse().ok())
            .ok_or(ClientError::parse(ParseErrorKind::MissingCSeq))?;

        let session = match find("Session") {
            Some(value) => Some(
                value
                    .split(';')
                    .next()
                    .unwrap_or(value)
                    .trim()
                    .parse()
                    .map_err(|_| ClientError::parse(ParseErrorKind::InvalidSessionId))?,
            ),
            None => None,
        };

        if !version.starts_with("RTSP/") {
            tracing::warn!(version, "server sent non-RTSP version token");
        }

        Ok(Self {
            version,
            status_code,
            status_text,
            headers,
            cseq,
            session,
            body,
        })
    }

    /// Look up a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    /// Whether the server reports that the requested resource is missing.
    pub fn is_not_found(&self) -> bool {
        if self.status_code == STATUS_NOT_FOUND {
            return true;
        }
        let text = self.status_text.to_ascii_uppercase();
        text.contains("NOT_FOUND") || text.contains("NOT FOUND")
    }

    /// Protocol and media type from a DESCRIBE body.
    ///
    /// Taken from the last two non-empty body lines with their 2-character
    /// prefix (e.g. `a=`) removed.
    pub fn describe_info(&self) -> Option<DescribeInfo> {
        let lines: Vec<&str> = self
            .body
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();

        let [.., protocol, media_type] = lines.as_slice() else {
            return None;
        };

        Some(DescribeInfo {
            protocol: protocol.get(2..)?.to_string(),
            media_type: media_type.get(2..)?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_setup_reply() {
        let reply = RtspReply::parse("RTSP/1.0 200 OK\nCSeq: 1\nSession: 77\n\n").unwrap();
        assert_eq!(reply.version, "RTSP/1.0");
        assert_eq!(reply.status_code, 200);
        assert_eq!(reply.status_text, "OK");
        assert_eq!(reply.cseq, 1);
        assert_eq!(reply.session, Some(77));
        assert!(reply.is_success());
        assert!(reply.body.is_empty());
    }

    #[test]
    fn parse_crlf_and_timeout_suffix() {
        let raw = "RTSP/1.0 200 OK\r\ncseq: 4\r\nSession: 123456;timeout=60\r\n\r\n";
        let reply = RtspReply::parse(raw).unwrap();
        assert_eq!(reply.cseq, 4);
        assert_eq!(reply.session, Some(123456));
        assert_eq!(reply.get_header("CSEQ"), Some("4"));
    }

    #[test]
    fn missing_session_header_is_none() {
        let reply = RtspReply::parse("RTSP/1.0 200 OK\nCSeq: 3\n\n").unwrap();
        assert_eq!(reply.session, None);
    }

    #[test]
    fn describe_info_from_body() {
        let raw = "RTSP/1.0 200 OK\nCSeq: 5\nSession: 77\nContent-Length: 40\n\n\
                   v=0\nm=video 25000 RTP/UDP 26\na=RTSP/1.0\na=Mjpeg\n";
        let reply = RtspReply::parse(raw).unwrap();
        assert_eq!(
            reply.describe_info(),
            Some(DescribeInfo {
                protocol: "RTSP/1.0".to_string(),
                media_type: "Mjpeg".to_string(),
            })
        );
    }

    #[test]
    fn describe_info_needs_two_lines() {
        let reply = RtspReply::parse("RTSP/1.0 200 OK\nCSeq: 5\nSession: 7\n\na=x\n").unwrap();
        assert_eq!(reply.describe_info(), None);
    }

    #[test]
    fn not_found_by_code_or_text() {
        let by_code = RtspReply::parse("RTSP/1.0 404 Not Found\nCSeq: 2\n\n").unwrap();
        assert!(by_code.is_not_found());
        assert_eq!(by_code.status_text, "Not Found");

        let by_text = RtspReply::parse("RTSP/1.0 500 FILE_NOT_FOUND\nCSeq: 2\n\n").unwrap();
        assert!(by_text.is_not_found());

        let ok = RtspReply::parse("RTSP/1.0 200 OK\nCSeq: 2\n\n").unwrap();
        assert!(!ok.is_not_found());
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            RtspReply::parse(""),
            Err(ClientError::Parse {
                kind: ParseErrorKind::EmptyReply
            })
        ));
        assert!(matches!(
            RtspReply::parse("RTSP/1.0 OK\nCSeq: 1\n\n"),
            Err(ClientError::Parse {
                kind: ParseErrorKind::InvalidStatusLine
            })
        ));
        assert!(matches!(
            RtspReply::parse("RTSP/1.0 200 OK\nno colon here\n\n"),
            Err(ClientError::Parse {
                kind: ParseErrorKind::InvalidHeader
            })
        ));
        assert!(matches!(
            RtspReply::parse("RTSP/1.0 200 OK\nSession: 1\n\n"),
            Err(ClientError::Parse {
                kind: ParseErrorKind::MissingCSeq
            })
        ));
        assert!(matches!(
            RtspReply::parse("RTSP/1.0 200 OK\nCSeq: 1\nSession: abc\n\n"),
            Err(ClientError::Parse {
                kind: ParseErrorKind::InvalidSessionId
            })
        ));
    }
}
