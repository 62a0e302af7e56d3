/// Splits the control-channel byte stream into reply records.
///
/// A record is a header block terminated by an empty line (`\n\n` or
/// `\r\n\r\n`), plus `Content-Length` body bytes when that header is
/// present. Servers that end a reply after its last header line are
/// handled by [`take_unterminated`](Self::take_unterminated).
///
/// Bytes arrive in arbitrary chunks; [`push`](Self::push) buffers them and
/// [`next_record`](Self::next_record) yields complete records.
#[derive(Debug, Default)]
pub struct ReplyFramer {
    buf: Vec<u8>,
}

impl ReplyFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes buffered but not yet returned as a record.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Extract the next complete record, if one is buffered.
    pub fn next_record(&mut self) -> Option<String> {
        let start = self
            .buf
            .iter()
            .position(|b| !matches!(b, b'\r' | b'\n'))?;
        if start > 0 {
            self.buf.drain(..start);
        }

        let header_end = find_header_end(&self.buf)?;
        let header_text = String::from_utf8_lossy(&self.buf[..header_end]);
        let body_len = content_length(&header_text).unwrap_or(0);

        let total = header_end + body_len;
        if self.buf.len() < total {
            return None;
        }

        let record: Vec<u8> = self.buf.drain(..total).collect();
        Some(String::from_utf8_lossy(&record).into_owned())
    }

    /// Take a reply the server sent without a closing empty line.
    ///
    /// Only called once a read has returned and no terminated record is
    /// buffered. The buffer must start with a status line and end with a
    /// newline, carry `CSeq` and `Session` headers, and have no
    /// `Content-Length`. Lines after the header block (DESCRIBE metadata)
    /// become the body; a second status line starts the next record.
    pub fn take_unterminated(&mut self) -> Option<String> {
        let start = self
            .buf
            .iter()
            .position(|b| !matches!(b, b'\r' | b'\n'))?;
        if self.buf.last() != Some(&b'\n') {
            return None;
        }

        let text = std::str::from_utf8(&self.buf[start..]).ok()?.to_owned();
        let mut lines = text.split_inclusive('\n');
        let status = lines.next()?;
        if !status.starts_with("RTSP/") {
            return None;
        }

        let mut consumed = start + status.len();
        let mut headers = vec![status.trim_end()];
        let mut body = Vec::new();
        for line in lines {
            if line.starts_with("RTSP/") {
                break;
            }
            consumed += line.len();
            match header_name(line) {
                Some(_) if body.is_empty() => headers.push(line.trim_end()),
                _ => body.push(line.trim_end()),
            }
        }

        let has = |name: &str| {
            headers[1..]
                .iter()
                .any(|line| header_name(line).is_some_and(|key| key.eq_ignore_ascii_case(name)))
        };
        if !has("CSeq") || !has("Session") || has("Content-Length") {
            return None;
        }

        self.buf.drain(..consumed);
        let mut record = headers.join("\n");
        record.push_str("\n\n");
        record.push_str(&body.join("\n"));
        Some(record)
    }

    /// Flush whatever is buffered once the peer closed the stream.
    pub fn finish(&mut self) -> Option<String> {
        if let Some(record) = self.next_record() {
            return Some(record);
        }
        let rest = std::mem::take(&mut self.buf);
        let text = String::from_utf8_lossy(&rest);
        if text.trim().is_empty() {
            None
        } else {
            Some(text.into_owned())
        }
    }
}

/// Index just past the empty line that ends the header block.
fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).enumerate().find_map(|(i, w)| match w {
        [b'\n', b'\n'] => Some(i + 2),
        [b'\n', b'\r'] if buf.get(i + 2) == Some(&b'\n') => Some(i + 3),
        _ => None,
    })
}

/// Name of a `Name: value` header line, if `line` is one.
fn header_name(line: &str) -> Option<&str> {
    let (name, _) = line.split_once(':')?;
    let name = name.trim();
    let token = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    token.then_some(name)
}

fn content_length(headers: &str) -> Option<usize> {
    headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("Content-Length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_back_to_back_records() {
        let mut framer = ReplyFramer::new();
        framer.push(b"RTSP/1.0 200 OK\nCSeq: 1\nSession: 7\n\nRTSP/1.0 200 OK\nCSeq: 2\n");
        assert_eq!(
            framer.next_record().unwrap(),
            "RTSP/1.0 200 OK\nCSeq: 1\nSession: 7\n\n"
        );
        assert!(framer.next_record().is_none());

        framer.push(b"Session: 7\n\n");
        assert_eq!(
            framer.next_record().unwrap(),
            "RTSP/1.0 200 OK\nCSeq: 2\nSession: 7\n\n"
        );
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn crlf_terminator() {
        let mut framer = ReplyFramer::new();
        framer.push(b"RTSP/1.0 200 OK\r\nCSeq: 1\r\n\r\nRTSP");
        assert_eq!(framer.next_record().unwrap(), "RTSP/1.0 200 OK\r\nCSeq: 1\r\n\r\n");
        assert_eq!(framer.pending(), 4);
    }

    #[test]
    fn waits_for_content_length_body() {
        let mut framer = ReplyFramer::new();
        framer.push(b"RTSP/1.0 200 OK\nCSeq: 3\nContent-Length: 10\n\na=RTSP");
        assert!(framer.next_record().is_none());

        framer.push(b"/1.0");
        let record = framer.next_record().unwrap();
        assert!(record.ends_with("\n\na=RTSP/1.0"));
    }

    #[test]
    fn skips_stray_blank_lines_between_records() {
        let mut framer = ReplyFramer::new();
        framer.push(b"\r\n\nRTSP/1.0 200 OK\nCSeq: 9\n\n");
        assert!(framer.next_record().unwrap().starts_with("RTSP/1.0 200 OK"));
    }

    #[test]
    fn reply_without_empty_line_is_taken_after_read() {
        let mut framer = ReplyFramer::new();
        framer.push(b"RTSP/1.0 200 OK\nCSeq: 1\nSession: 77\n");
        assert!(framer.next_record().is_none());
        assert_eq!(
            framer.take_unterminated().unwrap(),
            "RTSP/1.0 200 OK\nCSeq: 1\nSession: 77\n\n"
        );
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn unterminated_describe_keeps_metadata_as_body() {
        let mut framer = ReplyFramer::new();
        framer.push(b"RTSP/1.0 200 OK\nCSeq: 3\nSession: 77\nv=0\na=RTSP/1.0\na=Mjpeg\n");
        let record = framer.take_unterminated().unwrap();
        let reply = crate::protocol::RtspReply::parse(&record).unwrap();
        assert_eq!(reply.cseq, 3);
        assert_eq!(reply.body, "v=0\na=RTSP/1.0\na=Mjpeg");
        assert_eq!(reply.describe_info().unwrap().media_type, "Mjpeg");
    }

    #[test]
    fn unterminated_replies_split_at_status_line() {
        let mut framer = ReplyFramer::new();
        framer.push(b"RTSP/1.0 200 OK\nCSeq: 1\nSession: 7\nRTSP/1.0 200 OK\nCSeq: 2\nSession: 7\n");
        assert!(framer.take_unterminated().unwrap().contains("CSeq: 1"));
        assert!(framer.take_unterminated().unwrap().contains("CSeq: 2"));
        assert!(framer.take_unterminated().is_none());
    }

    #[test]
    fn partial_header_block_is_not_taken() {
        let mut framer = ReplyFramer::new();
        framer.push(b"RTSP/1.0 200 OK\nCSeq: 1\n");
        assert!(framer.take_unterminated().is_none());
        framer.push(b"Session: 77");
        assert!(framer.take_unterminated().is_none());

        framer.push(b"\nContent-Length: 4\n");
        assert!(framer.take_unterminated().is_none());
        assert!(framer.pending() > 0);
    }

    #[test]
    fn finish_flushes_unterminated_record() {
        let mut framer = ReplyFramer::new();
        framer.push(b"RTSP/1.0 200 OK\nCSeq: 4\nSession: 1");
        assert!(framer.next_record().is_none());
        assert_eq!(
            framer.finish().unwrap(),
            "RTSP/1.0 200 OK\nCSeq: 4\nSession: 1"
        );
        assert!(framer.finish().is_none());
    }
}
