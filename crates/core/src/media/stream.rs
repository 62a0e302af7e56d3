use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{ClientError, Result};

/// Width of the ASCII decimal length prefix in front of every frame.
pub const FRAME_LENGTH_DIGITS: usize = 5;

/// Length-prefixed frame source (the serving side's media file reader).
///
/// File layout:
///
/// ```text
/// 00042<42 bytes of JPEG>00017<17 bytes>...
/// ```
pub struct VideoStream<R> {
    reader: R,
    frame_number: u32,
}

impl VideoStream<BufReader<File>> {
    /// Open a media file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "video stream opened");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> VideoStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            frame_number: 0,
        }
    }

    /// Read the next frame. Returns `Ok(None)` at a clean end of stream.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mut prefix = [0u8; FRAME_LENGTH_DIGITS];
        match self.reader.read_exact(&mut prefix) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let text = std::str::from_utf8(&prefix)
            .map_err(|_| ClientError::Frame(format!("non-ASCII length prefix {prefix:?}")))?;
        let length: usize = text
            .trim()
            .parse()
            .map_err(|_| ClientError::Frame(format!("bad length prefix {text:?}")))?;

        let mut frame = vec![0u8; length];
        self.reader.read_exact(&mut frame)?;
        self.frame_number += 1;
        Ok(Some(frame))
    }

    /// Number of frames read so far.
    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }
}
