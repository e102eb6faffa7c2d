//! Content-Length framing for the language server protocol.
//!
//! The decoder is fed raw bytes as they arrive from the client and hands
//! back complete message bodies. Partial headers and partial bodies stay
//! buffered until the rest shows up.

use std::io::Write;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("missing Content-Length header")]
    MissingContentLength,
    #[error("invalid Content-Length value: {0}")]
    InvalidContentLength(String),
}

/// Incremental decoder for `Content-Length`-framed messages.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Append freshly read bytes to the internal buffer.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Pop the next complete message body, if one is buffered.
    ///
    /// A malformed header block is consumed and reported as an error, so a
    /// broken client cannot wedge the decoder.
    pub fn next_frame(&mut self) -> Option<Result<Vec<u8>, FrameError>> {
        let header_end = find_subsequence(&self.buffer, b"\r\n\r\n")?;
        let header = String::from_utf8_lossy(&self.buffer[..header_end]).into_owned();
        let length = match parse_content_length(&header) {
            Ok(length) => length,
            Err(err) => {
                self.buffer.drain(..header_end + 4);
                return Some(Err(err));
            }
        };
        let body_start = header_end + 4;
        // A length near usize::MAX would wrap the end offset.
        let Some(frame_end) = body_start.checked_add(length) else {
            self.buffer.drain(..body_start);
            return Some(Err(FrameError::InvalidContentLength(length.to_string())));
        };
        if self.buffer.len() < frame_end {
            return None;
        }
        let body = self.buffer[body_start..frame_end].to_vec();
        self.buffer.drain(..frame_end);
        Some(Ok(body))
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_content_length(header: &str) -> Result<usize, FrameError> {
    for line in header.split("\r\n") {
        if let Some((name, value)) = line.split_once(": ") {
            if name.eq_ignore_ascii_case("Content-Length") {
                return value
                    .trim()
                    .parse()
                    .map_err(|_| FrameError::InvalidContentLength(value.to_string()));
            }
        }
    }
    Err(FrameError::MissingContentLength)
}

/// Write one framed message and flush it.
pub fn write_frame(writer: &mut impl Write, body: &[u8]) -> std::io::Result<()> {
    write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
    writer.write_all(body)?;
    writer.flush()
}
