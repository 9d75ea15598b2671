//! Newline-delimited JSON framing.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{ConnectionError, Result};
use crate::messages::WireFrame;

/// Default upper bound for a single frame, newline excluded.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// Splits a byte buffer into frames and encodes frames for the wire.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_len: usize,
}

impl FrameCodec {
    /// Create a codec with the given frame size limit.
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Take the next complete line out of `buf`.
    ///
    /// Returns `Ok(None)` when no full line is buffered yet. Blank lines are
    /// skipped. A line, or an unterminated tail, longer than the limit is a
    /// hard error: the stream cannot be resynchronised.
    pub fn next_line(&self, buf: &mut BytesMut) -> Result<Option<BytesMut>> {
        loop {
            let Some(newline) = buf.iter().position(|b| *b == b'\n') else {
                if buf.len() > self.max_frame_len {
                    return Err(ConnectionError::FrameTooLarge {
                        len: buf.len(),
                        max: self.max_frame_len,
                    });
                }
                return Ok(None);
            };

            if newline > self.max_frame_len {
                return Err(ConnectionError::FrameTooLarge {
                    len: newline,
                    max: self.max_frame_len,
                });
            }

            let mut line = buf.split_to(newline);
            buf.advance(1);

            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            return Ok(Some(line));
        }
    }

    /// Decode one line into a frame.
    pub fn decode(&self, line: &[u8]) -> Result<WireFrame> {
        Ok(serde_json::from_slice(line)?)
    }

    /// Encode a frame, newline-terminated.
    pub fn encode(&self, frame: &WireFrame) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(frame)?;
        if bytes.len() > self.max_frame_len {
            return Err(ConnectionError::FrameTooLarge {
                len: bytes.len(),
                max: self.max_frame_len,
            });
        }
        bytes.push(b'\n');
        Ok(bytes)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

/// Reads frames from an async byte stream.
pub struct FrameReader<R> {
    reader: R,
    buf: BytesMut,
    codec: FrameCodec,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, codec: FrameCodec) -> Self {
        Self {
            reader,
            buf: BytesMut::with_capacity(4096),
            codec,
        }
    }

    /// Read the next decodable frame.
    ///
    /// Returns `Ok(None)` on a clean end of stream. Lines that do not decode
    /// (unknown events, malformed JSON) are logged and skipped.
    pub async fn next_frame(&mut self) -> Result<Option<WireFrame>> {
        loop {
            while let Some(line) = self.codec.next_line(&mut self.buf)? {
                match self.codec.decode(&line) {
                    Ok(frame) => return Ok(Some(frame)),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping undecodable frame");
                    }
                }
            }

            let read = self.reader.read_buf(&mut self.buf).await?;
            if read == 0 {
                if !self.buf.is_empty() {
                    tracing::warn!(bytes = self.buf.len(), "stream ended mid-frame");
                }
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_core::ConversationEvent;
    use chrono::Utc;

    #[test]
    fn test_next_line_waits_for_newline() {
        let codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"{\"event\":\"joined\"}"[..]);

        assert!(codec.next_line(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"\r\n\n{\"event\":");
        let line = codec.next_line(&mut buf).unwrap().unwrap();
        assert_eq!(&line[..], b"{\"event\":\"joined\"}");

        // The blank line is skipped and the partial tail stays buffered.
        assert!(codec.next_line(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"{\"event\":");
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let codec = FrameCodec::new(8);
        let mut buf = BytesMut::from(&b"0123456789"[..]);

        assert!(matches!(
            codec.next_line(&mut buf),
            Err(ConnectionError::FrameTooLarge { len: 10, max: 8 })
        ));
    }

    #[test]
    fn test_encode_is_newline_terminated() {
        let codec = FrameCodec::default();
        let frame = WireFrame::SendMessage(ConversationEvent::now("ishmam", "hi"));
        let bytes = codec.encode(&frame).unwrap();

        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(codec.decode(&bytes[..bytes.len() - 1]).unwrap(), frame);
    }

    #[test]
    fn test_encode_respects_limit() {
        let codec = FrameCodec::new(16);
        let frame = WireFrame::SendMessage(ConversationEvent::new("a", "x".repeat(64), Utc::now()));
        assert!(matches!(
            codec.encode(&frame),
            Err(ConnectionError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_reader_skips_garbage() {
        let input: &[u8] = b"not json\n{\"event\":\"presence\"}\n{\"event\":\"typing\",\"data\":{\"sender\":\"bot\"}}\n";
        let mut reader = FrameReader::new(input, FrameCodec::default());

        let frame = reader.next_frame().await.unwrap();
        assert_eq!(
            frame,
            Some(WireFrame::Typing {
                sender: "bot".into()
            })
        );
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }
}
