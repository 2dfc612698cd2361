#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;

use super::ApiError;
use crate::domain::models::StreamFrame;

const FRAME_DELIMITER: &[u8] = b"\n\n";
const DATA_PREFIX: &str = "data: ";

/// Reassembles discrete frames from a byte stream with arbitrary chunk
/// boundaries. Bytes accumulate until a blank-line delimiter appears; the
/// trailing incomplete fragment stays buffered for the next chunk. Buffering
/// bytes rather than text keeps multi-byte UTF-8 sequences intact when a
/// chunk boundary lands inside one.
#[derive(Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = vec![];
        while let Some(pos) = find_delimiter(&self.buffer) {
            let raw = self
                .buffer
                .drain(..pos + FRAME_DELIMITER.len())
                .take(pos)
                .collect::<Vec<u8>>();

            if let Some(frame) = parse_frame(&raw) {
                frames.push(frame);
            }
        }

        return frames;
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    return buffer
        .windows(FRAME_DELIMITER.len())
        .position(|window| return window == FRAME_DELIMITER);
}

/// Malformed frames are logged and skipped; they never abort the stream.
fn parse_frame(raw: &[u8]) -> Option<StreamFrame> {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(payload) = trimmed.strip_prefix(DATA_PREFIX) else {
        tracing::debug!(frame = trimmed, "skipping frame without data field");
        return None;
    };

    match serde_json::from_str::<StreamFrame>(payload) {
        Ok(frame) => return Some(frame),
        Err(err) => {
            tracing::warn!(error = %err, payload = payload, "skipping malformed stream frame");
            return None;
        }
    }
}

/// One open response stream. Finite: frames stop at stream closure, and the
/// controller treats closure without a terminal frame as a failure. Not
/// restartable.
pub struct ChatStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    decoder: FrameDecoder,
    pending: VecDeque<StreamFrame>,
    closed: bool,
}

impl ChatStream {
    pub fn new<S>(stream: S) -> ChatStream
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        return ChatStream {
            inner: Box::pin(stream),
            decoder: FrameDecoder::default(),
            pending: VecDeque::new(),
            closed: false,
        };
    }

    /// The next decoded frame, or None once the underlying stream has
    /// closed. A transport error mid-stream ends the stream.
    pub async fn next_frame(&mut self) -> Result<Option<StreamFrame>, ApiError> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }
            if self.closed {
                return Ok(None);
            }

            match self.inner.next().await {
                Some(Ok(chunk)) => {
                    self.pending.extend(self.decoder.feed(&chunk));
                }
                Some(Err(err)) => {
                    self.closed = true;
                    return Err(ApiError::Network(err));
                }
                None => {
                    self.closed = true;
                }
            }
        }
    }
}
