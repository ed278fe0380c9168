//! Turns a raw provider chunk stream into normalized [`StreamEvent`]s.
//!
//! ```rust
//! use bprovider::{StreamDecoder, StreamEvent, VecChunkStream};
//! use futures_util::StreamExt;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let chunks = VecChunkStream::from_chunks(vec![
//!     json!({"choices": [{"delta": {"content": "Hel"}}]}),
//!     json!({"choices": [{"delta": {"content": "lo"}}]}),
//! ]);
//! let mut decoder = StreamDecoder::new(Box::pin(chunks));
//!
//! assert_eq!(decoder.next().await, Some(Ok(StreamEvent::TextDelta("Hel".into()))));
//! assert_eq!(decoder.next().await, Some(Ok(StreamEvent::TextDelta("lo".into()))));
//! assert_eq!(decoder.next().await, Some(Ok(StreamEvent::StreamEnd(None))));
//! assert_eq!(decoder.next().await, None);
//! assert_eq!(decoder.into_raw_chunks().len(), 2);
//! # }
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::chunk::decode_chunk;
use crate::{BoxedChunkStream, ProviderError, RawChunk, StreamEvent, UsageRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Streaming,
    Finished,
}

/// Single-use decoder for one provider round.
///
/// Every raw chunk is retained (including skipped ones) so the round can be recorded
/// verbatim. The decoder ends with exactly one `StreamEnd` unless the underlying stream
/// fails, in which case the error is the last item.
pub struct StreamDecoder<'a> {
    chunks: BoxedChunkStream<'a>,
    pending: VecDeque<StreamEvent>,
    raw: Vec<RawChunk>,
    usage: Option<UsageRecord>,
    skipped: usize,
    state: DecoderState,
}

impl<'a> StreamDecoder<'a> {
    pub fn new(chunks: BoxedChunkStream<'a>) -> Self {
        Self {
            chunks,
            pending: VecDeque::new(),
            raw: Vec::new(),
            usage: None,
            skipped: 0,
            state: DecoderState::Streaming,
        }
    }

    pub fn raw_chunks(&self) -> &[RawChunk] {
        &self.raw
    }

    pub fn into_raw_chunks(self) -> Vec<RawChunk> {
        self.raw
    }

    pub fn usage(&self) -> Option<&UsageRecord> {
        self.usage.as_ref()
    }

    /// Number of chunks that could not be interpreted and were dropped.
    pub fn skipped_chunks(&self) -> usize {
        self.skipped
    }

    fn ingest(&mut self, raw: RawChunk) {
        match decode_chunk(&raw) {
            Ok(decoded) => {
                if let Some(text) = decoded.text {
                    self.pending.push_back(StreamEvent::TextDelta(text));
                }

                self.pending.extend(
                    decoded
                        .tool_calls
                        .into_iter()
                        .map(StreamEvent::ToolCallDelta),
                );

                if decoded.usage.is_some() {
                    self.usage = decoded.usage;
                }
            }
            Err(error) => {
                self.skipped += 1;
                tracing::warn!(
                    event = "malformed_chunk",
                    position = self.raw.len(),
                    error = %error,
                    "skipping provider chunk that could not be decoded"
                );
            }
        }

        self.raw.push(raw);
    }
}

impl Stream for StreamDecoder<'_> {
    type Item = Result<StreamEvent, ProviderError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            if this.state == DecoderState::Finished {
                return Poll::Ready(None);
            }

            match this.chunks.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => {
                    this.state = DecoderState::Finished;
                    return Poll::Ready(Some(Ok(StreamEvent::StreamEnd(this.usage.clone()))));
                }
                Poll::Ready(Some(Err(error))) => {
                    this.state = DecoderState::Finished;
                    return Poll::Ready(Some(Err(error)));
                }
                Poll::Ready(Some(Ok(raw))) => this.ingest(raw),
            }
        }
    }
}
