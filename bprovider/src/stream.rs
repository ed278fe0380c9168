//! Raw chunk stream contracts, normalized events, and in-memory stream utilities.
//!
//! ```rust
//! use bprovider::{BoxedChunkStream, VecChunkStream};
//! use serde_json::json;
//!
//! let stream = VecChunkStream::new(vec![Ok(json!({"choices": []}))]);
//! let _boxed: BoxedChunkStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{ProviderError, ToolCallDelta, UsageRecord};

/// A provider wire chunk exactly as received, kept for usage recording.
pub type RawChunk = serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
    ToolCallDelta(ToolCallDelta),
    /// Emitted once after the last chunk, carrying usage when the provider sent any.
    StreamEnd(Option<UsageRecord>),
}

/// Provider chunk stream contract.
///
/// Invariants for consumers:
/// - Chunks are yielded in arrival order.
/// - An `Err` item is a transport failure and ends the stream.
/// - Once the stream yields `None`, it must not yield additional items.
pub trait ChunkStream: Stream<Item = Result<RawChunk, ProviderError>> + Send {}

impl<T> ChunkStream for T where T: Stream<Item = Result<RawChunk, ProviderError>> + Send {}

pub type BoxedChunkStream<'a> = Pin<Box<dyn ChunkStream + 'a>>;

#[derive(Debug)]
pub struct VecChunkStream {
    chunks: VecDeque<Result<RawChunk, ProviderError>>,
}

impl VecChunkStream {
    pub fn new(chunks: Vec<Result<RawChunk, ProviderError>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }

    pub fn from_chunks(chunks: Vec<RawChunk>) -> Self {
        Self::new(chunks.into_iter().map(Ok).collect())
    }
}

impl Stream for VecChunkStream {
    type Item = Result<RawChunk, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<RawChunk, ProviderError>>> {
        Poll::Ready(self.chunks.pop_front())
    }
}
