//! Per-round usage recording: the payload sent, what came back, and token accounting.

use std::fmt::{Display, Formatter};
use std::sync::Mutex;

use bcommon::SessionId;
use bprovider::{RawChunk, UsageRecord};
use serde_json::Value;

use crate::{ChatError, ChatFuture};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    /// A streamed conversation round.
    Round,
    /// The one-shot title completion.
    Title,
}

impl UsageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Title => "title",
        }
    }
}

impl Display for UsageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageEntry {
    pub conversation_id: SessionId,
    pub round: u32,
    pub kind: UsageKind,
    /// The request body exactly as sent.
    pub payload: Value,
    /// Raw chunks as a JSON array for streamed rounds, the response object otherwise.
    pub response: Value,
    pub usage: Option<UsageRecord>,
}

impl UsageEntry {
    pub fn for_round(
        conversation_id: SessionId,
        round: u32,
        payload: Value,
        chunks: Vec<RawChunk>,
        usage: Option<UsageRecord>,
    ) -> Self {
        Self {
            conversation_id,
            round,
            kind: UsageKind::Round,
            payload,
            response: Value::Array(chunks),
            usage,
        }
    }

    pub fn for_title(
        conversation_id: SessionId,
        payload: Value,
        response: Value,
        usage: Option<UsageRecord>,
    ) -> Self {
        Self {
            conversation_id,
            round: 0,
            kind: UsageKind::Title,
            payload,
            response,
            usage,
        }
    }

    pub fn total_tokens(&self) -> Option<u64> {
        self.usage.as_ref().and_then(|usage| usage.total_tokens)
    }
}

pub trait UsageRecorder: Send + Sync {
    fn record<'a>(&'a self, entry: UsageEntry) -> ChatFuture<'a, Result<(), ChatError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryUsageRecorder {
    entries: Mutex<Vec<UsageEntry>>,
}

impl InMemoryUsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Result<Vec<UsageEntry>, ChatError> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|_| ChatError::store("usage recorder lock poisoned"))
    }
}

impl UsageRecorder for InMemoryUsageRecorder {
    fn record<'a>(&'a self, entry: UsageEntry) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.entries
                .lock()
                .map_err(|_| ChatError::store("usage recorder lock poisoned"))?
                .push(entry);
            Ok(())
        })
    }
}
