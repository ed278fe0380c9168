//! Transport seam and the reqwest-based server-sent-events implementation.

use async_stream::try_stream;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::{BoxedChunkStream, ProviderError, ProviderFuture, RawChunk};

use super::auth::OpenAiAuth;
use super::serde_api::{extract_error_message, stream_error_message};

pub trait OpenAiTransport: Send + Sync + std::fmt::Debug {
    /// Posts a streaming payload and yields each `data:` object as a raw chunk.
    fn stream<'a>(
        &'a self,
        payload: Value,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>>;

    fn complete<'a>(
        &'a self,
        payload: Value,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<Value, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    base_url: String,
}

impl OpenAiHttpTransport {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post(&self, payload: &Value, auth: &OpenAiAuth) -> Result<Response, ProviderError> {
        let mut builder = self.client.post(self.endpoint("chat/completions")).json(payload);
        if let OpenAiAuth::ApiKey(key) = auth {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                ProviderError::timeout(err.to_string())
            } else {
                ProviderError::transport(err.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        Ok(response)
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("chat completion request failed with status {status}"));

        ProviderError::from_status(status.as_u16(), message)
    }
}

/// Outcome of one complete SSE line.
#[derive(Debug, PartialEq)]
pub(crate) enum SseLine {
    Chunk(RawChunk),
    Done,
    Ignored,
}

pub(crate) fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    let Some(payload) = line.strip_prefix("data:") else {
        return SseLine::Ignored;
    };

    let payload = payload.trim();
    if payload == "[DONE]" {
        return SseLine::Done;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => SseLine::Chunk(value),
        Err(error) => {
            tracing::warn!(
                event = "malformed_chunk",
                error = %error,
                "skipping SSE payload that is not valid JSON"
            );
            SseLine::Ignored
        }
    }
}

impl OpenAiTransport for OpenAiHttpTransport {
    fn stream<'a>(
        &'a self,
        payload: Value,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            let response = self.post(&payload, &auth).await?;

            let stream = try_stream! {
                let mut bytes = response.bytes_stream();
                let mut buffer: Vec<u8> = Vec::new();

                'read: while let Some(item) = bytes.next().await {
                    let item = item.map_err(|err| ProviderError::transport(err.to_string()))?;
                    buffer.extend_from_slice(&item);

                    while let Some(newline) = buffer.iter().position(|byte| *byte == b'\n') {
                        let line = buffer.drain(..=newline).collect::<Vec<u8>>();
                        let line = String::from_utf8_lossy(&line);

                        match parse_sse_line(&line) {
                            SseLine::Chunk(chunk) => {
                                if let Some(message) = stream_error_message(&chunk) {
                                    Err::<(), ProviderError>(ProviderError::transport(message))?;
                                }
                                yield chunk;
                            }
                            SseLine::Done => break 'read,
                            SseLine::Ignored => {}
                        }
                    }
                }
            };

            Ok(Box::pin(stream) as BoxedChunkStream<'a>)
        })
    }

    fn complete<'a>(
        &'a self,
        payload: Value,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<Value, ProviderError>> {
        Box::pin(async move {
            let response = self.post(&payload, &auth).await?;
            response
                .json::<Value>()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))
        })
    }
}
