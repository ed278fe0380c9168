//! Provider implementation over the chat-completions transport.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    BoxedChunkStream, ModelProvider, ModelRequest, ModelResponse, NoopOperationHooks,
    OPERATION_COMPLETE, OPERATION_STREAM, ProviderError, ProviderFuture, ProviderId,
    ProviderOperationHooks, RetryPolicy, SecureCredentialManager, execute_with_retry,
};

use super::auth::resolve_auth;
use super::serde_api::parse_completion;
use super::transport::OpenAiTransport;

#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    id: ProviderId,
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    retry_policy: RetryPolicy,
    hooks: Arc<dyn ProviderOperationHooks>,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        id: ProviderId,
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            id,
            credentials,
            transport,
            retry_policy: RetryPolicy::default(),
            hooks: Arc::new(NoopOperationHooks),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_operation_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    fn check_request(&self, request: &ModelRequest, streaming: bool) -> Result<(), ProviderError> {
        request.validate()?;

        if request.provider != self.id {
            return Err(ProviderError::invalid_request(format!(
                "request was built for {} but sent to {}",
                request.provider, self.id
            )));
        }

        if request.is_streaming() != streaming {
            let expected = if streaming { "streaming" } else { "non-streaming" };
            return Err(ProviderError::invalid_request(format!(
                "{expected} call requires a {expected} request"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("id", &self.id)
            .field("transport", &self.transport)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

async fn backoff(delay: Duration) {
    tokio::time::sleep(delay).await;
}

impl ModelProvider for OpenAiCompatibleProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.check_request(&request, true)?;
            let auth = resolve_auth(&self.credentials, self.id)?;
            let payload = request.payload()?;

            tracing::debug!(
                provider = %self.id,
                model = %request.model,
                turns = request.turns.len(),
                tools = request.tools.len(),
                "opening provider stream"
            );

            execute_with_retry(
                self.id,
                OPERATION_STREAM,
                &self.retry_policy,
                self.hooks.as_ref(),
                |_| self.transport.stream(payload.clone(), auth.clone()),
                backoff,
            )
            .await
        })
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            self.check_request(&request, false)?;
            let auth = resolve_auth(&self.credentials, self.id)?;
            let payload = request.payload()?;

            let raw = execute_with_retry(
                self.id,
                OPERATION_COMPLETE,
                &self.retry_policy,
                self.hooks.as_ref(),
                |_| self.transport.complete(payload.clone(), auth.clone()),
                backoff,
            )
            .await?;

            parse_completion(raw, &request.model)
        })
    }
}
