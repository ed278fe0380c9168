//! Chat-completions adapter shared by OpenAI, Mistral and OpenAI-compatible servers.

mod auth;
mod provider;
mod serde_api;
mod transport;

pub use auth::OpenAiAuth;
pub use provider::OpenAiCompatibleProvider;
pub use serde_api::parse_completion;
pub use transport::{OpenAiHttpTransport, OpenAiTransport};
