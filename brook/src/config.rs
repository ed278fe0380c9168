//! Engine configuration loaded from JSON and `BROOK_*` environment variables.
//!
//! ```rust
//! use brook::{EngineConfig, ProviderId};
//!
//! let config = EngineConfig::from_json_str(r#"{"provider": "mistral", "model": "mistral-small-latest"}"#)
//!     .expect("config should parse");
//!
//! assert_eq!(config.provider, ProviderId::Mistral);
//! assert_eq!(config.system_prompt, "You are a helpful assistant!");
//! assert_eq!(config.chat_policy().max_rounds, 5);
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bchat::{ChatPolicy, DisconnectPolicy};
use bcommon::GenerationOptions;
use bmemory::MemoryBackendConfig;
use bprovider::ProviderId;
use serde::Deserialize;

use crate::BrookError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant!";
/// Upper bound for every `*_timeout_secs` field (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub provider: ProviderId,
    /// Overrides the provider's well-known endpoint; required for `openai-compatible`.
    pub base_url: Option<String>,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: Option<u32>,
    pub memory: MemoryBackendConfig,
    pub max_rounds: u32,
    pub multi_round_tools: bool,
    pub force_tool_first_round: bool,
    pub generate_titles: bool,
    pub title_timeout_secs: u64,
    pub readiness_timeout_secs: u64,
    pub abort_on_disconnect: bool,
    pub http_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let policy = ChatPolicy::default();
        Self {
            provider: ProviderId::OpenAi,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: GenerationOptions::DEFAULT_TEMPERATURE,
            top_p: GenerationOptions::DEFAULT_TOP_P,
            max_tokens: None,
            memory: MemoryBackendConfig::default(),
            max_rounds: policy.max_rounds,
            multi_round_tools: policy.multi_round_tools,
            force_tool_first_round: policy.force_tool_first_round,
            generate_titles: policy.generate_titles,
            title_timeout_secs: policy.title_timeout.as_secs(),
            readiness_timeout_secs: policy.readiness_timeout.as_secs(),
            abort_on_disconnect: false,
            http_timeout_secs: 90,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, BrookError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with whatever `BROOK_*` variables are set.
    pub fn from_env() -> Result<Self, BrookError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, BrookError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup; keys use the `BROOK_` prefix.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, BrookError> {
        if let Some(value) = lookup("BROOK_PROVIDER") {
            self.provider = ProviderId::from_str(&value)?;
        }
        if let Some(value) = lookup("BROOK_BASE_URL") {
            self.base_url = Some(value).filter(|url| !url.trim().is_empty());
        }
        if let Some(value) = lookup("BROOK_MODEL") {
            self.model = value;
        }
        if let Some(value) = lookup("BROOK_SYSTEM_PROMPT") {
            self.system_prompt = value;
        }
        if let Some(value) = lookup("BROOK_TEMPERATURE") {
            self.temperature = parse_value("BROOK_TEMPERATURE", &value)?;
        }
        if let Some(value) = lookup("BROOK_TOP_P") {
            self.top_p = parse_value("BROOK_TOP_P", &value)?;
        }
        if let Some(value) = lookup("BROOK_MAX_TOKENS") {
            self.max_tokens = Some(parse_value("BROOK_MAX_TOKENS", &value)?);
        }
        if let Some(value) = lookup("BROOK_MAX_ROUNDS") {
            self.max_rounds = parse_value("BROOK_MAX_ROUNDS", &value)?;
        }
        if let Some(value) = lookup("BROOK_MULTI_ROUND_TOOLS") {
            self.multi_round_tools = parse_flag("BROOK_MULTI_ROUND_TOOLS", &value)?;
        }
        if let Some(value) = lookup("BROOK_FORCE_TOOL_FIRST_ROUND") {
            self.force_tool_first_round = parse_flag("BROOK_FORCE_TOOL_FIRST_ROUND", &value)?;
        }
        if let Some(value) = lookup("BROOK_GENERATE_TITLES") {
            self.generate_titles = parse_flag("BROOK_GENERATE_TITLES", &value)?;
        }
        if let Some(value) = lookup("BROOK_ABORT_ON_DISCONNECT") {
            self.abort_on_disconnect = parse_flag("BROOK_ABORT_ON_DISCONNECT", &value)?;
        }
        if let Some(value) = lookup("BROOK_MEMORY") {
            self.memory = match value.trim().to_ascii_lowercase().as_str() {
                "in_memory" | "memory" => MemoryBackendConfig::InMemory,
                "sqlite" => match self.memory {
                    sqlite @ MemoryBackendConfig::Sqlite { .. } => sqlite,
                    MemoryBackendConfig::InMemory => MemoryBackendConfig::default(),
                },
                other => {
                    return Err(BrookError::config(format!(
                        "BROOK_MEMORY must be 'sqlite' or 'in_memory', got '{other}'"
                    )));
                }
            };
        }
        if let Some(value) = lookup("BROOK_SQLITE_PATH") {
            self.memory = MemoryBackendConfig::Sqlite {
                path: PathBuf::from(value),
            };
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), BrookError> {
        if self.model.trim().is_empty() {
            return Err(BrookError::config("model must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(BrookError::config(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(BrookError::config(
                "top_p must be in the inclusive range 0.0..=1.0",
            ));
        }
        if self.max_rounds == 0 {
            return Err(BrookError::config("max_rounds must be at least 1"));
        }
        for (field, secs) in [
            ("title_timeout_secs", self.title_timeout_secs),
            ("readiness_timeout_secs", self.readiness_timeout_secs),
            ("http_timeout_secs", self.http_timeout_secs),
        ] {
            if secs == 0 || secs > MAX_TIMEOUT_SECS {
                return Err(BrookError::config(format!(
                    "{field} must be between 1 and {MAX_TIMEOUT_SECS}, got {secs}"
                )));
            }
        }
        if self.provider == ProviderId::OpenAiCompatible && self.base_url.is_none() {
            return Err(BrookError::config(
                "openai-compatible providers need a base_url",
            ));
        }

        Ok(())
    }

    pub fn generation_options(&self) -> GenerationOptions {
        let options = GenerationOptions::default()
            .with_temperature(self.temperature)
            .with_top_p(self.top_p);

        match self.max_tokens {
            Some(max_tokens) => options.with_max_tokens(max_tokens),
            None => options,
        }
    }

    pub fn chat_policy(&self) -> ChatPolicy {
        let on_disconnect = if self.abort_on_disconnect {
            DisconnectPolicy::AbortRound
        } else {
            DisconnectPolicy::CompleteRound
        };

        ChatPolicy::default()
            .with_max_rounds(self.max_rounds)
            .with_multi_round_tools(self.multi_round_tools)
            .with_force_tool_first_round(self.force_tool_first_round)
            .with_title_generation(self.generate_titles)
            .with_title_timeout(Duration::from_secs(self.title_timeout_secs))
            .with_readiness_timeout(Duration::from_secs(self.readiness_timeout_secs))
            .with_disconnect_policy(on_disconnect)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, BrookError> {
    raw.trim()
        .parse()
        .map_err(|_| BrookError::config(format!("{key} has an invalid value '{raw}'")))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, BrookError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BrookError::config(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
    }
}
