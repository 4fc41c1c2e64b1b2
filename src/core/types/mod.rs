use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::UnknownProvider;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Openai,
    Anthropic,
    Google,
    Openrouter,
    Xai,
    Ollama,
}

impl ProviderId {
    pub const ALL: [ProviderId; 6] = [
        ProviderId::Openai,
        ProviderId::Anthropic,
        ProviderId::Google,
        ProviderId::Openrouter,
        ProviderId::Xai,
        ProviderId::Ollama,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Openrouter => "openrouter",
            Self::Xai => "xai",
            Self::Ollama => "ollama",
        }
    }

    /// Self-hosted providers need no credential; reachability is checked at call time.
    pub fn is_local(self) -> bool {
        matches!(self, Self::Ollama)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::Openai),
            "anthropic" => Ok(Self::Anthropic),
            "google" => Ok(Self::Google),
            "openrouter" => Ok(Self::Openrouter),
            "xai" => Ok(Self::Xai),
            "ollama" => Ok(Self::Ollama),
            _ => Err(UnknownProvider(value.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthError,
    RateLimit,
    ApiError,
    ContentFilter,
    ModelNotFound,
    ConnectionError,
    NoProviders,
    AllProvidersFailed,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthError => "auth_error",
            Self::RateLimit => "rate_limit",
            Self::ApiError => "api_error",
            Self::ContentFilter => "content_filter",
            Self::ModelNotFound => "model_not_found",
            Self::ConnectionError => "connection_error",
            Self::NoProviders => "no_providers",
            Self::AllProvidersFailed => "all_providers_failed",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive value accepted as a vendor-specific tuning knob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for ExtraValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ExtraValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ExtraValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ExtraValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ExtraValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&ExtraValue> for serde_json::Value {
    fn from(value: &ExtraValue) -> Self {
        match value {
            ExtraValue::Bool(flag) => serde_json::Value::Bool(*flag),
            ExtraValue::Int(number) => serde_json::Value::from(*number),
            ExtraValue::Float(number) => serde_json::Value::from(*number),
            ExtraValue::Text(text) => serde_json::Value::String(text.clone()),
        }
    }
}

/// Opaque vendor passthrough. Adapters merge these into their own payload slot
/// and never let them replace keys the adapter already set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraOptions(BTreeMap<String, ExtraValue>);

impl ExtraOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ExtraValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ExtraValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ExtraValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtraValue)> {
        self.0.iter()
    }

    pub(crate) fn merge_into(&self, target: &mut serde_json::Map<String, serde_json::Value>) {
        for (key, value) in &self.0 {
            target
                .entry(key.clone())
                .or_insert_with(|| serde_json::Value::from(value));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "ExtraOptions::is_empty")]
    pub extra: ExtraOptions,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            extra: ExtraOptions::default(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_extra(mut self, extra: ExtraOptions) -> Self {
        self.extra = extra;
        self
    }

    /// Minimal request used by live health probes.
    pub fn probe() -> Self {
        Self::new("Hello").with_temperature(0.0).with_max_tokens(1)
    }

    /// Returns the system prompt only when it carries text.
    pub fn system_text(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .filter(|system| !system.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResponse {
    pub content: String,
    pub provider: ProviderId,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub name: ProviderId,
    pub available: bool,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatusReport {
    pub available_providers: Vec<ProviderId>,
    pub preferred_provider: Option<ProviderId>,
    pub provider_status: BTreeMap<ProviderId, ProviderStatus>,
    pub total_providers: usize,
    pub healthy_providers: usize,
}
