use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};

use crate::core::error::ConfigError;
use crate::core::types::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, ProviderId};

pub const PLACEHOLDER_PREFIX: &str = "your-";
pub const NONE_SENTINEL: &str = "none";
pub const DEFAULT_PROVIDER_PRIORITY: &str = "anthropic,openai,google,openrouter,xai,ollama";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
pub const LOCAL_PROVIDER_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const PRIORITY_KEY: &str = "AI_PROVIDER_PRIORITY";
const TEMPERATURE_KEY: &str = "AI_TEMPERATURE";
const MAX_TOKENS_KEY: &str = "AI_MAX_TOKENS";
const TIMEOUT_KEY: &str = "AI_PROVIDER_TIMEOUT";

/// True when a credential is non-empty and not a known placeholder.
pub fn credential_is_usable(credential: &str) -> bool {
    let trimmed = credential.trim();
    !trimmed.is_empty() && !trimmed.starts_with(PLACEHOLDER_PREFIX) && trimmed != NONE_SENTINEL
}

pub fn env_prefix(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Openai => "OPENAI",
        ProviderId::Anthropic => "ANTHROPIC",
        ProviderId::Google => "GOOGLE",
        ProviderId::Openrouter => "OPENROUTER",
        ProviderId::Xai => "XAI",
        ProviderId::Ollama => "OLLAMA",
    }
}

pub fn default_model(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Openai => "gpt-4",
        ProviderId::Anthropic => "claude-3-5-sonnet-20241022",
        ProviderId::Google => "gemini-1.5-pro",
        ProviderId::Openrouter => "anthropic/claude-3.5-sonnet",
        ProviderId::Xai => "grok-beta",
        ProviderId::Ollama => "llama3.1:8b",
    }
}

/// Splits a comma-separated priority string into identities.
///
/// Unknown names are logged and dropped; later duplicates are ignored.
pub fn parse_priority(raw: &str) -> Vec<ProviderId> {
    let mut priority = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        match name.parse::<ProviderId>() {
            Ok(provider) if !priority.contains(&provider) => priority.push(provider),
            Ok(_) => {}
            Err(error) => tracing::warn!(%error, "ignoring entry in {PRIORITY_KEY}"),
        }
    }
    priority
}

/// Per-vendor values as exposed by the settings source.
#[derive(Debug, Clone, Default)]
pub struct VendorSettings {
    pub api_key: Option<SecretString>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl VendorSettings {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::from(api_key.into())),
            ..Self::default()
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Process-level settings consumed by `ProviderManager::configure_from_env`.
///
/// A vendor appears in `vendors` only when its settings source exposes the
/// vendor's credential key (for Ollama, its model key).
#[derive(Debug, Clone)]
pub struct Settings {
    pub vendors: IndexMap<ProviderId, VendorSettings>,
    pub provider_priority: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub provider_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vendors: IndexMap::new(),
            provider_priority: DEFAULT_PROVIDER_PRIORITY.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Reads the process environment after loading a `.env` file, if any.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(error) = dotenvy::dotenv()
            && !error.not_found()
        {
            tracing::warn!(%error, "failed to load .env file");
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut settings = Self::default();

        for provider in ProviderId::ALL {
            let prefix = env_prefix(provider);
            let api_key = lookup(&format!("{prefix}_API_KEY"));
            let model = non_blank(&format!("{prefix}_MODEL"));

            let present = if provider.is_local() {
                model.is_some()
            } else {
                api_key.is_some()
            };
            if !present {
                continue;
            }

            settings.vendors.insert(
                provider,
                VendorSettings {
                    api_key: api_key.map(SecretString::from),
                    model,
                    base_url: non_blank(&format!("{prefix}_BASE_URL")),
                },
            );
        }

        if let Some(priority) = non_blank(PRIORITY_KEY) {
            settings.provider_priority = priority;
        }
        if let Some(raw) = non_blank(TEMPERATURE_KEY) {
            settings.temperature = parse_value(TEMPERATURE_KEY, &raw)?;
        }
        if let Some(raw) = non_blank(MAX_TOKENS_KEY) {
            settings.max_tokens = parse_value(MAX_TOKENS_KEY, &raw)?;
        }
        if let Some(raw) = non_blank(TIMEOUT_KEY) {
            let timeout_secs: u64 = parse_value(TIMEOUT_KEY, &raw)?;
            if timeout_secs == 0 {
                return Err(ConfigError::InvalidTimeout { timeout_secs });
            }
            settings.provider_timeout_secs = timeout_secs;
        }

        Ok(settings)
    }

    pub fn with_vendor(mut self, provider: ProviderId, vendor: VendorSettings) -> Self {
        self.vendors.insert(provider, vendor);
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.provider_priority = priority.into();
        self
    }

    pub fn vendor(&self, provider: ProviderId) -> Option<&VendorSettings> {
        self.vendors.get(&provider)
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|error| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: error.to_string(),
        })
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: ProviderId,
    pub api_key: SecretString,
    pub model: String,
    pub base_url: Option<String>,
    pub enabled: bool,
    /// Carried for completeness; ordering comes from the priority list.
    pub priority: i32,
    pub timeout_secs: u64,
    /// Carried for completeness; adapters never retry within one call.
    pub max_retries: u32,
}

impl ProviderConfig {
    pub fn new(provider: ProviderId, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let timeout_secs = if provider.is_local() {
            LOCAL_PROVIDER_TIMEOUT_SECS
        } else {
            DEFAULT_PROVIDER_TIMEOUT_SECS
        };

        Self {
            provider,
            api_key: SecretString::from(api_key.into()),
            model: model.into(),
            base_url: None,
            enabled: true,
            priority: 0,
            timeout_secs,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Builds a config from vendor settings, filling documented defaults.
    pub fn from_settings(provider: ProviderId, vendor: &VendorSettings, settings: &Settings) -> Self {
        let api_key = vendor
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().to_string())
            .unwrap_or_else(|| NONE_SENTINEL.to_string());
        let model = vendor
            .model
            .clone()
            .unwrap_or_else(|| default_model(provider).to_string());

        let mut config = Self::new(provider, api_key, model);
        config.base_url = vendor.base_url.clone();
        if !provider.is_local() {
            config.timeout_secs = settings.provider_timeout_secs;
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn is_configured(&self) -> bool {
        if !self.enabled {
            return false;
        }
        self.provider.is_local() || credential_is_usable(self.api_key.expose_secret())
    }
}
