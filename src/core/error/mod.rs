use thiserror::Error;

use crate::core::types::{ErrorKind, ProviderId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("invalid timeout: {timeout_secs} s")]
    InvalidTimeout { timeout_secs: u64 },
}

/// Name that does not match any [`ProviderId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

/// Unified failure raised by every provider adapter and by the manager.
///
/// `provider` is `None` when the error originates in the manager itself
/// (`no_providers`, `all_providers_failed`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{kind}{context}: {message}",
    context = format_context(.provider.as_ref(), *.status_code)
)]
pub struct ProviderError {
    pub provider: Option<ProviderId>,
    pub kind: ErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: ProviderId, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider: Some(provider),
            kind,
            status_code: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn no_providers() -> Self {
        Self {
            provider: None,
            kind: ErrorKind::NoProviders,
            status_code: None,
            message: "no AI providers available".to_string(),
        }
    }

    pub fn all_providers_failed(last_error: Option<&ProviderError>) -> Self {
        let last_error = last_error
            .map(ToString::to_string)
            .unwrap_or_else(|| "none recorded".to_string());

        Self {
            provider: None,
            kind: ErrorKind::AllProvidersFailed,
            status_code: None,
            message: format!("all AI providers failed; last error: {last_error}"),
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::AuthError
    }
}

fn format_context(provider: Option<&ProviderId>, status_code: Option<u16>) -> String {
    let mut context = Vec::new();

    if let Some(provider) = provider {
        context.push(format!("provider={provider}"));
    }
    if let Some(status_code) = status_code {
        context.push(format!("status_code={status_code}"));
    }

    if context.is_empty() {
        String::new()
    } else {
        format!(" [{}]", context.join(", "))
    }
}
