use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::config::{ProviderConfig, credential_is_usable};
use crate::core::error::ProviderError;
use crate::core::types::{ErrorKind, ProviderId};
use crate::transport::http::{HttpTransport, normalize_base_url};

/// Live client handle: a transport plus the validated base URL it talks to.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub transport: HttpTransport,
    pub base_url: String,
}

impl Session {
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// State every adapter carries: credentials, model, and a lazily created session.
pub(crate) struct AdapterCore {
    provider: ProviderId,
    api_key: SecretString,
    model: String,
    base_url: String,
    timeout: Duration,
    session: RwLock<Option<Session>>,
}

impl AdapterCore {
    pub(crate) fn new(provider: ProviderId, config: &ProviderConfig, default_base_url: &str) -> Self {
        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(default_base_url)
            .to_string();

        Self {
            provider,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url,
            timeout: Duration::from_secs(config.timeout_secs),
            session: RwLock::new(None),
        }
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn has_usable_credential(&self) -> bool {
        credential_is_usable(self.api_key())
    }

    /// Returns the live session, creating it on first use.
    pub(crate) fn session<F>(&self, default_headers: F) -> Result<Session, ProviderError>
    where
        F: FnOnce(&Self) -> Result<HeaderMap, ProviderError>,
    {
        if let Some(session) = self.read_session().as_ref() {
            return Ok(session.clone());
        }

        let mut slot = self.write_session();
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }

        let base_url = normalize_base_url(&self.base_url).map_err(|message| {
            ProviderError::new(self.provider, ErrorKind::ConnectionError, message)
        })?;
        let headers = default_headers(self)?;
        let transport = HttpTransport::new(self.timeout, headers).map_err(|error| {
            ProviderError::new(
                self.provider,
                ErrorKind::UnknownError,
                format!("failed to initialize {} client: {error}", self.provider),
            )
        })?;

        tracing::debug!(provider = %self.provider, %base_url, "created provider client");
        let session = Session {
            transport,
            base_url,
        };
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Drops the session. Returns whether one was live.
    pub(crate) fn release(&self) -> bool {
        let released = self.write_session().take().is_some();
        if released {
            tracing::debug!(provider = %self.provider, "released provider client");
        }
        released
    }

    pub(crate) fn header(
        &self,
        name: &'static str,
        value: &str,
    ) -> Result<(HeaderName, HeaderValue), ProviderError> {
        let value = HeaderValue::from_str(value).map_err(|error| {
            ProviderError::new(
                self.provider,
                ErrorKind::UnknownError,
                format!("invalid header value for {name}: {error}"),
            )
        })?;
        Ok((HeaderName::from_static(name), value))
    }

    pub(crate) fn bearer_headers(&self) -> Result<HeaderMap, ProviderError> {
        let (_, value) = self.header("authorization", &format!("Bearer {}", self.api_key()))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
