use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::core::error::ProviderError;
use crate::core::traits::Provider;
use crate::core::types::{CapabilityResponse, ProviderId, TextRequest};
use crate::providers::google_translate::{
    decode_google_response, encode_google_request, generate_content_path,
    google_probe_has_content, map_google_transport_error,
};
use crate::providers::session::{AdapterCore, Session};

const GOOGLE_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GoogleProvider {
    core: AdapterCore,
}

impl GoogleProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            core: AdapterCore::new(ProviderId::Google, config, GOOGLE_DEFAULT_BASE_URL),
        }
    }

    fn session(&self) -> Result<Session, ProviderError> {
        self.core.session(|core| {
            let (name, value) = core.header("x-goog-api-key", core.api_key())?;
            let mut headers = HeaderMap::new();
            headers.insert(name, value);
            Ok(headers)
        })
    }

    async fn send(&self, body: &Value) -> Result<Value, ProviderError> {
        let session = self.session()?;
        let url = session.url(&generate_content_path(self.core.model()));
        session
            .transport
            .post_json(&url, body)
            .await
            .map_err(map_google_transport_error)
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    fn model(&self) -> &str {
        self.core.model()
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        self.session().map(|_| ())
    }

    async fn generate_text(&self, req: &TextRequest) -> Result<CapabilityResponse, ProviderError> {
        let response = self.send(&encode_google_request(req)).await?;
        decode_google_response(self.core.model(), &response)
    }

    async fn probe(&self) -> Result<bool, ProviderError> {
        let response = self.send(&encode_google_request(&TextRequest::probe())).await?;
        Ok(google_probe_has_content(&response))
    }

    fn is_available(&self) -> bool {
        self.core.has_usable_credential()
    }

    async fn cleanup(&self) {
        self.core.release();
    }
}
