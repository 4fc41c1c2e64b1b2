use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::core::error::ProviderError;
use crate::core::traits::Provider;
use crate::core::types::{CapabilityResponse, ProviderId, TextRequest};
use crate::providers::anthropic_translate::{
    anthropic_probe_has_content, decode_anthropic_response, encode_anthropic_request,
    map_anthropic_transport_error,
};
use crate::providers::session::{AdapterCore, Session};

const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MESSAGES_PATH: &str = "/v1/messages";

pub struct AnthropicProvider {
    core: AdapterCore,
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            core: AdapterCore::new(ProviderId::Anthropic, config, ANTHROPIC_DEFAULT_BASE_URL),
        }
    }

    fn session(&self) -> Result<Session, ProviderError> {
        self.core.session(default_headers)
    }

    async fn send(&self, body: &Value) -> Result<Value, ProviderError> {
        let session = self.session()?;
        session
            .transport
            .post_json(&session.url(MESSAGES_PATH), body)
            .await
            .map_err(map_anthropic_transport_error)
    }
}

fn default_headers(core: &AdapterCore) -> Result<HeaderMap, ProviderError> {
    let mut headers = HeaderMap::new();
    for (name, value) in [
        ("x-api-key", core.api_key()),
        ("anthropic-version", ANTHROPIC_VERSION),
    ] {
        let (name, value) = core.header(name, value)?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn model(&self) -> &str {
        self.core.model()
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        self.session().map(|_| ())
    }

    async fn generate_text(&self, req: &TextRequest) -> Result<CapabilityResponse, ProviderError> {
        let body = encode_anthropic_request(self.core.model(), req);
        let response = self.send(&body).await?;
        decode_anthropic_response(self.core.model(), &response)
    }

    async fn probe(&self) -> Result<bool, ProviderError> {
        let body = encode_anthropic_request(self.core.model(), &TextRequest::probe());
        let response = self.send(&body).await?;
        Ok(anthropic_probe_has_content(&response))
    }

    fn is_available(&self) -> bool {
        self.core.has_usable_credential()
    }

    async fn cleanup(&self) {
        self.core.release();
    }
}
