use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::config::ProviderConfig;
use crate::core::error::ProviderError;
use crate::core::traits::Provider;
use crate::core::types::{CapabilityResponse, ProviderId, TextRequest};
use crate::providers::ollama_translate::{
    decode_generate_response, encode_generate_request, map_ollama_transport_error,
    tags_include_model,
};
use crate::providers::session::{AdapterCore, Session};

const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";
const GENERATE_PATH: &str = "/api/generate";
const TAGS_PATH: &str = "/api/tags";

/// Local Ollama server. Needs no credential.
pub struct OllamaProvider {
    core: AdapterCore,
}

impl OllamaProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            core: AdapterCore::new(ProviderId::Ollama, config, OLLAMA_DEFAULT_BASE_URL),
        }
    }

    fn session(&self) -> Result<Session, ProviderError> {
        self.core.session(|_| Ok(HeaderMap::new()))
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn model(&self) -> &str {
        self.core.model()
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        self.session().map(|_| ())
    }

    async fn generate_text(&self, req: &TextRequest) -> Result<CapabilityResponse, ProviderError> {
        let session = self.session()?;
        let body = encode_generate_request(self.core.model(), req);
        let response = session
            .transport
            .post_json(&session.url(GENERATE_PATH), &body)
            .await
            .map_err(|error| map_ollama_transport_error(self.core.model(), error))?;
        decode_generate_response(self.core.model(), &response)
    }

    /// Lists installed models instead of generating.
    async fn probe(&self) -> Result<bool, ProviderError> {
        let session = self.session()?;
        let tags = session
            .transport
            .get_json(&session.url(TAGS_PATH))
            .await
            .map_err(|error| map_ollama_transport_error(self.core.model(), error))?;
        Ok(tags_include_model(&tags, self.core.model()))
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn cleanup(&self) {
        self.core.release();
    }
}
