use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::core::error::ProviderError;
use crate::core::traits::Provider;
use crate::core::types::{CapabilityResponse, ProviderId, TextRequest};
use crate::providers::chat_translate::{
    chat_probe_has_content, decode_chat_response, encode_chat_request, map_chat_transport_error,
};
use crate::providers::session::{AdapterCore, Session};

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const XAI_DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

const OPENROUTER_HTTP_REFERER: &str = "https://ai-poker-coach.com";
const OPENROUTER_X_TITLE: &str = "AI Poker Coach";

/// Vendors speaking the OpenAI chat-completions protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatVendor {
    OpenAi,
    OpenRouter,
    Xai,
}

impl ChatVendor {
    pub fn id(self) -> ProviderId {
        match self {
            Self::OpenAi => ProviderId::Openai,
            Self::OpenRouter => ProviderId::Openrouter,
            Self::Xai => ProviderId::Xai,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::OpenRouter => "OpenRouter",
            Self::Xai => "XAI",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_DEFAULT_BASE_URL,
            Self::OpenRouter => OPENROUTER_DEFAULT_BASE_URL,
            Self::Xai => XAI_DEFAULT_BASE_URL,
        }
    }
}

pub struct ChatCompletionsProvider {
    vendor: ChatVendor,
    core: AdapterCore,
}

impl ChatCompletionsProvider {
    pub fn new(vendor: ChatVendor, config: &ProviderConfig) -> Self {
        Self {
            vendor,
            core: AdapterCore::new(vendor.id(), config, vendor.default_base_url()),
        }
    }

    pub fn openai(config: &ProviderConfig) -> Self {
        Self::new(ChatVendor::OpenAi, config)
    }

    pub fn openrouter(config: &ProviderConfig) -> Self {
        Self::new(ChatVendor::OpenRouter, config)
    }

    pub fn xai(config: &ProviderConfig) -> Self {
        Self::new(ChatVendor::Xai, config)
    }

    pub fn vendor(&self) -> ChatVendor {
        self.vendor
    }

    fn session(&self) -> Result<Session, ProviderError> {
        let vendor = self.vendor;
        self.core.session(|core| default_headers(vendor, core))
    }

    async fn send(&self, body: &Value) -> Result<Value, ProviderError> {
        let session = self.session()?;
        session
            .transport
            .post_json(&session.url(CHAT_COMPLETIONS_PATH), body)
            .await
            .map_err(|error| map_chat_transport_error(self.vendor.id(), self.vendor.label(), error))
    }
}

fn default_headers(vendor: ChatVendor, core: &AdapterCore) -> Result<HeaderMap, ProviderError> {
    let mut headers = core.bearer_headers()?;
    if vendor == ChatVendor::OpenRouter {
        for (name, value) in [
            ("http-referer", OPENROUTER_HTTP_REFERER),
            ("x-title", OPENROUTER_X_TITLE),
        ] {
            let (name, value) = core.header(name, value)?;
            headers.insert(name, value);
        }
    }
    Ok(headers)
}

#[async_trait]
impl Provider for ChatCompletionsProvider {
    fn id(&self) -> ProviderId {
        self.vendor.id()
    }

    fn model(&self) -> &str {
        self.core.model()
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        self.session().map(|_| ())
    }

    async fn generate_text(&self, req: &TextRequest) -> Result<CapabilityResponse, ProviderError> {
        let body = encode_chat_request(self.core.model(), req);
        let response = self.send(&body).await?;
        decode_chat_response(
            self.vendor.id(),
            self.vendor.label(),
            self.core.model(),
            &response,
        )
    }

    async fn probe(&self) -> Result<bool, ProviderError> {
        let body = encode_chat_request(self.core.model(), &TextRequest::probe());
        let response = self.send(&body).await?;
        Ok(chat_probe_has_content(&response))
    }

    fn is_available(&self) -> bool {
        self.core.has_usable_credential()
    }

    async fn cleanup(&self) {
        self.core.release();
    }
}
