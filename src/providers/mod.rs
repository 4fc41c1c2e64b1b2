use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::core::error::ProviderError;
use crate::core::traits::{Provider, ProviderFactory};
use crate::core::types::ProviderId;

pub mod anthropic;
pub(crate) mod anthropic_translate;
pub(crate) mod chat_translate;
pub mod google;
pub(crate) mod google_translate;
pub mod ollama;
pub(crate) mod ollama_translate;
pub mod openai_compat;
pub(crate) mod session;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use ollama::OllamaProvider;
pub use openai_compat::{ChatCompletionsProvider, ChatVendor};

/// Maps every known identity to its HTTP adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinProviderFactory;

impl ProviderFactory for BuiltinProviderFactory {
    fn build(
        &self,
        provider: ProviderId,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        let adapter: Arc<dyn Provider> = match provider {
            ProviderId::Openai => Arc::new(ChatCompletionsProvider::openai(config)),
            ProviderId::Openrouter => Arc::new(ChatCompletionsProvider::openrouter(config)),
            ProviderId::Xai => Arc::new(ChatCompletionsProvider::xai(config)),
            ProviderId::Anthropic => Arc::new(AnthropicProvider::new(config)),
            ProviderId::Google => Arc::new(GoogleProvider::new(config)),
            ProviderId::Ollama => Arc::new(OllamaProvider::new(config)),
        };
        Ok(adapter)
    }
}
