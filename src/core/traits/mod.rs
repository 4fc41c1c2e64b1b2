use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::core::error::ProviderError;
use crate::core::types::{CapabilityResponse, ProviderId, TextRequest};

/// Contract shared by every vendor adapter.
///
/// Adapters normalize output into [`CapabilityResponse`] and map every vendor
/// failure into a [`ProviderError`] tagged with their own identity. Client
/// handles are created lazily, so `generate_text` and `probe` work even when
/// `initialize` was never called.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Fixed identity of this variant.
    fn id(&self) -> ProviderId;

    fn provider_name(&self) -> &'static str {
        self.id().as_str()
    }

    /// Model identifier sent to the vendor.
    fn model(&self) -> &str;

    /// Creates the underlying client handle. Idempotent.
    async fn initialize(&self) -> Result<(), ProviderError>;

    /// Sends one non-streaming completion request.
    async fn generate_text(&self, req: &TextRequest) -> Result<CapabilityResponse, ProviderError>;

    /// Cheapest live probe, reporting why it failed.
    async fn probe(&self) -> Result<bool, ProviderError>;

    /// Boolean form of [`Provider::probe`]; never surfaces an error.
    async fn health_check(&self) -> bool {
        match self.probe().await {
            Ok(healthy) => healthy,
            Err(error) => {
                tracing::debug!(provider = %self.id(), error = %error, "health check failed");
                false
            }
        }
    }

    /// Local credential check. Performs no I/O.
    fn is_available(&self) -> bool;

    /// Releases the client handle, if one was created.
    async fn cleanup(&self);
}

/// Builds live providers from configuration.
///
/// The manager never names concrete adapters; it asks the factory, which keeps
/// construction observable and replaceable.
pub trait ProviderFactory: Send + Sync {
    fn build(
        &self,
        provider: ProviderId,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn Provider>, ProviderError>;
}
