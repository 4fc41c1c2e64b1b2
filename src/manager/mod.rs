use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::join_all;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::config::{ProviderConfig, Settings, parse_priority};
use crate::core::error::ProviderError;
use crate::core::traits::{Provider, ProviderFactory};
use crate::core::types::{
    CapabilityResponse, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, ProviderId, ProviderStatus,
    ProviderStatusReport, TextRequest,
};
use crate::providers::BuiltinProviderFactory;

const TEST_PROMPT: &str = "Hello, this is a test. Please respond with 'Hello from [provider name]'";
const TEST_MAX_TOKENS: u32 = 50;

/// Lifecycle of the live-provider set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Not yet initialized; first use initializes on demand.
    Configured,
    Initialized,
    /// Torn down by `cleanup`; stays empty until `initialize` or reconfiguration.
    Released,
}

struct ManagerState {
    configs: IndexMap<ProviderId, ProviderConfig>,
    priority: Vec<ProviderId>,
    providers: IndexMap<ProviderId, Arc<dyn Provider>>,
    phase: Phase,
    temperature: f64,
    max_tokens: u32,
}

impl ManagerState {
    fn new() -> Self {
        Self {
            configs: IndexMap::new(),
            priority: Vec::new(),
            providers: IndexMap::new(),
            phase: Phase::Configured,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Live identities in priority order, then live unlisted ones in configuration order.
    fn available(&self) -> Vec<ProviderId> {
        let mut ordered: Vec<ProviderId> = self
            .priority
            .iter()
            .copied()
            .filter(|provider| self.providers.contains_key(provider))
            .collect();
        for provider in self.providers.keys() {
            if !ordered.contains(provider) {
                ordered.push(*provider);
            }
        }
        ordered
    }

    fn snapshot(&self, order: &[ProviderId]) -> Vec<(ProviderId, Arc<dyn Provider>)> {
        order
            .iter()
            .filter_map(|id| {
                self.providers
                    .get(id)
                    .map(|provider| (*id, Arc::clone(provider)))
            })
            .collect()
    }

    fn trial_order(&self, preferred: Option<ProviderId>) -> Vec<(ProviderId, Arc<dyn Provider>)> {
        let mut order = Vec::with_capacity(self.providers.len());
        if let Some(preferred) = preferred
            && self.providers.contains_key(&preferred)
        {
            order.push(preferred);
        }
        for provider in self.available() {
            if !order.contains(&provider) {
                order.push(provider);
            }
        }
        self.snapshot(&order)
    }

    /// Live identities that appear in the priority list, in that order.
    fn prioritized(&self) -> Vec<(ProviderId, Arc<dyn Provider>)> {
        self.snapshot(&self.priority)
    }
}

/// Owns the configured vendors and runs text generation with ordered fallback.
///
/// Lifecycle calls (`configure_from_env`, `initialize`, `cleanup`) take the
/// state write lock. Request paths copy the live providers out under a read
/// lock and release it before any network I/O, so concurrent requests never
/// wait on each other. Call `configure_from_env` and `initialize` once at
/// startup and `cleanup` at shutdown.
pub struct ProviderManager {
    state: RwLock<ManagerState>,
    factory: Arc<dyn ProviderFactory>,
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderManager {
    pub fn new() -> Self {
        Self::with_factory(Arc::new(BuiltinProviderFactory))
    }

    pub fn with_factory(factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            state: RwLock::new(ManagerState::new()),
            factory,
        }
    }

    /// Replaces configuration from settings. Never fails.
    pub async fn configure_from_env(&self, settings: &Settings) {
        let configs: IndexMap<ProviderId, ProviderConfig> = settings
            .vendors
            .iter()
            .map(|(provider, vendor)| {
                (
                    *provider,
                    ProviderConfig::from_settings(*provider, vendor, settings),
                )
            })
            .collect();
        let priority = parse_priority(&settings.provider_priority);

        let configured: Vec<&str> = configs.keys().map(|id| id.as_str()).collect();
        let ordered: Vec<&str> = priority.iter().map(|id| id.as_str()).collect();
        tracing::info!(
            count = configs.len(),
            providers = ?configured,
            priority = ?ordered,
            "configured AI providers"
        );

        let mut state = self.state.write().await;
        state.configs = configs;
        state.priority = priority;
        state.temperature = settings.temperature;
        state.max_tokens = settings.max_tokens;
        if state.phase == Phase::Released {
            state.phase = Phase::Configured;
        }
    }

    /// Builds and registers every usable provider. Idempotent.
    ///
    /// A provider whose construction or initialization fails is logged and
    /// skipped; the manager itself never fails to initialize.
    pub async fn initialize(&self) {
        let mut state = self.state.write().await;
        if state.phase == Phase::Initialized {
            return;
        }

        let mut live = IndexMap::new();
        for (provider, config) in &state.configs {
            if !config.is_configured() {
                tracing::debug!(provider = %provider, "skipping provider: not configured");
                continue;
            }

            let adapter = match self.factory.build(*provider, config) {
                Ok(adapter) => adapter,
                Err(error) => {
                    tracing::warn!(provider = %provider, error = %error, "failed to build provider");
                    continue;
                }
            };

            if !adapter.is_available() {
                tracing::debug!(provider = %provider, "skipping provider: not available");
                continue;
            }

            match adapter.initialize().await {
                Ok(()) => {
                    tracing::info!(
                        provider = %provider,
                        model = %config.model,
                        "initialized provider"
                    );
                    live.insert(*provider, adapter);
                }
                Err(error) => {
                    tracing::warn!(
                        provider = %provider,
                        kind = %error.kind,
                        error = %error,
                        "failed to initialize provider"
                    );
                }
            }
        }

        tracing::info!(count = live.len(), "initialized AI providers");
        state.providers = live;
        state.phase = Phase::Initialized;
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.phase == Phase::Initialized
    }

    /// Identities with stored configuration, in configuration order.
    pub async fn configured_providers(&self) -> Vec<ProviderId> {
        self.state.read().await.configs.keys().copied().collect()
    }

    pub async fn get_available_providers(&self) -> Vec<ProviderId> {
        self.ensure_initialized().await;
        self.state.read().await.available()
    }

    /// Probes every live provider concurrently.
    pub async fn get_provider_status(&self) -> BTreeMap<ProviderId, ProviderStatus> {
        self.ensure_initialized().await;
        let live = {
            let state = self.state.read().await;
            state.snapshot(&state.available())
        };

        let probes = live.into_iter().map(|(id, provider)| async move {
            let outcome = provider.probe().await;
            let last_check = unix_millis();
            let status = match outcome {
                Ok(healthy) => ProviderStatus {
                    name: id,
                    available: true,
                    healthy,
                    last_error: None,
                    last_check,
                },
                Err(error) => {
                    tracing::debug!(provider = %id, error = %error, "provider probe failed");
                    ProviderStatus {
                        name: id,
                        available: true,
                        healthy: false,
                        last_error: Some(error.to_string()),
                        last_check,
                    }
                }
            };
            (id, status)
        });

        join_all(probes).await.into_iter().collect()
    }

    /// Runs `req` against live providers in trial order; the first success wins.
    ///
    /// `preferred` goes first when it is live. Every per-provider failure is
    /// logged and the next provider is tried; only `no_providers` and
    /// `all_providers_failed` escape.
    pub async fn generate_text(
        &self,
        req: &TextRequest,
        preferred: Option<ProviderId>,
    ) -> Result<CapabilityResponse, ProviderError> {
        self.ensure_initialized().await;
        let order = {
            let state = self.state.read().await;
            if state.providers.is_empty() {
                return Err(ProviderError::no_providers());
            }
            state.trial_order(preferred)
        };

        let mut last_error: Option<ProviderError> = None;
        for (id, provider) in order {
            tracing::debug!(provider = %id, "attempting text generation");
            match provider.generate_text(req).await {
                Ok(response) => {
                    tracing::info!(
                        provider = %id,
                        total_tokens = response.usage.total_tokens,
                        "generated text"
                    );
                    return Ok(response);
                }
                Err(error) => {
                    if error.is_auth() {
                        tracing::warn!(
                            provider = %id,
                            error = %error,
                            "provider rejected credentials; trying next"
                        );
                    } else {
                        tracing::warn!(
                            provider = %id,
                            kind = %error.kind,
                            error = %error,
                            "provider failed; trying next"
                        );
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(ProviderError::all_providers_failed(last_error.as_ref()))
    }

    /// First live provider in priority order that passes a health check.
    pub async fn get_preferred_provider(&self) -> Option<ProviderId> {
        self.ensure_initialized().await;
        let candidates = self.state.read().await.prioritized();

        for (id, provider) in candidates {
            if provider.health_check().await {
                return Some(id);
            }
        }
        None
    }

    /// Tears down live providers. Configuration is kept.
    pub async fn cleanup(&self) {
        let mut state = self.state.write().await;
        for (id, provider) in state.providers.drain(..) {
            provider.cleanup().await;
            tracing::debug!(provider = %id, "released provider");
        }
        state.phase = Phase::Released;
        tracing::info!("AI providers cleaned up");
    }

    /// Availability, preference and health in one serializable value.
    pub async fn status_report(&self) -> ProviderStatusReport {
        let available_providers = self.get_available_providers().await;
        let provider_status = self.get_provider_status().await;
        let priority = self.state.read().await.priority.clone();

        let preferred_provider = priority.into_iter().find(|id| {
            provider_status
                .get(id)
                .is_some_and(|status| status.healthy)
        });
        let healthy_providers = provider_status
            .values()
            .filter(|status| status.healthy)
            .count();

        ProviderStatusReport {
            available_providers,
            preferred_provider,
            total_providers: provider_status.len(),
            healthy_providers,
            provider_status,
        }
    }

    /// Sends a short fixed greeting with `provider` tried first.
    pub async fn test_provider(
        &self,
        provider: ProviderId,
    ) -> Result<CapabilityResponse, ProviderError> {
        let req = self
            .text_request(TEST_PROMPT)
            .await
            .with_max_tokens(TEST_MAX_TOKENS);
        self.generate_text(&req, Some(provider)).await
    }

    /// A request seeded with the configured temperature and token limit.
    pub async fn text_request(&self, prompt: impl Into<String>) -> TextRequest {
        let state = self.state.read().await;
        TextRequest::new(prompt)
            .with_temperature(state.temperature)
            .with_max_tokens(state.max_tokens)
    }

    async fn ensure_initialized(&self) {
        let phase = self.state.read().await.phase;
        if phase == Phase::Configured {
            self.initialize().await;
        }
    }
}

fn unix_millis() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| u64::try_from(elapsed.as_millis()).ok())
}
