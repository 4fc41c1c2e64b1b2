use std::sync::Arc;

use coach_providers::config::{DEFAULT_PROVIDER_PRIORITY, credential_is_usable, parse_priority};
use coach_providers::providers::{
    AnthropicProvider, ChatCompletionsProvider, ChatVendor, GoogleProvider, OllamaProvider,
};
use coach_providers::{
    BuiltinProviderFactory, CapabilityResponse, ConfigError, ExtraOptions, ExtraValue, Provider,
    ProviderConfig, ProviderError, ProviderFactory, ProviderId, ProviderManager, ProviderStatus,
    ProviderStatusReport, Settings, TextRequest, TokenUsage, VendorSettings,
};

#[test]
fn test_public_api_compiles() {
    let _manager: ProviderManager = ProviderManager::default();
    let _with_factory = ProviderManager::with_factory(Arc::new(BuiltinProviderFactory));

    let config = ProviderConfig::new(ProviderId::Openai, "sk-test", "gpt-4");
    let adapters: Vec<Arc<dyn Provider>> = vec![
        Arc::new(ChatCompletionsProvider::new(ChatVendor::OpenAi, &config)),
        Arc::new(AnthropicProvider::new(&config)),
        Arc::new(GoogleProvider::new(&config)),
        Arc::new(OllamaProvider::new(&config)),
    ];
    assert_eq!(adapters.len(), 4);

    let _built: Result<Arc<dyn Provider>, ProviderError> =
        BuiltinProviderFactory.build(ProviderId::Xai, &config);

    let _req = TextRequest::new("hi")
        .with_extra(ExtraOptions::new().with("top_p", ExtraValue::Float(0.9)));
    let _usage = TokenUsage::new(1, 2);

    let settings = Settings::default().with_vendor(
        ProviderId::Google,
        VendorSettings::with_api_key("key").model("gemini-1.5-pro"),
    );
    let _settings_err: Result<Settings, ConfigError> = Settings::from_lookup(|_| None);
    assert!(settings.vendor(ProviderId::Google).is_some());

    assert_eq!(parse_priority(DEFAULT_PROVIDER_PRIORITY).len(), 6);
    assert!(!credential_is_usable("none"));

    let _types: Option<(CapabilityResponse, ProviderStatus, ProviderStatusReport)> = None;
}
