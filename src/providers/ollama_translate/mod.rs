use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{CapabilityResponse, ErrorKind, ProviderId, TextRequest, TokenUsage};
use crate::providers::chat_translate::describe_error_body;
use crate::transport::http::TransportError;

const TIMING_FIELDS: [&str; 4] = [
    "total_duration",
    "load_duration",
    "prompt_eval_duration",
    "eval_duration",
];

pub(crate) fn compose_prompt(req: &TextRequest) -> String {
    match req.system_text() {
        Some(system) => format!("System: {system}\n\nUser: {}\n\nAssistant:", req.prompt),
        None => req.prompt.clone(),
    }
}

pub(crate) fn encode_generate_request(model: &str, req: &TextRequest) -> Value {
    let mut options = Map::new();
    options.insert("temperature".to_string(), json!(req.temperature));
    options.insert("num_predict".to_string(), json!(req.max_tokens));
    req.extra.merge_into(&mut options);

    json!({
        "model": model,
        "prompt": compose_prompt(req),
        "stream": false,
        "options": Value::Object(options),
    })
}

pub(crate) fn decode_generate_response(
    model: &str,
    body: &Value,
) -> Result<CapabilityResponse, ProviderError> {
    let root = body.as_object().ok_or_else(|| {
        ProviderError::new(
            ProviderId::Ollama,
            ErrorKind::UnknownError,
            "Ollama unexpected error: response payload must be a JSON object",
        )
    })?;

    if let Some(error) = root.get("error").filter(|error| !error.is_null()) {
        let detail = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ProviderError::new(
            ProviderId::Ollama,
            ErrorKind::ApiError,
            format!("Ollama API error: {detail}"),
        ));
    }

    let count = |key: &str| root.get(key).and_then(Value::as_u64).unwrap_or(0);
    let done = root.get("done").and_then(Value::as_bool).unwrap_or(false);

    let metadata: BTreeMap<String, Value> = TIMING_FIELDS
        .iter()
        .filter_map(|field| {
            root.get(*field)
                .filter(|value| !value.is_null())
                .map(|value| (field.to_string(), value.clone()))
        })
        .collect();

    Ok(CapabilityResponse {
        content: root
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        provider: ProviderId::Ollama,
        model: model.to_string(),
        usage: TokenUsage::new(count("prompt_eval_count"), count("eval_count")),
        finish_reason: Some(if done { "stop" } else { "length" }.to_string()),
        metadata,
    })
}

/// True when `/api/tags` lists `model` by exact name.
pub(crate) fn tags_include_model(body: &Value, model: &str) -> bool {
    body.get("models")
        .and_then(Value::as_array)
        .is_some_and(|models| {
            models
                .iter()
                .filter_map(|entry| entry.get("name").and_then(Value::as_str))
                .any(|name| name == model)
        })
}

pub(crate) fn map_ollama_transport_error(model: &str, error: TransportError) -> ProviderError {
    match error {
        TransportError::Status {
            status_code: 404, ..
        } => ProviderError::new(
            ProviderId::Ollama,
            ErrorKind::ModelNotFound,
            format!("Ollama model not found: {model}"),
        )
        .with_status(404),
        TransportError::Status { status_code, body } => ProviderError::new(
            ProviderId::Ollama,
            ErrorKind::ApiError,
            format!("Ollama HTTP error: {}", describe_error_body(&body)),
        )
        .with_status(status_code),
        TransportError::Connect { message } => ProviderError::new(
            ProviderId::Ollama,
            ErrorKind::ConnectionError,
            format!("Ollama connection failed - is Ollama running? ({message})"),
        ),
        other => ProviderError::new(
            ProviderId::Ollama,
            ErrorKind::UnknownError,
            format!("Ollama unexpected error: {other}"),
        ),
    }
}
