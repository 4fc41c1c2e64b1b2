//! Anthropic Messages API codec.
//!
//! The system prompt travels as the top-level `system` field, not as a message.
//! Error bodies use the `{"type":"error","error":{"type":..,"message":..}}`
//! envelope, which is recognized both on non-2xx statuses and in 200 replies.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{CapabilityResponse, ErrorKind, ProviderId, TextRequest, TokenUsage};
use crate::providers::chat_translate::describe_error_body;
use crate::transport::http::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnthropicErrorEnvelope {
    pub error_type: Option<String>,
    pub message: String,
    pub request_id: Option<String>,
}

pub(crate) fn encode_anthropic_request(model: &str, req: &TextRequest) -> Value {
    let mut body = Map::new();
    body.insert("model".to_string(), json!(model));
    body.insert(
        "messages".to_string(),
        json!([{"role": "user", "content": req.prompt}]),
    );
    body.insert("temperature".to_string(), json!(req.temperature));
    body.insert("max_tokens".to_string(), json!(req.max_tokens));
    if let Some(system) = req.system_text() {
        body.insert("system".to_string(), json!(system));
    }
    req.extra.merge_into(&mut body);

    Value::Object(body)
}

pub(crate) fn decode_anthropic_response(
    model: &str,
    body: &Value,
) -> Result<CapabilityResponse, ProviderError> {
    let root = body.as_object().ok_or_else(|| {
        unexpected("Anthropic unexpected error: response payload must be a JSON object")
    })?;

    if root.get("type").and_then(Value::as_str) == Some("error") {
        let detail = parse_anthropic_error_value(body)
            .map(|envelope| format_anthropic_error_message(&envelope))
            .unwrap_or_else(|| body.to_string());
        return Err(ProviderError::new(
            ProviderId::Anthropic,
            ErrorKind::ApiError,
            format!("Anthropic API error: {detail}"),
        ));
    }

    let content = root
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let finish_reason = root
        .get("stop_reason")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut metadata = BTreeMap::new();
    if let Some(id) = root.get("id").filter(|id| !id.is_null()) {
        metadata.insert("response_id".to_string(), id.clone());
    }

    Ok(CapabilityResponse {
        content,
        provider: ProviderId::Anthropic,
        model: model.to_string(),
        usage: decode_usage(root.get("usage")),
        finish_reason,
        metadata,
    })
}

fn decode_usage(usage: Option<&Value>) -> TokenUsage {
    let count = |key: &str| {
        usage
            .and_then(|usage| usage.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    };
    TokenUsage::new(count("input_tokens"), count("output_tokens"))
}

pub(crate) fn anthropic_probe_has_content(body: &Value) -> bool {
    body.pointer("/content/0/text")
        .and_then(Value::as_str)
        .is_some_and(|text| !text.is_empty())
}

pub(crate) fn map_anthropic_transport_error(error: TransportError) -> ProviderError {
    match error {
        TransportError::Status { status_code, body } => {
            let detail = parse_anthropic_error_envelope(&body)
                .map(|envelope| format_anthropic_error_message(&envelope))
                .unwrap_or_else(|| describe_error_body(&body));
            let (kind, message) = match status_code {
                401 => (
                    ErrorKind::AuthError,
                    format!("Anthropic authentication failed: {detail}"),
                ),
                429 => (
                    ErrorKind::RateLimit,
                    format!("Anthropic rate limit exceeded: {detail}"),
                ),
                _ => (ErrorKind::ApiError, format!("Anthropic API error: {detail}")),
            };
            ProviderError::new(ProviderId::Anthropic, kind, message).with_status(status_code)
        }
        other => unexpected(&format!("Anthropic unexpected error: {other}")),
    }
}

pub(crate) fn parse_anthropic_error_envelope(body: &str) -> Option<AnthropicErrorEnvelope> {
    let payload = serde_json::from_str::<Value>(body).ok()?;
    parse_anthropic_error_value(&payload)
}

fn parse_anthropic_error_value(payload: &Value) -> Option<AnthropicErrorEnvelope> {
    let root = payload.as_object()?;
    let error_obj = root.get("error")?.as_object()?;
    let message = error_obj
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)?;

    let error_type = error_obj
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);
    let request_id = root
        .get("request_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(AnthropicErrorEnvelope {
        error_type,
        message,
        request_id,
    })
}

pub(crate) fn format_anthropic_error_message(envelope: &AnthropicErrorEnvelope) -> String {
    let mut message = envelope.message.clone();
    if let Some(error_type) = &envelope.error_type {
        message.push_str(&format!(" [type={error_type}]"));
    }
    if let Some(request_id) = &envelope.request_id {
        message.push_str(&format!(" [request_id={request_id}]"));
    }
    message
}

fn unexpected(message: &str) -> ProviderError {
    ProviderError::new(ProviderId::Anthropic, ErrorKind::UnknownError, message)
}
