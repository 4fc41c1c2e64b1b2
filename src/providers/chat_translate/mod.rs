use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{CapabilityResponse, ErrorKind, ProviderId, TextRequest, TokenUsage};
use crate::transport::http::TransportError;

/// Encodes a chat-completions body; the system prompt becomes a leading message.
pub(crate) fn encode_chat_request(model: &str, req: &TextRequest) -> Value {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = req.system_text() {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.push(json!({"role": "user", "content": req.prompt}));

    let mut body = Map::new();
    body.insert("model".to_string(), json!(model));
    body.insert("messages".to_string(), Value::Array(messages));
    body.insert("temperature".to_string(), json!(req.temperature));
    body.insert("max_tokens".to_string(), json!(req.max_tokens));
    req.extra.merge_into(&mut body);

    Value::Object(body)
}

pub(crate) fn decode_chat_response(
    provider: ProviderId,
    label: &str,
    model: &str,
    body: &Value,
) -> Result<CapabilityResponse, ProviderError> {
    let root = body.as_object().ok_or_else(|| {
        ProviderError::new(
            provider,
            ErrorKind::UnknownError,
            format!("{label} unexpected error: response payload must be a JSON object"),
        )
    })?;

    if let Some(error) = root.get("error").filter(|error| !error.is_null()) {
        return Err(ProviderError::new(
            provider,
            ErrorKind::ApiError,
            format!("{label} API error: {}", describe_error_value(error)),
        ));
    }

    let choice = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ProviderError::new(
                provider,
                ErrorKind::UnknownError,
                format!("{label} unexpected error: response contained no choices"),
            )
        })?;

    let content = choice
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let finish_reason = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut metadata = BTreeMap::new();
    if let Some(id) = root.get("id").filter(|id| !id.is_null()) {
        metadata.insert("response_id".to_string(), id.clone());
    }

    Ok(CapabilityResponse {
        content,
        provider,
        model: model.to_string(),
        usage: decode_chat_usage(root.get("usage")),
        finish_reason,
        metadata,
    })
}

fn decode_chat_usage(usage: Option<&Value>) -> TokenUsage {
    let Some(usage) = usage.and_then(Value::as_object) else {
        return TokenUsage::default();
    };

    TokenUsage::new(
        usage
            .get("prompt_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        usage
            .get("completion_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0),
    )
}

/// True when the probe reply carries non-empty assistant text.
pub(crate) fn chat_probe_has_content(body: &Value) -> bool {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .is_some_and(|content| !content.is_empty())
}

pub(crate) fn map_chat_transport_error(
    provider: ProviderId,
    label: &str,
    error: TransportError,
) -> ProviderError {
    match error {
        TransportError::Status { status_code, body } => {
            let detail = describe_error_body(&body);
            let (kind, message) = match status_code {
                401 => (
                    ErrorKind::AuthError,
                    format!("{label} authentication failed: {detail}"),
                ),
                429 => (
                    ErrorKind::RateLimit,
                    format!("{label} rate limit exceeded: {detail}"),
                ),
                _ => (ErrorKind::ApiError, format!("{label} API error: {detail}")),
            };
            ProviderError::new(provider, kind, message).with_status(status_code)
        }
        other => ProviderError::new(
            provider,
            ErrorKind::UnknownError,
            format!("{label} unexpected error: {other}"),
        ),
    }
}

/// Extracts `error.message` from a vendor error body, falling back to the raw text.
pub(crate) fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("error") {
            Some(error) => describe_error_value(error),
            None => body.trim().to_string(),
        },
        Err(_) => body.trim().to_string(),
    }
}

fn describe_error_value(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => {
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified error");
            match fields
                .get("code")
                .or_else(|| fields.get("type"))
                .filter(|code| !code.is_null())
            {
                Some(Value::String(code)) => format!("{message} [code={code}]"),
                Some(code) => format!("{message} [code={code}]"),
                None => message.to_string(),
            }
        }
        other => other.to_string(),
    }
}
