//! Gemini `generateContent` codec.
//!
//! Gemini reports most failures as prose, so classification works on message
//! substrings rather than on status codes alone.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{CapabilityResponse, ErrorKind, ProviderId, TextRequest, TokenUsage};
use crate::providers::chat_translate::describe_error_body;
use crate::transport::http::TransportError;

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const BLOCK_THRESHOLD: &str = "BLOCK_ONLY_HIGH";
const SAFETY_FINISH_REASON: &str = "SAFETY";

pub(crate) fn generate_content_path(model: &str) -> String {
    format!("/v1beta/models/{model}:generateContent")
}

/// Gemini has no system role here; the system prompt is folded into the user turn.
pub(crate) fn compose_prompt(req: &TextRequest) -> String {
    match req.system_text() {
        Some(system) => format!("{system}\n\nUser: {}\n\nAssistant:", req.prompt),
        None => req.prompt.clone(),
    }
}

pub(crate) fn encode_google_request(req: &TextRequest) -> Value {
    let mut generation_config = Map::new();
    generation_config.insert("temperature".to_string(), json!(req.temperature));
    generation_config.insert("maxOutputTokens".to_string(), json!(req.max_tokens));
    req.extra.merge_into(&mut generation_config);

    let safety_settings: Vec<Value> = HARM_CATEGORIES
        .iter()
        .map(|category| json!({"category": category, "threshold": BLOCK_THRESHOLD}))
        .collect();

    json!({
        "contents": [{"role": "user", "parts": [{"text": compose_prompt(req)}]}],
        "generationConfig": Value::Object(generation_config),
        "safetySettings": safety_settings,
    })
}

pub(crate) fn decode_google_response(
    model: &str,
    body: &Value,
) -> Result<CapabilityResponse, ProviderError> {
    let root = body
        .as_object()
        .ok_or_else(|| classified("response payload must be a JSON object"))?;

    if let Some(error) = root.get("error").filter(|error| !error.is_null()) {
        let detail = describe_error_body(&json!({"error": error}).to_string());
        return Err(classified(&detail));
    }

    let candidate = root
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first());

    let Some(candidate) = candidate else {
        if let Some(reason) = root
            .get("promptFeedback")
            .and_then(|feedback| feedback.get("blockReason"))
            .and_then(Value::as_str)
        {
            return Err(classified(&format!("prompt blocked: {reason}")));
        }
        return Err(classified("response contained no candidates"));
    };

    let content = candidate_text(candidate);
    let finish_reason = candidate
        .get("finishReason")
        .and_then(Value::as_str)
        .map(str::to_string);

    if content.is_empty() && finish_reason.as_deref() == Some(SAFETY_FINISH_REASON) {
        return Err(classified("response blocked by safety filters"));
    }

    let mut metadata = BTreeMap::new();
    for (source, target) in [("responseId", "response_id"), ("modelVersion", "model_version")] {
        if let Some(value) = root.get(source).filter(|value| !value.is_null()) {
            metadata.insert(target.to_string(), value.clone());
        }
    }

    Ok(CapabilityResponse {
        content,
        provider: ProviderId::Google,
        model: model.to_string(),
        usage: decode_usage(root.get("usageMetadata")),
        finish_reason,
        metadata,
    })
}

fn candidate_text(candidate: &Value) -> String {
    candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn decode_usage(usage: Option<&Value>) -> TokenUsage {
    let count = |key: &str| {
        usage
            .and_then(|usage| usage.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    };
    TokenUsage::new(count("promptTokenCount"), count("candidatesTokenCount"))
}

pub(crate) fn google_probe_has_content(body: &Value) -> bool {
    body.pointer("/candidates/0")
        .map(candidate_text)
        .is_some_and(|text| !text.is_empty())
}

pub(crate) fn map_google_transport_error(error: TransportError) -> ProviderError {
    match error {
        TransportError::Status { status_code, body } => {
            let detail = describe_error_body(&body);
            // Reason codes such as API_KEY_INVALID live in `error.details`, not the message.
            let kind = classify(&format!("{detail} {body}"));
            ProviderError::new(
                ProviderId::Google,
                kind,
                format!("Google Gemini error: {detail}"),
            )
            .with_status(status_code)
        }
        other => classified(&other.to_string()),
    }
}

/// Maps Gemini failure text to an error kind.
pub(crate) fn classify(message: &str) -> ErrorKind {
    let lowered = message.to_lowercase();
    if message.contains("API_KEY_INVALID") || lowered.contains("authentication") {
        ErrorKind::AuthError
    } else if lowered.contains("quota") || lowered.contains("rate limit") {
        ErrorKind::RateLimit
    } else if lowered.contains("blocked") {
        ErrorKind::ContentFilter
    } else {
        ErrorKind::UnknownError
    }
}

fn classified(detail: &str) -> ProviderError {
    ProviderError::new(
        ProviderId::Google,
        classify(detail),
        format!("Google Gemini error: {detail}"),
    )
}

#[cfg(test)]
mod tests;
