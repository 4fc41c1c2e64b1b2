use serde_json::json;

use super::*;
use crate::core::types::ExtraOptions;

#[test]
fn test_system_prompt_is_folded_into_user_turn() {
    let req = TextRequest::new("A5s on the button?").with_system_prompt("You are a coach");
    assert_eq!(
        compose_prompt(&req),
        "You are a coach\n\nUser: A5s on the button?\n\nAssistant:"
    );
    assert_eq!(compose_prompt(&TextRequest::new("plain")), "plain");
}

#[test]
fn test_encode_sets_generation_config_and_safety() {
    let req = TextRequest::new("hi")
        .with_temperature(0.5)
        .with_max_tokens(256)
        .with_extra(
            ExtraOptions::new()
                .with("topK", 40_i64)
                .with("temperature", 1.0),
        );

    let body = encode_google_request(&req);
    assert_eq!(
        body["contents"],
        json!([{"role": "user", "parts": [{"text": "hi"}]}])
    );
    assert_eq!(
        body["generationConfig"],
        json!({"temperature": 0.5, "maxOutputTokens": 256, "topK": 40})
    );

    let safety = body["safetySettings"].as_array().expect("safety settings");
    assert_eq!(safety.len(), 4);
    assert!(
        safety
            .iter()
            .all(|setting| setting["threshold"] == json!("BLOCK_ONLY_HIGH"))
    );
    assert_eq!(safety[0]["category"], json!("HARM_CATEGORY_HARASSMENT"));
}

#[test]
fn test_encode_keeps_decimal_temperature() {
    let body = encode_google_request(&TextRequest::new("hi").with_temperature(0.1));
    assert_eq!(body["generationConfig"]["temperature"], json!(0.1));
}

#[test]
fn test_generate_content_path_embeds_model() {
    assert_eq!(
        generate_content_path("gemini-1.5-pro"),
        "/v1beta/models/gemini-1.5-pro:generateContent"
    );
}

#[test]
fn test_decode_concatenates_parts_and_reads_usage() {
    let body = json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "Bet "}, {"text": "half pot."}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 18, "candidatesTokenCount": 5, "totalTokenCount": 23},
        "responseId": "resp-abc",
        "modelVersion": "gemini-1.5-pro-002"
    });

    let response = decode_google_response("gemini-1.5-pro", &body).expect("decodes");
    assert_eq!(response.content, "Bet half pot.");
    assert_eq!(response.provider, ProviderId::Google);
    assert_eq!(response.usage, TokenUsage::new(18, 5));
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    assert_eq!(response.metadata.get("response_id"), Some(&json!("resp-abc")));
    assert_eq!(
        response.metadata.get("model_version"),
        Some(&json!("gemini-1.5-pro-002"))
    );
}

#[test]
fn test_decode_zero_fills_missing_usage() {
    let body = json!({"candidates": [{"content": {"parts": [{"text": "ok"}]}}]});

    let response = decode_google_response("gemini", &body).expect("decodes");
    assert_eq!(response.usage, TokenUsage::default());
    assert!(response.metadata.is_empty());
}

#[test]
fn test_blocked_prompt_is_content_filter() {
    let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});

    let err = decode_google_response("gemini", &body).expect_err("blocked");
    assert_eq!(err.kind, ErrorKind::ContentFilter);
    assert!(err.message.contains("prompt blocked: SAFETY"));
}

#[test]
fn test_safety_stop_without_text_is_content_filter() {
    let body = json!({"candidates": [{"finishReason": "SAFETY", "safetyRatings": []}]});

    let err = decode_google_response("gemini", &body).expect_err("blocked");
    assert_eq!(err.kind, ErrorKind::ContentFilter);
}

#[test]
fn test_missing_candidates_is_unknown_error() {
    let err = decode_google_response("gemini", &json!({})).expect_err("empty");
    assert_eq!(err.kind, ErrorKind::UnknownError);
}

#[test]
fn test_status_errors_are_classified_by_text() {
    let invalid_key = TransportError::Status {
        status_code: 400,
        body: r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#.to_string(),
    };
    let err = map_google_transport_error(invalid_key);
    assert_eq!(err.kind, ErrorKind::AuthError);
    assert_eq!(err.status_code, Some(400));
    assert!(err.message.contains("API key not valid"));

    let exhausted = TransportError::Status {
        status_code: 429,
        body: r#"{"error":{"message":"Resource has been exhausted (e.g. check quota)."}}"#.to_string(),
    };
    assert_eq!(map_google_transport_error(exhausted).kind, ErrorKind::RateLimit);

    let server = TransportError::Status {
        status_code: 500,
        body: "internal".to_string(),
    };
    let err = map_google_transport_error(server);
    assert_eq!(err.kind, ErrorKind::UnknownError);
    assert_eq!(err.status_code, Some(500));
}

#[test]
fn test_classify_keywords() {
    assert_eq!(classify("Authentication required"), ErrorKind::AuthError);
    assert_eq!(classify("Rate limit reached"), ErrorKind::RateLimit);
    assert_eq!(classify("candidate was blocked"), ErrorKind::ContentFilter);
    assert_eq!(classify("socket closed"), ErrorKind::UnknownError);
}

#[test]
fn test_probe_content_detection() {
    assert!(google_probe_has_content(
        &json!({"candidates": [{"content": {"parts": [{"text": "H"}]}}]})
    ));
    assert!(!google_probe_has_content(&json!({"candidates": []})));
}
