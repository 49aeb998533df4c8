use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::gemini::GeminiClient;
use crate::llm::models::provider_base::{GenerationOptions, ProviderClient};
use crate::llm::models::transport::{HttpTransport, ReqwestTransport};
use crate::tests::support::ok_body;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GeminiClient {
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(None).unwrap());
    GeminiClient::new(
        server.uri(),
        "g-test".to_string(),
        "gemini-pro".to_string(),
        Some(transport),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generate_response_posts_generate_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .and(header("x-goog-api-key", "g-test"))
            .and(body_partial_json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Write a haiku" }] }],
                "generationConfig": { "maxOutputTokens": 64 }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(ok_body(LLMProvider::Gemini, "leaves fall")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let options = GenerationOptions {
            max_tokens: Some(64),
            temperature: Some(0.2),
        };
        let text = client_for(&server).generate_response("Write a haiku", &options).await;
        assert_eq!(text, "leaves fall");
    }

    #[tokio::test]
    async fn blocked_prompt_without_candidates_is_an_error_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate_response("hello", &GenerationOptions::default())
            .await;
        assert_eq!(text, "Error from Gemini: response did not contain any candidates");
    }

    #[tokio::test]
    async fn quota_error_becomes_error_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("RESOURCE_EXHAUSTED"))
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate_response("hello", &GenerationOptions::default())
            .await;
        assert!(text.starts_with("Error from Gemini: "), "got {}", text);
        assert!(text.contains("429"));
    }

    #[tokio::test]
    async fn validate_connection_requires_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;
        assert!(!client_for(&server).validate_connection().await);

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "generationConfig": { "maxOutputTokens": 10 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(LLMProvider::Gemini, "Hello!")))
            .mount(&server)
            .await;
        assert!(client_for(&server).validate_connection().await);
    }

    #[tokio::test]
    async fn network_error_does_not_expose_api_key() {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(None).unwrap());
        let client = GeminiClient::new(
            "http://127.0.0.1:9/v1beta".to_string(),
            "SECRET-KEY-123".to_string(),
            "gemini-pro".to_string(),
            Some(transport),
        );

        let text = client
            .generate_response("hello", &GenerationOptions::default())
            .await;
        assert!(text.starts_with("Error from Gemini: "), "got {}", text);
        assert!(!text.contains("SECRET-KEY-123"), "key leaked: {}", text);
    }

    #[tokio::test]
    async fn missing_transport_reports_unavailable() {
        let client = GeminiClient::new(
            "http://127.0.0.1:9".to_string(),
            "k".to_string(),
            "gemini-pro".to_string(),
            None,
        );
        let text = client.generate_response("hi", &GenerationOptions::default()).await;
        assert!(text.starts_with("Error from Gemini: Google GenerativeAI client not available"));
        assert!(!client.get_provider_info().await.available);
    }
}
