use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::transport::UnavailableTransportFactory;
use crate::llm::orchestrator::{AiPowerhouse, NO_PROVIDERS_KEY, NO_PROVIDERS_MESSAGE};
use crate::tests::support::{config_with, ok_body, MockTransport, MockTransports, Reply};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn replying(provider: LLMProvider, text: &str) -> Arc<MockTransport> {
    MockTransport::new(Reply::Json(ok_body(provider, text)))
}

fn all_replying() -> (AiPowerhouse, [Arc<MockTransport>; 3]) {
    let mocks = [
        replying(LLMProvider::Claude, "from claude"),
        replying(LLMProvider::Gemini, "from gemini"),
        replying(LLMProvider::OpenAI, "from openai"),
    ];
    let factory = MockTransports::default()
        .with(LLMProvider::Claude, mocks[0].clone())
        .with(LLMProvider::Gemini, mocks[1].clone())
        .with(LLMProvider::OpenAI, mocks[2].clone());
    let powerhouse = AiPowerhouse::with_transports(config_with(&LLMProvider::ALL), &factory);
    (powerhouse, mocks)
}

fn sentinel() -> BTreeMap<String, String> {
    BTreeMap::from([(NO_PROVIDERS_KEY.to_string(), NO_PROVIDERS_MESSAGE.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_matches_credentials_for_every_combination() {
        for mask in 0u8..8 {
            let configured: Vec<LLMProvider> = LLMProvider::ALL
                .into_iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, p)| p)
                .collect();

            let powerhouse =
                AiPowerhouse::with_transports(config_with(&configured), &UnavailableTransportFactory);
            let expected: Vec<String> = configured
                .iter()
                .map(|p| p.provider_name().to_string())
                .collect();
            assert_eq!(powerhouse.get_available_providers(), expected, "mask {:03b}", mask);
        }
    }

    #[test]
    fn available_providers_is_stable() {
        let (powerhouse, _) = all_replying();
        let first = powerhouse.get_available_providers();
        let second = powerhouse.get_available_providers();
        assert_eq!(first, vec!["claude", "gemini", "openai"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn ask_with_no_providers_returns_sentinel() {
        let powerhouse = AiPowerhouse::with_transports(config_with(&[]), &UnavailableTransportFactory);
        assert!(powerhouse.get_available_providers().is_empty());
        assert_eq!(powerhouse.ask("hello", None).await, sentinel());
    }

    #[tokio::test]
    async fn ask_with_only_unknown_names_returns_sentinel() {
        let (powerhouse, mocks) = all_replying();
        assert_eq!(powerhouse.ask("hello", Some(&["unknownName"])).await, sentinel());
        assert_eq!(powerhouse.ask("hello", Some(&[])).await, sentinel());
        assert!(mocks.iter().all(|m| m.call_count() == 0));
    }

    #[tokio::test]
    async fn ask_all_collects_every_reply() {
        let (powerhouse, mocks) = all_replying();
        let responses = powerhouse.ask("What is AI?", None).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses["claude"], "from claude");
        assert_eq!(responses["gemini"], "from gemini");
        assert_eq!(responses["openai"], "from openai");
        assert!(mocks.iter().all(|m| m.call_count() == 1));
    }

    #[tokio::test]
    async fn subset_intersects_with_registry() {
        let claude = replying(LLMProvider::Claude, "c");
        let openai = replying(LLMProvider::OpenAI, "o");
        let factory = MockTransports::default()
            .with(LLMProvider::Claude, claude.clone())
            .with(LLMProvider::OpenAI, openai.clone());
        let powerhouse = AiPowerhouse::with_transports(
            config_with(&[LLMProvider::Claude, LLMProvider::OpenAI]),
            &factory,
        );

        let responses = powerhouse
            .ask("hi", Some(&["openai", "gemini", "openai", "Claude", "bogus"]))
            .await;

        assert_eq!(responses.keys().collect::<Vec<_>>(), vec!["openai"]);
        assert_eq!(responses["openai"], "o");
        assert_eq!(openai.call_count(), 1);
        assert_eq!(claude.call_count(), 0);
    }

    #[tokio::test]
    async fn one_failure_never_hides_the_others() {
        let factory = MockTransports::default()
            .with(LLMProvider::Claude, MockTransport::new(Reply::Panic("socket exploded".into())))
            .with(LLMProvider::Gemini, replying(LLMProvider::Gemini, "haiku"))
            .with(LLMProvider::OpenAI, MockTransport::new(Reply::Fail("API error (500): boom".into())));
        let powerhouse = AiPowerhouse::with_transports(config_with(&LLMProvider::ALL), &factory);

        let responses = powerhouse.ask("Write a haiku", None).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses["gemini"], "haiku");
        assert_eq!(responses["openai"], "Error from OpenAI: API error (500): boom");
        assert!(responses["claude"].starts_with("Error: "), "got {}", responses["claude"]);
        assert!(responses["claude"].contains("socket exploded"));
    }

    #[tokio::test(start_paused = true)]
    async fn calls_overlap_in_time() {
        let factory = MockTransports::default()
            .with(
                LLMProvider::Claude,
                MockTransport::delayed(Reply::Json(ok_body(LLMProvider::Claude, "c")), Duration::from_millis(100)),
            )
            .with(
                LLMProvider::Gemini,
                MockTransport::delayed(Reply::Json(ok_body(LLMProvider::Gemini, "g")), Duration::from_millis(200)),
            )
            .with(
                LLMProvider::OpenAI,
                MockTransport::delayed(Reply::Json(ok_body(LLMProvider::OpenAI, "o")), Duration::from_millis(300)),
            );
        let powerhouse = AiPowerhouse::with_transports(config_with(&LLMProvider::ALL), &factory);

        let started = tokio::time::Instant::now();
        let responses = powerhouse.ask("hi", None).await;
        let elapsed = started.elapsed();

        assert_eq!(responses.len(), 3);
        assert!(elapsed >= Duration::from_millis(300), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(400), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_provider_times_out_without_blocking_others() {
        let mut config = config_with(&[LLMProvider::Claude, LLMProvider::OpenAI]);
        config.request_timeout_ms = Some(50);
        let factory = MockTransports::default()
            .with(LLMProvider::Claude, replying(LLMProvider::Claude, "quick"))
            .with(
                LLMProvider::OpenAI,
                MockTransport::delayed(Reply::Json(ok_body(LLMProvider::OpenAI, "late")), Duration::from_secs(60)),
            );
        let powerhouse = AiPowerhouse::with_transports(config, &factory);

        let started = tokio::time::Instant::now();
        let responses = powerhouse.ask("hi", None).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(responses["claude"], "quick");
        assert_eq!(responses["openai"], "Error: OpenAI did not respond within 50 ms");
    }

    #[tokio::test]
    async fn ask_single_unregistered_makes_no_call() {
        let gemini = replying(LLMProvider::Gemini, "g");
        let factory = MockTransports::default().with(LLMProvider::Gemini, gemini.clone());
        let powerhouse = AiPowerhouse::with_transports(config_with(&[LLMProvider::Gemini]), &factory);

        assert_eq!(powerhouse.ask_single("claude", "hi").await, "claude provider not available");
        assert_eq!(powerhouse.ask_single("mistral", "hi").await, "mistral provider not available");
        assert_eq!(powerhouse.ask_claude("hi").await, "Claude provider not available");
        assert_eq!(powerhouse.ask_openai("hi").await, "OpenAI provider not available");
        assert_eq!(gemini.call_count(), 0);

        assert_eq!(powerhouse.ask_single("gemini", "hi").await, "g");
        assert_eq!(powerhouse.ask_gemini("hi").await, "g");
        assert_eq!(gemini.call_count(), 2);
    }

    #[tokio::test]
    async fn generation_options_come_from_config() {
        let mut config = config_with(&[LLMProvider::Claude]);
        config.max_tokens = 1234;
        config.temperature = 0.3;
        let claude = replying(LLMProvider::Claude, "ok");
        let factory = MockTransports::default().with(LLMProvider::Claude, claude.clone());
        let powerhouse = AiPowerhouse::with_transports(config, &factory);

        powerhouse.ask("hi", Some(&["claude"])).await;

        let request = claude.last_request().expect("request recorded");
        assert_eq!(request.body["max_tokens"], json!(1234));
        assert_eq!(request.body["temperature"], json!(0.3));
        let wire = serde_json::to_string(&request.body).unwrap();
        assert!(wire.contains("\"temperature\":0.3"), "body was {}", wire);
        assert_eq!(request.body["messages"][0]["content"], json!("hi"));
    }

    #[tokio::test]
    async fn registered_provider_without_transport_reports_unavailable() {
        let powerhouse =
            AiPowerhouse::with_transports(config_with(&[LLMProvider::Claude]), &UnavailableTransportFactory);
        assert_eq!(powerhouse.get_available_providers(), vec!["claude"]);

        let responses = powerhouse.ask("hi", None).await;
        assert_eq!(
            responses["claude"],
            "Error from Claude: Anthropic client not available, install an HTTP transport for claude"
        );
    }

    #[tokio::test]
    async fn provider_info_probes_each_registered_backend() {
        let factory = MockTransports::default()
            .with(LLMProvider::Claude, replying(LLMProvider::Claude, "Hi"))
            .with(LLMProvider::Gemini, MockTransport::new(Reply::Fail("API error (403): denied".into())));
        let powerhouse = AiPowerhouse::with_transports(
            config_with(&[LLMProvider::Claude, LLMProvider::Gemini]),
            &factory,
        );

        let info = powerhouse.get_provider_info().await;
        assert_eq!(info.keys().collect::<Vec<_>>(), vec!["claude", "gemini"]);
        assert_eq!(info["claude"].name, "Claude");
        assert_eq!(info["claude"].model, "claude-3-sonnet-20240229");
        assert!(info["claude"].available);
        assert_eq!(info["gemini"].name, "Gemini");
        assert!(!info["gemini"].available);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_status_check_reports_unavailable_within_timeout() {
        let mut config = config_with(&[LLMProvider::Claude, LLMProvider::OpenAI]);
        config.request_timeout_ms = Some(50);
        let factory = MockTransports::default()
            .with(LLMProvider::Claude, replying(LLMProvider::Claude, "Hi"))
            .with(
                LLMProvider::OpenAI,
                MockTransport::delayed(Reply::Json(ok_body(LLMProvider::OpenAI, "Hi")), Duration::from_secs(60)),
            );
        let powerhouse = AiPowerhouse::with_transports(config, &factory);

        let started = tokio::time::Instant::now();
        let info = powerhouse.get_provider_info().await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(info["claude"].available);
        assert!(!info["openai"].available);
        assert_eq!(info["openai"].model, "gpt-4");
    }

    #[tokio::test]
    async fn panicking_status_check_reports_unavailable() {
        let factory = MockTransports::default()
            .with(LLMProvider::Claude, MockTransport::new(Reply::Panic("status check exploded".into())))
            .with(LLMProvider::Gemini, replying(LLMProvider::Gemini, "Hi"));
        let powerhouse = AiPowerhouse::with_transports(
            config_with(&[LLMProvider::Claude, LLMProvider::Gemini]),
            &factory,
        );

        let info = powerhouse.get_provider_info().await;
        assert_eq!(info.len(), 2);
        assert_eq!(info["claude"].name, "Claude");
        assert!(!info["claude"].available);
        assert!(info["gemini"].available);
    }

    #[tokio::test]
    async fn real_transports_honour_configured_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body(LLMProvider::OpenAI, "Hi"))
                    .set_delay(Duration::from_secs(4)),
            )
            .mount(&server)
            .await;

        let mut config = config_with(&[LLMProvider::OpenAI]);
        config.openai.base_url = format!("{}/v1", server.uri());
        config.request_timeout_ms = Some(200);
        let powerhouse = AiPowerhouse::new(config);

        let started = std::time::Instant::now();
        let info = powerhouse.get_provider_info().await;

        assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
        assert!(!info["openai"].available);
    }
}
