//! Command-flow behavior driven through scripted generation backends.

use async_trait::async_trait;
use gemini_tg::bot::handlers::{response_route, run_generation, ResponseRoute};
use gemini_tg::config::Settings;
use gemini_tg::history::{ChatHistory, ChatRole};
use gemini_tg::llm::{GenError, GenerationBackend, GeminiClient};
use gemini_tg::media::MediaPayload;

struct EchoBackend;

#[async_trait]
impl GenerationBackend for EchoBackend {
    async fn generate(
        &self,
        prompt: &str,
        _media: Option<&MediaPayload>,
    ) -> Result<String, GenError> {
        Ok(format!("echo: {prompt}"))
    }
}

struct FailingBackend;

#[async_trait]
impl GenerationBackend for FailingBackend {
    async fn generate(
        &self,
        _prompt: &str,
        _media: Option<&MediaPayload>,
    ) -> Result<String, GenError> {
        Err(GenError::Network("connection reset by peer".to_string()))
    }
}

#[tokio::test]
async fn successful_generation_records_both_turns() {
    let history = ChatHistory::new();

    let reply = run_generation(&history, 10, &EchoBackend, "hi there", None)
        .await
        .expect("generation succeeds");
    assert_eq!(reply, "echo: hi there");

    let turns = history.snapshot(10).await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, ChatRole::User);
    assert_eq!(turns[0].content, "hi there");
    assert_eq!(turns[1].role, ChatRole::Assistant);
    assert_eq!(turns[1].content, "echo: hi there");
}

#[tokio::test]
async fn transport_failure_rolls_back_the_user_turn() {
    let history = ChatHistory::new();
    history.append(10, ChatRole::User, "earlier").await;
    history.append(10, ChatRole::Assistant, "reply").await;
    let before = history.len(10).await;

    let result = run_generation(&history, 10, &FailingBackend, "doomed", None).await;
    assert!(matches!(result, Err(GenError::Network(_))));

    // The failed invocation left no trace
    assert_eq!(history.len(10).await, before);
    let turns = history.snapshot(10).await;
    assert_eq!(turns.last().map(|t| t.content.clone()), Some("reply".to_string()));
}

#[tokio::test]
async fn clearing_history_empties_every_conversation() {
    let history = ChatHistory::new();
    for chat_id in [1, 2, 3] {
        run_generation(&history, chat_id, &EchoBackend, "hello", None)
            .await
            .expect("generation succeeds");
    }
    assert_eq!(history.len(2).await, 2);

    history.clear_all().await;

    for chat_id in [1, 2, 3] {
        assert!(history.is_empty(chat_id).await);
    }
}

#[tokio::test]
async fn unconfigured_client_fails_without_touching_the_network() {
    let settings = Settings {
        telegram_token: "dummy".to_string(),
        allowed_users_str: None,
        gemini_api: None,
        gemini_model: None,
    };
    let client = GeminiClient::new(&settings);
    assert!(!client.is_configured());

    let result = client.generate("hello", None).await;
    assert!(matches!(result, Err(GenError::MissingConfig(_))));
}

#[test]
fn inline_boundary_is_exact() {
    let prompt = "q".repeat(1000);

    // 1000 + 3095 = 4095: edited in place
    assert_eq!(
        response_route(&prompt, &"r".repeat(3095)),
        ResponseRoute::Inline
    );
    // 1000 + 3096 = 4096: shipped as a file
    assert_eq!(
        response_route(&prompt, &"r".repeat(3096)),
        ResponseRoute::Document
    );
}
