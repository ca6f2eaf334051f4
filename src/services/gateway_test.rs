use futures::StreamExt;

use super::test_helpers::*;
use super::*;
use crate::llm::types::Role;

// =========================================================================
// stream
// =========================================================================

#[tokio::test]
async fn stream_prepends_system_prompt_and_maps_tier() {
    let llm = Arc::new(MockLlm::new());
    llm.push_chunks(&["Quantum ", "computing uses qubits."]);
    let gateway = test_gateway(llm.clone());

    let convo = vec![ChatMessage::user("Explain quantum computing")];
    let chunks: Vec<String> = gateway
        .stream(&convo, Tier::Fast)
        .await
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(chunks.concat(), "Quantum computing uses qubits.");

    let requests = llm.recorded();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "fast-model");
    assert_eq!(requests[0].messages.len(), 2);
    assert_eq!(requests[0].messages[0].role, Role::System);
    assert!(requests[0].messages[0].content.contains("swipe"));
    assert_eq!(requests[0].messages[1], convo[0]);
}

#[tokio::test]
async fn stream_slow_tier_uses_slow_model() {
    let llm = Arc::new(MockLlm::new());
    let gateway = test_gateway(llm.clone());
    let _ = gateway.stream(&[ChatMessage::user("q")], Tier::Slow).await.unwrap();
    assert_eq!(llm.recorded()[0].model, "slow-model");
}

#[tokio::test]
async fn stream_rejection_is_returned() {
    let llm = Arc::new(MockLlm::new());
    llm.push_stream(ScriptedStream::Reject(401));
    let gateway = test_gateway(llm);
    let result = gateway.stream(&[ChatMessage::user("q")], Tier::Fast).await;
    assert!(matches!(result, Err(LlmError::ApiResponse { status: 401, .. })));
}

// =========================================================================
// summarize_followups
// =========================================================================

#[tokio::test]
async fn followups_parse_reply_and_use_fast_model() {
    let llm = Arc::new(MockLlm::new());
    llm.push_completion(Ok("\"Qubit Hardware\", Quantum Algorithms, 'Future Tech'".into()));
    let gateway = test_gateway(llm.clone());

    let badges = gateway.summarize_followups("Explain quantum computing", "Qubits.").await;
    assert_eq!(badges, vec!["Qubit Hardware", "Quantum Algorithms", "Future Tech"]);

    let req = &llm.recorded()[0];
    assert_eq!(req.model, "fast-model");
    assert_eq!(req.max_tokens, Some(badges::BADGE_MAX_TOKENS));
    assert_eq!(req.temperature, Some(badges::BADGE_TEMPERATURE));
}

#[tokio::test]
async fn followups_fall_back_on_error() {
    let llm = Arc::new(MockLlm::new());
    llm.push_completion(Err(LlmError::ApiRequest("timeout".into())));
    let gateway = test_gateway(llm);
    assert_eq!(gateway.summarize_followups("q", "a").await, badges::fallback_badges());
}

#[tokio::test]
async fn followups_fall_back_on_unparsable_reply() {
    let llm = Arc::new(MockLlm::new());
    llm.push_completion(Ok(" , ".into()));
    let gateway = test_gateway(llm);
    assert_eq!(gateway.summarize_followups("q", "a").await, badges::fallback_badges());
}

#[tokio::test]
async fn followups_heuristic_source_skips_network() {
    let llm = Arc::new(MockLlm::new());
    let gateway = Gateway::new(llm.clone(), test_models(), BadgeSource::Heuristic);
    let badges = gateway.summarize_followups("tell me about security", "locks").await;
    assert_eq!(badges.len(), 3);
    assert!(llm.recorded().is_empty());
}

// =========================================================================
// structured_expand
// =========================================================================

#[tokio::test]
async fn structured_expand_parses_sections_on_slow_model() {
    let llm = Arc::new(MockLlm::new());
    llm.push_completion(Ok(r#"```json
[{"title":"Basics","content":"Qubits"},{"title":"Uses","content":"Chemistry"}]
```"#
        .into()));
    let gateway = test_gateway(llm.clone());

    let sections = gateway
        .structured_expand(&[ChatMessage::user("q"), ChatMessage::assistant("a")])
        .await;
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[1].title, "Uses");

    let req = &llm.recorded()[0];
    assert_eq!(req.model, "slow-model");
    assert_eq!(req.messages.first().map(|m| m.role), Some(Role::System));
    assert_eq!(req.messages.last().map(|m| m.content.as_str()), Some(expand::EXPAND_INSTRUCTION));
}

#[tokio::test]
async fn structured_expand_wraps_plain_text() {
    let llm = Arc::new(MockLlm::new());
    llm.push_completion(Ok("No JSON here.".into()));
    let gateway = test_gateway(llm);
    let sections = gateway.structured_expand(&[]).await;
    assert_eq!(sections, vec![Section { title: "Overview".into(), content: "No JSON here.".into() }]);
}

#[tokio::test]
async fn structured_expand_transport_failure_is_empty() {
    let llm = Arc::new(MockLlm::new());
    llm.push_completion(Err(LlmError::ApiResponse { status: 502, body: String::new() }));
    let gateway = test_gateway(llm);
    assert!(gateway.structured_expand(&[]).await.is_empty());
}
