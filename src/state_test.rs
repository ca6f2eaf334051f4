use super::*;
use crate::services::gateway::test_helpers::MockLlm;

#[tokio::test]
async fn create_session_registers_empty_session() {
    let state = test_helpers::test_app_state(Arc::new(MockLlm::new()));
    let id = state.create_session().await;

    let handle = state.session(id).await.unwrap();
    let session = driver::lock(&handle);
    assert!(session.cards().is_empty());
    assert!(!session.loading());
}

#[tokio::test]
async fn unknown_session_is_none() {
    let state = test_helpers::test_app_state(Arc::new(MockLlm::new()));
    assert!(state.session(Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn sessions_are_independent() {
    let state = test_helpers::test_app_state(Arc::new(MockLlm::new()));
    let a = state.create_session().await;
    let b = state.create_session().await;
    assert_ne!(a, b);

    let handle = state.session(a).await.unwrap();
    driver::lock(&handle).submit_question("only in a").unwrap();

    let other = state.session(b).await.unwrap();
    assert!(driver::lock(&other).cards().is_empty());
}

#[tokio::test]
async fn remove_session_cancels_and_forgets() {
    let state = test_helpers::test_app_state(Arc::new(MockLlm::new()));
    let id = state.create_session().await;
    let ticket = driver::lock(&state.session(id).await.unwrap()).submit_question("q").unwrap();

    let handle = state.remove_session(id).await.unwrap();
    assert!(ticket.cancel.is_cancelled());
    assert!(driver::lock(&handle).cards().is_empty());
    assert!(state.session(id).await.is_none());
    assert!(state.remove_session(id).await.is_none());
}
