mod error;
mod gesture;
mod llm;
mod routes;
mod services;
mod session;
mod state;

use std::sync::Arc;

use services::gateway::Gateway;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    // Every route needs the model; a missing key is fatal.
    let client = llm::LlmClient::from_env().expect("LLM client not configured");
    let models = client.models().clone();
    let badge_source = services::badges::badge_source();
    tracing::info!(fast = %models.fast, slow = %models.slow, ?badge_source, "LLM client initialized");

    let gateway = Arc::new(Gateway::new(Arc::new(client), models, badge_source));
    let app = routes::app(state::AppState::new(gateway));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "swipecards listening");
    axum::serve(listener, app).await.expect("server failed");
}
