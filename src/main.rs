use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use exchange_iq::api;
use exchange_iq::config::Config;
use exchange_iq::state::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    if let Some(filter) = &config.doc_filter {
        tracing::info!("Corpus filter: {filter}*.txt");
    }

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/chat", post(api::chat::chat))
        .route("/health", get(api::health::health))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    // Serve immediately; queries answered before indexing completes get a
    // structured not_ready response rather than a partial-index answer.
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    // An indexing failure is fatal: returning the error here tears the
    // whole process down, server task included.
    state::build_index(&state).await?;

    server.await??;
    Ok(())
}
