//! World Travel Guide Chat
//!
//! A single-page chat that forwards each question to Gemini with a travel
//! guide persona and renders the exchange. Conversations live in memory,
//! one per browser session.

mod api;
mod chat;
mod config;
mod conversation;
mod llm;
mod prompt;

#[cfg(test)]
mod testing;

use api::{create_router, AppState, Backend};
use chat::ChatEngine;
use config::{ConfigError, EnvLookup, GeminiConfig, ServerConfig};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Resolve configuration and set up the generation client.
///
/// Failure here is fatal for the chat: the server still starts so the
/// browser can show the error, but no request will ever be generated.
fn initialize_backend(env: &EnvLookup) -> Backend {
    let result = GeminiConfig::resolve(env).and_then(|config| {
        let service = llm::build_service(&config)?;
        Ok::<_, ConfigError>(ChatEngine::new(service, config.max_output_tokens))
    });

    match result {
        Ok(engine) => Backend::Ready(engine),
        Err(e) => {
            tracing::error!(error = %e, "Configuration failed, chat is halted");
            Backend::Halted(e.to_string())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_guide_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let env = EnvLookup::from_env();
    let server = ServerConfig::resolve(&env);
    let backend = initialize_backend(&env);

    let state = AppState::new(backend);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
    tracing::info!("Travel guide chat listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
