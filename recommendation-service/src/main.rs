use recommendation_service::{ServiceConfig, ServiceState, create_app, expire_idle_sessions};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing, JSON by default and human-readable with `LOG_FORMAT=pretty`
fn init_tracing(log_format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "recommendation_service=debug,book_flow=debug,tower_http=debug".into()
    });

    match log_format {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = ServiceConfig::from_env()?;
    init_tracing(&config.log_format);

    if config.flow.gemini.api_key.is_none() {
        warn!("GEMINI_API_KEY not set; recommendation requests will end in the error state");
    }

    let state = ServiceState::from_config(&config.flow)?;
    if let Some(max_idle) = config.session_idle {
        info!(idle_secs = max_idle.as_secs(), "Idle session expiry enabled");
        tokio::spawn(expire_idle_sessions(state.session_storage.clone(), max_idle));
    }
    let app = create_app(state).await;

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    let addr = listener.local_addr()?;

    info!("Book Recommendation Service starting on {}", addr);
    info!("Available endpoints:");
    info!("  GET    /catalog                              - Genres, moods and levels");
    info!("  POST   /sessions                             - Open a session");
    info!("  PUT    /sessions/{{id}}/genre|mood|level       - Choose a facet");
    info!("  POST   /sessions/{{id}}/recommendations        - Ask for recommendations");
    info!("  DELETE /sessions/{{id}}                        - Close a session");

    axum::serve(listener, app).await?;

    Ok(())
}
