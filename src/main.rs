//! Server binary: reads config from env (and `.env`), opens the store, serves GraphQL.

use entity_graph::{app, open_store, AppConfig, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("entity_graph=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let store = open_store(&config).await?;
    let state = AppState::new(store);
    let router = app(state, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        "server ready at http://{}{}",
        listener.local_addr()?,
        config.graphql_path
    );
    axum::serve(listener, router).await?;
    Ok(())
}
