use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use campus_market::{app_state::AppState, config::Config, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("campus_market=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let state = AppState::new(config.clone()).await?;
    let app = routes::router(state);

    let addr = config.server_address();
    info!("Server starting on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
