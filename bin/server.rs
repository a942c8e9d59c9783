// HBNB - Web Server
// Read-only pages over the configured storage engine

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::trace::TraceLayer;

use hbnb::web::{router, AppState};
use hbnb::{logger, HbnbConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = HbnbConfig::parse();
    logger::init_logger(config.verbose);

    let storage = config.open_storage().context("opening storage")?;
    let app = router(AppState::new(storage)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;

    tracing::info!(address = %config.bind, "web server listening");
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
