use tracing::{info, Level};

use school_dashboard_backend::backend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (the fmt subscriber also bridges `log` records)
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Setting up backend");
    let app_state = backend::initialize_backend()?;
    let addr = app_state.config.bind_addr;

    let app = backend::create_router(app_state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
