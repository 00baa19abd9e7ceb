//! data-connector entry point

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let addr = std::env::var("CATALOG_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3333".into());
    let public_base =
        std::env::var("CATALOG_PUBLIC_URL").unwrap_or_else(|_| "http://localhost:3333".into());

    let app = data_connector::router(public_base.as_str());

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("data-connector running on http://{}", addr);
    tracing::info!("Tools endpoint: {}/tools", public_base);

    axum::serve(listener, app).await?;

    Ok(())
}
