use skewer::{Server, ServerConfig, ServerError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let server = Server::bind(config).await?;
    tracing::info!(
        ws_addr = %server.ws_addr()?,
        http_addr = %server.http_addr()?,
        "skewer server starting"
    );
    server.run().await
}
