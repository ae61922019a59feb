use std::sync::Arc;

use tabletalk::infrastructure::config::AppConfig;
use tabletalk::infrastructure::llm_clients::openai::OpenAiAgentClient;
use tabletalk::interfaces::http::start_server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    info!(
        model = %config.agent.model,
        bind = %format!("{}:{}", config.bind_host, config.bind_port),
        "starting tabletalk"
    );

    let agent = Arc::new(OpenAiAgentClient::new());
    start_server(config, agent)?.await
}
