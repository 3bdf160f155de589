use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use docchat_core::Config;
use docchat_core::config::DEFAULT_CONFIG_PATH;
use docchat_core::orchestrator::Orchestrator;
use docchat_core::secrets::EnvSecrets;
use docchat_gateway::GatewayServer;
use docchat_llm::{AnyProvider, LlmProvider};
use docchat_llm::gemini::GeminiProvider;
use docchat_memory::InMemoryVectorStore;
use docchat_memory::document::{SplitterConfig, TextSplitter};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("failed to load .env: {e}");
    }
    init_subscriber();

    let config_path = resolve_config_path();
    let mut config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    config.resolve_secrets(&EnvSecrets).await?;
    config.validate()?;

    let provider = create_provider(&config)?;
    tracing::info!(
        provider = provider.name(),
        model = %config.llm.model,
        embedding_model = %config.llm.embedding_model,
        "LLM provider ready"
    );

    let orchestrator = Arc::new(build_orchestrator(&config, provider));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &config.gateway.bind,
        config.gateway.port,
        orchestrator,
        shutdown_rx,
    )
    .with_auth(config.gateway.auth_token.clone())
    .with_max_body_size(config.gateway.max_body_size)
    .serve()
    .await?;

    Ok(())
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn resolve_config_path() -> PathBuf {
    let args: Vec<String> = std::env::args().collect();
    if let Some(path) = args.windows(2).find(|w| w[0] == "--config").map(|w| &w[1]) {
        return PathBuf::from(path);
    }
    if let Ok(path) = std::env::var("DOCCHAT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let api_key = config
        .secrets
        .gemini_api_key
        .as_ref()
        .context("GEMINI_API_KEY is not set")?;

    let provider = GeminiProvider::new(
        api_key.expose().to_owned(),
        config.llm.base_url.clone(),
        &config.llm.model,
        &config.llm.embedding_model,
        config.llm.temperature,
    )
    .with_max_retries(config.llm.max_retries);

    Ok(AnyProvider::Gemini(provider))
}

fn build_orchestrator(config: &Config, provider: AnyProvider) -> Orchestrator {
    let splitter = TextSplitter::new(SplitterConfig {
        chunk_size: config.chunking.chunk_size,
        chunk_overlap: config.chunking.chunk_overlap,
        boundary_aware: config.chunking.boundary_aware,
    });

    Orchestrator::new(provider, Arc::new(InMemoryVectorStore::new()))
        .with_splitter(splitter)
        .with_top_k(config.retrieval.top_k)
        .with_max_file_size(config.documents.max_file_size)
}
