mod rest;

use std::sync::Arc;

use anyhow::Result;
use axum::routing::get;
use axum::Router;
use clap::{Parser, Subcommand};
use newsroom_common::{Config, EmbeddingLookup};
use newsroom_feeds::{Catalogue, FeedFetcher};
use newsroom_pipeline::{Orchestrator, OpenAiEmbedder};
use newsroom_store::{EmbeddingStore, Store};
use tracing::info;
use tracing_subscriber::EnvFilter;

const EMBEDDING_MODEL_VERSION: &str = "text-embedding-3-small";
/// Chat model field OpenAi::new requires but this process never calls chat
/// completion on, only embeddings.
const UNUSED_CHAT_MODEL: &str = "gpt-4o-mini";

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

#[derive(Parser)]
#[command(name = "newsroom-server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server, serving health/trigger endpoints.
    Serve {
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Run exactly one cycle and exit.
    RunOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("newsroom=info".parse()?))
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let cli = Cli::parse();
    let orchestrator = build_orchestrator(&config).await?;

    match cli.command {
        Command::RunOnce => {
            let stats = orchestrator.run_cycle().await?;
            match stats {
                Some(stats) => info!("{stats}"),
                None => info!("another cycle already holds the run lock"),
            }
        }
        Command::Serve { port } => {
            let state = Arc::new(AppState {
                orchestrator: Arc::new(orchestrator),
            });

            let app = Router::new()
                .route("/", get(rest::trigger_handler).post(rest::trigger_handler))
                .route("/health", get(rest::health_handler))
                .with_state(state)
                .layer(
                    tower_http::trace::TraceLayer::new_for_http().make_span_with(
                        |request: &axum::http::Request<_>| {
                            tracing::info_span!(
                                "http_request",
                                method = %request.method(),
                                path = %request.uri().path(),
                            )
                        },
                    ),
                );

            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
            info!(port, "newsroom-server listening");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

async fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let store = Store::connect(&config.database_url, 10).await?;

    let catalogue_path =
        std::env::var("CATALOGUE_PATH").unwrap_or_else(|_| "catalogue.json".to_string());
    let catalogue_raw = std::fs::read_to_string(&catalogue_path)
        .map_err(|e| anyhow::anyhow!("failed to read catalogue at {catalogue_path}: {e}"))?;
    let catalogue = Catalogue::from_json(&catalogue_raw)?;

    let feed_fetcher = FeedFetcher::new(config.feed_workers, config.fetch_timeout());

    let openai = ai_client::openai::OpenAi::new(config.embedding_api_key.clone(), UNUSED_CHAT_MODEL)
        .with_embedding_model(EMBEDDING_MODEL_VERSION);
    let embedder = Arc::new(OpenAiEmbedder::new(Arc::new(openai)));
    let embedding_store = EmbeddingStore::new(
        store.pool().clone(),
        embedder,
        EMBEDDING_MODEL_VERSION.to_string(),
    );
    let embedding_lookup: Arc<dyn EmbeddingLookup> = Arc::new(embedding_store);

    Ok(Orchestrator::new(
        store,
        catalogue,
        config.clone(),
        feed_fetcher,
        embedding_lookup,
    ))
}
