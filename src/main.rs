use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use popchoice_api::{
    api::{create_router, AppState},
    config::{Config, VectorStoreKind},
    db,
    services::{
        load_corpus, seed_if_empty, ChatModel, Embedder, InMemoryVectorStore, OpenAiClient,
        PgVectorStore, PipelineOrchestrator, PipelineSettings, PosterResolver, Recommender,
        TextSplitter, TmdbPosterResolver, VectorStore,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("popchoice_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    let timeout = config.external_call_timeout();

    let openai = Arc::new(
        OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_api_url.clone(),
            config.embedding_model.clone(),
            timeout,
        )
        .context("Failed to build OpenAI client")?,
    );
    let embedder: Arc<dyn Embedder> = openai.clone();
    let chat_model: Arc<dyn ChatModel> = openai;

    let poster_resolver: Arc<dyn PosterResolver> = Arc::new(
        TmdbPosterResolver::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_image_url.clone(),
            timeout,
        )
        .context("Failed to build TMDB client")?,
    );

    let vector_store: Arc<dyn VectorStore> = match config.vector_store {
        VectorStoreKind::Postgres => {
            let pool = db::create_pool(&config.database_url, timeout)
                .await
                .context("Failed to connect to Postgres")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;
            Arc::new(PgVectorStore::new(pool))
        }
        VectorStoreKind::Memory => Arc::new(InMemoryVectorStore::new()),
    };
    tracing::info!(store = vector_store.name(), "Vector store ready");

    if config.seed_on_startup {
        if let Err(e) = seed(&config, vector_store.as_ref(), embedder.as_ref()).await {
            tracing::error!(error = %e, "Seeding failed, continuing without it");
        }
    }

    let recommender = Arc::new(Recommender::new(chat_model, config.chat_model.clone()));
    let orchestrator = PipelineOrchestrator::new(
        embedder,
        vector_store,
        recommender,
        poster_resolver,
        PipelineSettings::from_config(&config),
    );

    let app = create_router(AppState::new(orchestrator, config.max_group_size));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "PopChoice relay listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn seed(
    config: &Config,
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
) -> popchoice_api::error::AppResult<usize> {
    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
    let movies = load_corpus(&config.corpus_path)?;
    seed_if_empty(store, embedder, &splitter, &movies).await
}
