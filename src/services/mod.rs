pub mod chunker;
pub mod orchestrator;
pub mod providers;
pub mod recommender;
pub mod seeding;
pub mod vector_store;

pub use chunker::TextSplitter;
pub use orchestrator::{PipelineOrchestrator, PipelineSettings};
pub use providers::{ChatModel, Embedder, OpenAiClient, PosterResolver, TmdbPosterResolver};
pub use recommender::Recommender;
pub use seeding::{load_corpus, seed_if_empty, CorpusMovie};
pub use vector_store::{InMemoryVectorStore, PgVectorStore, VectorStore};
