mod common;

use tokio_test::{assert_err, assert_ok};

use popchoice_api::{
    error::AppError,
    models::{
        ContentChunk, Genre, GroupPreferences, Mood, PipelineStage, PreferenceCollector,
        Recommendation, UserOutcome, UserPreference,
    },
    services::{InMemoryVectorStore, VectorStore},
};

use common::{pipeline, FakeEmbedder, HEIST_CHUNK, HEIST_REPLY, POSTER_URL, SENTINEL_REPLY};

#[tokio::test]
async fn test_heist_comedy_gets_titled_recommendation() {
    let pipeline = pipeline(FakeEmbedder::new(), HEIST_REPLY, true).await;

    let movie = assert_ok!(
        pipeline
            .orchestrator
            .recommend_input("A heist comedy with a charming crew", None)
            .await
    );

    assert_eq!(movie.title, "Ocean's Eleven");
    assert_eq!(movie.release_year, Some(2001));
    assert!(movie.content.split_whitespace().count() <= 60);
    assert_eq!(movie.poster.as_deref(), Some(POSTER_URL));

    let prompts = pipeline.chat.user_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(HEIST_CHUNK));
}

#[tokio::test]
async fn test_empty_retrieval_uses_placeholder_and_accepts_no_match() {
    let pipeline = pipeline(FakeEmbedder::new(), SENTINEL_REPLY, false).await;

    let movie = assert_ok!(
        pipeline
            .orchestrator
            .recommend_input("An obscure 1920s silent documentary about lighthouses", None)
            .await
    );

    assert_eq!(movie, Recommendation::no_movies_found());
    assert!(pipeline.chat.user_prompts()[0].contains("No matching context found."));
    assert!(pipeline.posters.lookups.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_group_failure_is_isolated_to_its_slot() {
    let pipeline = pipeline(FakeEmbedder::failing_on("Jaws"), HEIST_REPLY, true).await;

    let group = GroupPreferences::new(3, Some(120)).unwrap();
    let mut collector = PreferenceCollector::new(group);
    for favorite in [
        "Ocean's Eleven, the banter",
        "Jaws, the tension on the boat",
        "The Sting, the final con",
    ] {
        collector
            .submit(UserPreference::new(favorite, Genre::Classic, Mood::Fun))
            .unwrap();
    }

    let results = assert_ok!(pipeline.orchestrator.recommend_for_group(collector).await);

    assert_eq!(results.len(), 3);
    for (index, result) in results.iter().enumerate() {
        assert_eq!(result.user_index, index);
    }
    assert!(results[0].recommendation().is_some());
    assert!(results[2].recommendation().is_some());
    match &results[1].outcome {
        UserOutcome::Failed { stage, error } => {
            assert_eq!(*stage, PipelineStage::Embedding);
            assert!(error.contains("Jaws"));
        }
        other => panic!("expected a failed slot, got {:?}", other),
    }
}

#[tokio::test]
async fn test_duration_reaches_prompt() {
    let pipeline = pipeline(FakeEmbedder::new(), HEIST_REPLY, true).await;

    assert_ok!(
        pipeline
            .orchestrator
            .recommend_input("Something fun for the evening", Some(90))
            .await
    );

    assert!(pipeline.chat.user_prompts()[0].contains("90 minutes"));
}

#[tokio::test]
async fn test_incomplete_group_is_rejected() {
    let pipeline = pipeline(FakeEmbedder::new(), HEIST_REPLY, true).await;

    let mut collector = PreferenceCollector::new(GroupPreferences::new(2, None).unwrap());
    collector
        .submit(UserPreference::new("Heat", Genre::New, Mood::Serious))
        .unwrap();

    let result = pipeline.orchestrator.recommend_for_group(collector).await;
    assert!(matches!(assert_err!(result), AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_nearest_respects_count_and_threshold() {
    let store = InMemoryVectorStore::new();
    store
        .ingest(&[
            ContentChunk::new("exact", vec![1.0, 0.0]),
            ContentChunk::new("close", vec![0.9, 0.1]),
            ContentChunk::new("diagonal", vec![0.7, 0.7]),
            ContentChunk::new("opposite", vec![-1.0, 0.0]),
        ])
        .await
        .unwrap();

    let matches = store.nearest(&[1.0, 0.0], 2, 0.5).await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].chunk.content, "exact");
    assert!(matches.iter().all(|m| m.similarity >= 0.5));

    let all = store.nearest(&[1.0, 0.0], 10, 0.5).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[tokio::test]
async fn test_store_not_empty_after_ingest() {
    let store = InMemoryVectorStore::new();
    assert!(store.is_empty().await.unwrap());

    store
        .ingest(&[ContentChunk::new(HEIST_CHUNK, vec![0.6, 0.8, 0.0])])
        .await
        .unwrap();

    assert!(!store.is_empty().await.unwrap());
}
