use std::{future::Future, sync::Arc, time::Duration};

use tokio::task::JoinSet;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        PipelineStage, PreferenceCollector, Recommendation, UserOutcome, UserPreference,
        UserResult,
    },
    services::{
        providers::{Embedder, PosterResolver},
        recommender::Recommender,
        vector_store::VectorStore,
    },
};

/// Retrieval and timeout tuning for pipeline runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub match_count: usize,
    pub match_threshold: f32,
    /// Upper bound for each external call
    pub call_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            match_count: 1,
            match_threshold: 0.5,
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            match_count: config.match_count,
            match_threshold: config.match_threshold,
            call_timeout: config.external_call_timeout(),
        }
    }
}

/// A run that stopped at `stage`
#[derive(Debug)]
pub struct StageFailure {
    pub stage: PipelineStage,
    pub error: AppError,
}

/// Tracks which stage a single user's run is in
struct PipelineRun {
    user_index: usize,
    stage: PipelineStage,
}

impl PipelineRun {
    fn new(user_index: usize) -> Self {
        Self {
            user_index,
            stage: PipelineStage::CollectingPreferences,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        tracing::debug!(
            user_index = self.user_index,
            from = %self.stage,
            to = %next,
            "Pipeline stage transition"
        );
        self.stage = next;
        if next.is_terminal() {
            tracing::debug!(user_index = self.user_index, stage = %next, "Pipeline run finished");
        }
    }

    fn fail(&mut self, error: AppError) -> StageFailure {
        let stage = self.stage;
        tracing::warn!(
            user_index = self.user_index,
            stage = %stage,
            error = %error,
            "Pipeline run failed"
        );
        self.advance(PipelineStage::Failed);
        StageFailure { stage, error }
    }
}

/// Runs embedding, retrieval, recommendation and poster lookup per user
///
/// Service handles are shared behind `Arc`s; cloning the orchestrator is
/// cheap and is how each spawned run gets its own handle.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    recommender: Arc<Recommender>,
    poster_resolver: Arc<dyn PosterResolver>,
    settings: PipelineSettings,
}

impl PipelineOrchestrator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        recommender: Arc<Recommender>,
        poster_resolver: Arc<dyn PosterResolver>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            recommender,
            poster_resolver,
            settings,
        }
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    async fn bounded<T>(
        &self,
        stage: PipelineStage,
        call: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        tokio::time::timeout(self.settings.call_timeout, call)
            .await
            .map_err(|_| AppError::Timeout {
                stage: stage.as_str(),
            })?
    }

    /// Runs the pipeline for one raw input string
    async fn run(
        &self,
        user_index: usize,
        input: &str,
        duration_minutes: Option<u32>,
    ) -> Result<Recommendation, StageFailure> {
        let mut run = PipelineRun::new(user_index);

        run.advance(PipelineStage::Embedding);
        let query = self
            .bounded(run.stage, self.embedder.embed(input))
            .await
            .map_err(|e| run.fail(e))?;

        run.advance(PipelineStage::Retrieving);
        let matches = self
            .bounded(
                run.stage,
                self.vector_store.nearest(
                    &query,
                    self.settings.match_count,
                    self.settings.match_threshold,
                ),
            )
            .await
            .map_err(|e| run.fail(e))?;

        let context = matches
            .first()
            .map(|m| m.chunk.content.as_str())
            .unwrap_or_default();
        tracing::debug!(
            user_index,
            matches = matches.len(),
            top_similarity = ?matches.first().map(|m| m.similarity),
            "Context retrieved"
        );

        run.advance(PipelineStage::Recommending);
        let mut recommendation = self
            .bounded(
                run.stage,
                self.recommender.recommend(input, context, duration_minutes),
            )
            .await
            .map_err(|e| run.fail(e))?;

        if !recommendation.is_no_movies_found() {
            run.advance(PipelineStage::ResolvingPoster);
            recommendation.poster = self.resolve_poster(&recommendation.title).await;
        }

        run.advance(PipelineStage::Done);
        Ok(recommendation)
    }

    /// Poster lookup never fails the run; a timeout just means no poster
    async fn resolve_poster(&self, title: &str) -> Option<String> {
        match tokio::time::timeout(
            self.settings.call_timeout,
            self.poster_resolver.resolve_poster(title),
        )
        .await
        {
            Ok(poster) => poster,
            Err(_) => {
                tracing::warn!(
                    title = %title,
                    provider = self.poster_resolver.name(),
                    "Poster lookup timed out"
                );
                None
            }
        }
    }

    /// Recommends a movie for a raw input string
    pub async fn recommend_input(
        &self,
        input: &str,
        duration_minutes: Option<u32>,
    ) -> AppResult<Recommendation> {
        if input.trim().is_empty() {
            return Err(AppError::InvalidInput("input cannot be empty".to_string()));
        }
        if duration_minutes == Some(0) {
            return Err(AppError::InvalidInput(
                "duration must be at least 1 minute".to_string(),
            ));
        }

        self.run(0, input, duration_minutes)
            .await
            .map_err(|failure| failure.error)
    }

    /// Recommends a movie for one person; failures become a failed slot
    pub async fn recommend_for_user(
        &self,
        user_index: usize,
        preference: &UserPreference,
        duration_minutes: Option<u32>,
    ) -> UserResult {
        let outcome = match preference.to_embedding_input() {
            Ok(input) => match self.run(user_index, &input, duration_minutes).await {
                Ok(movie) => UserOutcome::Ok { movie },
                Err(failure) => UserOutcome::Failed {
                    stage: failure.stage,
                    error: failure.error.to_string(),
                },
            },
            Err(e) => UserOutcome::Failed {
                stage: PipelineStage::CollectingPreferences,
                error: e.to_string(),
            },
        };

        UserResult {
            user_index,
            outcome,
        }
    }

    /// Fans out one run per collected preference and waits for all of them
    ///
    /// The returned slots are ordered by user index, one per preference.
    pub async fn recommend_for_group(
        &self,
        collector: PreferenceCollector,
    ) -> AppResult<Vec<UserResult>> {
        let (group, users) = collector.finish()?;
        let users_count = users.len();

        tracing::info!(
            users_count,
            duration = ?group.duration,
            "Starting group recommendation"
        );

        let mut tasks = JoinSet::new();
        for (user_index, preference) in users.into_iter().enumerate() {
            let orchestrator = self.clone();
            let duration = group.duration;
            tasks.spawn(async move {
                orchestrator
                    .recommend_for_user(user_index, &preference, duration)
                    .await
            });
        }

        let mut slots: Vec<Option<UserResult>> = vec![None; users_count];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    if let Some(slot) = slots.get_mut(result.user_index) {
                        *slot = Some(result);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Pipeline task join error");
                }
            }
        }

        let results: Vec<UserResult> = slots
            .into_iter()
            .enumerate()
            .map(|(user_index, slot)| {
                slot.unwrap_or_else(|| UserResult {
                    user_index,
                    outcome: UserOutcome::Failed {
                        stage: PipelineStage::Failed,
                        error: "Pipeline task aborted".to_string(),
                    },
                })
            })
            .collect();

        let failed = results.iter().filter(|r| r.is_failed()).count();
        tracing::info!(
            users_count,
            succeeded = users_count - failed,
            failed,
            "Group recommendation completed"
        );

        Ok(results)
    }
}
