use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{GroupPreferences, PreferenceCollector, Recommendation, UserPreference, UserResult},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub input: String,
    /// Maximum runtime in minutes
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub movie: Recommendation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecommendationRequest {
    pub users_count: usize,
    /// Time budget in minutes; takes precedence over `hours`/`minutes`
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub hours: Option<u32>,
    #[serde(default)]
    pub minutes: Option<u32>,
    pub users: Vec<UserPreference>,
}

impl GroupRecommendationRequest {
    fn group(&self) -> AppResult<GroupPreferences> {
        match (self.duration, self.hours, self.minutes) {
            (Some(duration), _, _) => GroupPreferences::new(self.users_count, Some(duration)),
            (None, None, None) => GroupPreferences::new(self.users_count, None),
            (None, hours, minutes) => GroupPreferences::with_hours_and_minutes(
                self.users_count,
                hours.unwrap_or(0),
                minutes.unwrap_or(0),
            ),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupRecommendationResponse {
    pub results: Vec<UserResult>,
}

pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Runs the pipeline for one free-text input
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RecommendResponse>> {
    tracing::info!(
        request_id = %request_id,
        duration = ?request.duration,
        "Recommendation requested"
    );

    let movie = state
        .orchestrator
        .recommend_input(&request.input, request.duration)
        .await?;

    Ok(Json(RecommendResponse { movie }))
}

/// Collects every member's answers, then runs one pipeline per member
///
/// Individual failures come back as failed slots; only a malformed group
/// fails the request.
pub async fn recommend_group(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<GroupRecommendationRequest>,
) -> AppResult<Json<GroupRecommendationResponse>> {
    let group = request.group()?;
    group.ensure_group_size(state.max_group_size)?;

    tracing::info!(
        request_id = %request_id,
        users_count = group.users_count,
        submitted = request.users.len(),
        "Group recommendation requested"
    );

    let mut collector = PreferenceCollector::new(group);
    for preference in request.users {
        collector.submit(preference)?;
    }

    let results = state.orchestrator.recommend_for_group(collector).await?;

    Ok(Json(GroupRecommendationResponse { results }))
}
