use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Title of the reply the model gives when nothing matches confidently
pub const NO_MOVIES_FOUND_TITLE: &str = "No movies found";
pub const NO_MOVIES_FOUND_CONTENT: &str = "Sorry, no movies found for your query. Please try again.";

/// A single recommended movie, as returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    /// Short description, at most 60 words
    pub content: String,
    /// Absent only for the "No movies found" reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<u16>,
    /// Poster image URL, null when the catalog had nothing
    #[serde(default)]
    pub poster: Option<String>,
}

impl Recommendation {
    pub fn new(title: impl Into<String>, content: impl Into<String>, release_year: u16) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            release_year: Some(release_year),
            poster: None,
        }
    }

    /// The low-confidence reply; a valid result, not a failure
    pub fn no_movies_found() -> Self {
        Self {
            title: NO_MOVIES_FOUND_TITLE.to_string(),
            content: NO_MOVIES_FOUND_CONTENT.to_string(),
            release_year: None,
            poster: None,
        }
    }

    pub fn is_no_movies_found(&self) -> bool {
        self.title == NO_MOVIES_FOUND_TITLE
    }
}

/// Where a single user's pipeline run currently is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    CollectingPreferences,
    Embedding,
    Retrieving,
    Recommending,
    ResolvingPoster,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::CollectingPreferences => "collecting_preferences",
            PipelineStage::Embedding => "embedding",
            PipelineStage::Retrieving => "retrieving",
            PipelineStage::Recommending => "recommending",
            PipelineStage::ResolvingPoster => "resolving_poster",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one user's run
///
/// A failed run is reported separately from the "No movies found" reply,
/// which is a successful outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UserOutcome {
    Ok {
        movie: Recommendation,
    },
    Failed {
        /// Stage the run was in when it failed
        stage: PipelineStage,
        error: String,
    },
}

/// One slot of a group result, tagged with the submitting user's position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResult {
    pub user_index: usize,
    #[serde(flatten)]
    pub outcome: UserOutcome,
}

impl UserResult {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match &self.outcome {
            UserOutcome::Ok { movie } => Some(movie),
            UserOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, UserOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recommendation_serializes_camel_case_with_null_poster() {
        let movie = Recommendation::new("Ocean's Eleven", "A crew robs three casinos.", 2001);
        let value = serde_json::to_value(&movie).unwrap();

        assert_eq!(
            value,
            json!({
                "title": "Ocean's Eleven",
                "content": "A crew robs three casinos.",
                "releaseYear": 2001,
                "poster": null
            })
        );
    }

    #[test]
    fn test_no_movies_found_has_no_year() {
        let movie = Recommendation::no_movies_found();
        let value = serde_json::to_value(&movie).unwrap();

        assert!(movie.is_no_movies_found());
        assert!(value.get("releaseYear").is_none());
        assert_eq!(value["content"], NO_MOVIES_FOUND_CONTENT);
    }

    #[test]
    fn test_failed_slot_is_distinct_from_no_movies_found() {
        let failed = UserResult {
            user_index: 2,
            outcome: UserOutcome::Failed {
                stage: PipelineStage::Embedding,
                error: "Embedding error: unreachable".to_string(),
            },
        };
        let sentinel = UserResult {
            user_index: 1,
            outcome: UserOutcome::Ok {
                movie: Recommendation::no_movies_found(),
            },
        };

        let failed_json = serde_json::to_value(&failed).unwrap();
        assert_eq!(failed_json["userIndex"], 2);
        assert_eq!(failed_json["status"], "failed");
        assert_eq!(failed_json["stage"], "embedding");
        assert!(failed_json.get("movie").is_none());

        let sentinel_json = serde_json::to_value(&sentinel).unwrap();
        assert_eq!(sentinel_json["status"], "ok");
        assert_eq!(sentinel_json["movie"]["title"], NO_MOVIES_FOUND_TITLE);
        assert!(!sentinel.is_failed());
    }

    #[test]
    fn test_stage_display_matches_serde_name() {
        for stage in [
            PipelineStage::CollectingPreferences,
            PipelineStage::Embedding,
            PipelineStage::Retrieving,
            PipelineStage::Recommending,
            PipelineStage::ResolvingPoster,
            PipelineStage::Done,
            PipelineStage::Failed,
        ] {
            let value = serde_json::to_value(stage).unwrap();
            assert_eq!(value, json!(stage.to_string()));
        }
        assert!(PipelineStage::Failed.is_terminal());
        assert!(!PipelineStage::Retrieving.is_terminal());
    }
}
