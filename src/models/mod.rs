mod chunk;
mod preferences;
mod recommendation;

pub use chunk::{ContentChunk, ContentMatch};
pub use preferences::{GroupPreferences, Genre, Mood, PreferenceCollector, UserPreference};
pub use recommendation::{
    PipelineStage, Recommendation, UserOutcome, UserResult, NO_MOVIES_FOUND_CONTENT,
    NO_MOVIES_FOUND_TITLE,
};
