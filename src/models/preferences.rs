use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Whether the person is in the mood for something new or a classic
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Classic,
    New,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Fun,
    Serious,
    Inspiring,
    Scary,
}

/// One person's answers to the preference form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPreference {
    /// Favourite movie and why
    pub favorite_movie: String,
    pub genre: Genre,
    pub mood: Mood,
}

impl UserPreference {
    pub fn new(favorite_movie: impl Into<String>, genre: Genre, mood: Mood) -> Self {
        Self {
            favorite_movie: favorite_movie.into(),
            genre,
            mood,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.favorite_movie.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "favoriteMovie cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Serializes the preference as the JSON text that gets embedded
    pub fn to_embedding_input(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize preference: {}", e)))
    }
}

/// Settings shared by the whole group, chosen before anyone fills in a form
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupPreferences {
    pub users_count: usize,
    /// Maximum runtime in minutes, if the group has a time budget
    pub duration: Option<u32>,
}

impl GroupPreferences {
    pub fn new(users_count: usize, duration: Option<u32>) -> AppResult<Self> {
        if users_count == 0 {
            return Err(AppError::InvalidInput(
                "usersCount must be at least 1".to_string(),
            ));
        }
        if duration == Some(0) {
            return Err(AppError::InvalidInput(
                "duration must be at least 1 minute".to_string(),
            ));
        }
        Ok(Self {
            users_count,
            duration,
        })
    }

    /// Builds the duration budget from the hours/minutes spinners
    pub fn with_hours_and_minutes(users_count: usize, hours: u32, minutes: u32) -> AppResult<Self> {
        let duration = hours
            .checked_mul(60)
            .and_then(|total| total.checked_add(minutes))
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "duration of {}h {}m is out of range",
                    hours, minutes
                ))
            })?;
        Self::new(users_count, Some(duration))
    }

    pub fn ensure_group_size(&self, max_group_size: usize) -> AppResult<()> {
        if self.users_count > max_group_size {
            return Err(AppError::InvalidInput(format!(
                "usersCount must be at most {}, got {}",
                max_group_size, self.users_count
            )));
        }
        Ok(())
    }
}

/// Collects one preference per person until the group is complete
#[derive(Debug, Clone)]
pub struct PreferenceCollector {
    group: GroupPreferences,
    users: Vec<UserPreference>,
}

impl PreferenceCollector {
    pub fn new(group: GroupPreferences) -> Self {
        Self {
            group,
            users: Vec::with_capacity(group.users_count),
        }
    }

    /// Adds the next person's preference and returns their index
    pub fn submit(&mut self, preference: UserPreference) -> AppResult<usize> {
        if self.is_complete() {
            return Err(AppError::InvalidInput(format!(
                "All {} preferences have already been collected",
                self.group.users_count
            )));
        }
        preference.validate()?;
        self.users.push(preference);
        Ok(self.users.len() - 1)
    }

    pub fn collected(&self) -> usize {
        self.users.len()
    }

    pub fn is_complete(&self) -> bool {
        self.users.len() == self.group.users_count
    }

    /// Hands over the collected preferences once every person has answered
    pub fn finish(self) -> AppResult<(GroupPreferences, Vec<UserPreference>)> {
        if !self.is_complete() {
            return Err(AppError::InvalidInput(format!(
                "Expected {} preferences, collected {}",
                self.group.users_count,
                self.users.len()
            )));
        }
        Ok((self.group, self.users))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preference(text: &str) -> UserPreference {
        UserPreference::new(text, Genre::Classic, Mood::Fun)
    }

    #[test]
    fn test_embedding_input_uses_form_field_names() {
        let pref = UserPreference::new("Heat, the bank scene", Genre::New, Mood::Serious);
        let json: serde_json::Value =
            serde_json::from_str(&pref.to_embedding_input().unwrap()).unwrap();

        assert_eq!(json["favoriteMovie"], "Heat, the bank scene");
        assert_eq!(json["genre"], "new");
        assert_eq!(json["mood"], "serious");
    }

    #[test]
    fn test_unknown_mood_rejected() {
        let result = serde_json::from_str::<UserPreference>(
            r#"{"favoriteMovie":"Up","genre":"classic","mood":"sleepy"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_group_requires_a_user() {
        assert!(GroupPreferences::new(0, Some(90)).is_err());
        assert!(GroupPreferences::new(1, Some(0)).is_err());
        assert!(GroupPreferences::new(1, None).is_ok());
    }

    #[test]
    fn test_hours_and_minutes_duration() {
        let group = GroupPreferences::with_hours_and_minutes(2, 1, 45).unwrap();
        assert_eq!(group.duration, Some(105));
    }

    #[test]
    fn test_hours_and_minutes_overflow_is_invalid_input() {
        let result = GroupPreferences::with_hours_and_minutes(1, u32::MAX / 2, 0);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = GroupPreferences::with_hours_and_minutes(1, u32::MAX / 60, u32::MAX);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_group_size_limit() {
        let group = GroupPreferences::new(6, None).unwrap();
        assert!(group.ensure_group_size(5).is_err());
        assert!(group.ensure_group_size(6).is_ok());
    }

    #[test]
    fn test_collector_completes_at_users_count() {
        let mut collector = PreferenceCollector::new(GroupPreferences::new(2, None).unwrap());

        assert_eq!(collector.submit(preference("Alien")).unwrap(), 0);
        assert!(!collector.is_complete());
        assert_eq!(collector.submit(preference("Amelie")).unwrap(), 1);
        assert!(collector.is_complete());
        assert!(collector.submit(preference("Jaws")).is_err());

        let (group, users) = collector.finish().unwrap();
        assert_eq!(group.users_count, 2);
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn test_collector_refuses_to_finish_early() {
        let mut collector = PreferenceCollector::new(GroupPreferences::new(3, None).unwrap());
        collector.submit(preference("Alien")).unwrap();

        assert_eq!(collector.collected(), 1);
        assert!(collector.finish().is_err());
    }

    #[test]
    fn test_collector_rejects_blank_rationale() {
        let mut collector = PreferenceCollector::new(GroupPreferences::new(1, None).unwrap());
        assert!(collector.submit(preference("   ")).is_err());
        assert_eq!(collector.collected(), 0);
    }
}
