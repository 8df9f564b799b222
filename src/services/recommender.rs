use std::sync::Arc;

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{Recommendation, NO_MOVIES_FOUND_CONTENT, NO_MOVIES_FOUND_TITLE},
    services::providers::{ChatMessage, ChatModel, ChatRequest},
};

pub const TEMPERATURE: f32 = 0.7;
pub const PRESENCE_PENALTY: f32 = 0.0;
/// Discourages the model from falling back on the same generic titles
pub const FREQUENCY_PENALTY: f32 = 0.5;
pub const MAX_DESCRIPTION_WORDS: usize = 60;

/// Context sent when retrieval found nothing above the threshold
pub const EMPTY_CONTEXT_PLACEHOLDER: &str = "No matching context found.";

/// The reply shape the model is instructed to produce
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ModelReply {
    title: String,
    content: String,
    #[serde(default)]
    release_year: Option<ReleaseYear>,
}

/// Models return the year either as a number or as a string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReleaseYear {
    Number(u64),
    Text(String),
}

impl ReleaseYear {
    fn to_year(&self) -> Option<u16> {
        match self {
            ReleaseYear::Number(n) => u16::try_from(*n).ok().filter(|y| (1000..=9999).contains(y)),
            ReleaseYear::Text(s) => {
                let s = s.trim();
                if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
                    s.parse().ok()
                } else {
                    None
                }
            }
        }
    }
}

/// Asks the chat model for exactly one movie and parses its JSON reply
pub struct Recommender {
    chat_model: Arc<dyn ChatModel>,
    model: String,
}

impl Recommender {
    pub fn new(chat_model: Arc<dyn ChatModel>, model: impl Into<String>) -> Self {
        Self {
            chat_model,
            model: model.into(),
        }
    }

    /// Output contract for the model
    pub fn system_prompt() -> String {
        let sentinel = format!(
            r#"{{"title":"{}","content":"{}"}}"#,
            NO_MOVIES_FOUND_TITLE, NO_MOVIES_FOUND_CONTENT
        );

        [
            "You are a precise movie recommender.".to_string(),
            "Given a user input, a context summary and optionally a maximum movie duration (in minutes), recommend exactly one movie that is similar to the input and consistent with the context.".to_string(),
            r#"Respond ONLY as minified JSON with this shape: {"title":"Movie Title","content":"Movie Description","releaseYear":"Release Year"}."#.to_string(),
            "Rules:".to_string(),
            "- Only recommend if confident it matches both input and context.".to_string(),
            format!("- If unsure or no good match, respond exactly with: {}", sentinel),
            "- Do not include extra fields, commentary, markdown, or quotes outside the JSON.".to_string(),
            format!(
                "- Keep the description concise (<= {} words).",
                MAX_DESCRIPTION_WORDS
            ),
        ]
        .join("\n")
    }

    /// User turn carrying the input, the retrieved context and the time budget
    pub fn user_prompt(input: &str, context: &str, duration_minutes: Option<u32>) -> String {
        let context = if context.trim().is_empty() {
            EMPTY_CONTEXT_PLACEHOLDER
        } else {
            context
        };

        let mut lines = vec![
            "User input:".to_string(),
            input.to_string(),
            String::new(),
            "Context:".to_string(),
            context.to_string(),
            String::new(),
        ];

        if let Some(minutes) = duration_minutes {
            lines.push("Max movie duration:".to_string());
            lines.push(format!("{} minutes", minutes));
            lines.push(format!(
                "The recommended movie's runtime must not exceed {} minutes.",
                minutes
            ));
        }

        lines.push("Return only the JSON object as specified.".to_string());
        lines.join("\n")
    }

    pub fn build_request(
        &self,
        input: &str,
        context: &str,
        duration_minutes: Option<u32>,
    ) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(Self::system_prompt()),
                ChatMessage::user(Self::user_prompt(input, context, duration_minutes)),
            ],
            temperature: TEMPERATURE,
            presence_penalty: PRESENCE_PENALTY,
            frequency_penalty: FREQUENCY_PENALTY,
        }
    }

    pub async fn recommend(
        &self,
        input: &str,
        context: &str,
        duration_minutes: Option<u32>,
    ) -> AppResult<Recommendation> {
        let request = self.build_request(input, context, duration_minutes);
        let raw = self.chat_model.complete(&request).await?;

        let recommendation = parse_reply(&raw)?;

        tracing::info!(
            title = %recommendation.title,
            release_year = ?recommendation.release_year,
            no_match = recommendation.is_no_movies_found(),
            provider = self.chat_model.name(),
            "Recommendation parsed"
        );

        Ok(recommendation)
    }
}

/// Parses the model's reply strictly
///
/// The reply must be one JSON object with `title`, `content` and, unless it
/// is the "No movies found" reply, a four-digit `releaseYear`. Anything else
/// is a [`AppError::MalformedModelOutput`].
pub fn parse_reply(raw: &str) -> AppResult<Recommendation> {
    let reply: ModelReply = serde_json::from_str(raw.trim())
        .map_err(|e| AppError::malformed(format!("Reply is not the expected JSON: {}", e), raw))?;

    if reply.title.trim() == NO_MOVIES_FOUND_TITLE {
        return Ok(Recommendation::no_movies_found());
    }

    let title = reply.title.trim();
    if title.is_empty() {
        return Err(AppError::malformed("Reply has an empty title", raw));
    }

    let content = reply.content.trim();
    if content.is_empty() {
        return Err(AppError::malformed("Reply has an empty description", raw));
    }

    let release_year = reply
        .release_year
        .as_ref()
        .ok_or_else(|| AppError::malformed("Reply is missing releaseYear", raw))?
        .to_year()
        .ok_or_else(|| AppError::malformed("releaseYear is not a four-digit year", raw))?;

    Ok(Recommendation::new(
        title,
        limit_words(content, MAX_DESCRIPTION_WORDS),
        release_year,
    ))
}

fn limit_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }

    tracing::warn!(
        words = words.len(),
        max_words,
        "Model description too long, truncating"
    );
    words[..max_words].join(" ")
}
