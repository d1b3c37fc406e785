use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An article as it comes off a detail page, before generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedRecord {
    pub title: String,
    pub content: String,
    /// Absolute URL of the detail page. Used as the dedup key.
    pub link: String,
    pub fetched_at: DateTime<Utc>,
}

impl ScrapedRecord {
    pub fn new(link: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            link: link.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// A persisted row: the scraped text plus what the backend generated for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: String,
    pub link: String,
    pub title: String,
    pub article: String,
    pub article_gen: String,
    /// RFC 3339 timestamp taken when the row was written.
    pub created_at: String,
}

/// Result of a single `generate` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub text: String,
    pub eval_count: Option<u64>,
    /// Nanoseconds spent generating `eval_count` tokens.
    pub eval_duration: Option<u64>,
}

impl GenerationOutput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn tokens_per_second(&self) -> Option<f64> {
        match (self.eval_count, self.eval_duration) {
            (Some(count), Some(duration)) if duration > 0 => {
                Some(count as f64 / (duration as f64 / 1_000_000_000.0))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_per_second() {
        let output = GenerationOutput {
            text: "ni hao".to_string(),
            eval_count: Some(50),
            eval_duration: Some(2_000_000_000),
        };
        assert_eq!(output.tokens_per_second(), Some(25.0));

        let output = GenerationOutput {
            eval_duration: Some(0),
            ..output
        };
        assert_eq!(output.tokens_per_second(), None);
        assert_eq!(GenerationOutput::from_text("x").tokens_per_second(), None);
    }
}
