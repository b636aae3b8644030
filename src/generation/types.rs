//! Slide deck data model
//!
//! Defines the request, slide, and question structures shared by the
//! pipeline, cache, and API layers.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Maximum number of content slides accepted in a single request
pub const MAX_SLIDE_COUNT: u32 = 20;

fn default_slide_count() -> u32 {
    5
}

/// Request for a slide deck generation
///
/// Immutable once validated. `slide_count` is the number of content slides;
/// the title, agenda, and conclusion slides are extra.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeckRequest {
    /// Subject of the lesson
    pub topic: String,
    /// Students' year/level
    pub grade: String,
    /// Extra details from the teacher (may be empty)
    #[serde(default)]
    pub context: String,
    /// Number of content slides to generate
    #[serde(default = "default_slide_count")]
    pub slide_count: u32,
}

impl DeckRequest {
    /// Validate the request before it reaches the generation core
    pub fn validate(&self) -> Result<(), AppError> {
        if self.topic.trim().is_empty() {
            return Err(AppError::Validation("topic cannot be empty".to_string()));
        }
        if self.grade.trim().is_empty() {
            return Err(AppError::Validation("grade cannot be empty".to_string()));
        }
        if self.slide_count == 0 {
            return Err(AppError::Validation(
                "slide_count must be at least 1".to_string(),
            ));
        }
        if self.slide_count > MAX_SLIDE_COUNT {
            return Err(AppError::Validation(format!(
                "slide_count must be at most {}",
                MAX_SLIDE_COUNT
            )));
        }
        Ok(())
    }

    /// Normalized cache key for this request
    ///
    /// Text fields are trimmed and the grade is case-folded, so requests
    /// that differ only in surrounding whitespace or grade casing hit the
    /// same cache entry.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            topic: self.topic.trim().to_string(),
            grade: self.grade.trim().to_lowercase(),
            context: self.context.trim().to_string(),
            slide_count: self.slide_count,
        }
    }

    /// Content-slide index (0-based) of the slide that carries the question
    pub fn question_slide_index(&self) -> usize {
        (self.slide_count / 2) as usize
    }
}

/// Normalized request fingerprint used as the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    topic: String,
    grade: String,
    context: String,
    slide_count: u32,
}

/// Kind of slide in the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    /// Opening slide with the lesson title
    Title,
    /// Agenda listing the content slide titles
    Agenda,
    /// One teaching slide
    Content,
    /// Summary and takeaway
    Conclusion,
}

/// Question (exercise) carried by exactly one content slide per deck
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    /// Question statement, aligned with the lesson
    pub prompt: String,
    /// Answer options (at least two)
    pub options: Vec<String>,
    /// The correct option; must be one of `options`
    pub answer: String,
}

impl Question {
    /// Whether the question is internally consistent
    pub fn is_consistent(&self) -> bool {
        self.options.len() >= 2 && self.options.contains(&self.answer)
    }
}

/// A single slide in the deck
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slide {
    /// Kind of slide (wire field `type`)
    #[serde(rename = "type")]
    pub kind: SlideKind,
    /// Slide title
    pub title: String,
    /// Text displayed on the slide (wire field `content`)
    #[serde(rename = "content")]
    pub body: String,
    /// Search query for an image that fits the slide (content slides only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Question for this slide (at most one content slide per deck)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
}

/// Ordered slide sequence for one request: title, agenda, content slides,
/// conclusion
pub type Deck = Vec<Slide>;
