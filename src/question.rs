//! Trivia question structs and the `/api/trivia` wire payloads.

use serde::{Deserialize, Serialize};

/// Smallest batch the question source will generate.
pub const MIN_BATCH: usize = 1;
/// Largest batch the question source will generate.
pub const MAX_BATCH: usize = 10;
/// Number of incorrect answers every question carries.
pub const INCORRECT_ANSWERS: usize = 3;

/// One multiple-choice question.
///
/// Text fields may contain inline markup; it is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaItem {
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

impl TriviaItem {
    pub fn new(
        question: impl Into<String>,
        correct_answer: impl Into<String>,
        incorrect_answers: [&str; INCORRECT_ANSWERS],
    ) -> Self {
        Self {
            question: question.into(),
            correct_answer: correct_answer.into(),
            incorrect_answers: incorrect_answers.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Correct answer followed by the incorrect ones.
    pub fn answers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.correct_answer.as_str())
            .chain(self.incorrect_answers.iter().map(String::as_str))
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// Ordered group of questions returned by one fetch.
pub type Batch = Vec<TriviaItem>;

/// Body of `POST /api/trivia`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriviaRequest {
    #[serde(default)]
    pub count: Option<usize>,
}

/// Success or failure body returned by the question source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriviaResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Batch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl TriviaResponse {
    pub fn questions(questions: Batch) -> Self {
        Self {
            questions: Some(questions),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: Some(error.into()),
            details,
            ..Self::default()
        }
    }

    /// Error text preferring `details` over `error`.
    pub fn failure_message(&self) -> Option<&str> {
        self.details.as_deref().or(self.error.as_deref())
    }
}
