//! Shape checks applied to every batch before it reaches the cache.

use crate::question::{Batch, TriviaItem, INCORRECT_ANSWERS};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("API returned no question list")]
    MissingBatch,

    #[error("API returned invalid number of questions. Expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("question {index} has {actual} incorrect answers, expected 3")]
    IncorrectAnswerCount { index: usize, actual: usize },

    #[error("question {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },

    #[error("question {index} repeats the answer \"{answer}\"")]
    DuplicateAnswer { index: usize, answer: String },
}

/// Batch validator. Structural checks always run; the content checks can
/// be relaxed for sources known to emit near-duplicate options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchValidator {
    pub require_non_empty: bool,
    pub require_distinct_answers: bool,
}

impl Default for BatchValidator {
    fn default() -> Self {
        Self {
            require_non_empty: true,
            require_distinct_answers: true,
        }
    }
}

impl BatchValidator {
    /// Structural checks only.
    pub fn lenient() -> Self {
        Self {
            require_non_empty: false,
            require_distinct_answers: false,
        }
    }

    /// Returns the batch untouched when it holds exactly `expected` well-formed items.
    pub fn validate(
        &self,
        expected: usize,
        batch: Option<Batch>,
    ) -> Result<Batch, ValidationError> {
        let batch = batch.ok_or(ValidationError::MissingBatch)?;

        if batch.len() != expected {
            warn!(expected, actual = batch.len(), "Batch length mismatch");
            return Err(ValidationError::LengthMismatch {
                expected,
                actual: batch.len(),
            });
        }

        for (index, item) in batch.iter().enumerate() {
            self.validate_item(index, item)?;
        }

        debug!(count = batch.len(), "Batch passed validation");
        Ok(batch)
    }

    fn validate_item(&self, index: usize, item: &TriviaItem) -> Result<(), ValidationError> {
        if item.incorrect_answers.len() != INCORRECT_ANSWERS {
            return Err(ValidationError::IncorrectAnswerCount {
                index,
                actual: item.incorrect_answers.len(),
            });
        }

        if self.require_non_empty {
            if item.question.trim().is_empty() {
                return Err(ValidationError::EmptyField {
                    index,
                    field: "question",
                });
            }
            if item.answers().any(|a| a.trim().is_empty()) {
                return Err(ValidationError::EmptyField {
                    index,
                    field: "answer",
                });
            }
        }

        if self.require_distinct_answers {
            let mut seen = HashSet::with_capacity(INCORRECT_ANSWERS + 1);
            for answer in item.answers() {
                if !seen.insert(answer.trim().to_lowercase()) {
                    return Err(ValidationError::DuplicateAnswer {
                        index,
                        answer: answer.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Validates with the default (strict) policy.
pub fn validate_batch(expected: usize, batch: Option<Batch>) -> Result<Batch, ValidationError> {
    BatchValidator::default().validate(expected, batch)
}
