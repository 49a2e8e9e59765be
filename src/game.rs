//! Game flow over a loaded batch: start, five rounds, final score.

use crate::cache::QuestionCache;
use crate::commands::FETCH_FAILED_MESSAGE;
use crate::question::Batch;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

pub const TOTAL_QUESTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameState {
    Start,
    Playing,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("{}", FETCH_FAILED_MESSAGE)]
    LoadFailed,
    #[error("No game in progress")]
    NotPlaying,
    #[error("This question was already answered")]
    AlreadyAnswered,
    #[error("Answer the current question first")]
    NotAnswered,
    #[error("\"{0}\" is not one of the options")]
    UnknownAnswer(String),
}

/// What the player sees for the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Round<'a> {
    pub number: usize,
    pub total: usize,
    pub question: &'a str,
    pub answers: &'a [String],
    pub selected: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_answer: String,
    pub score: usize,
}

#[derive(Debug)]
pub struct GameSession {
    state: GameState,
    questions: Batch,
    index: usize,
    score: usize,
    options: Vec<String>,
    selected: Option<String>,
    error: Option<String>,
    rng: StdRng,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Session with a fixed shuffle source.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            state: GameState::Start,
            questions: Vec::new(),
            index: 0,
            score: 0,
            options: Vec::new(),
            selected: None,
            error: None,
            rng,
        }
    }

    /// Pulls a fresh set of questions and starts playing. On failure the
    /// session goes back to `Start` and keeps the message for display.
    pub async fn load(&mut self, cache: &QuestionCache) -> Result<(), GameError> {
        self.error = None;
        match cache.get_questions(TOTAL_QUESTIONS).await {
            Ok(questions) => {
                self.begin(questions);
                info!(questions = TOTAL_QUESTIONS, "Game started");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Could not load questions");
                self.state = GameState::Start;
                self.error = Some(FETCH_FAILED_MESSAGE.to_string());
                Err(GameError::LoadFailed)
            }
        }
    }

    fn begin(&mut self, questions: Batch) {
        self.questions = questions;
        self.index = 0;
        self.score = 0;
        self.state = GameState::Playing;
        self.deal();
    }

    /// Shuffles the options of the current question once.
    fn deal(&mut self) {
        self.selected = None;
        self.options = match self.questions.get(self.index) {
            Some(item) => item.answers().map(str::to_string).collect(),
            None => Vec::new(),
        };
        self.options.shuffle(&mut self.rng);
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_round(&self) -> Option<Round<'_>> {
        if self.state != GameState::Playing {
            return None;
        }
        let item = self.questions.get(self.index)?;
        Some(Round {
            number: self.index + 1,
            total: TOTAL_QUESTIONS,
            question: &item.question,
            answers: &self.options,
            selected: self.selected.as_deref(),
        })
    }

    /// Records the player's choice and reveals the correct answer.
    pub fn answer(&mut self, choice: &str) -> Result<AnswerOutcome, GameError> {
        if self.state != GameState::Playing {
            return Err(GameError::NotPlaying);
        }
        if self.selected.is_some() {
            return Err(GameError::AlreadyAnswered);
        }
        if !self.options.iter().any(|o| o == choice) {
            return Err(GameError::UnknownAnswer(choice.to_string()));
        }

        let item = &self.questions[self.index];
        let correct = item.is_correct(choice);
        if correct {
            self.score += 1;
        }
        self.selected = Some(choice.to_string());
        debug!(round = self.index + 1, correct, score = self.score, "Answer recorded");

        Ok(AnswerOutcome {
            correct,
            correct_answer: item.correct_answer.clone(),
            score: self.score,
        })
    }

    /// Moves to the next question, or finishes after the last one.
    pub fn advance(&mut self) -> Result<GameState, GameError> {
        if self.state != GameState::Playing {
            return Err(GameError::NotPlaying);
        }
        if self.selected.is_none() {
            return Err(GameError::NotAnswered);
        }

        let next = self.index + 1;
        if next < TOTAL_QUESTIONS.min(self.questions.len()) {
            self.index = next;
            self.deal();
        } else {
            self.state = GameState::Finished;
            info!(score = self.score, total = TOTAL_QUESTIONS, "Game finished");
        }
        Ok(self.state)
    }

    /// End-screen line for the final score.
    pub fn feedback(&self) -> Option<&'static str> {
        (self.state == GameState::Finished).then(|| score_feedback(self.score, TOTAL_QUESTIONS))
    }

    pub fn play_again(&mut self) {
        self.state = GameState::Start;
        self.questions.clear();
        self.options.clear();
        self.selected = None;
        self.index = 0;
        self.score = 0;
    }
}

pub fn score_feedback(score: usize, total: usize) -> &'static str {
    let percentage = if total == 0 { 0 } else { score * 100 / total };
    match percentage {
        100.. => "A Modern Day Warrior! Perfect Score!",
        80..=99 => "Closer to the Heart! Excellent job!",
        50..=79 => "Working Man! A solid effort!",
        _ => "Time Stand Still... Better luck next time!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::fetcher::BatchFetcher;
    use crate::testing::ScriptedTransport;
    use crate::transport::FetchError;
    use std::sync::Arc;

    fn cache(transport: ScriptedTransport) -> QuestionCache {
        let config = CacheConfig {
            retry_backoff_ms: 0,
            ..CacheConfig::default()
        };
        QuestionCache::new(BatchFetcher::new(Arc::new(transport)), config)
    }

    async fn playing(seed: u64) -> GameSession {
        let mut session = GameSession::with_rng(StdRng::seed_from_u64(seed));
        session.load(&cache(ScriptedTransport::new())).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_load_starts_the_first_round() {
        let session = playing(7).await;
        assert_eq!(session.state(), GameState::Playing);

        let round = session.current_round().unwrap();
        assert_eq!(round.number, 1);
        assert_eq!(round.total, TOTAL_QUESTIONS);
        assert_eq!(round.question, "q0");
        let mut answers = round.answers.to_vec();
        answers.sort();
        assert_eq!(answers, vec!["answer 0", "wrong a", "wrong b", "wrong c"]);
    }

    #[tokio::test]
    async fn test_shuffle_follows_the_seed() {
        let a = playing(42).await;
        let b = playing(42).await;
        assert_eq!(
            a.current_round().unwrap().answers,
            b.current_round().unwrap().answers
        );
    }

    #[tokio::test]
    async fn test_full_game() {
        let mut session = playing(1).await;

        for round in 0..TOTAL_QUESTIONS {
            let choice = if round < 4 {
                format!("answer {round}")
            } else {
                "wrong a".to_string()
            };
            let outcome = session.answer(&choice).unwrap();
            assert_eq!(outcome.correct, round < 4);
            assert_eq!(outcome.correct_answer, format!("answer {round}"));

            let state = session.advance().unwrap();
            if round + 1 < TOTAL_QUESTIONS {
                assert_eq!(state, GameState::Playing);
                assert_eq!(session.current_round().unwrap().number, round + 2);
            } else {
                assert_eq!(state, GameState::Finished);
            }
        }

        assert_eq!(session.score(), 4);
        assert!(session.current_round().is_none());
        assert_eq!(session.feedback(), Some("Closer to the Heart! Excellent job!"));

        session.play_again();
        assert_eq!(session.state(), GameState::Start);
        assert_eq!(session.score(), 0);
        assert!(session.feedback().is_none());
    }

    #[tokio::test]
    async fn test_answer_rules() {
        let mut session = playing(3).await;

        assert_eq!(session.advance(), Err(GameError::NotAnswered));
        assert_eq!(
            session.answer("Moving Pictures"),
            Err(GameError::UnknownAnswer("Moving Pictures".to_string()))
        );

        session.answer("wrong b").unwrap();
        assert_eq!(session.answer("answer 0"), Err(GameError::AlreadyAnswered));
        assert_eq!(session.current_round().unwrap().selected, Some("wrong b"));
        assert_eq!(session.score(), 0);
    }

    #[tokio::test]
    async fn test_load_failure_returns_to_start() {
        let mut session = GameSession::with_rng(StdRng::seed_from_u64(0));
        let failing = cache(ScriptedTransport::new().fail_always(FetchError::transport("down")));

        assert_eq!(session.load(&failing).await, Err(GameError::LoadFailed));
        assert_eq!(session.state(), GameState::Start);
        assert_eq!(session.error(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(session.answer("anything"), Err(GameError::NotPlaying));
    }

    #[test]
    fn test_score_feedback() {
        assert_eq!(score_feedback(5, 5), "A Modern Day Warrior! Perfect Score!");
        assert_eq!(score_feedback(3, 5), "Working Man! A solid effort!");
        assert_eq!(score_feedback(2, 5), "Time Stand Still... Better luck next time!");
    }
}
