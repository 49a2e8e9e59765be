use crate::cache::QuestionCache;
use crate::game::GameSession;
use crate::question::Batch;
use tracing::error;

/// The only failure text shown to players; every cause is retryable.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch trivia questions. Please try again later.";

/* ---------- QUESTIONS ---------- */

pub async fn get_questions(cache: &QuestionCache, count: usize) -> Result<Batch, String> {
    cache.get_questions(count).await.map_err(|e| {
        error!(error = %e, count, "Question request failed");
        FETCH_FAILED_MESSAGE.to_string()
    })
}

/* ---------- GAME ---------- */

/// New session already holding its questions.
pub async fn start_game(cache: &QuestionCache) -> Result<GameSession, String> {
    let mut session = GameSession::new();
    session.load(cache).await.map_err(|e| e.to_string())?;
    Ok(session)
}
