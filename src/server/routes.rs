use super::{error::ApiError, state::AppState};
use crate::question::{TriviaResponse, MAX_BATCH, MIN_BATCH};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

pub const DEFAULT_COUNT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
    count: Option<usize>,
}

/// Missing or zero counts fall back to the default.
fn resolve_count(count: Option<usize>) -> Result<usize, ApiError> {
    let count = match count {
        None | Some(0) => DEFAULT_COUNT,
        Some(n) => n,
    };
    if (MIN_BATCH..=MAX_BATCH).contains(&count) {
        Ok(count)
    } else {
        Err(ApiError::InvalidCount)
    }
}

/// Reads `count` from a raw request body. Anything present other than an
/// integer in range (or 0) is rejected rather than defaulted.
fn count_from_body(body: Result<Json<Value>, JsonRejection>) -> Result<usize, ApiError> {
    let value = match body {
        Ok(Json(value)) => value.get("count").cloned().unwrap_or(Value::Null),
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Null,
        Err(e) => return Err(ApiError::MalformedPayload(e.body_text())),
    };

    match value {
        Value::Null => resolve_count(None),
        Value::Number(n) => match n.as_u64() {
            Some(n) => resolve_count(Some(usize::try_from(n).map_err(|_| ApiError::InvalidCount)?)),
            None => Err(ApiError::InvalidCount),
        },
        _ => Err(ApiError::InvalidCount),
    }
}

/// `POST /api/trivia`: generates a fresh batch straight from the model.
#[instrument(skip_all)]
pub async fn trivia_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TriviaResponse>, ApiError> {
    let generator = state.generator.as_ref().ok_or(ApiError::MissingApiKey)?;
    let count = count_from_body(body)?;

    let questions = generator
        .fetch_batch(count)
        .await
        .map_err(ApiError::Generation)?;

    debug!(count, "Generated trivia questions");
    Ok(Json(TriviaResponse::questions(questions)))
}

/// `GET /api/questions?count=n`: serves from the prefetch buffer.
#[instrument(skip_all)]
pub async fn questions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuestionsQuery>,
) -> Result<Json<TriviaResponse>, ApiError> {
    let count = resolve_count(query.count)?;

    let questions = state
        .cache
        .get_questions(count)
        .await
        .map_err(ApiError::Unavailable)?;

    Ok(Json(TriviaResponse::questions(questions)))
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "generator": state.generator.is_some(),
        "cache": state.cache.stats(),
    }))
}
