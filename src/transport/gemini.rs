//! Direct channel: calls the Gemini `generateContent` API with a JSON
//! response schema so the model answers with a `{questions: [...]}` object.

use super::{http_client, FetchError, Transport};
use crate::config::GeminiConfig;
use crate::question::Batch;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

pub struct GeminiTransport {
    client: Client,
    api_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize, Debug)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Debug)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct QuestionsEnvelope {
    questions: Option<Batch>,
}

impl GeminiTransport {
    pub fn new(config: &GeminiConfig, timeout: Duration) -> Result<Self, FetchError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| FetchError::transport("GEMINI_API_KEY not configured"))?;

        Ok(Self {
            client: http_client(timeout)?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn request(&self, count: usize) -> Result<Option<Batch>, FetchError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(count) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": questions_schema(count),
                "temperature": self.temperature,
            }
        });

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchError::from_status(status, &error_text));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Schema(format!("Failed to parse API response as JSON: {}", e)))?;

        let text = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| FetchError::Schema("Invalid response from Gemini API".to_string()))?;

        let json_str = extract_json(&text)?;
        let envelope: QuestionsEnvelope = serde_json::from_str(json_str)
            .map_err(|e| FetchError::Schema(format!("Failed to parse generated questions: {}", e)))?;

        debug!(
            returned = envelope.questions.as_ref().map(Vec::len),
            "Gemini answered"
        );
        Ok(envelope.questions)
    }
}

fn build_prompt(count: usize) -> String {
    format!(
        "Generate exactly {count} different multiple-choice trivia questions about the Canadian progressive rock band Rush.
Cover the band's lyrics, albums, members (Geddy Lee, Alex Lifeson, Neil Peart) and general trivia.
Keep most questions accessible to a casual fan and include a few harder ones for die-hard fans.
Avoid extremely obscure details.

For each question:
- Provide one correct answer.
- Provide exactly three plausible but incorrect answers.
- Ensure all answer options are distinct from each other.
- Make sure every question is unique and covers a different aspect of Rush."
    )
}

fn questions_schema(count: usize) -> Value {
    json!({
        "type": "object",
        "properties": {
            "questions": {
                "type": "array",
                "description": format!("An array of exactly {} trivia questions about Rush.", count),
                "items": {
                    "type": "object",
                    "properties": {
                        "question": {
                            "type": "string",
                            "description": "The trivia question about the band Rush."
                        },
                        "correctAnswer": {
                            "type": "string",
                            "description": "The single correct answer to the question."
                        },
                        "incorrectAnswers": {
                            "type": "array",
                            "description": "An array of exactly three plausible but incorrect answers.",
                            "items": { "type": "string" }
                        }
                    },
                    "required": ["question", "correctAnswer", "incorrectAnswers"]
                }
            }
        },
        "required": ["questions"]
    })
}

/// Strips markdown fences or surrounding prose from a model reply.
fn extract_json(response: &str) -> Result<&str, FetchError> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        if let Some(end) = trimmed[start + 7..].find("```") {
            return Ok(trimmed[start + 7..start + 7 + end].trim());
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&trimmed[start..=end]),
        _ => Err(FetchError::Schema("No valid JSON found in response".to_string())),
    }
}
