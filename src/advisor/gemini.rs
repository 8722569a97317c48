use super::AdvisoryClient;
use crate::error::RequestError;
use crate::models::transaction::Transaction;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

const SYSTEM_INSTRUCTION: &str =
    "You are a world-class financial advisor expert. Provide brief, data-driven insights.";
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

/// Client for Google's `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: &str, api_base: &str) -> Result<Self, RequestError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model)
    }
}

impl AdvisoryClient for GeminiClient {
    fn request(&self, transactions: &[Transaction]) -> Result<String, RequestError> {
        let api_key = self.api_key.as_deref().ok_or(RequestError::MissingApiKey)?;
        let body = build_request(transactions);

        debug!(model = %self.model, count = transactions.len(), "requesting insights");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RequestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json()?;
        Ok(response_text(parsed))
    }
}

/// One `type: amount (description)` entry per transaction, comma separated.
pub fn summarize(transactions: &[Transaction]) -> String {
    transactions
        .iter()
        .map(|t| {
            format!(
                "{}: {} ({})",
                t.transaction_type.as_str(),
                t.amount.normalize(),
                t.description
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_prompt(transactions: &[Transaction]) -> String {
    format!(
        "Analyze these monthly transactions and provide 3-4 concise, actionable financial tips.\n\
         Keep the tone professional and encouraging.\n\
         Transactions: {}\n\
         Format the response as a simple markdown list.",
        summarize(transactions)
    )
}

fn build_request(transactions: &[Transaction]) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: SYSTEM_INSTRUCTION.to_string(),
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: build_prompt(transactions),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
        },
    }
}

// A response without candidates yields an empty string, not an error.
fn response_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .map(|c| {
            c.content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}
