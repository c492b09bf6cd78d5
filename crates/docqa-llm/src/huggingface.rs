use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co";

/// Models hosted behind the Hugging Face inference router.
///
/// Generation uses the OpenAI-compatible `/v1/chat/completions` route with
/// temperature 0; embeddings use the `feature-extraction` pipeline.
#[derive(Clone)]
pub struct HuggingFaceProvider {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
    model: String,
    embedding_model: Option<String>,
    max_tokens: u32,
}

impl fmt::Debug for HuggingFaceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl HuggingFaceProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        api_token: String,
        mut base_url: String,
        model: String,
        embedding_model: Option<String>,
        max_tokens: u32,
    ) -> Result<Self, LlmError> {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            client: crate::http::default_client()?,
            api_token,
            base_url,
            model,
            embedding_model,
            max_tokens,
        })
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn embedding_url(&self, model: &str) -> String {
        format!(
            "{}/hf-inference/models/{model}/pipeline/feature-extraction",
            self.base_url
        )
    }
}

impl LlmProvider for HuggingFaceProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let api_messages: Vec<ApiMessage<'_>> = messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();
        let body = ChatRequest {
            model: &self.model,
            messages: &api_messages,
            max_tokens: self.max_tokens,
            temperature: 0.0,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited {
                provider: "huggingface",
            });
        }
        if !status.is_success() {
            tracing::error!("Hugging Face API error {status}: {text}");
            return Err(LlmError::Other(format!(
                "Hugging Face chat request failed (status {status})"
            )));
        }

        let resp: ChatResponse = serde_json::from_str(&text)?;
        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse {
                provider: "huggingface",
            })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let model = self
            .embedding_model
            .as_deref()
            .ok_or(LlmError::EmbedUnsupported {
                provider: "huggingface",
            })?;

        let response = self
            .client
            .post(self.embedding_url(model))
            .bearer_auth(&self.api_token)
            .json(&EmbeddingRequest { inputs: text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited {
                provider: "huggingface",
            });
        }
        if !status.is_success() {
            tracing::error!("Hugging Face embedding error {status}: {body}");
            return Err(LlmError::Other(format!(
                "Hugging Face embedding request failed (status {status})"
            )));
        }

        let resp: EmbeddingResponse = serde_json::from_str(&body)?;
        resp.into_vector().ok_or(LlmError::EmptyResponse {
            provider: "huggingface",
        })
    }

    fn supports_embeddings(&self) -> bool {
        self.embedding_model.is_some()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "huggingface"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage<'a>],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    inputs: &'a str,
}

/// Sentence-embedding models return one vector; token-level models return one
/// row per token, which is mean-pooled.
#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Pooled(Vec<f32>),
    PerToken(Vec<Vec<f32>>),
}

impl EmbeddingResponse {
    fn into_vector(self) -> Option<Vec<f32>> {
        match self {
            Self::Pooled(v) if !v.is_empty() => Some(v),
            Self::Pooled(_) => None,
            Self::PerToken(rows) => mean_pool(&rows),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_pool(rows: &[Vec<f32>]) -> Option<Vec<f32>> {
    let dim = rows.first()?.len();
    if dim == 0 {
        return None;
    }
    let mut sum = vec![0.0f32; dim];
    for row in rows {
        for (acc, v) in sum.iter_mut().zip(row) {
            *acc += v;
        }
    }
    let n = rows.len() as f32;
    Some(sum.into_iter().map(|v| v / n).collect())
}
