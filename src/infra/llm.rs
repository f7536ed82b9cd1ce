use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};

use crate::domain::batch::Batch;
use crate::domain::prompt::summary_prompt;
use crate::error::{AppError, AppResult};
use crate::services::LanguageModelService;

/// Client for any endpoint speaking the OpenAI chat-completions protocol.
pub struct OpenAiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            AppError::Configuration(
                "OpenAI API key not configured; run `riddlesolver config set openai api_key <KEY>`"
                    .to_string(),
            )
        })
    }

    fn completions_endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn complete(&self, prompt: String) -> AppResult<String> {
        let api_key = self.api_key()?;
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(model = %self.model, "requesting completion");
        let response = self
            .http
            .post(self.completions_endpoint())
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                AppError::LanguageModel(format!("failed to call the language model: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(status_error(status, &body));
        }

        let payload: ChatCompletionResponse = response.json().await.map_err(|err| {
            AppError::LanguageModel(format!("failed to parse language model response: {err}"))
        })?;
        first_choice(payload)
    }
}

#[async_trait]
impl LanguageModelService for OpenAiClient {
    async fn summarize_batch(&self, batch: &Batch) -> AppResult<String> {
        self.complete(summary_prompt(batch)).await
    }
}

fn status_error(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Authentication(format!(
            "language model rejected the API key ({status}): {body}"
        )),
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited(body.to_string()),
        _ => AppError::LanguageModel(format!("language model responded with {status}: {body}")),
    }
}

fn first_choice(payload: ChatCompletionResponse) -> AppResult<String> {
    payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| AppError::LanguageModel("language model returned no choices".to_string()))
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
