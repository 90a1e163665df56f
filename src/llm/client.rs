//! Text-generation API clients for the supported providers

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::LlmError;
use super::LlmProvider;
use super::TextGenerator;
use crate::config::AppConfig;
use crate::errors::PostRagError;
use crate::errors::Result;

/// Client for a single configured text-generation provider
#[derive(Debug, Clone)]
pub struct LlmService {
    provider: LlmProvider,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: Client,
}

impl LlmService {
    /// Create a client from the `[llm]` section
    ///
    /// # Errors
    /// - Unknown provider name
    /// - Missing API key for providers that need one
    /// - HTTP client build errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let provider = config.llm_provider()?;
        if provider.requires_api_key() && config.llm_key().trim().is_empty() {
            return Err(PostRagError::ConfigError(format!(
                "llm.llm_key is required for provider {provider}"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .build()
            .map_err(|e| PostRagError::HttpError(e.to_string()))?;

        Ok(Self {
            provider,
            endpoint: config.llm_endpoint().trim_end_matches('/').to_string(),
            api_key: config.llm_key().to_string(),
            model: config.llm_model().to_string(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            client,
        })
    }

    pub const fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Generate a completion for a single prompt
    pub async fn generate_with_params(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> std::result::Result<String, LlmError> {
        debug!(
            "Calling {} model {} ({} prompt chars)",
            self.provider,
            self.model,
            prompt.chars().count()
        );

        match self.provider {
            LlmProvider::OpenAi => self.generate_openai(prompt, temperature, max_tokens).await,
            LlmProvider::Ollama => self.generate_ollama(prompt, temperature, max_tokens).await,
            LlmProvider::Gemini => self.generate_gemini(prompt, temperature, max_tokens).await,
        }
    }

    async fn generate_openai(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> std::result::Result<String, LlmError> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: vec![OpenAiMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
        };

        let mut builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let body = send(builder).await?;
        parse_openai_response(&body)
    }

    async fn generate_ollama(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> std::result::Result<String, LlmError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let builder = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request);

        let body = send(builder).await?;
        parse_ollama_response(&body)
    }

    async fn generate_gemini(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> std::result::Result<String, LlmError> {
        let request = GeminiRequest {
            contents: vec![GeminiContentRequest {
                parts: vec![GeminiPartRequest { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature,
                max_output_tokens: max_tokens,
            },
        };

        let builder = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.endpoint, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request);

        let body = send(builder).await?;
        parse_gemini_response(&body)
    }
}

#[async_trait]
impl TextGenerator for LlmService {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, LlmError> {
        self.generate_with_params(prompt, self.temperature, self.max_tokens)
            .await
    }
}

/// Send a request and return the body, classifying non-success statuses
async fn send(builder: reqwest::RequestBuilder) -> std::result::Result<String, LlmError> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = extract_error_message(&body);
        return Err(LlmError::classify(Some(status.as_u16()), &message));
    }

    Ok(body)
}

/// Pull the human-readable message out of a provider error body.
///
/// OpenAI and Gemini use `{"error": {"message": ...}}`, Ollama uses `{"error": "..."}`.
pub(crate) fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    let error = &value["error"];
    if let Some(message) = error["message"].as_str() {
        let status = error["status"].as_str().or_else(|| error["code"].as_str());
        return match status {
            Some(status) => format!("{status}: {message}"),
            None => message.to_string(),
        };
    }
    if let Some(message) = error.as_str() {
        return message.to_string();
    }

    body.trim().to_string()
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

pub(crate) fn parse_openai_response(body: &str) -> std::result::Result<String, LlmError> {
    let response: OpenAiResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

    let Some(choice) = response.choices.into_iter().next() else {
        return Ok(String::new());
    };

    let content = choice
        .message
        .and_then(|m| m.content)
        .unwrap_or_default();

    if content.trim().is_empty() && choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(LlmError::ContentBlocked(
            "completion stopped by content_filter".to_string(),
        ));
    }

    Ok(content)
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

pub(crate) fn parse_ollama_response(body: &str) -> std::result::Result<String, LlmError> {
    let response: OllamaResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    Ok(response.response)
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContentRequest<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContentRequest<'a> {
    parts: Vec<GeminiPartRequest<'a>>,
}

#[derive(Serialize)]
struct GeminiPartRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

pub(crate) fn parse_gemini_response(body: &str) -> std::result::Result<String, LlmError> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::ContentBlocked(format!("prompt blocked: {reason}")));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(String::new());
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if matches!(reason, "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST") {
                return Err(LlmError::ContentBlocked(format!("finish reason {reason}")));
            }
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openai_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"こんにちは"},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_openai_response(body).unwrap(), "こんにちは");
    }

    #[test]
    fn test_parse_openai_no_choices_is_empty_answer() {
        assert_eq!(parse_openai_response(r#"{"choices":[]}"#).unwrap(), "");
    }

    #[test]
    fn test_parse_openai_content_filter() {
        let body = r#"{"choices":[{"message":{"content":null},"finish_reason":"content_filter"}]}"#;
        assert!(matches!(
            parse_openai_response(body),
            Err(LlmError::ContentBlocked(_))
        ));
    }

    #[test]
    fn test_parse_ollama() {
        let body = r#"{"model":"gemma","response":"answer text","done":true}"#;
        assert_eq!(parse_ollama_response(body).unwrap(), "answer text");
    }

    #[test]
    fn test_parse_gemini_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"前半"},{"text":"後半"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_gemini_response(body).unwrap(), "前半後半");
    }

    #[test]
    fn test_parse_gemini_safety_block() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert!(matches!(
            parse_gemini_response(body),
            Err(LlmError::ContentBlocked(_))
        ));

        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(
            parse_gemini_response(body),
            Err(LlmError::ContentBlocked(_))
        ));
    }

    #[test]
    fn test_malformed_body_is_invalid_response() {
        assert!(matches!(
            parse_gemini_response("<html>"),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_extract_error_message_shapes() {
        let gemini = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            extract_error_message(gemini),
            "INVALID_ARGUMENT: API key not valid."
        );

        let openai = r#"{"error":{"message":"Rate limit reached","type":"requests","code":"rate_limit_exceeded"}}"#;
        assert_eq!(
            extract_error_message(openai),
            "rate_limit_exceeded: Rate limit reached"
        );

        assert_eq!(
            extract_error_message(r#"{"error":"model 'x' not found"}"#),
            "model 'x' not found"
        );
        assert_eq!(extract_error_message("upstream down"), "upstream down");
    }

    #[test]
    fn test_new_requires_key_for_hosted_providers() {
        let mut config = AppConfig::default();
        config.llm.provider = "gemini".to_string();
        config.llm.llm_key = String::new();
        assert!(matches!(
            LlmService::new(&config),
            Err(PostRagError::ConfigError(_))
        ));

        config.llm.provider = "ollama".to_string();
        let service = LlmService::new(&config).unwrap();
        assert_eq!(service.provider(), LlmProvider::Ollama);
    }

    /// Local provider stand-in that answers every request with `status` and `body`
    async fn stub_provider(status: u16, body: serde_json::Value) -> String {
        use axum::http::StatusCode;
        use axum::Json;
        use axum::Router;

        let status = StatusCode::from_u16(status).unwrap();
        let app = Router::new().fallback(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn service_for(provider: &str, endpoint: String) -> LlmService {
        let mut config = AppConfig::default();
        config.llm.provider = provider.to_string();
        config.llm.llm_endpoint = endpoint;
        config.llm.llm_key = "test-key".to_string();
        config.llm.timeout_secs = 5;
        LlmService::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_openai_429_is_rate_limited() {
        let endpoint = stub_provider(
            429,
            serde_json::json!({"error": {"message": "Rate limit reached", "type": "requests"}}),
        )
        .await;
        let service = service_for("openai", endpoint);

        let err = service.generate("質問").await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_gemini_403_blocked_key_is_invalid_api_key() {
        let endpoint = stub_provider(
            403,
            serde_json::json!({"error": {
                "code": 403,
                "message": "Requests to this API generativelanguage.googleapis.com method google.ai.generativelanguage.v1beta.GenerativeService.GenerateContent are blocked.",
                "status": "PERMISSION_DENIED"
            }}),
        )
        .await;
        let service = service_for("gemini", endpoint);

        let err = service.generate("質問").await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidApiKey(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_success_body_is_parsed() {
        let endpoint = stub_provider(
            200,
            serde_json::json!({"choices": [{"message": {"content": "回答"}, "finish_reason": "stop"}]}),
        )
        .await;
        let service = service_for("openai", endpoint);

        assert_eq!(service.generate("質問").await.unwrap(), "回答");
    }
}
