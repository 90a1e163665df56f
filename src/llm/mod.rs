//! Text generation: provider clients, error classification and prompt templates

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::errors::PostRagError;

pub mod client;
pub mod error;
pub mod prompts;

pub use client::LlmService;
pub use error::LlmError;
pub use prompts::PromptTemplate;

/// Something that turns one prompt into one free-text answer
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Supported text-generation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// OpenAI-compatible `/v1/chat/completions`
    OpenAi,
    /// Ollama `/api/generate`
    Ollama,
    /// Google Gemini `generateContent`
    Gemini,
}

impl LlmProvider {
    pub const fn requires_api_key(self) -> bool {
        matches!(self, Self::OpenAi | Self::Gemini)
    }
}

impl FromStr for LlmProvider {
    type Err = PostRagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(PostRagError::ConfigError(format!(
                "unknown llm provider '{other}' (expected openai, ollama or gemini)"
            ))),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Gemini => "gemini",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!("google".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert!("bard".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        assert!(!LlmProvider::Ollama.requires_api_key());
        assert!(LlmProvider::Gemini.requires_api_key());
    }
}
