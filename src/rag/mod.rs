//! Grounded answer search over community posts
//!
//! The pipeline runs in six stages:
//! - Fetch recent globally visible posts
//! - Keep the top K by lexical overlap with the question (newest posts when nothing overlaps)
//! - Assemble a prompt that numbers each post `[1]..[K]`
//! - Generate, retrying once with a stricter prompt on short or refused answers
//! - Recover which numbered posts the answer cited
//! - Shape the public payload
//!
//! # Examples
//!
//! ```rust,no_run
//! use postrag::config::AppConfig;
//! use postrag::rag::SearchRequest;
//! use postrag::rag::SearchService;
//! use postrag::session::RequestContext;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = SearchService::from_config(&config).await?;
//!
//!     let outcome = service
//!         .search(&RequestContext::anonymous(), SearchRequest::new("おすすめのカフェは？"))
//!         .await?;
//!     println!("{}", outcome.result.answer_text);
//!     println!("Cited: {} posts", outcome.result.related_posts.len());
//!
//!     Ok(())
//! }
//! ```

pub mod citations;
pub mod pipeline;
pub mod prompts;
pub mod relevance;
pub mod response;
pub mod retriever;
pub mod text;

pub use citations::CitationExtractor;
pub use citations::CitationSet;
pub use citations::ExtractionMethod;
pub use pipeline::AnswerOrigin;
pub use pipeline::SearchOutcome;
pub use pipeline::SearchRequest;
pub use pipeline::SearchService;
pub use prompts::PromptAssembler;
pub use relevance::RelevanceFilter;
pub use relevance::Selection;
pub use response::ConfidenceLevel;
pub use response::RelatedPost;
pub use response::ResponseFormatter;
pub use response::SearchMode;
pub use response::SearchResult;
pub use retriever::CandidateFetcher;

use crate::models::Post;

/// Post with its lexical relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPost {
    pub post: Post,
    pub score: f32,
}

/// Selected post with the 1-based number it carries in the prompt
#[derive(Debug, Clone)]
pub struct Candidate {
    pub post: Post,
    pub score: f32,
    pub citation_index: usize,
}
