//! Final response shaping

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::models::PostCategory;
use crate::rag::citations::CitationSet;
use crate::rag::text::truncate_chars;
use crate::rag::Candidate;

/// Whether the answer had reference posts behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Grounded,
    Reasoning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl SearchMode {
    pub const fn from_candidate_count(count: usize) -> Self {
        if count > 0 {
            Self::Grounded
        } else {
            Self::Reasoning
        }
    }

    /// Coarse: follows groundedness only, not answer quality
    pub const fn confidence(self) -> ConfidenceLevel {
        match self {
            Self::Grounded => ConfidenceLevel::High,
            Self::Reasoning => ConfidenceLevel::Low,
        }
    }
}

/// Public view of a cited post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedPost {
    pub id: Uuid,
    pub citation_index: usize,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub category: PostCategory,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Payload returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub answer_text: String,
    pub related_posts: Vec<RelatedPost>,
    pub mode: SearchMode,
    pub confidence_level: ConfidenceLevel,
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseFormatter {
    snippet_chars: usize,
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new(200)
    }
}

impl ResponseFormatter {
    #[must_use]
    pub const fn new(snippet_chars: usize) -> Self {
        Self { snippet_chars }
    }

    pub fn format(
        &self,
        answer_text: String,
        candidates: &[Candidate],
        citations: &CitationSet,
    ) -> SearchResult {
        let mode = SearchMode::from_candidate_count(candidates.len());

        let related_posts = citations
            .cited(candidates)
            .into_iter()
            .map(|c| self.related_post(c))
            .collect();

        SearchResult {
            answer_text,
            related_posts,
            mode,
            confidence_level: mode.confidence(),
        }
    }

    fn related_post(&self, candidate: &Candidate) -> RelatedPost {
        let post = &candidate.post;
        RelatedPost {
            id: post.id,
            citation_index: candidate.citation_index,
            title: post.title.clone(),
            content: truncate_chars(&post.content, self.snippet_chars),
            author_name: post.author_display_name().to_string(),
            category: post.category,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            created_at: post.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::citations::ExtractionMethod;
    use crate::rag::prompts::PromptAssembler;
    use crate::rag::test_support::post;
    use crate::rag::ScoredPost;

    #[test]
    fn test_empty_pool_is_reasoning_low_and_empty() {
        let result = ResponseFormatter::default().format(
            "general answer".to_string(),
            &[],
            &CitationSet::empty(),
        );
        assert_eq!(result.mode, SearchMode::Reasoning);
        assert_eq!(result.confidence_level, ConfidenceLevel::Low);
        assert!(result.related_posts.is_empty());
    }

    #[test]
    fn test_grounded_maps_cited_posts_with_snippets() {
        let candidates = PromptAssembler::number(vec![
            ScoredPost {
                post: post("Alpha", &"x".repeat(300), 0),
                score: 2.0,
            },
            ScoredPost {
                post: post("Beta", "short", 1),
                score: 1.0,
            },
        ]);
        let citations = CitationSet {
            indices: vec![2],
            method: ExtractionMethod::CandidatePattern,
        };

        let result = ResponseFormatter::new(10).format("a".to_string(), &candidates, &citations);
        assert_eq!(result.mode, SearchMode::Grounded);
        assert_eq!(result.confidence_level, ConfidenceLevel::High);
        assert_eq!(result.related_posts.len(), 1);
        assert_eq!(result.related_posts[0].title, "Beta");
        assert_eq!(result.related_posts[0].citation_index, 2);

        let all = CitationSet {
            indices: vec![1, 2],
            method: ExtractionMethod::AllCandidates,
        };
        let result = ResponseFormatter::new(10).format("a".to_string(), &candidates, &all);
        assert_eq!(result.related_posts[0].content, format!("{}...", "x".repeat(10)));
    }

    #[test]
    fn test_wire_shape() {
        let result = SearchResult {
            answer_text: "hi".to_string(),
            related_posts: Vec::new(),
            mode: SearchMode::Reasoning,
            confidence_level: ConfidenceLevel::Low,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["mode"], "reasoning");
        assert_eq!(json["confidence_level"], "low");
        assert!(json["related_posts"].as_array().unwrap().is_empty());
        assert_eq!(json["answer_text"], "hi");
    }
}
