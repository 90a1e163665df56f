//! Prompt assembly: numbers the selected posts and renders them into a prompt.
//!
//! The 1-based numbers assigned here are the citation indices the extractor
//! resolves later; nothing else renumbers candidates during a request.

use crate::llm::prompts::SearchPrompts;
use crate::llm::prompts::CITATION_FORMAT;
use crate::rag::text::collapse_whitespace;
use crate::rag::text::truncate_chars;
use crate::rag::Candidate;
use crate::rag::ScoredPost;

const UNTITLED: &str = "（無題）";

/// Prompt text plus the numbered candidates it refers to
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub text: String,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Copy)]
pub struct PromptAssembler {
    snippet_chars: usize,
    min_answer_chars: usize,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(500, 100)
    }
}

impl PromptAssembler {
    #[must_use]
    pub const fn new(snippet_chars: usize, min_answer_chars: usize) -> Self {
        Self {
            snippet_chars,
            min_answer_chars,
        }
    }

    /// Assign citation indices 1..=K in input order
    pub fn number(selected: Vec<ScoredPost>) -> Vec<Candidate> {
        selected
            .into_iter()
            .enumerate()
            .map(|(idx, scored)| Candidate {
                post: scored.post,
                score: scored.score,
                citation_index: idx + 1,
            })
            .collect()
    }

    /// Number the selection and render the standard grounded prompt
    pub fn assemble(&self, question: &str, selected: Vec<ScoredPost>) -> AssembledPrompt {
        let candidates = Self::number(selected);
        let text = if candidates.is_empty() {
            self.render_reasoning(question)
        } else {
            self.render_grounded(question, &candidates)
        };
        AssembledPrompt { text, candidates }
    }

    pub fn render_grounded(&self, question: &str, candidates: &[Candidate]) -> String {
        SearchPrompts::grounded().render_pairs(&[
            ("count", candidates.len().to_string()),
            ("posts", self.format_candidates(candidates)),
            ("question", question.trim().to_string()),
            ("citation_format", CITATION_FORMAT.to_string()),
            ("citation_example", citation_example(candidates)),
        ])
    }

    /// Stronger second-attempt prompt with the same numbering
    pub fn render_directive(&self, question: &str, candidates: &[Candidate]) -> String {
        if candidates.is_empty() {
            return format!(
                "前回は回答が得られませんでした。今回は必ず回答してください。\n\n{}",
                self.render_reasoning(question)
            );
        }

        SearchPrompts::directive_retry().render_pairs(&[
            ("count", candidates.len().to_string()),
            ("posts", self.format_candidates(candidates)),
            ("question", question.trim().to_string()),
            ("min_chars", self.min_answer_chars.to_string()),
            ("citation_format", CITATION_FORMAT.to_string()),
            ("citation_example", citation_example(candidates)),
        ])
    }

    pub fn render_reasoning(&self, question: &str) -> String {
        SearchPrompts::reasoning().render_pairs(&[
            ("question", question.trim().to_string()),
            ("min_chars", self.min_answer_chars.to_string()),
        ])
    }

    fn format_candidates(&self, candidates: &[Candidate]) -> String {
        candidates
            .iter()
            .map(|c| self.format_candidate(c))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// One numbered section: header, metadata, truncated body
    pub fn format_candidate(&self, candidate: &Candidate) -> String {
        let post = &candidate.post;
        let title = if post.title.trim().is_empty() {
            UNTITLED
        } else {
            post.title.trim()
        };
        let body = truncate_chars(&collapse_whitespace(&post.content), self.snippet_chars);

        format!(
            "[{}] {}\nタイトル: {}\n投稿者: {}\nカテゴリ: {}\n投稿日: {}\nいいね: {} / コメント: {}\n本文: {}",
            candidate.citation_index,
            title,
            title,
            post.author_display_name(),
            post.category.label(),
            post.created_at.format("%Y-%m-%d"),
            post.likes_count,
            post.comments_count,
            body
        )
    }
}

/// A worked example in the mandated format, using the first real candidate
fn citation_example(candidates: &[Candidate]) -> String {
    candidates.first().map_or_else(
        || "投稿: 週末のおすすめカフェ（投稿者: 山田）[1]".to_string(),
        |c| {
            format!(
                "投稿: {}（投稿者: {}）[{}]",
                c.post.title.trim(),
                c.post.author_display_name(),
                c.citation_index
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::post;
    use crate::rag::test_support::post_by;

    fn scored(titles: &[&str]) -> Vec<ScoredPost> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| ScoredPost {
                post: post(t, "body", i as i64),
                score: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_indices_follow_input_order() {
        let candidates = PromptAssembler::number(scored(&["c", "a", "b"]));
        let pairs: Vec<(usize, &str)> = candidates
            .iter()
            .map(|c| (c.citation_index, c.post.title.as_str()))
            .collect();
        assert_eq!(pairs, vec![(1, "c"), (2, "a"), (3, "b")]);
    }

    #[test]
    fn test_prompt_contains_format_sections_and_query() {
        let assembled = PromptAssembler::default().assemble("カフェはどこ？", scored(&["Alpha", "Beta"]));
        let text = &assembled.text;
        assert!(text.contains(CITATION_FORMAT));
        assert!(text.contains("[1] Alpha"));
        assert!(text.contains("[2] Beta"));
        assert!(text.contains("質問: カフェはどこ？"));
        assert!(text.find("[1] Alpha").unwrap() < text.find("[2] Beta").unwrap());
    }

    #[test]
    fn test_body_is_truncated() {
        let long = "あ".repeat(800);
        let candidates = PromptAssembler::number(vec![ScoredPost {
            post: post("Long", &long, 0),
            score: 1.0,
        }]);
        let section = PromptAssembler::default().format_candidate(&candidates[0]);
        let body_line = section.lines().last().unwrap();
        assert_eq!(body_line, format!("本文: {}...", "あ".repeat(500)));
    }

    #[test]
    fn test_example_uses_first_candidate() {
        let candidates = PromptAssembler::number(vec![ScoredPost {
            post: post_by("Alpha", "Bob"),
            score: 1.0,
        }]);
        let text = PromptAssembler::default().render_grounded("q", &candidates);
        assert!(text.contains("投稿: Alpha（投稿者: Bob）[1]"));
    }

    #[test]
    fn test_empty_selection_renders_reasoning_prompt() {
        let assembled = PromptAssembler::default().assemble("why?", Vec::new());
        assert!(assembled.candidates.is_empty());
        assert!(!assembled.text.contains(CITATION_FORMAT));
        assert!(assembled.text.contains("質問: why?"));
    }

    #[test]
    fn test_directive_keeps_numbering_and_min_length() {
        let assembler = PromptAssembler::new(500, 120);
        let assembled = assembler.assemble("q", scored(&["Alpha", "Beta"]));
        let retry = assembler.render_directive("q", &assembled.candidates);
        assert!(retry.contains("[1] Alpha"));
        assert!(retry.contains("[2] Beta"));
        assert!(retry.contains("120文字以上"));
    }
}
