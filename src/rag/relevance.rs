//! Lexical relevance filter over the candidate pool

use std::collections::HashSet;

use crate::models::Post;
use crate::rag::text::cjk_bigrams;
use crate::rag::text::is_cjk;
use crate::rag::text::tokenize;
use crate::rag::ScoredPost;

/// Weighted query terms derived from the question
#[derive(Debug, Clone, Default)]
pub struct QueryTerms {
    terms: Vec<(String, f32)>,
}

const TOKEN_WEIGHT: f32 = 1.0;
const BIGRAM_WEIGHT: f32 = 0.5;

impl QueryTerms {
    /// Whole tokens first, then CJK bigrams that are not already tokens
    pub fn parse(query: &str) -> Self {
        let mut seen = HashSet::new();
        let mut terms = Vec::new();

        let tokens = tokenize(query);
        for token in &tokens {
            if seen.insert(token.clone()) {
                terms.push((token.clone(), TOKEN_WEIGHT));
            }
        }
        for token in tokens.iter().filter(|t| t.chars().any(is_cjk)) {
            for bigram in cjk_bigrams(token) {
                if seen.insert(bigram.clone()) {
                    terms.push((bigram, BIGRAM_WEIGHT));
                }
            }
        }

        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.terms.iter().map(|(t, w)| (t.as_str(), *w))
    }
}

/// Lowercased text of one post field plus its word set
struct FieldIndex {
    text: String,
    words: HashSet<String>,
}

impl FieldIndex {
    fn new(text: &str) -> Self {
        let mut words = HashSet::new();
        for token in tokenize(text) {
            if token.chars().any(is_cjk) {
                // Latin words written straight against kana/kanji ("rustの本")
                words.extend(
                    token
                        .split(is_cjk)
                        .filter(|piece| piece.chars().count() > 1)
                        .map(str::to_string),
                );
            }
            words.insert(token);
        }
        Self {
            text: text.to_lowercase(),
            words,
        }
    }

    /// CJK terms match anywhere in the unsegmented text, other terms only as whole words
    fn matches(&self, term: &str) -> bool {
        if term.chars().any(is_cjk) {
            self.text.contains(term)
        } else {
            self.words.contains(term)
        }
    }
}

/// Result of ranking the pool against a query
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// At least one candidate shares a term with the query; top-K by score
    Relevant(Vec<ScoredPost>),
    /// No candidate matched any query term
    NoMatch,
}

/// Keyword-overlap scorer. Title hits count more than body hits.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceFilter {
    title_weight: f32,
    body_weight: f32,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(2.0, 1.0)
    }
}

impl RelevanceFilter {
    #[must_use]
    pub const fn new(title_weight: f32, body_weight: f32) -> Self {
        Self {
            title_weight,
            body_weight,
        }
    }

    /// Overlap score of one post; zero when no term occurs in title or body
    pub fn score(&self, terms: &QueryTerms, post: &Post) -> f32 {
        let title = FieldIndex::new(&post.title);
        let body = FieldIndex::new(&post.content);

        terms
            .iter()
            .map(|(term, weight)| {
                let mut hit = 0.0;
                if title.matches(term) {
                    hit += self.title_weight;
                }
                if body.matches(term) {
                    hit += self.body_weight;
                }
                hit * weight
            })
            .sum()
    }

    /// Score every post and keep the best `k`.
    ///
    /// The sort is stable, so equal scores keep the pool's recency order.
    pub fn rank(&self, query: &str, pool: &[Post], k: usize) -> Vec<ScoredPost> {
        let terms = QueryTerms::parse(query);

        let mut scored: Vec<ScoredPost> = pool
            .iter()
            .map(|post| ScoredPost {
                post: post.clone(),
                score: self.score(&terms, post),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }

    /// Rank and report whether anything matched at all
    pub fn select(&self, query: &str, pool: &[Post], k: usize) -> Selection {
        let ranked = self.rank(query, pool, k);
        match ranked.first() {
            Some(top) if top.score > 0.0 => Selection::Relevant(ranked),
            _ => Selection::NoMatch,
        }
    }
}

/// The first `k` posts of a newest-first pool, unscored
pub fn most_recent(pool: &[Post], k: usize) -> Vec<ScoredPost> {
    pool.iter()
        .take(k)
        .map(|post| ScoredPost {
            post: post.clone(),
            score: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::post;

    fn titles(scored: &[ScoredPost]) -> Vec<&str> {
        scored.iter().map(|s| s.post.title.as_str()).collect()
    }

    #[test]
    fn test_query_terms_include_bigrams_once() {
        let terms = QueryTerms::parse("東京 東京のカフェ");
        let words: Vec<&str> = terms.iter().map(|(t, _)| t).collect();
        assert_eq!(words.iter().filter(|t| **t == "東京").count(), 1);
        assert!(words.contains(&"カフ"));
    }

    #[test]
    fn test_title_match_outranks_body_match() {
        let pool = vec![
            post("Weekend plans", "thinking about rust later", 0),
            post("Rust async tips", "tokio runtime notes", 1),
        ];
        let ranked = RelevanceFilter::default().rank("rust", &pool, 2);
        assert_eq!(titles(&ranked), vec!["Rust async tips", "Weekend plans"]);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_case_folded_matching() {
        let pool = vec![post("SQLX migrations", "", 0)];
        let ranked = RelevanceFilter::default().rank("sqlx", &pool, 1);
        assert!(ranked[0].score > 0.0);
    }

    #[test]
    fn test_ties_preserve_recency_order() {
        let pool = vec![
            post("cafe one", "", 0),
            post("cafe two", "", 1),
            post("cafe three", "", 2),
        ];
        let ranked = RelevanceFilter::default().rank("cafe", &pool, 3);
        assert_eq!(titles(&ranked), vec!["cafe one", "cafe two", "cafe three"]);
    }

    #[test]
    fn test_japanese_query_matches_inside_unsegmented_text() {
        let pool = vec![
            post("今日の日記", "雨が降っていた", 0),
            post("駅前の新しいカフェ", "ラテがおいしかった", 1),
        ];
        let ranked = RelevanceFilter::default().rank("おすすめのカフェはありますか", &pool, 1);
        assert_eq!(titles(&ranked), vec!["駅前の新しいカフェ"]);
    }

    #[test]
    fn test_takes_top_k() {
        let pool: Vec<Post> = (0..10).map(|i| post(&format!("rust {i}"), "", i)).collect();
        assert_eq!(RelevanceFilter::default().rank("rust", &pool, 3).len(), 3);
    }

    #[test]
    fn test_no_overlap_reports_no_match() {
        let pool = vec![post("gardening", "tomatoes", 0), post("cooking", "pasta", 1)];
        assert_eq!(
            RelevanceFilter::default().select("kubernetes", &pool, 2),
            Selection::NoMatch
        );
    }

    #[test]
    fn test_word_inside_longer_word_is_not_overlap() {
        let pool = vec![
            post("gardening tips", "tomatoes", 0),
            post("party planning", "snacks", 1),
        ];
        assert_eq!(
            RelevanceFilter::default().select("art history", &pool, 2),
            Selection::NoMatch
        );

        let pool = vec![post("good morning", "", 0)];
        assert_eq!(RelevanceFilter::default().select("go", &pool, 1), Selection::NoMatch);
    }

    #[test]
    fn test_latin_word_attached_to_japanese_still_matches() {
        let pool = vec![post("Rustの入門書", "", 0), post("料理", "", 1)];
        let ranked = RelevanceFilter::default().rank("rust", &pool, 1);
        assert_eq!(titles(&ranked), vec!["Rustの入門書"]);
        assert!(ranked[0].score > 0.0);
    }

    #[test]
    fn test_weights_are_configurable() {
        let pool = vec![post("rust", "", 0), post("other", "rust", 1)];
        let ranked = RelevanceFilter::new(1.0, 5.0).rank("rust", &pool, 2);
        assert_eq!(titles(&ranked), vec!["other", "rust"]);
    }

    #[test]
    fn test_empty_pool_and_empty_query() {
        assert_eq!(RelevanceFilter::default().select("rust", &[], 5), Selection::NoMatch);
        let pool = vec![post("rust", "", 0)];
        assert_eq!(RelevanceFilter::default().select("?!", &pool, 5), Selection::NoMatch);
    }

    #[test]
    fn test_most_recent_keeps_order() {
        let pool: Vec<Post> = (0..6).map(|i| post(&format!("p{i}"), "", i)).collect();
        let recent = most_recent(&pool, 4);
        assert_eq!(titles(&recent), vec!["p0", "p1", "p2", "p3"]);
        assert!(recent.iter().all(|s| s.score == 0.0));
    }
}
