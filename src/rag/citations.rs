//! Best-effort recovery of which candidates a generated answer cited.
//!
//! Layers are tried in order and the first non-empty one wins. When every layer
//! comes back empty, all candidates are reported as cited so callers can still
//! show what was consulted. Nothing here fails on malformed text.

use std::collections::BTreeSet;

use regex::Regex;

use crate::rag::Candidate;

/// Which layer produced the citation set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Candidate's own title, author and index found together
    CandidatePattern,
    /// Generic `投稿: ...（投稿者: ...）[n]` markers mapped by number
    CitationFormat,
    /// Title and author both mentioned somewhere
    TitleAndAuthor,
    /// Nothing recognisable; every candidate reported
    AllCandidates,
}

/// Cited citation indices in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationSet {
    pub indices: Vec<usize>,
    pub method: ExtractionMethod,
}

impl CitationSet {
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            method: ExtractionMethod::AllCandidates,
        }
    }

    /// Resolve indices back to candidates, keeping citation order
    pub fn cited<'a>(&self, candidates: &'a [Candidate]) -> Vec<&'a Candidate> {
        self.indices
            .iter()
            .filter_map(|idx| candidates.iter().find(|c| c.citation_index == *idx))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Max characters allowed between title, author and marker on one line
const MAX_GAP: usize = 60;

const GENERIC_CITATION: &str = r"投稿\s*[:：]\s*[\[「『]?(?P<title>[^（(\n]+?)[\]」』]?\s*[（(]\s*投稿者\s*[:：]\s*(?P<author>[^）)\n]+?)\s*[）)]\s*[\[［]\s*(?P<num>\d+)\s*[\]］]";

pub struct CitationExtractor {
    generic: Option<Regex>,
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationExtractor {
    pub fn new() -> Self {
        let generic = match Regex::new(GENERIC_CITATION) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!("Citation pattern failed to compile: {}", e);
                None
            }
        };
        Self { generic }
    }

    pub fn extract(&self, answer: &str, candidates: &[Candidate]) -> CitationSet {
        if candidates.is_empty() {
            return CitationSet::empty();
        }

        let layers: [(ExtractionMethod, BTreeSet<usize>); 3] = [
            (
                ExtractionMethod::CandidatePattern,
                Self::by_candidate_pattern(answer, candidates),
            ),
            (
                ExtractionMethod::CitationFormat,
                self.by_citation_format(answer, candidates),
            ),
            (
                ExtractionMethod::TitleAndAuthor,
                Self::by_title_and_author(answer, candidates),
            ),
        ];

        for (method, found) in layers {
            if !found.is_empty() {
                tracing::debug!("Citations via {:?}: {:?}", method, found);
                return CitationSet {
                    indices: found.into_iter().collect(),
                    method,
                };
            }
        }

        tracing::debug!(
            "No citations recognised; reporting all {} candidates",
            candidates.len()
        );
        CitationSet {
            indices: candidates.iter().map(|c| c.citation_index).collect(),
            method: ExtractionMethod::AllCandidates,
        }
    }

    fn by_candidate_pattern(answer: &str, candidates: &[Candidate]) -> BTreeSet<usize> {
        candidates
            .iter()
            .filter(|c| {
                let title = c.post.title.trim();
                if title.is_empty() {
                    return false;
                }
                let pattern = format!(
                    r"(?i){}[^\n]{{0,{gap}}}?{}[^\n]{{0,{gap}}}?[\[［]\s*{}\s*[\]］]",
                    regex::escape(title),
                    regex::escape(c.post.author_display_name()),
                    c.citation_index,
                    gap = MAX_GAP,
                );
                Regex::new(&pattern).is_ok_and(|re| re.is_match(answer))
            })
            .map(|c| c.citation_index)
            .collect()
    }

    fn by_citation_format(&self, answer: &str, candidates: &[Candidate]) -> BTreeSet<usize> {
        let Some(re) = &self.generic else {
            return BTreeSet::new();
        };

        re.captures_iter(answer)
            .filter_map(|caps| caps.name("num")?.as_str().parse::<usize>().ok())
            .filter(|n| (1..=candidates.len()).contains(n))
            .filter_map(|n| candidates.get(n - 1).map(|c| c.citation_index))
            .collect()
    }

    fn by_title_and_author(answer: &str, candidates: &[Candidate]) -> BTreeSet<usize> {
        let haystack = answer.to_lowercase();
        candidates
            .iter()
            .filter(|c| {
                let title = c.post.title.trim().to_lowercase();
                let author = c.post.author_display_name().to_lowercase();
                !title.is_empty()
                    && !author.is_empty()
                    && haystack.contains(&title)
                    && haystack.contains(&author)
            })
            .map(|c| c.citation_index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::prompts::PromptAssembler;
    use crate::rag::test_support::post_by;
    use crate::rag::ScoredPost;

    fn candidates(pairs: &[(&str, &str)]) -> Vec<Candidate> {
        PromptAssembler::number(
            pairs
                .iter()
                .map(|(title, author)| ScoredPost {
                    post: post_by(title, author),
                    score: 1.0,
                })
                .collect(),
        )
    }

    #[test]
    fn test_exact_format_cites_both() {
        let cands = candidates(&[("Alpha", "Bob"), ("Beta", "Carol")]);
        let answer = "まとめると次の通りです。\n投稿: Alpha（投稿者: Bob）[1] によると…\n投稿: Beta（投稿者: Carol）[2] も参考になります。";
        let set = CitationExtractor::new().extract(answer, &cands);
        assert_eq!(set.indices, vec![1, 2]);
        assert_eq!(set.method, ExtractionMethod::CandidatePattern);
    }

    #[test]
    fn test_candidate_pattern_only_cites_mentioned() {
        let cands = candidates(&[("Alpha", "Bob"), ("Beta", "Carol"), ("Gamma", "Dave")]);
        let answer = "投稿: Beta（投稿者: Carol）[2] が詳しいです。";
        let set = CitationExtractor::new().extract(answer, &cands);
        assert_eq!(set.indices, vec![2]);
        let cited = set.cited(&cands);
        assert_eq!(cited.len(), 1);
        assert_eq!(cited[0].post.title, "Beta");
    }

    #[test]
    fn test_generic_format_maps_numbers_positionally() {
        // Model paraphrased the titles, so only the numbers are usable
        let cands = candidates(&[("Alpha", "Bob"), ("Beta", "Carol"), ("Gamma", "Dave")]);
        let answer = "投稿: 「アルファの話」（投稿者: ぼぶ）[3] と 投稿: something（投稿者: x）[9]";
        let set = CitationExtractor::new().extract(answer, &cands);
        assert_eq!(set.indices, vec![3]);
        assert_eq!(set.method, ExtractionMethod::CitationFormat);
    }

    #[test]
    fn test_fullwidth_colon_and_brackets_accepted() {
        let cands = candidates(&[("Alpha", "Bob")]);
        let answer = "投稿：Alpha（投稿者：Bob）［1］";
        let set = CitationExtractor::new().extract(answer, &cands);
        assert_eq!(set.indices, vec![1]);
    }

    #[test]
    fn test_title_and_author_fallback() {
        let cands = candidates(&[("Alpha", "Bob"), ("Beta", "Carol")]);
        let answer = "Carol wrote a post called beta that covers this well.";
        let set = CitationExtractor::new().extract(answer, &cands);
        assert_eq!(set.indices, vec![2]);
        assert_eq!(set.method, ExtractionMethod::TitleAndAuthor);
    }

    #[test]
    fn test_nothing_found_cites_everything() {
        let cands = candidates(&[("Alpha", "Bob"), ("Beta", "Carol"), ("Gamma", "Dave")]);
        let set = CitationExtractor::new().extract("A generic answer with no references.", &cands);
        assert_eq!(set.indices, vec![1, 2, 3]);
        assert_eq!(set.method, ExtractionMethod::AllCandidates);
        assert_eq!(set.cited(&cands).len(), cands.len());
    }

    #[test]
    fn test_regex_metacharacters_in_titles_are_literal() {
        let cands = candidates(&[("C++ (and Rust?) [tips]", "a.b")]);
        let answer = "投稿: C++ (and Rust?) [tips]（投稿者: a.b）[1]";
        let set = CitationExtractor::new().extract(answer, &cands);
        assert_eq!(set.indices, vec![1]);
        assert_eq!(set.method, ExtractionMethod::CandidatePattern);
    }

    #[test]
    fn test_malformed_text_never_fails() {
        let cands = candidates(&[("Alpha", "Bob")]);
        for answer in ["", "[", "投稿: （投稿者: ）[", "[99999999999999999999999]", "\u{0}\u{FFFF}"] {
            let set = CitationExtractor::new().extract(answer, &cands);
            assert_eq!(set.indices, vec![1]);
        }
    }

    #[test]
    fn test_no_candidates_yields_empty_set() {
        let set = CitationExtractor::new().extract("投稿: Alpha（投稿者: Bob）[1]", &[]);
        assert!(set.is_empty());
    }
}
