//! Complete search pipeline: Fetch -> Rank -> Prompt -> Generate -> Cite -> Format

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::config::SearchConfig;
use crate::database::Database;
use crate::database::PostStore;
use crate::errors::PostRagError;
use crate::errors::Result;
use crate::llm::LlmService;
use crate::llm::TextGenerator;
use crate::rag::citations::CitationExtractor;
use crate::rag::citations::CitationSet;
use crate::rag::citations::ExtractionMethod;
use crate::rag::prompts::PromptAssembler;
use crate::rag::relevance::most_recent;
use crate::rag::relevance::RelevanceFilter;
use crate::rag::relevance::Selection;
use crate::rag::response::ResponseFormatter;
use crate::rag::response::SearchResult;
use crate::rag::retriever::CandidateFetcher;
use crate::rag::text::char_len;
use crate::rag::text::collapse_whitespace;
use crate::rag::text::truncate_chars;
use crate::rag::Candidate;
use crate::session::RequestContext;

/// Phrases that mark an answer as a refusal even when it is long enough
const FALLBACK_PHRASES: &[&str] = &[
    "回答できません",
    "お答えできません",
    "回答を生成できません",
    "I cannot answer",
    "I can't answer",
    "I'm unable to answer",
];

const SYNTHESIZED_SNIPPET_CHARS: usize = 80;

/// A search question from a caller
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub question: String,
    pub top_k: Option<usize>,
}

impl SearchRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
        }
    }

    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

/// Where the final answer text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOrigin {
    Generated,
    Retried,
    Synthesized,
}

/// Payload plus how it was produced
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub result: SearchResult,
    pub answer_origin: AnswerOrigin,
    pub citation_method: ExtractionMethod,
    /// Nothing matched lexically and the newest posts were used instead
    pub used_recency_fallback: bool,
    pub candidates_considered: usize,
}

/// Grounded-answer search service
pub struct SearchService {
    fetcher: CandidateFetcher,
    filter: RelevanceFilter,
    assembler: PromptAssembler,
    generator: Arc<dyn TextGenerator>,
    extractor: CitationExtractor,
    formatter: ResponseFormatter,
    settings: SearchConfig,
}

impl SearchService {
    /// Build from the database and the configured provider
    ///
    /// # Errors
    /// - Database connection errors
    /// - LLM configuration errors (unknown provider, missing key)
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let database = Arc::new(Database::from_config(config).await?);
        let llm_service = Arc::new(LlmService::new(config)?);
        Ok(Self::from_services(
            database,
            llm_service,
            config.search.clone(),
        ))
    }

    /// Create from existing services
    #[must_use]
    pub fn from_services(
        store: Arc<dyn PostStore>,
        generator: Arc<dyn TextGenerator>,
        settings: SearchConfig,
    ) -> Self {
        Self {
            fetcher: CandidateFetcher::new(store),
            filter: RelevanceFilter::new(settings.title_weight, settings.body_weight),
            assembler: PromptAssembler::new(
                settings.prompt_snippet_chars,
                settings.min_answer_chars,
            ),
            generator,
            extractor: CitationExtractor::new(),
            formatter: ResponseFormatter::new(settings.related_snippet_chars),
            settings,
        }
    }

    /// Requested K clamped into `1..=max_top_k`
    pub fn effective_top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.settings.default_top_k)
            .clamp(1, self.settings.max_top_k.max(1))
    }

    /// Run one search request end to end
    ///
    /// # Errors
    /// - `InvalidInput` for an empty question
    /// - `Llm` when the first generation call fails
    pub async fn search(&self, ctx: &RequestContext, request: SearchRequest) -> Result<SearchOutcome> {
        let question = request.question.trim();
        if question.is_empty() {
            return Err(PostRagError::InvalidInput(
                "question_text is required".to_string(),
            ));
        }

        let top_k = self.effective_top_k(request.top_k);
        info!(
            request_id = %ctx.request_id,
            caller = ctx.caller(),
            "Processing search (top_k={}): {}",
            top_k,
            truncate_chars(question, 80)
        );

        // Step 1: candidate pool
        let pool = self.fetcher.fetch(self.settings.candidate_pool_size).await;

        // Step 2: lexical selection, newest posts when nothing matches
        let (selected, used_recency_fallback) = match self.filter.select(question, &pool, top_k) {
            Selection::Relevant(ranked) => (ranked, false),
            Selection::NoMatch => (most_recent(&pool, top_k), !pool.is_empty()),
        };
        debug!(
            "Selected {} of {} posts (recency fallback: {})",
            selected.len(),
            pool.len(),
            used_recency_fallback
        );

        // Step 3: numbered prompt
        let assembled = self.assembler.assemble(question, selected);
        debug!("=== SEARCH PROMPT ===\n{}\n=== END PROMPT ===", assembled.text);

        // Step 4: generation with one directive retry
        let (answer_text, answer_origin) = self
            .generate_answer(ctx, question, &assembled.text, &assembled.candidates)
            .await?;

        // Step 5: citations
        let citations = if assembled.candidates.is_empty() {
            CitationSet::empty()
        } else {
            self.extractor.extract(&answer_text, &assembled.candidates)
        };

        // Step 6: payload
        let citation_method = citations.method;
        let result = self
            .formatter
            .format(answer_text, &assembled.candidates, &citations);

        info!(
            request_id = %ctx.request_id,
            "Search completed: mode={:?}, cited={}/{}, origin={:?}, citations={:?}",
            result.mode,
            result.related_posts.len(),
            assembled.candidates.len(),
            answer_origin,
            citation_method
        );

        Ok(SearchOutcome {
            result,
            answer_origin,
            citation_method,
            used_recency_fallback,
            candidates_considered: pool.len(),
        })
    }

    async fn generate_answer(
        &self,
        ctx: &RequestContext,
        question: &str,
        prompt: &str,
        candidates: &[Candidate],
    ) -> Result<(String, AnswerOrigin)> {
        let first = self.generator.generate(prompt).await?;
        if self.is_acceptable(&first) {
            return Ok((first.trim().to_string(), AnswerOrigin::Generated));
        }

        warn!(
            request_id = %ctx.request_id,
            "Answer rejected ({} chars), retrying with directive prompt",
            char_len(first.trim())
        );

        let retry_prompt = self.assembler.render_directive(question, candidates);
        match self.generator.generate(&retry_prompt).await {
            Ok(second) if self.is_acceptable(&second) => {
                Ok((second.trim().to_string(), AnswerOrigin::Retried))
            }
            Ok(second) => {
                warn!(
                    request_id = %ctx.request_id,
                    "Retry answer also rejected ({} chars), synthesizing from candidates",
                    char_len(second.trim())
                );
                Ok((synthesize_answer(candidates), AnswerOrigin::Synthesized))
            }
            Err(e) => {
                warn!(
                    request_id = %ctx.request_id,
                    "Retry failed ({}), synthesizing from candidates",
                    e
                );
                Ok((synthesize_answer(candidates), AnswerOrigin::Synthesized))
            }
        }
    }

    /// Long enough and not a refusal
    fn is_acceptable(&self, answer: &str) -> bool {
        let answer = answer.trim();
        char_len(answer) >= self.settings.min_answer_chars
            && !FALLBACK_PHRASES.iter().any(|p| answer.contains(p))
    }
}

/// Answer assembled from candidate metadata alone, in the citation format
pub fn synthesize_answer(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "申し訳ありません。現在この質問への回答を生成できませんでした。時間をおいて、もう一度お試しください。".to_string();
    }

    let mut answer = format!(
        "AIによる回答を生成できなかったため、ご質問に関連しそうな投稿を{}件ご紹介します。\n",
        candidates.len()
    );
    for candidate in candidates {
        let post = &candidate.post;
        answer.push_str(&format!(
            "\n- 投稿: {}（投稿者: {}）[{}]\n  {}",
            post.title.trim(),
            post.author_display_name(),
            candidate.citation_index,
            truncate_chars(&collapse_whitespace(&post.content), SYNTHESIZED_SNIPPET_CHARS)
        ));
    }
    answer
}
