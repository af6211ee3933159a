//! Keyword extraction strategies for suggested tags.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use reread_core::{defaults, EmbeddingBackend, Error, Result, SuggestedTag};

use crate::cosine_similarity;

/// Words too common to be useful tags.
const KEYWORD_STOPWORDS: &[&str] = &[
    "about", "after", "all", "also", "and", "are", "been", "but", "can", "could", "for", "from",
    "had", "has", "have", "how", "into", "its", "just", "more", "most", "new", "not", "one",
    "other", "our", "out", "over", "some", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "was", "were", "what", "when", "which", "who", "will",
    "with", "you", "your",
];

/// Extracts scored keywords from classification text.
#[async_trait]
pub trait KeywordStrategy: Send + Sync {
    /// Extract up to five keywords, each scored in [0, 1].
    async fn extract(&self, text: &str) -> Result<Vec<SuggestedTag>>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Lower-cased alphanumeric tokens in document order.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Candidate keywords: tokens of at least `MIN_KEYWORD_LEN` characters,
/// stopwords removed, deduplicated in first-seen order.
fn keyword_candidates(text: &str) -> Vec<String> {
    let stopwords: HashSet<&str> = KEYWORD_STOPWORDS.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for token in tokenize(text) {
        if token.chars().count() < defaults::MIN_KEYWORD_LEN
            || stopwords.contains(token.as_str())
        {
            continue;
        }
        if seen.insert(token.clone()) {
            candidates.push(token);
        }
    }

    candidates
}

/// Embedding-ranked keyword extraction with diversity-aware selection.
///
/// Candidates are scored by similarity to the whole document, then picked
/// greedily under maximal marginal relevance so near-duplicate words do
/// not crowd out the tag list.
pub struct EmbeddingKeywordStrategy {
    backend: Arc<dyn EmbeddingBackend>,
    lambda: f32,
    max_keywords: usize,
}

impl EmbeddingKeywordStrategy {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            backend,
            lambda: defaults::KEYWORD_MMR_LAMBDA,
            max_keywords: defaults::MAX_SUGGESTED_TAGS,
        }
    }
}

#[async_trait]
impl KeywordStrategy for EmbeddingKeywordStrategy {
    #[instrument(skip_all, fields(subsystem = "classify", component = "keywords", strategy = "embedding"))]
    async fn extract(&self, text: &str) -> Result<Vec<SuggestedTag>> {
        let candidates = keyword_candidates(text);
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        // One batch: the document first, then every candidate.
        let mut inputs = Vec::with_capacity(candidates.len() + 1);
        inputs.push(text.to_string());
        inputs.extend(candidates.iter().cloned());

        let vectors = self.backend.embed_texts(&inputs).await?;
        let (document, candidate_vectors) = vectors
            .split_first()
            .ok_or_else(|| Error::Embedding("backend returned no vectors".to_string()))?;

        // Relevance of each candidate to the whole document.
        let mut relevance = Vec::with_capacity(candidates.len());
        for vector in candidate_vectors {
            relevance.push(cosine_similarity(document, vector)?);
        }

        let mut selected: Vec<usize> = Vec::new();
        let mut remaining: Vec<usize> = (0..candidates.len()).collect();

        while selected.len() < self.max_keywords && !remaining.is_empty() {
            let mut best_pos = 0;
            let mut best_score = f32::NEG_INFINITY;

            for (pos, &idx) in remaining.iter().enumerate() {
                let mut max_similarity_to_selected = 0.0f32;
                for &chosen in &selected {
                    let similarity =
                        cosine_similarity(&candidate_vectors[idx], &candidate_vectors[chosen])?;
                    if similarity > max_similarity_to_selected {
                        max_similarity_to_selected = similarity;
                    }
                }

                let score = self.lambda * relevance[idx]
                    - (1.0 - self.lambda) * max_similarity_to_selected;
                if score > best_score {
                    best_score = score;
                    best_pos = pos;
                }
            }

            selected.push(remaining.remove(best_pos));
        }

        debug!(
            candidate_count = candidates.len(),
            selected_count = selected.len(),
            "Keywords selected"
        );

        Ok(selected
            .into_iter()
            .map(|idx| SuggestedTag::new(candidates[idx].clone(), relevance[idx].clamp(0.0, 1.0)))
            .collect())
    }

    fn name(&self) -> &'static str {
        "embedding"
    }
}

/// Deterministic frequency fallback.
///
/// Alphanumeric tokens of at least three characters, lower-cased and
/// frequency-counted; top five by count with first-seen order breaking
/// ties; score = `min(frequency / 10, 1.0)`.
pub struct FrequencyKeywordStrategy;

#[async_trait]
impl KeywordStrategy for FrequencyKeywordStrategy {
    #[instrument(skip_all, fields(subsystem = "classify", component = "keywords", strategy = "frequency"))]
    async fn extract(&self, text: &str) -> Result<Vec<SuggestedTag>> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();

        for token in tokenize(text) {
            if token.chars().count() < defaults::MIN_KEYWORD_LEN {
                continue;
            }
            if !counts.contains_key(&token) {
                first_seen.push(token.clone());
            }
            *counts.entry(token).or_insert(0) += 1;
        }

        // Stable sort keeps first-seen order among equal counts.
        let mut ranked: Vec<(String, usize)> = first_seen
            .into_iter()
            .map(|token| {
                let count = counts[&token];
                (token, count)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(ranked
            .into_iter()
            .take(defaults::MAX_SUGGESTED_TAGS)
            .map(|(token, count)| {
                let score = (count as f32 / defaults::KEYWORD_FREQUENCY_CAP).min(1.0);
                SuggestedTag::new(token, score)
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "frequency"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingBackend;

    #[test]
    fn test_tokenize_splits_and_lowercases() {
        let tokens = tokenize("Rust async memory-pipeline, tokio!");
        assert_eq!(tokens, vec!["rust", "async", "memory", "pipeline", "tokio"]);
    }

    #[test]
    fn test_candidates_filter_stopwords_and_short_tokens() {
        let candidates = keyword_candidates("the quick fox is in a box with tokio");
        assert_eq!(candidates, vec!["quick", "fox", "box", "tokio"]);
    }

    #[test]
    fn test_candidates_dedupe_in_first_seen_order() {
        let candidates = keyword_candidates("rust tokio rust async tokio");
        assert_eq!(candidates, vec!["rust", "tokio", "async"]);
    }

    #[tokio::test]
    async fn test_frequency_ranks_by_count() {
        let strategy = FrequencyKeywordStrategy;
        let tags = strategy
            .extract("rust rust rust tokio tokio async")
            .await
            .unwrap();

        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "tokio", "async"]);
        assert!((tags[0].score - 0.3).abs() < 1e-6);
        assert!((tags[1].score - 0.2).abs() < 1e-6);
        assert!((tags[2].score - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_frequency_ties_break_by_first_appearance() {
        let strategy = FrequencyKeywordStrategy;
        let tags = strategy.extract("zebra apple zebra apple mango").await.unwrap();

        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["zebra", "apple", "mango"]);
    }

    #[tokio::test]
    async fn test_frequency_caps_at_five_keywords() {
        let strategy = FrequencyKeywordStrategy;
        let tags = strategy
            .extract("one1 two2 three3 four4 five5 six6 seven7")
            .await
            .unwrap();

        assert_eq!(tags.len(), 5);
    }

    #[tokio::test]
    async fn test_frequency_score_caps_at_one() {
        let strategy = FrequencyKeywordStrategy;
        let text = "echo ".repeat(12);
        let tags = strategy.extract(&text).await.unwrap();

        assert_eq!(tags[0].name, "echo");
        assert_eq!(tags[0].score, 1.0);
    }

    #[tokio::test]
    async fn test_frequency_skips_short_tokens_but_not_stopwords() {
        let strategy = FrequencyKeywordStrategy;
        let tags = strategy.extract("the the the is is go code").await.unwrap();

        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        // "is" and "go" fall under the length floor; "the" does not and the
        // frequency fallback applies no stopword list.
        assert_eq!(names, vec!["the", "code"]);
    }

    #[tokio::test]
    async fn test_frequency_of_empty_text_is_empty() {
        let strategy = FrequencyKeywordStrategy;
        let tags = strategy.extract("").await.unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_strategy_orders_by_marginal_relevance() {
        // Hand-built vectors: "alpha" and "beta" embed identically, so once
        // "alpha" is picked, the diversity penalty pushes "beta" behind the
        // less relevant but novel "gamma".
        let backend = Arc::new(
            MockEmbeddingBackend::new()
                .with_dimension(3)
                .with_embedding("alpha beta gamma", vec![1.0, 0.0, 0.0])
                .with_embedding("alpha", vec![0.9, 0.43589, 0.0])
                .with_embedding("beta", vec![0.9, 0.43589, 0.0])
                .with_embedding("gamma", vec![0.8, 0.0, 0.6]),
        );
        let strategy = EmbeddingKeywordStrategy::new(backend);

        let tags = strategy.extract("alpha beta gamma").await.unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(names, vec!["alpha", "gamma", "beta"]);
        assert!((tags[0].score - 0.9).abs() < 1e-3);
        assert!((tags[1].score - 0.8).abs() < 1e-3);
        assert!((tags[2].score - 0.9).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_embedding_strategy_caps_at_five_keywords() {
        let backend = Arc::new(MockEmbeddingBackend::new());
        let strategy = EmbeddingKeywordStrategy::new(backend);

        let tags = strategy
            .extract("apple banana cherry damson elder fig grape")
            .await
            .unwrap();
        assert_eq!(tags.len(), 5);
    }

    #[tokio::test]
    async fn test_embedding_strategy_skips_backend_without_candidates() {
        let backend = Arc::new(MockEmbeddingBackend::new());
        let strategy = EmbeddingKeywordStrategy::new(backend.clone());

        let tags = strategy.extract("the and for").await.unwrap();
        assert!(tags.is_empty());
        assert_eq!(backend.embed_call_count(), 0);
    }

    #[tokio::test]
    async fn test_embedding_strategy_propagates_unavailable_backend() {
        let backend = Arc::new(MockEmbeddingBackend::new().with_availability(false));
        let strategy = EmbeddingKeywordStrategy::new(backend);

        let result = strategy.extract("rust tokio async").await;
        assert!(matches!(result, Err(Error::BackendUnavailable(_))));
    }
}
