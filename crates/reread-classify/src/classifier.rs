//! Classification pipeline over ordered strategy chains.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use reread_core::{EmbeddingBackend, Error, Result, SuggestedTag};

use crate::category::{
    CategorySet, CategoryStrategy, EmbeddingCategoryStrategy, KeywordCategoryStrategy,
};
use crate::keywords::{EmbeddingKeywordStrategy, FrequencyKeywordStrategy, KeywordStrategy};

/// Result of one classification run.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: String,
    pub category_score: f64,
    pub keywords: Vec<SuggestedTag>,
}

/// Runs the category and keyword strategy chains.
///
/// Chains are fixed at construction and tried in order. A strategy that
/// returns [`Error::BackendUnavailable`] hands over to the next one; any
/// other error stops the run. Built once per worker; the embedding
/// backend is shared through an `Arc`, never through global state.
pub struct BookmarkClassifier {
    categories: CategorySet,
    category_strategies: Vec<Box<dyn CategoryStrategy>>,
    keyword_strategies: Vec<Box<dyn KeywordStrategy>>,
}

impl BookmarkClassifier {
    /// Build the standard chains: embedding strategies first when a
    /// backend is supplied, deterministic fallbacks always last.
    pub fn new(backend: Option<Arc<dyn EmbeddingBackend>>, categories: CategorySet) -> Self {
        let mut category_strategies: Vec<Box<dyn CategoryStrategy>> = Vec::new();
        let mut keyword_strategies: Vec<Box<dyn KeywordStrategy>> = Vec::new();

        if let Some(backend) = backend {
            category_strategies.push(Box::new(EmbeddingCategoryStrategy::new(backend.clone())));
            keyword_strategies.push(Box::new(EmbeddingKeywordStrategy::new(backend)));
        }
        category_strategies.push(Box::new(KeywordCategoryStrategy));
        keyword_strategies.push(Box::new(FrequencyKeywordStrategy));

        Self {
            categories,
            category_strategies,
            keyword_strategies,
        }
    }

    /// Build from explicit strategy lists. First success wins.
    pub fn with_strategies(
        categories: CategorySet,
        category_strategies: Vec<Box<dyn CategoryStrategy>>,
        keyword_strategies: Vec<Box<dyn KeywordStrategy>>,
    ) -> Self {
        Self {
            categories,
            category_strategies,
            keyword_strategies,
        }
    }

    /// Classify non-empty text into a category plus suggested keywords.
    #[instrument(skip(self, text), fields(subsystem = "classify", component = "classifier", op = "classify", text_len = text.len()))]
    pub async fn classify(&self, text: &str) -> Result<Classification> {
        let (category, category_score) = self.assign_category(text).await?;
        let keywords = self.extract_keywords(text).await?;

        info!(
            category = %category,
            keyword_count = keywords.len(),
            "Classification complete"
        );

        Ok(Classification {
            category,
            category_score,
            keywords,
        })
    }

    async fn assign_category(&self, text: &str) -> Result<(String, f64)> {
        let mut last_unavailable: Option<Error> = None;

        for strategy in &self.category_strategies {
            match strategy.assign(text, &self.categories).await {
                Ok(result) => {
                    debug!(strategy = strategy.name(), "Category strategy succeeded");
                    return Ok(result);
                }
                Err(e) if e.is_backend_unavailable() => {
                    warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "Category strategy unavailable, falling through"
                    );
                    last_unavailable = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_unavailable.unwrap_or_else(|| {
            Error::Classification("no category strategies configured".to_string())
        }))
    }

    async fn extract_keywords(&self, text: &str) -> Result<Vec<SuggestedTag>> {
        let mut last_unavailable: Option<Error> = None;

        for strategy in &self.keyword_strategies {
            match strategy.extract(text).await {
                Ok(result) => {
                    debug!(strategy = strategy.name(), "Keyword strategy succeeded");
                    return Ok(result);
                }
                Err(e) if e.is_backend_unavailable() => {
                    warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "Keyword strategy unavailable, falling through"
                    );
                    last_unavailable = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_unavailable.unwrap_or_else(|| {
            Error::Classification("no keyword strategies configured".to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingBackend;
    use async_trait::async_trait;

    struct PoisonedCategoryStrategy;

    #[async_trait]
    impl CategoryStrategy for PoisonedCategoryStrategy {
        async fn assign(&self, _text: &str, _categories: &CategorySet) -> Result<(String, f64)> {
            Err(Error::Embedding("malformed response".to_string()))
        }

        fn name(&self) -> &'static str {
            "poisoned"
        }
    }

    #[tokio::test]
    async fn test_classify_uses_embedding_strategies_when_available() {
        let backend = Arc::new(MockEmbeddingBackend::new());
        let classifier =
            BookmarkClassifier::new(Some(backend.clone()), CategorySet::default());

        let classification = classifier.classify("python code example").await.unwrap();

        // Category batch plus keyword batch.
        assert_eq!(backend.embed_call_count(), 2);
        assert!(CategorySet::default()
            .iter()
            .any(|c| c.label == classification.category));
        assert!((0.0..=1.0).contains(&classification.category_score));
        assert_eq!(classification.keywords.len(), 3);
        for keyword in &classification.keywords {
            assert!((0.0..=1.0).contains(&keyword.score));
        }
    }

    #[tokio::test]
    async fn test_classify_falls_back_when_backend_unavailable() {
        let backend = Arc::new(MockEmbeddingBackend::new().with_availability(false));
        let classifier =
            BookmarkClassifier::new(Some(backend.clone()), CategorySet::default());

        let classification = classifier.classify("python code example").await.unwrap();

        // Both embedding strategies were attempted before falling back.
        assert_eq!(backend.embed_call_count(), 2);
        assert_eq!(classification.category, "programming");
        assert!((classification.category_score - 2.0 / 3.0).abs() < 1e-9);

        let names: Vec<&str> = classification
            .keywords
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["python", "code", "example"]);
    }

    #[tokio::test]
    async fn test_classifier_without_backend_is_deterministic() {
        let classifier = BookmarkClassifier::new(None, CategorySet::default());

        let first = classifier.classify("python code example").await.unwrap();
        let second = classifier.classify("python code example").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.category, "programming");
    }

    #[tokio::test]
    async fn test_non_unavailable_error_stops_the_chain() {
        let classifier = BookmarkClassifier::with_strategies(
            CategorySet::default(),
            vec![
                Box::new(PoisonedCategoryStrategy),
                Box::new(KeywordCategoryStrategy),
            ],
            vec![Box::new(FrequencyKeywordStrategy)],
        );

        let result = classifier.classify("python code example").await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn test_empty_strategy_chain_errors() {
        let classifier =
            BookmarkClassifier::with_strategies(CategorySet::default(), vec![], vec![]);

        let result = classifier.classify("some text").await;
        assert!(matches!(result, Err(Error::Classification(_))));
    }

    #[tokio::test]
    async fn test_backend_recovery_between_runs() {
        let backend = Arc::new(MockEmbeddingBackend::new().with_availability(false));
        let classifier =
            BookmarkClassifier::new(Some(backend.clone()), CategorySet::default());

        let degraded = classifier.classify("python code example").await.unwrap();
        assert_eq!(degraded.category, "programming");

        backend.set_available(true);
        let recovered = classifier.classify("python code example").await.unwrap();
        assert!((0.0..=1.0).contains(&recovered.category_score));
    }
}
