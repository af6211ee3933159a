//! Category assignment strategies.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use reread_core::{EmbeddingBackend, Error, Result};

use crate::cosine_similarity;

/// One category: a label plus the keyword set the overlap fallback scores
/// against.
#[derive(Debug, Clone)]
pub struct Category {
    pub label: String,
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(label: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            label: label.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered, fixed set of categories.
///
/// Declaration order matters: the keyword fallback breaks score ties in
/// favor of the earlier category.
#[derive(Debug, Clone)]
pub struct CategorySet {
    categories: Vec<Category>,
}

impl CategorySet {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategorySet {
    /// Built-in catalog covering the common bookmark domains.
    fn default() -> Self {
        Self::new(vec![
            Category::new(
                "programming",
                &[
                    "programming",
                    "code",
                    "software",
                    "developer",
                    "python",
                    "rust",
                    "javascript",
                    "api",
                    "library",
                    "framework",
                ],
            ),
            Category::new(
                "technology",
                &[
                    "technology", "tech", "hardware", "computer", "internet", "gadget", "mobile",
                ],
            ),
            Category::new(
                "science",
                &[
                    "science",
                    "research",
                    "physics",
                    "biology",
                    "chemistry",
                    "study",
                    "experiment",
                ],
            ),
            Category::new(
                "business",
                &[
                    "business",
                    "startup",
                    "market",
                    "finance",
                    "economy",
                    "company",
                    "investment",
                ],
            ),
            Category::new(
                "design",
                &[
                    "design",
                    "typography",
                    "interface",
                    "usability",
                    "art",
                    "illustration",
                ],
            ),
            Category::new(
                "health",
                &[
                    "health", "fitness", "medicine", "nutrition", "exercise", "sleep",
                ],
            ),
            Category::new(
                "news",
                &["news", "politics", "election", "government", "world"],
            ),
            Category::new(
                "culture",
                &[
                    "culture", "music", "film", "book", "history", "travel", "food",
                ],
            ),
        ])
    }
}

/// Assigns a category to classification text, returning `(label, score)`
/// with the score in [0, 1].
#[async_trait]
pub trait CategoryStrategy: Send + Sync {
    async fn assign(&self, text: &str, categories: &CategorySet) -> Result<(String, f64)>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Embedding-similarity category assignment.
///
/// Embeds the document and every label in one batch and picks the label
/// with the highest cosine similarity.
pub struct EmbeddingCategoryStrategy {
    backend: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingCategoryStrategy {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl CategoryStrategy for EmbeddingCategoryStrategy {
    #[instrument(skip_all, fields(subsystem = "classify", component = "category", strategy = "embedding"))]
    async fn assign(&self, text: &str, categories: &CategorySet) -> Result<(String, f64)> {
        if categories.is_empty() {
            return Err(Error::Classification("no categories configured".to_string()));
        }

        // One batch: the document first, then every label.
        let mut inputs = Vec::with_capacity(categories.len() + 1);
        inputs.push(text.to_string());
        inputs.extend(categories.iter().map(|c| c.label.clone()));

        let vectors = self.backend.embed_texts(&inputs).await?;
        let (document, label_vectors) = vectors
            .split_first()
            .ok_or_else(|| Error::Embedding("backend returned no vectors".to_string()))?;

        let mut best: Option<(&Category, f32)> = None;
        for (category, vector) in categories.iter().zip(label_vectors.iter()) {
            let similarity = cosine_similarity(document, vector)?;
            // Strictly-greater keeps the first-declared label on exact ties.
            let better = match best {
                Some((_, best_similarity)) => similarity > best_similarity,
                None => true,
            };
            if better {
                best = Some((category, similarity));
            }
        }

        let (category, similarity) =
            best.ok_or_else(|| Error::Classification("no categories configured".to_string()))?;
        // Cosine lands in [-1, 1]; clamp into the stored [0, 1] range.
        let score = f64::from(similarity.clamp(0.0, 1.0));

        debug!(label = %category.label, score, "Embedding category selected");
        Ok((category.label.clone(), score))
    }

    fn name(&self) -> &'static str {
        "embedding"
    }
}

/// Deterministic keyword-overlap fallback.
///
/// Counts whole-token occurrences of each category's keyword set in the
/// lower-cased text. The winning count is normalized by the text's word
/// count and capped at 1.0; ties go to the first-declared category.
pub struct KeywordCategoryStrategy;

#[async_trait]
impl CategoryStrategy for KeywordCategoryStrategy {
    #[instrument(skip_all, fields(subsystem = "classify", component = "category", strategy = "keyword"))]
    async fn assign(&self, text: &str, categories: &CategorySet) -> Result<(String, f64)> {
        if categories.is_empty() {
            return Err(Error::Classification("no categories configured".to_string()));
        }

        let lowered = text.to_lowercase();
        let word_count = lowered.split_whitespace().count();
        if word_count == 0 {
            return Err(Error::Classification("empty text".to_string()));
        }

        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut best: Option<(&Category, usize)> = None;
        for category in categories.iter() {
            let matches: usize = category
                .keywords
                .iter()
                .map(|keyword| tokens.iter().filter(|t| **t == keyword.as_str()).count())
                .sum();
            // Strictly-greater keeps the first-declared category on ties.
            let better = match best {
                Some((_, best_matches)) => matches > best_matches,
                None => true,
            };
            if better {
                best = Some((category, matches));
            }
        }

        let (category, matches) =
            best.ok_or_else(|| Error::Classification("no categories configured".to_string()))?;
        let score = ((matches as f64) / (word_count as f64)).min(1.0);

        debug!(label = %category.label, matches, word_count, "Keyword category selected");
        Ok((category.label.clone(), score))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}
