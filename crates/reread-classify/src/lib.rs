//! Classification for reread bookmarks.
//!
//! Assigns a category and extracts suggested keyword tags from the cached
//! title and description of a bookmarked page. Both run as ordered
//! strategy chains: an embedding-based strategy backed by Ollama first,
//! then a deterministic fallback that needs no inference server. Only a
//! [`reread_core::Error::BackendUnavailable`] moves the chain along; any
//! other failure is a real error.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reread_classify::{BookmarkClassifier, CategorySet, OllamaEmbedding};
//!
//! let backend = Arc::new(OllamaEmbedding::from_env());
//! let classifier = BookmarkClassifier::new(Some(backend), CategorySet::default());
//! let classification = classifier.classify("Rust and the async ecosystem").await?;
//! ```

pub mod category;
pub mod classifier;
pub mod keywords;
pub mod ollama;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use category::{
    Category, CategorySet, CategoryStrategy, EmbeddingCategoryStrategy, KeywordCategoryStrategy,
};
pub use classifier::{BookmarkClassifier, Classification};
pub use keywords::{EmbeddingKeywordStrategy, FrequencyKeywordStrategy, KeywordStrategy};
pub use ollama::OllamaEmbedding;

use reread_core::{Error, Result};

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::InvalidInput(format!(
            "Vector dimension mismatch: {} != {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();

    let a_norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let b_norm: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if a_norm == 0.0 || b_norm == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (a_norm * b_norm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert_eq!(sim, 0.0);
    }
}
