//! Mock embedding backend for deterministic testing.
//!
//! Identical input text always produces the same vector, specific inputs
//! can be pinned to hand-built vectors, and availability can be toggled
//! at runtime to exercise strategy fallback paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use reread_core::{EmbeddingBackend, Error, Result};

/// Deterministic mock embedding backend.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    config: Arc<MockConfig>,
    available: Arc<Mutex<bool>>,
    call_log: Arc<Mutex<Vec<Vec<String>>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    fixed_embeddings: HashMap<String, Vec<f32>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            fixed_embeddings: HashMap::new(),
        }
    }
}

impl MockEmbeddingBackend {
    /// Create a mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            available: Arc::new(Mutex::new(true)),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Pin a specific input text to a hand-built vector.
    pub fn with_embedding(mut self, input: impl Into<String>, vector: Vec<f32>) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_embeddings
            .insert(input.into(), vector);
        self
    }

    /// Set the initial availability.
    pub fn with_availability(self, available: bool) -> Self {
        *self.available.lock().unwrap() = available;
        self
    }

    /// Flip availability at runtime. Shared across clones, so a handle
    /// kept by a test controls the backend inside a classifier.
    pub fn set_available(&self, available: bool) {
        *self.available.lock().unwrap() = available;
    }

    /// Number of `embed_texts` calls made, unavailable attempts included.
    pub fn embed_call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// All logged `embed_texts` inputs for assertion.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.call_log.lock().unwrap().clone()
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a deterministic embedding from text.
///
/// Character-based hashing: the same text always produces the same unit
/// vector.
fn generate(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0; dimension];

    for (i, c) in text.chars().enumerate() {
        let idx = (c as usize + i) % dimension;
        vector[idx] += 0.1;
    }

    normalize(&mut vector);
    vector
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.call_log.lock().unwrap().push(texts.to_vec());

        if !*self.available.lock().unwrap() {
            return Err(Error::BackendUnavailable("mock backend offline".to_string()));
        }

        Ok(texts
            .iter()
            .map(|text| {
                self.config
                    .fixed_embeddings
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| generate(text, self.config.dimension))
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}
