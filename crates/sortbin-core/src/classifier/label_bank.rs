//! Pre-computed descriptor embeddings for fast scoring.
//!
//! The label bank stores a flat N×D matrix of text embeddings, one row per
//! descriptor, together with the descriptor strings it was built from.

use crate::error::ClassifyError;

use super::text_encoder::TextEncoder;

/// Pre-computed descriptor embeddings.
///
/// Stores a single flat matrix (N × D, row-major) for efficient dot products.
#[derive(Debug, Clone)]
pub struct LabelBank {
    labels: Vec<String>,
    matrix: Vec<f32>,
    embedding_dim: usize,
}

impl LabelBank {
    /// Create a label bank from a pre-computed matrix.
    pub fn from_raw(
        labels: Vec<String>,
        matrix: Vec<f32>,
        embedding_dim: usize,
    ) -> Result<Self, ClassifyError> {
        if matrix.len() != labels.len() * embedding_dim {
            return Err(ClassifyError::Model {
                message: format!(
                    "Matrix size ({}) does not match {} labels × {} dim",
                    matrix.len(),
                    labels.len(),
                    embedding_dim,
                ),
            });
        }
        Ok(Self {
            labels,
            matrix,
            embedding_dim,
        })
    }

    /// Encode every label and build the bank, `batch_size` labels per inference call.
    pub fn encode_all(
        labels: &[String],
        text_encoder: &TextEncoder,
        batch_size: usize,
    ) -> Result<Self, ClassifyError> {
        let mut matrix: Vec<f32> = Vec::new();
        let mut embedding_dim = 0;

        tracing::info!("Encoding {} descriptors...", labels.len());

        for chunk in labels.chunks(batch_size.max(1)) {
            for emb in text_encoder.encode_batch(chunk)? {
                if embedding_dim == 0 {
                    embedding_dim = emb.len();
                    matrix.reserve(labels.len() * embedding_dim);
                } else if emb.len() != embedding_dim {
                    return Err(ClassifyError::Model {
                        message: format!(
                            "Text encoder returned mixed embedding sizes ({} vs {})",
                            embedding_dim,
                            emb.len()
                        ),
                    });
                }
                matrix.extend_from_slice(&emb);
            }
        }

        let bank = Self::from_raw(labels.to_vec(), matrix, embedding_dim)?;
        tracing::info!(
            "Label bank ready: {} descriptors x {} dims",
            bank.len(),
            bank.embedding_dim
        );
        Ok(bank)
    }

    /// Whether this bank was built for exactly `labels`, in the same order.
    pub fn matches(&self, labels: &[String]) -> bool {
        self.labels == labels
    }

    /// Cosine similarity of a normalized image embedding against every row.
    pub fn cosines(&self, image_embedding: &[f32]) -> Result<Vec<f32>, ClassifyError> {
        if self.labels.is_empty() {
            return Ok(vec![]);
        }
        if image_embedding.len() != self.embedding_dim {
            return Err(ClassifyError::Model {
                message: format!(
                    "Image embedding has {} dims but label bank has {}",
                    image_embedding.len(),
                    self.embedding_dim
                ),
            });
        }
        Ok(self
            .matrix
            .chunks_exact(self.embedding_dim)
            .map(|row| row.iter().zip(image_embedding).map(|(a, b)| a * b).sum())
            .collect())
    }

    /// Number of descriptors in the bank.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the bank holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }
}
