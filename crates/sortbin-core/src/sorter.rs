//! Request orchestration: relay → fetch → decode → classify → aggregate.
//!
//! [`Sorter`] is the immutable application context. It is built once at
//! startup and shared by every request handler.

use std::sync::Arc;
use std::time::Instant;

use crate::classifier::{ClipClassifier, ZeroShotClassifier};
use crate::config::{Config, LimitsConfig};
use crate::decode::ImageDecoder;
use crate::error::{ClassifyError, Result};
use crate::relay::{ImageRelay, ImgbbRelay};
use crate::taxonomy::{aggregate, LabelIndex, TaxonomyTable};
use crate::types::Classification;

/// Shared, read-only state for classifying uploads.
pub struct Sorter {
    index: LabelIndex,
    /// Descriptors in index order, handed to the classifier on every request.
    descriptors: Arc<Vec<String>>,
    relay: Arc<dyn ImageRelay>,
    classifier: Arc<dyn ZeroShotClassifier>,
    decoder: ImageDecoder,
}

impl Sorter {
    /// Assemble a sorter from already-built parts.
    pub fn new(
        index: LabelIndex,
        relay: Arc<dyn ImageRelay>,
        classifier: Arc<dyn ZeroShotClassifier>,
        limits: LimitsConfig,
    ) -> Self {
        let descriptors = Arc::new(index.descriptors());
        Self {
            index,
            descriptors,
            relay,
            classifier,
            decoder: ImageDecoder::new(limits),
        }
    }

    /// Build the production sorter: taxonomy, imgbb relay and CLIP.
    ///
    /// Fails fast on a malformed taxonomy, a missing API key, or missing
    /// model files.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let table = TaxonomyTable::load_or_builtin(config.taxonomy_path().as_deref())?;
        let index = LabelIndex::build(&table)?;
        let api_key = config.relay_api_key()?;
        let relay = ImgbbRelay::new(&config.relay, &api_key)?;

        let labels = index.descriptors();
        let model_config = config.clone();
        let classifier = tokio::task::spawn_blocking(move || {
            ClipClassifier::load(&model_config)?.with_label_bank(&labels)
        })
        .await
        .map_err(|e| ClassifyError::Model {
            message: format!("Model loading task failed: {e}"),
        })??;

        tracing::info!(
            "Sorter ready: {} categories, {} descriptors, relay={}, classifier={}",
            index.category_count(),
            index.len(),
            relay.name(),
            classifier.name()
        );

        Ok(Self::new(
            index,
            Arc::new(relay),
            Arc::new(classifier),
            config.limits.clone(),
        ))
    }

    /// The label index this sorter classifies against.
    pub fn index(&self) -> &LabelIndex {
        &self.index
    }

    /// Classify one uploaded image.
    ///
    /// The image is hosted first; nothing is classified if hosting fails.
    /// A classifier output whose length disagrees with the label index is
    /// reported as [`ClassifyError::ScoreLengthMismatch`].
    pub async fn classify_upload(
        &self,
        bytes: &[u8],
        filename: Option<&str>,
    ) -> Result<Classification> {
        let start = Instant::now();

        let hosted = self.relay.upload(bytes, filename).await?;
        let fetched = self.relay.fetch(&hosted.url).await?;
        let decoded = self.decoder.decode(fetched).await?;

        let classifier = Arc::clone(&self.classifier);
        let descriptors = Arc::clone(&self.descriptors);
        let image = decoded.image;
        let probabilities =
            tokio::task::spawn_blocking(move || classifier.classify(&image, &descriptors))
                .await
                .map_err(|e| ClassifyError::Model {
                    message: format!("Inference task failed: {e}"),
                })??;

        let scores = aggregate(&self.index, &probabilities)?;
        let top_descriptor = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| self.index.labels()[i].descriptor.clone());

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if let Some(best) = scores.first() {
            tracing::info!(
                "Classified {} as {} ({:.3}) in {}ms",
                hosted.url,
                best.category,
                best.score,
                elapsed_ms
            );
        }

        Ok(Classification {
            image_url: hosted.url,
            scores,
            top_descriptor,
            elapsed_ms,
        })
    }
}
