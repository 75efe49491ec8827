//! Zero-shot image classification.
//!
//! A [`ZeroShotClassifier`] maps an image and an ordered list of candidate
//! labels to a probability distribution over those labels. The production
//! implementation is CLIP running locally via ONNX Runtime:
//!
//! ```text
//! image → preprocess → vision encoder ─┐
//!                                      ├→ cosine × logit_scale → softmax
//! labels → tokenizer → text encoder ───┘
//! ```

pub mod label_bank;
pub(crate) mod preprocess;
pub(crate) mod text_encoder;
pub(crate) mod vision;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::Config;
use crate::error::ClassifyError;

pub use self::label_bank::LabelBank;
use self::preprocess::preprocess;
use self::text_encoder::TextEncoder;
use self::vision::VisionEncoder;

/// Vision tower ONNX filename inside the model directory.
pub const VISION_MODEL_FILENAME: &str = "vision_model.onnx";
/// Text tower ONNX filename inside the model directory.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";
/// Tokenizer filename inside the model directory.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Anything that can score an image against candidate labels.
///
/// Implementations are synchronous and CPU-bound; callers run them on the
/// blocking pool. The returned vector has one probability per label, in
/// label order, summing to 1.
pub trait ZeroShotClassifier: Send + Sync {
    /// Classifier name for logging.
    fn name(&self) -> &str;

    /// Score `image` against `labels`.
    fn classify(&self, image: &DynamicImage, labels: &[String]) -> Result<Vec<f32>, ClassifyError>;
}

/// CLIP zero-shot classifier.
pub struct ClipClassifier {
    vision: VisionEncoder,
    text: TextEncoder,
    /// Embeddings for the label list seen at startup.
    bank: Option<LabelBank>,
    image_size: u32,
    logit_scale: f32,
    text_batch_size: usize,
}

impl ClipClassifier {
    /// Load the CLIP towers and tokenizer from `{model_dir}/{model}/`.
    pub fn load(config: &Config) -> Result<Self, ClassifyError> {
        let model_path = config.model_path();
        if let Some(missing) = Self::missing_files(&model_path).first() {
            return Err(ClassifyError::Model {
                message: format!(
                    "{:?} not found. Run `sortbin models download` first.",
                    missing
                ),
            });
        }

        tracing::info!("Loading CLIP model from {:?}", model_path);
        let vision = VisionEncoder::load(&model_path.join(VISION_MODEL_FILENAME))?;
        let text = TextEncoder::load(
            &model_path.join(TEXT_MODEL_FILENAME),
            &model_path.join(TOKENIZER_FILENAME),
        )?;
        tracing::info!("CLIP model loaded successfully");

        Ok(Self {
            vision,
            text,
            bank: None,
            image_size: config.model.image_size,
            logit_scale: config.model.logit_scale,
            text_batch_size: config.model.text_batch_size,
        })
    }

    /// Pre-compute embeddings for the label list the server will use.
    pub fn with_label_bank(mut self, labels: &[String]) -> Result<Self, ClassifyError> {
        self.bank = Some(LabelBank::encode_all(
            labels,
            &self.text,
            self.text_batch_size,
        )?);
        Ok(self)
    }

    /// Model files that are not present in `model_path`.
    pub fn missing_files(model_path: &Path) -> Vec<PathBuf> {
        [VISION_MODEL_FILENAME, TEXT_MODEL_FILENAME, TOKENIZER_FILENAME]
            .iter()
            .map(|f| model_path.join(f))
            .filter(|p| !p.exists())
            .collect()
    }
}

impl ZeroShotClassifier for ClipClassifier {
    fn name(&self) -> &str {
        "clip"
    }

    fn classify(&self, image: &DynamicImage, labels: &[String]) -> Result<Vec<f32>, ClassifyError> {
        let tensor = preprocess(image, self.image_size);
        let image_embedding = self.vision.embed(&tensor)?;

        let cosines = match &self.bank {
            Some(bank) if bank.matches(labels) => bank.cosines(&image_embedding)?,
            _ => {
                tracing::debug!("Label list differs from startup bank; encoding on the fly");
                LabelBank::encode_all(labels, &self.text, self.text_batch_size)?
                    .cosines(&image_embedding)?
            }
        };

        Ok(probabilities(&cosines, self.logit_scale))
    }
}

/// Convert cosine similarities to a label distribution the way CLIP does:
/// scale into logits, then softmax across labels.
pub fn probabilities(cosines: &[f32], logit_scale: f32) -> Vec<f32> {
    let logits: Vec<f32> = cosines.iter().map(|c| c * logit_scale).collect();
    crate::math::softmax(&logits)
}
