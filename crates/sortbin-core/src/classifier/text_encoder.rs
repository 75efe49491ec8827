//! CLIP text encoder for generating descriptor embeddings.
//!
//! Loads the CLIP text ONNX model and tokenizer, encodes descriptor strings
//! to vectors aligned with the vision encoder's space.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::error::ClassifyError;

/// CLIP context length.
const MAX_LENGTH: usize = 77;

/// CLIP pads with its end-of-text token.
const FALLBACK_PAD_ID: u32 = 49407;

/// Output names that carry the cross-modal projection, in preference order.
const EMBEDDING_OUTPUTS: &[&str] = &["text_embeds", "pooler_output"];

/// CLIP text encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the vision encoder.
pub struct TextEncoder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    pad_id: u32,
    /// Whether the exported graph takes an `attention_mask` input.
    wants_attention_mask: bool,
}

impl TextEncoder {
    /// Load the text encoder and tokenizer.
    pub fn load(model_path: &Path, tokenizer_path: &Path) -> Result<Self, ClassifyError> {
        let session = Session::builder()
            .map_err(|e| ClassifyError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| ClassifyError::Model {
                message: format!("Failed to load text model {:?}: {e}", model_path),
            })?;

        let tokenizer =
            tokenizers::Tokenizer::from_file(tokenizer_path).map_err(|e| ClassifyError::Model {
                message: format!("Failed to load tokenizer {:?}: {e}", tokenizer_path),
            })?;

        let pad_id = tokenizer
            .token_to_id("<|endoftext|>")
            .unwrap_or(FALLBACK_PAD_ID);
        let wants_attention_mask = session
            .inputs()
            .iter()
            .any(|i| i.name() == "attention_mask");

        tracing::debug!(
            "Loaded CLIP text encoder (inputs: {:?}, outputs: {:?})",
            session
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>(),
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            pad_id,
            wants_attention_mask,
        })
    }

    /// Encode a batch of descriptors to normalized embeddings.
    ///
    /// Returns one vector per input text, in input order.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClassifyError> {
        let batch_size = texts.len();
        if batch_size == 0 {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ClassifyError::Model {
                message: format!("Tokenization failed: {e}"),
            })?;

        let mut input_ids = vec![self.pad_id as i64; batch_size * MAX_LENGTH];
        let mut attention_mask = vec![0i64; batch_size * MAX_LENGTH];

        for (i, encoding) in encodings.iter().enumerate() {
            for (j, &id) in encoding.get_ids().iter().take(MAX_LENGTH).enumerate() {
                input_ids[i * MAX_LENGTH + j] = id as i64;
                attention_mask[i * MAX_LENGTH + j] = 1;
            }
        }

        let shape = vec![batch_size as i64, MAX_LENGTH as i64];
        let input_ids_value =
            Value::from_array((shape.clone(), input_ids)).map_err(|e| ClassifyError::Model {
                message: format!("Failed to create input_ids tensor: {e}"),
            })?;

        let mut session = self.session.lock().map_err(|e| ClassifyError::Model {
            message: format!("Text encoder lock poisoned: {e}"),
        })?;

        let run_result = if self.wants_attention_mask {
            let mask_value =
                Value::from_array((shape, attention_mask)).map_err(|e| ClassifyError::Model {
                    message: format!("Failed to create attention_mask tensor: {e}"),
                })?;
            session.run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => mask_value
            ])
        } else {
            session.run(ort::inputs!["input_ids" => input_ids_value])
        };
        let outputs = run_result.map_err(|e| ClassifyError::Model {
            message: format!("Text encoder inference failed: {e}"),
        })?;

        let embedding_output = EMBEDDING_OUTPUTS
            .iter()
            .find_map(|wanted| outputs.iter().find(|(name, _)| name == wanted))
            .ok_or_else(|| ClassifyError::Model {
                message: "Text encoder produced no text_embeds output".to_string(),
            })?;

        let (shape, data) =
            embedding_output
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| ClassifyError::Model {
                    message: format!("Failed to extract text embeddings: {e}"),
                })?;

        let embedding_dim = match shape.len() {
            2 => shape[1] as usize,
            _ => {
                return Err(ClassifyError::Model {
                    message: format!("Unexpected text embedding shape: {:?}", shape),
                });
            }
        };

        let embeddings: Vec<Vec<f32>> = data
            .chunks(embedding_dim)
            .take(batch_size)
            .map(crate::math::l2_normalize)
            .collect();

        Ok(embeddings)
    }
}
