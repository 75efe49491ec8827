//! Core data types produced by a classification request.

use serde::{Deserialize, Serialize};

/// Aggregated score of one primary category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Category name (e.g., "glass")
    pub category: String,
    /// Sum of the probabilities of the category's descriptors
    pub score: f32,
}

/// The complete outcome of classifying one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// Public URL of the hosted image
    pub image_url: String,

    /// Categories ranked by descending score
    pub scores: Vec<CategoryScore>,

    /// Best-matching descriptor overall, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_descriptor: Option<String>,

    /// Wall-clock time spent on the request, in milliseconds
    pub elapsed_ms: u64,
}

impl Classification {
    /// The highest-ranked category, if any.
    pub fn best(&self) -> Option<&CategoryScore> {
        self.scores.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_serializes_without_empty_descriptor() {
        let result = Classification {
            image_url: "https://i.ibb.co/x/y.jpg".to_string(),
            scores: vec![CategoryScore {
                category: "glass".to_string(),
                score: 1.0,
            }],
            top_descriptor: None,
            elapsed_ms: 12,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"category\":\"glass\""));
        assert!(!json.contains("top_descriptor"));
        assert_eq!(result.best().unwrap().category, "glass");
    }
}
