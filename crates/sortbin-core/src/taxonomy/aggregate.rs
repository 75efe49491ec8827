//! Roll descriptor probabilities up into ranked category scores.

use crate::error::ClassifyError;
use crate::types::CategoryScore;

use super::index::{CategoryId, LabelIndex};

/// Running per-category sums, with every known category starting at zero.
struct CategoryAccumulator {
    sums: Vec<f64>,
    contributed: Vec<bool>,
}

impl CategoryAccumulator {
    fn new(category_count: usize) -> Self {
        Self {
            sums: vec![0.0; category_count],
            contributed: vec![false; category_count],
        }
    }

    fn add(&mut self, category: CategoryId, score: f32) {
        self.sums[category.index()] += f64::from(score);
        self.contributed[category.index()] = true;
    }

    fn into_scores(self, index: &LabelIndex) -> Vec<CategoryScore> {
        self.sums
            .into_iter()
            .zip(self.contributed)
            .enumerate()
            .filter(|(_, (_, contributed))| *contributed)
            .map(|(idx, (sum, _))| CategoryScore {
                category: index.categories()[idx].clone(),
                score: sum as f32,
            })
            .collect()
    }
}

/// Sum a score distribution into per-category totals.
///
/// `scores[i]` belongs to `index.labels()[i]`. Every category that received a
/// contribution (even 0.0) appears once in the output, ordered by score
/// descending; equal scores are ordered by category name.
///
/// Returns [`ClassifyError::ScoreLengthMismatch`] when the distribution and
/// the index disagree on length. Nothing is truncated or padded.
pub fn aggregate(index: &LabelIndex, scores: &[f32]) -> Result<Vec<CategoryScore>, ClassifyError> {
    if scores.len() != index.len() {
        return Err(ClassifyError::ScoreLengthMismatch {
            expected: index.len(),
            actual: scores.len(),
        });
    }

    let mut acc = CategoryAccumulator::new(index.category_count());
    for (label, &score) in index.labels().iter().zip(scores) {
        acc.add(label.category, score);
    }

    let mut ranked = acc.into_scores(index);
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.category.cmp(&b.category))
    });
    Ok(ranked)
}
