use std::cmp::Ordering;

use ndarray::prelude::*;

use crate::detection::{Annotation, Prediction};
use crate::error::{Error, Result};
use crate::evaluation::MatchOutcome;
use crate::geometry::{iou_batch, BBox, Ltrb};

/// Greedy first-qualifying matching of one image.
///
/// Parameters
/// ----------
/// predictions : Predictions of the image, processed in the given order.
/// pool : Ground truth of the image. Each entry is consumed at most once.
/// iou_threshold : Minimum IoU for a same-category pair to qualify.
///
/// Returns
/// -------
/// MatchOutcome
///     A prediction that takes the first unconsumed qualifying annotation in
///     pool order is a true positive, any other prediction is a false
///     positive, and every annotation left unconsumed is a false negative.
pub fn greedy_match(predictions: &[&Prediction], pool: &[&Annotation], iou_threshold: f32) -> MatchOutcome {
    let boxes: Vec<BBox<Ltrb>> = pool.iter().map(|a| a.bbox).collect();
    let mut consumed = vec![false; pool.len()];
    let mut outcome = MatchOutcome::default();

    for prediction in predictions {
        let scores = iou_batch(&prediction.bbox, &boxes);
        let hit = (0..pool.len()).find(|&idx| {
            !consumed[idx] && pool[idx].category == prediction.category && scores[idx] >= iou_threshold
        });

        match hit {
            Some(idx) => {
                log::debug!(
                    "image {}: prediction {:?} matched annotation #{} (iou {:.3})",
                    prediction.image_id, prediction.bbox.to_array(), idx, scores[idx]
                );
                consumed[idx] = true;
                outcome.true_positives += 1;
            }
            None => outcome.false_positives += 1,
        }
    }

    outcome.false_negatives = consumed.iter().filter(|&&c| !c).count();
    outcome
}

/// Orders predictions by descending score, unscored last. The sort is
/// stable, so equal scores keep input order.
pub fn sort_by_confidence<'a>(predictions: &[&'a Prediction]) -> Vec<&'a Prediction> {
    fn rank(score: Option<f32>) -> f32 {
        match score {
            Some(s) if !s.is_nan() => s,
            _ => f32::NEG_INFINITY,
        }
    }

    let mut sorted = predictions.to_vec();
    sorted.sort_by(|a, b| {
        rank(b.score)
            .partial_cmp(&rank(a.score))
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

/// Maximum-cardinality, minimum-cost matching of one image.
///
/// Builds a square cost matrix of `1 - IoU` between predictions (rows) and
/// annotations (columns). Pairs that do not qualify, and the padding needed to
/// square the matrix, are gated with a cost larger than any possible sum of
/// qualifying costs, so the solver never trades a match for a cheaper one.
pub fn optimal_match(predictions: &[&Prediction], pool: &[&Annotation], iou_threshold: f32) -> Result<MatchOutcome> {
    let (pred_n, ann_n) = (predictions.len(), pool.len());

    if pred_n == 0 || ann_n == 0 {
        return Ok(MatchOutcome {
            true_positives: 0,
            false_positives: pred_n,
            false_negatives: ann_n,
        });
    }

    let n = pred_n.max(ann_n);
    let gated_cost = n as f32 + 1.0;
    let boxes: Vec<BBox<Ltrb>> = pool.iter().map(|a| a.bbox).collect();

    let mut cost_matrix = Array2::from_elem((n, n), gated_cost);
    let mut feasible = Array2::from_elem((n, n), false);

    for (row, prediction) in predictions.iter().enumerate() {
        let scores = iou_batch(&prediction.bbox, &boxes);

        for (col, annotation) in pool.iter().enumerate() {
            if annotation.category == prediction.category && scores[col] >= iou_threshold {
                cost_matrix[(row, col)] = 1.0 - scores[col];
                feasible[(row, col)] = true;
            }
        }
    }

    let mut weights = munkres::WeightMatrix::from_row_vec(n, cost_matrix.iter().copied().collect());
    let indices = munkres::solve_assignment(&mut weights)
        .map_err(|_| Error::Assignment(format!("no assignment for {}x{} cost matrix", n, n)))?;

    let true_positives = indices
        .iter()
        .filter(|pos| pos.row < pred_n && pos.column < ann_n && feasible[(pos.row, pos.column)])
        .count();

    Ok(MatchOutcome {
        true_positives,
        false_positives: pred_n - true_positives,
        false_negatives: ann_n - true_positives,
    })
}
