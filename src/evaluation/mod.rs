pub mod dataset;
pub mod matching;

use std::collections::BTreeMap;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::detection::{Annotation, ImageId, Prediction};
use crate::error::Result;

pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;

/// Order in which predictions claim ground truth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Predictions in input order, first qualifying annotation wins.
    InputOrder,
    /// Predictions by descending score, first qualifying annotation wins.
    ConfidenceSorted,
    /// Per-image optimal assignment maximizing the number of matches.
    Optimal,
}

impl Default for MatchStrategy {
    fn default() -> Self {
        MatchStrategy::InputOrder
    }
}

impl std::str::FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "input_order" => Ok(MatchStrategy::InputOrder),
            "confidence_sorted" => Ok(MatchStrategy::ConfidenceSorted),
            "optimal" => Ok(MatchStrategy::Optimal),
            other => Err(format!(
                "unknown strategy '{}' (expected input_order, confidence_sorted or optimal)",
                other
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl AddAssign for MatchOutcome {
    fn add_assign(&mut self, other: Self) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

impl From<MatchOutcome> for EvaluationSummary {
    fn from(outcome: MatchOutcome) -> Self {
        let MatchOutcome { true_positives: tp, false_positives: fp, false_negatives: fn_ } = outcome;

        let precision = ratio(tp as f32, (tp + fp) as f32);
        let recall = ratio(tp as f32, (tp + fn_) as f32);
        let f1 = ratio(2.0 * precision * recall, precision + recall);

        Self {
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_,
            precision,
            recall,
            f1,
        }
    }
}

#[inline]
fn ratio(num: f32, den: f32) -> f32 {
    if den > 0.0 { num / den } else { 0.0 }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub summary: EvaluationSummary,
    pub per_image: BTreeMap<ImageId, MatchOutcome>,
}

///
/// Scores predictions against ground truth, image by image.
///
/// ```text
///     Parameters
///     ----------
///     iou_threshold : f32
///         Minimum IoU for a same-category prediction/annotation pair to match.
///     strategy : MatchStrategy
///         Order in which predictions claim annotations.
/// ```
///
/// Every call owns its matching pools; nothing is shared between calls.
///
#[derive(Debug, Clone)]
pub struct Evaluator {
    iou_threshold: f32,
    strategy: MatchStrategy,
}

impl Evaluator {
    pub fn new(iou_threshold: f32) -> Self {
        Self {
            iou_threshold,
            strategy: MatchStrategy::InputOrder,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            iou_threshold: config.evaluation.iou_threshold,
            strategy: config.evaluation.strategy,
        }
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[inline]
    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    #[inline]
    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn evaluate(&self, annotations: &[Annotation], predictions: &[Prediction]) -> Result<Evaluation> {
        let mut pools: BTreeMap<ImageId, Vec<&Annotation>> = BTreeMap::new();
        for annotation in annotations {
            pools.entry(annotation.image_id).or_insert_with(Vec::new).push(annotation);
        }

        let mut by_image: BTreeMap<ImageId, Vec<&Prediction>> = BTreeMap::new();
        for prediction in predictions {
            by_image.entry(prediction.image_id).or_insert_with(Vec::new).push(prediction);
        }

        let image_ids: Vec<ImageId> = {
            let mut ids: Vec<_> = pools.keys().chain(by_image.keys()).copied().collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };

        let mut total = MatchOutcome::default();
        let mut per_image = BTreeMap::new();

        for image_id in image_ids {
            let pool = pools.get(&image_id).map(Vec::as_slice).unwrap_or(&[]);
            let preds = by_image.get(&image_id).map(Vec::as_slice).unwrap_or(&[]);

            let outcome = self.match_image(preds, pool)?;

            total += outcome;
            per_image.insert(image_id, outcome);
        }

        let summary = EvaluationSummary::from(total);

        log::info!(
            "evaluated {} image(s) with {:?} at IoU {}: TP={} FP={} FN={}",
            per_image.len(),
            self.strategy,
            self.iou_threshold,
            summary.true_positives,
            summary.false_positives,
            summary.false_negatives,
        );

        Ok(Evaluation { summary, per_image })
    }

    fn match_image(&self, predictions: &[&Prediction], pool: &[&Annotation]) -> Result<MatchOutcome> {
        match self.strategy {
            MatchStrategy::InputOrder => Ok(matching::greedy_match(predictions, pool, self.iou_threshold)),
            MatchStrategy::ConfidenceSorted => {
                let sorted = matching::sort_by_confidence(predictions);
                Ok(matching::greedy_match(&sorted, pool, self.iou_threshold))
            }
            MatchStrategy::Optimal => matching::optimal_match(predictions, pool, self.iou_threshold),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_IOU_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;

    fn ann(image_id: ImageId, category: u32, ltwh: [f32; 4]) -> Annotation {
        Annotation::from_ltwh(image_id, category, BBox::ltwh(ltwh[0], ltwh[1], ltwh[2], ltwh[3])).unwrap()
    }

    fn pred(image_id: ImageId, category: u32, score: f32, ltwh: [f32; 4]) -> Prediction {
        Prediction::from_ltwh(image_id, category, Some(score), BBox::ltwh(ltwh[0], ltwh[1], ltwh[2], ltwh[3])).unwrap()
    }

    #[test]
    fn perfect_match() {
        let gt = vec![ann(1, 1, [10.0, 10.0, 100.0, 100.0])];
        let preds = vec![pred(1, 1, 0.9, [12.0, 12.0, 100.0, 100.0])];

        let summary = Evaluator::default().evaluate(&gt, &preds).unwrap().summary;

        assert_eq!((summary.true_positives, summary.false_positives, summary.false_negatives), (1, 0, 0));
        assert_eq!(summary.precision, 1.0);
        assert_eq!(summary.recall, 1.0);
        assert_eq!(summary.f1, 1.0);
    }

    #[test]
    fn low_overlap_is_a_miss() {
        // 10% horizontal overlap: iou = 10 / 190.
        let gt = vec![ann(1, 1, [0.0, 0.0, 100.0, 100.0])];
        let preds = vec![pred(1, 1, 0.9, [90.0, 0.0, 100.0, 100.0])];

        let summary = Evaluator::default().evaluate(&gt, &preds).unwrap().summary;

        assert_eq!((summary.true_positives, summary.false_positives, summary.false_negatives), (0, 1, 1));
        assert_eq!(summary.precision, 0.0);
        assert_eq!(summary.recall, 0.0);
        assert_eq!(summary.f1, 0.0);
    }

    #[test]
    fn annotation_matches_at_most_once() {
        let gt = vec![ann(1, 1, [0.0, 0.0, 100.0, 100.0])];
        let preds = vec![
            pred(1, 1, 0.9, [0.0, 0.0, 100.0, 100.0]),
            pred(1, 1, 0.8, [5.0, 5.0, 100.0, 100.0]),
        ];

        let summary = Evaluator::default().evaluate(&gt, &preds).unwrap().summary;

        assert_eq!((summary.true_positives, summary.false_positives, summary.false_negatives), (1, 1, 0));
        assert_eq!(summary.precision, 0.5);
    }

    #[test]
    fn no_predictions() {
        let gt = vec![ann(1, 1, [0.0, 0.0, 10.0, 10.0]), ann(2, 1, [0.0, 0.0, 10.0, 10.0])];

        let summary = Evaluator::default().evaluate(&gt, &[]).unwrap().summary;

        assert_eq!(summary.false_negatives, 2);
        assert_eq!((summary.precision, summary.recall, summary.f1), (0.0, 0.0, 0.0));
    }

    #[test]
    fn empty_dataset() {
        let evaluation = Evaluator::default().evaluate(&[], &[]).unwrap();

        assert!(evaluation.per_image.is_empty());
        assert_eq!(evaluation.summary.f1, 0.0);
    }

    #[test]
    fn matching_is_scoped_per_image() {
        let gt = vec![ann(1, 1, [0.0, 0.0, 10.0, 10.0])];
        let preds = vec![
            pred(2, 1, 0.9, [0.0, 0.0, 10.0, 10.0]),
            pred(1, 1, 0.9, [0.0, 0.0, 10.0, 10.0]),
        ];

        let evaluation = Evaluator::default().evaluate(&gt, &preds).unwrap();

        assert_eq!(evaluation.per_image[&1], MatchOutcome { true_positives: 1, false_positives: 0, false_negatives: 0 });
        assert_eq!(evaluation.per_image[&2], MatchOutcome { true_positives: 0, false_positives: 1, false_negatives: 0 });
    }

    #[test]
    fn confidence_sorted_changes_who_claims_the_annotation() {
        // Under input order the weak prediction claims the first annotation and
        // the strong one cannot reach the narrow second one. Sorted, the strong
        // prediction goes first and both match.
        let gt = vec![
            ann(1, 1, [0.0, 0.0, 10.0, 10.0]),
            ann(1, 1, [6.0, 0.0, 4.0, 10.0]),
        ];
        let preds = vec![
            pred(1, 1, 0.2, [3.0, 0.0, 7.0, 10.0]),
            pred(1, 1, 0.9, [0.0, 0.0, 10.0, 10.0]),
        ];

        let input_order = Evaluator::default().evaluate(&gt, &preds).unwrap().summary;
        let sorted = Evaluator::default()
            .with_strategy(MatchStrategy::ConfidenceSorted)
            .evaluate(&gt, &preds)
            .unwrap()
            .summary;

        assert_eq!(input_order.true_positives, 1);
        assert_eq!(sorted.true_positives, 2);
    }

    #[test]
    fn strategy_parses_from_cli_names() {
        assert_eq!("optimal".parse::<MatchStrategy>().unwrap(), MatchStrategy::Optimal);
        assert_eq!("input_order".parse::<MatchStrategy>().unwrap(), MatchStrategy::InputOrder);
        assert!("best".parse::<MatchStrategy>().is_err());
    }
}
