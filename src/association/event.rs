use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Ltrb};

#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    HelmetlessDriving,
}

/// Whether the guard-item check behind an event actually ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardCheck {
    /// The check ran and found no guard item near the rider.
    NoGuardFound,
    /// The guard capability was unavailable; the rider was never checked.
    NotChecked,
}

/// How an inferred event's confidence is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceMode {
    /// Legacy fixed value, independent of the contributing detections.
    Placeholder,
    /// Minimum of the contributing detections' confidences.
    Min,
    /// Product of the contributing detections' confidences.
    Product,
}

impl Default for ConfidenceMode {
    fn default() -> Self {
        ConfidenceMode::Placeholder
    }
}

impl ConfidenceMode {
    pub fn resolve(&self, placeholder: f32, contributors: &[f32]) -> f32 {
        match self {
            ConfidenceMode::Placeholder => placeholder,
            ConfidenceMode::Min => contributors
                .iter()
                .copied()
                .fold(None, |acc: Option<f32>, c| Some(acc.map_or(c, |a| a.min(c))))
                .unwrap_or(placeholder),
            ConfidenceMode::Product => {
                if contributors.is_empty() {
                    placeholder
                } else {
                    contributors.iter().product()
                }
            }
        }
    }
}

/// A violation inferred from spatial relationships in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationEvent {
    pub kind: ViolationKind,
    pub subject_bbox: BBox<Ltrb>,
    pub confidence: f32,
    pub description: String,
    pub guard_check: GuardCheck,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_modes() {
        let contributors = [0.9, 0.5];

        assert_eq!(ConfidenceMode::Placeholder.resolve(0.8, &contributors), 0.8);
        assert_eq!(ConfidenceMode::Min.resolve(0.8, &contributors), 0.5);
        assert!((ConfidenceMode::Product.resolve(0.8, &contributors) - 0.45).abs() < 1e-6);
        assert_eq!(ConfidenceMode::Min.resolve(0.8, &[]), 0.8);
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ViolationKind::HelmetlessDriving).unwrap(),
            "\"helmetless_driving\""
        );
    }
}
