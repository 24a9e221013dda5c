use std::fmt;

use serde::{Deserialize, Serialize};

use crate::association::{GuardCheck, ViolationEvent, ViolationKind};
use crate::detection::Detection;
use crate::evaluation::EvaluationSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(rename = "class")]
    pub class_label: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

impl<'a> From<&'a Detection> for DetectionRecord {
    fn from(det: &'a Detection) -> Self {
        Self {
            class_label: det.class_label.clone(),
            confidence: det.confidence,
            bbox: det.bbox.to_array(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub description: String,
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub guard_check: GuardCheck,
}

impl<'a> From<&'a ViolationEvent> for ViolationRecord {
    fn from(event: &'a ViolationEvent) -> Self {
        Self {
            kind: event.kind,
            description: event.description.clone(),
            bbox: event.subject_bbox.to_array(),
            confidence: event.confidence,
            guard_check: event.guard_check,
        }
    }
}

/// One frame's detections and inferred violations, in the boundary shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub detections: Vec<DetectionRecord>,
    pub violations: Vec<ViolationRecord>,
    pub total_vehicles: usize,
    pub total_violations: usize,
}

impl DetectionReport {
    pub fn build<S: AsRef<str>>(detections: &[Detection], events: &[ViolationEvent], vehicle_classes: &[S]) -> Self {
        let total_vehicles = detections
            .iter()
            .filter(|d| vehicle_classes.iter().any(|c| d.is_class(c.as_ref())))
            .count();

        Self {
            detections: detections.iter().map(DetectionRecord::from).collect(),
            violations: events.iter().map(ViolationRecord::from).collect(),
            total_vehicles,
            total_violations: events.len(),
        }
    }
}

impl fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "TP={} FP={} FN={}",
            self.true_positives, self.false_positives, self.false_negatives
        )?;
        write!(
            f,
            "Precision={:.3} Recall={:.3} F1={:.3}",
            self.precision, self.recall, self.f1
        )
    }
}
