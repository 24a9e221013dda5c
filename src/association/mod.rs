pub mod event;
pub mod helmet;

pub use event::{ConfidenceMode, GuardCheck, ViolationEvent, ViolationKind};
pub use helmet::HelmetRule;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::detection::Detection;

/// Class labels that fill the logical roles the rules reason about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roles {
    pub rider_candidate: String,
    pub subject: String,
    pub guard: String,
}

impl Default for Roles {
    fn default() -> Self {
        Self {
            rider_candidate: "motorcycle".to_string(),
            subject: "person".to_string(),
            guard: "helmet".to_string(),
        }
    }
}

///
/// Availability of the guard-item detections for a frame.
///
/// `Unavailable` means nobody looked, `RanEmpty` means a detector looked
/// and found nothing. Rules must never read the former as the latter.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardCapability {
    Available,
    Unavailable,
    RanEmpty,
}

impl GuardCapability {
    #[inline]
    pub fn is_checked(&self) -> bool {
        *self != GuardCapability::Unavailable
    }
}

/// One frame's detections as seen by the rules.
#[derive(Debug, Clone)]
pub struct Frame {
    pub detections: Vec<Detection>,
    pub guard: GuardCapability,
}

impl Frame {
    /// A frame whose guard items, if any, are part of `detections`.
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            guard: GuardCapability::Available,
        }
    }

    pub fn with_guard(detections: Vec<Detection>, guard: GuardCapability) -> Self {
        Self { detections, guard }
    }

    /// Detections of `label`, in input order.
    pub fn of_class<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Detection> + 'a {
        self.detections.iter().filter(move |d| d.is_class(label))
    }
}

/// A single independent inference pass over one frame.
pub trait Rule: Send + Sync {
    /// Rule identifier.
    fn name(&self) -> &'static str;

    /// Infers events from `frame`. Must be a pure function of its input.
    fn evaluate(&self, frame: &Frame) -> Vec<ViolationEvent>;
}

/// Ordered set of rules run over the same frame.
#[derive(Default)]
pub struct AssociationEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl AssociationEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The default rule set: helmet compliance.
    pub fn from_config(config: &Config) -> Self {
        let mut engine = Self::new();
        engine.register(HelmetRule::from_config(config));
        engine
    }

    pub fn register<R: Rule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    #[inline]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Runs every rule in registration order and concatenates their events.
    pub fn infer(&self, frame: &Frame) -> Vec<ViolationEvent> {
        let mut events = Vec::new();

        for rule in &self.rules {
            let mut found = rule.evaluate(frame);
            log::debug!("rule '{}' emitted {} event(s)", rule.name(), found.len());
            events.append(&mut found);
        }

        events
    }
}
