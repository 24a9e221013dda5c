use crate::association::{
    ConfidenceMode, Frame, GuardCheck, Roles, Rule, ViolationEvent, ViolationKind,
};
use crate::config::Config;
use crate::detection::Detection;
use crate::geometry::within_radius;

pub const DEFAULT_ASSOCIATION_RADIUS: f32 = 100.0;
pub const DEFAULT_GUARD_RADIUS: f32 = 50.0;
pub const DEFAULT_PLACEHOLDER_CONFIDENCE: f32 = 0.8;

///
/// Flags riders of a rider-candidate vehicle that carry no guard item.
///
/// ```text
///     Parameters
///     ----------
///     roles : Roles
///         Class labels of the rider candidate (vehicle), the subject (rider)
///         and the guard item (helmet).
///     association_radius : f32
///         Maximum centroid distance between a candidate and its rider.
///     guard_radius : f32
///         Maximum centroid distance between a rider and a guard item.
/// ```
///
/// Association is first-match in input order, not nearest-match: the first
/// subject within `association_radius` becomes the rider, even when a closer
/// one follows. Candidates without a rider are skipped.
///
#[derive(Debug, Clone)]
pub struct HelmetRule {
    roles: Roles,
    association_radius: f32,
    guard_radius: f32,
    confidence_mode: ConfidenceMode,
    placeholder_confidence: f32,
}

impl HelmetRule {
    pub fn new(roles: Roles) -> Self {
        Self {
            roles,
            association_radius: DEFAULT_ASSOCIATION_RADIUS,
            guard_radius: DEFAULT_GUARD_RADIUS,
            confidence_mode: ConfidenceMode::Placeholder,
            placeholder_confidence: DEFAULT_PLACEHOLDER_CONFIDENCE,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            roles: config.roles.clone(),
            association_radius: config.association.association_radius,
            guard_radius: config.association.guard_radius,
            confidence_mode: config.association.confidence_mode,
            placeholder_confidence: config.association.placeholder_confidence,
        }
    }

    pub fn with_radii(mut self, association_radius: f32, guard_radius: f32) -> Self {
        self.association_radius = association_radius;
        self.guard_radius = guard_radius;
        self
    }

    pub fn with_confidence_mode(mut self, mode: ConfidenceMode) -> Self {
        self.confidence_mode = mode;
        self
    }

    fn find_rider<'a>(&self, candidate: &Detection, frame: &'a Frame) -> Option<&'a Detection> {
        frame
            .detections
            .iter()
            .filter(|d| d.is_class(&self.roles.subject))
            .find(|subject| within_radius(
                candidate.bbox.centroid_distance(&subject.bbox),
                self.association_radius,
            ))
    }

    fn is_guarded(&self, rider: &Detection, frame: &Frame) -> bool {
        frame
            .of_class(&self.roles.guard)
            .any(|guard| within_radius(
                rider.bbox.centroid_distance(&guard.bbox),
                self.guard_radius,
            ))
    }

    fn describe(&self, check: GuardCheck) -> String {
        let vehicle = capitalize(&self.roles.rider_candidate);

        match check {
            GuardCheck::NoGuardFound => format!("{} rider without {} detected", vehicle, self.roles.guard),
            GuardCheck::NotChecked => format!("{} rider detected; {} check unavailable", vehicle, self.roles.guard),
        }
    }
}

impl Default for HelmetRule {
    fn default() -> Self {
        Self::new(Roles::default())
    }
}

impl Rule for HelmetRule {
    fn name(&self) -> &'static str {
        "helmet"
    }

    fn evaluate(&self, frame: &Frame) -> Vec<ViolationEvent> {
        let checked = frame.guard.is_checked();
        let mut events = vec![];

        if !checked {
            log::warn!("{} capability unavailable, skipping compliance check", self.roles.guard);
        }

        for candidate in frame.of_class(&self.roles.rider_candidate) {
            let rider = match self.find_rider(candidate, frame) {
                Some(rider) => rider,
                None => {
                    log::debug!("{} at {:?} has no rider", self.roles.rider_candidate, candidate.bbox.to_array());
                    continue;
                }
            };

            if checked && self.is_guarded(rider, frame) {
                continue;
            }

            let guard_check = if checked { GuardCheck::NoGuardFound } else { GuardCheck::NotChecked };

            events.push(ViolationEvent {
                kind: ViolationKind::HelmetlessDriving,
                subject_bbox: candidate.bbox,
                confidence: self.confidence_mode.resolve(
                    self.placeholder_confidence,
                    &[candidate.confidence, rider.confidence],
                ),
                description: self.describe(guard_check),
                guard_check,
            });
        }

        events
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::GuardCapability;
    use crate::geometry::BBox;

    fn centered(class: &str, cx: f32, cy: f32) -> Detection {
        Detection::new(class, 0.9, BBox::ltrb(cx - 10.0, cy - 10.0, cx + 10.0, cy + 10.0))
    }

    #[test]
    fn unhelmeted_rider_is_flagged() {
        let moto = centered("motorcycle", 0.0, 0.0);
        let frame = Frame::new(vec![moto.clone(), centered("person", 10.0, 10.0)]);

        let events = HelmetRule::default().evaluate(&frame);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ViolationKind::HelmetlessDriving);
        assert_eq!(events[0].subject_bbox, moto.bbox);
        assert_eq!(events[0].confidence, 0.8);
        assert_eq!(events[0].description, "Motorcycle rider without helmet detected");
        assert_eq!(events[0].guard_check, GuardCheck::NoGuardFound);
    }

    #[test]
    fn helmet_near_rider_is_compliant() {
        let frame = Frame::new(vec![
            centered("motorcycle", 0.0, 0.0),
            centered("person", 10.0, 10.0),
            centered("helmet", 10.0, 40.0),
        ]);

        assert!(HelmetRule::default().evaluate(&frame).is_empty());
    }

    #[test]
    fn helmet_out_of_guard_radius_does_not_count() {
        let frame = Frame::new(vec![
            centered("motorcycle", 0.0, 0.0),
            centered("person", 10.0, 10.0),
            centered("helmet", 10.0, 60.0),
        ]);

        assert_eq!(HelmetRule::default().evaluate(&frame).len(), 1);
    }

    #[test]
    fn no_subjects_means_no_events() {
        let frame = Frame::new(vec![
            centered("motorcycle", 0.0, 0.0),
            centered("motorcycle", 300.0, 0.0),
            centered("car", 5.0, 5.0),
        ]);

        assert!(HelmetRule::default().evaluate(&frame).is_empty());
    }

    #[test]
    fn rider_is_first_match_not_nearest() {
        // The far person (distance 90) comes first and becomes the rider; the
        // helmet sits on the nearer person only.
        let frame = Frame::new(vec![
            centered("motorcycle", 0.0, 0.0),
            centered("person", 90.0, 0.0),
            centered("person", 5.0, 0.0),
            centered("helmet", 5.0, 0.0),
        ]);

        assert_eq!(HelmetRule::default().evaluate(&frame).len(), 1);
    }

    #[test]
    fn events_follow_candidate_order() {
        let frame = Frame::new(vec![
            centered("motorcycle", 500.0, 0.0),
            centered("motorcycle", 0.0, 0.0),
            centered("person", 0.0, 0.0),
            centered("person", 500.0, 0.0),
        ]);

        let events = HelmetRule::default().evaluate(&frame);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].subject_bbox.centroid().x, 500.0);
        assert_eq!(events[1].subject_bbox.centroid().x, 0.0);
    }

    #[test]
    fn unavailable_guard_flags_every_rider_as_not_checked() {
        let frame = Frame::with_guard(
            vec![
                centered("motorcycle", 0.0, 0.0),
                centered("person", 10.0, 10.0),
                centered("helmet", 10.0, 10.0),
            ],
            GuardCapability::Unavailable,
        );

        let events = HelmetRule::default().evaluate(&frame);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].guard_check, GuardCheck::NotChecked);
        assert_eq!(events[0].description, "Motorcycle rider detected; helmet check unavailable");
    }

    #[test]
    fn ran_empty_guard_is_checked_and_failed() {
        let frame = Frame::with_guard(
            vec![centered("motorcycle", 0.0, 0.0), centered("person", 10.0, 10.0)],
            GuardCapability::RanEmpty,
        );

        let events = HelmetRule::default().evaluate(&frame);

        assert_eq!(events[0].guard_check, GuardCheck::NoGuardFound);
    }

    #[test]
    fn confidence_derived_from_contributors() {
        let mut moto = centered("motorcycle", 0.0, 0.0);
        moto.confidence = 0.6;
        let frame = Frame::new(vec![moto, centered("person", 10.0, 10.0)]);

        let rule = HelmetRule::default().with_confidence_mode(ConfidenceMode::Min);

        assert_eq!(rule.evaluate(&frame)[0].confidence, 0.6);
    }

    #[test]
    fn custom_radii_and_roles() {
        let roles = Roles {
            rider_candidate: "bicycle".to_string(),
            subject: "person".to_string(),
            guard: "helmet".to_string(),
        };
        let frame = Frame::new(vec![centered("bicycle", 0.0, 0.0), centered("person", 30.0, 0.0)]);

        assert!(HelmetRule::new(roles.clone()).with_radii(20.0, 10.0).evaluate(&frame).is_empty());

        let events = HelmetRule::new(roles).evaluate(&frame);

        assert_eq!(events[0].description, "Bicycle rider without helmet detected");
    }

    #[test]
    fn non_finite_geometry_never_associates() {
        let rogue = Detection::new("person", 0.9, BBox::ltrb(f32::NAN, 0.0, 1.0, 1.0));
        let frame = Frame::new(vec![centered("motorcycle", 0.0, 0.0), rogue]);

        assert!(HelmetRule::default().evaluate(&frame).is_empty());
    }
}
