pub mod association;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod evaluation;
pub mod geometry;
pub mod report;


pub use association::{AssociationEngine, Frame, GuardCapability, Rule, ViolationEvent, ViolationKind};
pub use config::Config;
pub use detection::{Annotation, Detection, Prediction, RawDetection};
pub use detector::{Detector, FrameRef, ReplayDetector};
pub use error::{Error, Result};
pub use evaluation::{Evaluation, EvaluationSummary, Evaluator, MatchStrategy};
pub use report::DetectionReport;

///
/// Live path: runs the detector handles on a frame, infers violations and
/// builds the frame's report.
///
/// The primary detector supplies every role. An optional guard detector
/// supplies guard items on its own; when it is configured its output is
/// relabelled to the guard role, otherwise guard items come from the primary
/// detector. A guard detector that fails on a frame leaves the guard check
/// unavailable for that frame.
///
pub struct Analyzer {
    config: Config,
    engine: AssociationEngine,
    primary: Box<dyn Detector>,
    guard: Option<Box<dyn Detector>>,
}

impl Analyzer {
    pub fn new(config: Config, primary: Box<dyn Detector>, guard: Option<Box<dyn Detector>>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            engine: AssociationEngine::from_config(&config),
            config,
            primary,
            guard,
        })
    }

    /// Replaces the rule set run on every frame.
    pub fn with_engine(mut self, engine: AssociationEngine) -> Self {
        self.engine = engine;
        self
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn analyze(&mut self, frame: &FrameRef<'_>) -> Result<DetectionReport> {
        if frame.is_empty() {
            return Err(Error::InputMissing("no frame supplied".to_string()));
        }

        let detections = detection::ingest_all(&self.primary.detect(frame)?)?;

        let (guards, capability) = match self.guard.as_mut() {
            None => {
                let label = &self.config.roles.guard;
                let capability = if detections.iter().any(|d| d.is_class(label)) {
                    GuardCapability::Available
                } else {
                    GuardCapability::RanEmpty
                };

                (vec![], capability)
            }
            Some(guard) => match guard.detect(frame).and_then(|raw| detection::ingest_all(&raw)) {
                Ok(found) => {
                    let capability = if found.is_empty() {
                        GuardCapability::RanEmpty
                    } else {
                        GuardCapability::Available
                    };

                    let label = &self.config.roles.guard;
                    let found: Vec<_> = found
                        .into_iter()
                        .map(|d| Detection::new(label.as_str(), d.confidence, d.bbox))
                        .collect();

                    (found, capability)
                }
                Err(err) => {
                    log::warn!(
                        "guard detector '{}' failed on frame '{}', skipping guard check: {}",
                        guard.name(),
                        frame.id,
                        err
                    );

                    (vec![], GuardCapability::Unavailable)
                }
            },
        };

        self.report(frame.id, detections, guards, capability)
    }

    /// Same as [`Analyzer::analyze`] with the guard capability forced to
    /// unavailable, for callers whose guard detector failed to load.
    pub fn analyze_without_guard(&mut self, frame: &FrameRef<'_>) -> Result<DetectionReport> {
        if frame.is_empty() {
            return Err(Error::InputMissing("no frame supplied".to_string()));
        }

        let detections = detection::ingest_all(&self.primary.detect(frame)?)?;

        self.report(frame.id, detections, vec![], GuardCapability::Unavailable)
    }

    fn report(
        &self,
        frame_id: &str,
        detections: Vec<Detection>,
        guards: Vec<Detection>,
        capability: GuardCapability,
    ) -> Result<DetectionReport> {
        let primary_count = detections.len();
        let mut all = detections;
        all.extend(guards);

        let frame = Frame::with_guard(all, capability);
        let events = self.engine.infer(&frame);

        let report = DetectionReport::build(
            &frame.detections[..primary_count],
            &events,
            &self.config.report.vehicle_classes,
        );

        log::info!(
            "frame '{}': {} detection(s), {} vehicle(s), {} violation(s), guard {:?}",
            frame_id,
            primary_count,
            report.total_vehicles,
            report.total_violations,
            capability,
        );

        Ok(report)
    }

    /// Releases every detector handle.
    pub fn release(mut self) {
        self.primary.release();

        if let Some(guard) = self.guard.as_mut() {
            guard.release();
        }
    }
}
