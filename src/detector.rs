use std::collections::HashMap;
use std::path::Path;

use crate::detection::RawDetection;
use crate::error::{Error, Result};

/// One frame handed to a detector. `id` names the frame for detectors that
/// look it up; `pixels` carries image data for detectors that run inference.
#[derive(Debug, Clone, Copy)]
pub struct FrameRef<'a> {
    pub id: &'a str,
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
}

impl<'a> FrameRef<'a> {
    pub fn by_id(id: &'a str) -> Self {
        Self {
            id,
            pixels: &[],
            width: 0,
            height: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.pixels.is_empty()
    }
}

/// Handle to an external object detector.
///
/// Construction loads the detector, `detect` runs it and `release` frees
/// whatever it holds. Handles are owned by their caller and never shared
/// through global state.
pub trait Detector: Send {
    /// Detector identifier.
    fn name(&self) -> &str;

    /// Runs the detector on one frame.
    fn detect(&mut self, frame: &FrameRef<'_>) -> Result<Vec<RawDetection>>;

    /// Frees the detector's resources. Calls after release may fail.
    fn release(&mut self) {}
}

/// Serves detector output recorded ahead of time, keyed by frame id.
///
/// File shape: `{"<frame id>": [{"class", "confidence", "bbox": [x1, y1, x2, y2]}]}`.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    name: String,
    frames: HashMap<String, Vec<RawDetection>>,
    released: bool,
}

impl ReplayDetector {
    pub fn new<S: Into<String>>(name: S, frames: HashMap<String, Vec<RawDetection>>) -> Self {
        Self {
            name: name.into(),
            frames,
            released: false,
        }
    }

    pub fn from_json<S: Into<String>>(name: S, raw: &str) -> Result<Self> {
        Ok(Self::new(name, serde_json::from_str(raw)?))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "replay".to_string());

        Self::from_json(name, &raw)
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl Detector for ReplayDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&mut self, frame: &FrameRef<'_>) -> Result<Vec<RawDetection>> {
        if self.released {
            return Err(Error::InputMissing(format!("detector '{}' was released", self.name)));
        }

        self.frames
            .get(frame.id)
            .cloned()
            .ok_or_else(|| Error::InputMissing(format!(
                "detector '{}' has no output for frame '{}'",
                self.name, frame.id
            )))
    }

    fn release(&mut self) {
        self.frames.clear();
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDED: &str = r#"{
        "frame-1": [{"class": "person", "confidence": 0.9, "bbox": [0, 0, 10, 10]}],
        "frame-2": []
    }"#;

    #[test]
    fn replays_recorded_frames() {
        let mut detector = ReplayDetector::from_json("yolo", RECORDED).unwrap();

        assert_eq!(detector.name(), "yolo");
        assert_eq!(detector.frame_count(), 2);
        assert_eq!(detector.detect(&FrameRef::by_id("frame-1")).unwrap().len(), 1);
        assert!(detector.detect(&FrameRef::by_id("frame-2")).unwrap().is_empty());
    }

    #[test]
    fn unknown_frame_is_input_missing() {
        let mut detector = ReplayDetector::from_json("yolo", RECORDED).unwrap();

        assert!(matches!(
            detector.detect(&FrameRef::by_id("frame-9")),
            Err(Error::InputMissing(_))
        ));
    }

    #[test]
    fn released_detector_refuses_work() {
        let mut detector = ReplayDetector::from_json("yolo", RECORDED).unwrap();
        detector.release();

        assert!(detector.detect(&FrameRef::by_id("frame-1")).is_err());
    }

    #[test]
    fn empty_frame() {
        assert!(FrameRef::by_id("").is_empty());
        assert!(!FrameRef::by_id("a").is_empty());
    }
}
