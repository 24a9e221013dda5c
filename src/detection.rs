use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{BBox, Ltrb, Ltwh};

pub type ImageId = u64;
pub type CategoryId = u32;

///
/// This class represents a bounding box detection in a single image.
/// Parameters
///
/// class_label : String - Class name from the detector vocabulary.
/// confidence : f32 - Detector confidence score in `[0, 1]`.
/// bbox : BBox in format `(x_min, y_min, x_max, y_max)`, pixel coordinates.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_label: String,
    pub confidence: f32,
    pub bbox: BBox<Ltrb>,
}

impl Detection {
    pub fn new<S: Into<String>>(class_label: S, confidence: f32, bbox: BBox<Ltrb>) -> Self {
        Self {
            class_label: class_label.into(),
            confidence,
            bbox,
        }
    }

    #[inline]
    pub fn is_class(&self, label: &str) -> bool {
        self.class_label == label
    }
}

/// Detector output as it crosses the boundary: `{class, confidence, bbox:[x1,y1,x2,y2]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(rename = "class")]
    pub class_label: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

impl RawDetection {
    /// Normalizes one detector output into a [`Detection`].
    ///
    /// Finite confidences are clamped into `[0, 1]`; non-finite confidences
    /// and coordinates are rejected.
    pub fn ingest(&self) -> Result<Detection> {
        if !self.confidence.is_finite() {
            return Err(Error::MalformedGeometry(format!(
                "non-finite confidence {} for class '{}'",
                self.confidence, self.class_label
            )));
        }

        let [x1, y1, x2, y2] = self.bbox;

        Ok(Detection {
            class_label: self.class_label.clone(),
            confidence: self.confidence.max(0.0).min(1.0),
            bbox: BBox::try_ltrb(x1, y1, x2, y2)?,
        })
    }
}

pub fn ingest_all(raw: &[RawDetection]) -> Result<Vec<Detection>> {
    raw.iter().map(RawDetection::ingest).collect()
}

/// A ground-truth box of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub image_id: ImageId,
    pub category: CategoryId,
    pub bbox: BBox<Ltrb>,
}

impl Annotation {
    pub fn from_ltwh(image_id: ImageId, category: CategoryId, bbox: BBox<Ltwh>) -> Result<Self> {
        Ok(Self {
            image_id,
            category,
            bbox: bbox.try_into_ltrb()?,
        })
    }
}

/// A detector output scored against [`Annotation`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub image_id: ImageId,
    pub category: CategoryId,
    pub score: Option<f32>,
    pub bbox: BBox<Ltrb>,
}

impl Prediction {
    pub fn from_ltwh(
        image_id: ImageId,
        category: CategoryId,
        score: Option<f32>,
        bbox: BBox<Ltwh>,
    ) -> Result<Self> {
        Ok(Self {
            image_id,
            category,
            score,
            bbox: bbox.try_into_ltrb()?,
        })
    }
}
