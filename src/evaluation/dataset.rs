//! COCO-like ground truth and prediction files.
//!
//! Ground truth: `{"images": [...], "annotations": [{"image_id", "bbox": [x, y, w, h], "category_id"}]}`.
//! Predictions: `[{"image_id", "bbox": [x, y, w, h], "score", "category_id"}]`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detection::{Annotation, CategoryId, ImageId, Prediction};
use crate::error::{Error, Result};
use crate::geometry::BBox;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: ImageId,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub image_id: ImageId,
    pub bbox: [f32; 4],
    pub category_id: CategoryId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoGroundTruth {
    #[serde(default)]
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoPrediction {
    pub image_id: ImageId,
    pub bbox: [f32; 4],
    #[serde(default)]
    pub score: Option<f32>,
    pub category_id: CategoryId,
}

impl CocoGroundTruth {
    pub fn into_annotations(self) -> Result<Vec<Annotation>> {
        self.annotations
            .into_iter()
            .map(|a| {
                let [x, y, w, h] = a.bbox;
                Annotation::from_ltwh(a.image_id, a.category_id, BBox::ltwh(x, y, w, h))
            })
            .collect()
    }
}

pub fn parse_annotations(raw: &str) -> Result<Vec<Annotation>> {
    let gt: CocoGroundTruth = serde_json::from_str(raw)?;
    gt.into_annotations()
}

pub fn parse_predictions(raw: &str) -> Result<Vec<Prediction>> {
    let preds: Vec<CocoPrediction> = serde_json::from_str(raw)?;

    preds
        .into_iter()
        .map(|p| {
            let [x, y, w, h] = p.bbox;
            Prediction::from_ltwh(p.image_id, p.category_id, p.score, BBox::ltwh(x, y, w, h))
        })
        .collect()
}

pub fn load_annotations(path: &Path) -> Result<Vec<Annotation>> {
    parse_annotations(&read(path)?)
}

pub fn load_predictions(path: &Path) -> Result<Vec<Prediction>> {
    parse_predictions(&read(path)?)
}

fn read(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)?;

    if raw.trim().is_empty() {
        return Err(Error::InputMissing(format!("{} is empty", path.display())));
    }

    Ok(raw)
}
