use ndarray::prelude::*;

use crate::geometry::{BBox, Ltrb};

/// Computes intersection over union of two boxes.
///
/// Returns `0.0` for disjoint boxes and whenever the union area is not a
/// positive finite number, so degenerate boxes never divide by zero.
pub fn iou(a: &BBox<Ltrb>, b: &BBox<Ltrb>) -> f32 {
    let i_xmin = a.left().max(b.left());
    let i_ymin = a.top().max(b.top());

    let i_xmax = a.right().min(b.right());
    let i_ymax = a.bottom().min(b.bottom());

    let intersection_area = (i_xmax - i_xmin).max(0.0) * (i_ymax - i_ymin).max(0.0);
    let union_area = a.area() + b.area() - intersection_area;

    if union_area <= 0.0 || !union_area.is_finite() || !intersection_area.is_finite() {
        return 0.0;
    }

    intersection_area / union_area
}

/// Computes intersection over union between `bbox` and every candidate.
/// Parameters
/// ----------
/// bbox : A bounding box in format `(x_min, y_min, x_max, y_max)`.
/// candidates : Candidate bounding boxes in the same format as `bbox`.
/// Returns
/// -------
/// Array1<f32>
///     The intersection over union in [0, 1] between `bbox` and each
///     candidate, in candidate order.
pub fn iou_batch(bbox: &BBox<Ltrb>, candidates: &[BBox<Ltrb>]) -> Array1<f32> {
    candidates
        .iter()
        .map(|c| iou(bbox, c))
        .collect()
}
