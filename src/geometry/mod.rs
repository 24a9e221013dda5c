pub mod iou;

pub use iou::{iou, iou_batch};

use core::marker::PhantomData;
use ndarray::prelude::*;

use crate::error::Error;

pub trait BBoxFormat: std::fmt::Debug {}

/// `(left, top, width, height)`, the form datasets and predictions arrive in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// `(x_min, y_min, x_max, y_max)`, the form all geometry math runs on.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance. May be non-finite when either point is.
    #[inline]
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;

        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);
impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_view(&self) -> ArrayView1<'_, f32> {
        aview1(&self.0)
    }

    #[inline]
    pub fn to_array(&self) -> [f32; 4] {
        self.0
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl BBox<Ltwh> {
    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    #[inline]
    pub fn ltwh(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox(
            [x1, x2, x3, x4],
            Default::default(),
        )
    }

    /// Checked conversion into `Ltrb`.
    ///
    /// Negative extents are folded into the equivalent rectangle; any
    /// non-finite component is rejected.
    pub fn try_into_ltrb(&self) -> Result<BBox<Ltrb>, Error> {
        if !self.is_finite() {
            return Err(Error::MalformedGeometry(format!("non-finite ltwh box {:?}", self.0)));
        }

        BBox::try_ltrb(
            self.left(),
            self.top(),
            self.left() + self.width(),
            self.top() + self.height(),
        )
    }
}

impl BBox<Ltrb> {
    /// Unchecked constructor. Values coming from outside the crate should go
    /// through [`BBox::try_ltrb`].
    #[inline]
    pub fn ltrb(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox(
            [x1, x2, x3, x4],
            Default::default(),
        )
    }

    /// Validating constructor: swaps inverted corners and rejects
    /// non-finite coordinates, so `left <= right` and `top <= bottom` hold.
    pub fn try_ltrb(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self, Error> {
        let bbox = Self::ltrb(x1, y1, x2, y2);

        if !bbox.is_finite() {
            return Err(Error::MalformedGeometry(format!("non-finite ltrb box {:?}", bbox.0)));
        }

        if x1 > x2 || y1 > y2 {
            log::debug!("normalizing inverted box {:?}", bbox.0);
        }

        Ok(Self::ltrb(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)))
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    /// Area, clamped at zero for degenerate or inverted boxes.
    #[inline]
    pub fn area(&self) -> f32 {
        (self.right() - self.left()).max(0.0) * (self.bottom() - self.top()).max(0.0)
    }

    #[inline]
    pub fn centroid(&self) -> Point {
        Point::new(
            (self.left() + self.right()) / 2.0,
            (self.top() + self.bottom()) / 2.0,
        )
    }

    #[inline]
    pub fn centroid_distance(&self, other: &BBox<Ltrb>) -> f32 {
        self.centroid().distance(&other.centroid())
    }
}

impl <'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self([
            v.0[0],
            v.0[1],
            v.0[2] + v.0[0],
            v.0[3] + v.0[1],
        ], Default::default())
    }
}

impl <'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self([
            v.0[0],
            v.0[1],
            v.0[2] - v.0[0],
            v.0[3] - v.0[1],
        ], Default::default())
    }
}

/// Returns true only when `distance` is a real number strictly below `radius`.
#[inline]
pub fn within_radius(distance: f32, radius: f32) -> bool {
    distance.is_finite() && distance < radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ltwh_converts_to_corners() {
        let b = BBox::ltwh(10.0, 20.0, 30.0, 40.0).as_ltrb();

        assert_eq!(b.to_array(), [10.0, 20.0, 40.0, 60.0]);
        assert_eq!(b.as_ltwh().to_array(), [10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn centroid_and_distance() {
        let a = BBox::ltrb(-10.0, -10.0, 10.0, 10.0);
        let b = BBox::ltrb(0.0, 0.0, 20.0, 20.0);

        assert_eq!(a.centroid(), Point::new(0.0, 0.0));
        assert!((a.centroid_distance(&b) - 200f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn try_ltrb_swaps_inverted_corners() {
        let b = BBox::try_ltrb(50.0, 60.0, 10.0, 20.0).unwrap();

        assert_eq!(b.to_array(), [10.0, 20.0, 50.0, 60.0]);
    }

    #[test]
    fn try_ltrb_rejects_non_finite() {
        assert!(matches!(
            BBox::try_ltrb(0.0, f32::NAN, 1.0, 1.0),
            Err(Error::MalformedGeometry(_))
        ));
        assert!(BBox::try_ltrb(0.0, 0.0, f32::INFINITY, 1.0).is_err());
        assert!(BBox::ltwh(0.0, 0.0, f32::NAN, 1.0).try_into_ltrb().is_err());
    }

    #[test]
    fn negative_extent_is_folded() {
        let b = BBox::ltwh(10.0, 10.0, -5.0, -5.0).try_into_ltrb().unwrap();

        assert_eq!(b.to_array(), [5.0, 5.0, 10.0, 10.0]);
    }

    #[test]
    fn zero_area_box_is_legal() {
        let b = BBox::try_ltrb(3.0, 3.0, 3.0, 3.0).unwrap();

        assert_eq!(b.area(), 0.0);
        assert_eq!(b.centroid(), Point::new(3.0, 3.0));
    }

    #[test]
    fn non_finite_distance_is_never_within() {
        assert!(within_radius(14.1, 100.0));
        assert!(!within_radius(100.0, 100.0));
        assert!(!within_radius(f32::NAN, 100.0));
        assert!(!within_radius(f32::INFINITY, f32::INFINITY));
    }
}
