//! Curve key: one control point with two Bezier supports and a cached
//! per-segment approximation table.

use serde::{Deserialize, Serialize};

use crate::value::Vec2;

/// Number of approximated points cached for the segment to the next key.
pub const APPROX_SAMPLES: usize = 20;

/// Axis-aligned bounds of a segment's approximated points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Rect {
    /// Degenerate rect covering a single point.
    pub fn point(x: f32, y: f32) -> Self {
        Self {
            left: x,
            bottom: y,
            right: x,
            top: y,
        }
    }

    pub fn expand(&mut self, x: f32, y: f32) {
        self.left = self.left.min(x);
        self.right = self.right.max(x);
        self.bottom = self.bottom.min(y);
        self.top = self.top.max(y);
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }
}

/// Support point behavior for a key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportsType {
    /// Supports follow the averaged neighbor tangent; recomputed after any
    /// structural change around the key.
    #[default]
    Smooth,
    /// Horizontal tangent.
    Flat,
    /// Hand-placed supports, left alone by the smoothing pass.
    Free,
    /// Zero-length supports; the segment is a straight line.
    Linear,
    /// Left and right supports move independently.
    Broken,
    /// Hold this key's value until the next key (step).
    Discrete,
}

/// One control point of a curve. Support offsets are relative to the key's
/// own value/position; the left support must lie at or before the key in
/// time and the right support at or after it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Key {
    /// Unique id within a curve; 0 means "unassigned, allocate on insert".
    #[serde(default)]
    pub uid: u64,
    pub position: f32,
    pub value: f32,
    #[serde(default)]
    pub left_support_value: f32,
    #[serde(default)]
    pub left_support_position: f32,
    #[serde(default)]
    pub right_support_value: f32,
    #[serde(default)]
    pub right_support_position: f32,
    #[serde(default)]
    pub supports: SupportsType,

    // Derived data, rebuilt by Curve::update_approximation.
    #[serde(skip)]
    pub(crate) approx: [Vec2; APPROX_SAMPLES],
    #[serde(skip)]
    pub(crate) approx_bounds: Rect,
}

impl Key {
    /// Key with zero-length supports, tagged `Smooth` so it picks up
    /// neighbor-derived supports on the next smoothing pass.
    pub fn new(position: f32, value: f32) -> Self {
        Self {
            uid: 0,
            position,
            value,
            left_support_value: 0.0,
            left_support_position: 0.0,
            right_support_value: 0.0,
            right_support_position: 0.0,
            supports: SupportsType::Smooth,
            approx: [Vec2::default(); APPROX_SAMPLES],
            approx_bounds: Rect::default(),
        }
    }

    /// Explicit 6-value Bezier form; supports are clamped to their own side
    /// of the key. Tagged `Free` so the smoothing pass leaves it alone.
    pub fn with_supports(
        position: f32,
        value: f32,
        left_support_value: f32,
        left_support_position: f32,
        right_support_value: f32,
        right_support_position: f32,
    ) -> Self {
        let mut key = Self::new(position, value);
        key.left_support_value = left_support_value;
        key.left_support_position = left_support_position.min(0.0);
        key.right_support_value = right_support_value;
        key.right_support_position = right_support_position.max(0.0);
        key.supports = SupportsType::Free;
        key
    }

    /// Key with a horizontal tangent.
    pub fn flat(position: f32, value: f32) -> Self {
        let mut key = Self::new(position, value);
        key.supports = SupportsType::Flat;
        key
    }

    /// Key whose value holds until the next key.
    pub fn discrete(position: f32, value: f32) -> Self {
        let mut key = Self::new(position, value);
        key.supports = SupportsType::Discrete;
        key
    }

    /// Zero-length supports; the outgoing segment is a straight line.
    pub fn linear(position: f32, value: f32) -> Self {
        let mut key = Self::new(position, value);
        key.supports = SupportsType::Linear;
        key
    }

    /// Cached (position, value) samples for the segment to the next key.
    pub fn approximated_points(&self) -> &[Vec2] {
        &self.approx
    }

    /// Bounds of the cached samples.
    pub fn approximated_bounds(&self) -> &Rect {
        &self.approx_bounds
    }
}

// Equality ignores the derived approximation table.
impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.position == other.position
            && self.value == other.value
            && self.left_support_value == other.left_support_value
            && self.left_support_position == other.left_support_position
            && self.right_support_value == other.right_support_value
            && self.right_support_position == other.right_support_position
            && self.supports == other.supports
    }
}
