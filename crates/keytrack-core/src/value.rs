//! Animatable value types and their scalar channel decomposition.
//!
//! Compound types animate as one curve per channel; `Animatable` defines how
//! a value splits into scalars and reassembles from them.

use serde::{Deserialize, Serialize};

/// Upper bound on `Animatable::CHANNELS` across provided implementations.
pub const MAX_CHANNELS: usize = 4;

/// 2D vector (x - position, y - value in curve space; general-purpose
/// elsewhere).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// RGBA color (linear by convention).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }
}

/// Decomposes a compound value into scalar channels and reassembles it.
pub trait Animatable: Copy + PartialEq + std::fmt::Debug + 'static {
    /// Number of scalar channels (at most [`MAX_CHANNELS`]).
    const CHANNELS: usize;

    /// Returns channel `idx` (0-based, `idx < CHANNELS`).
    fn channel(&self, idx: usize) -> f32;

    /// Rebuilds a value from exactly `CHANNELS` scalars.
    fn assemble(channels: &[f32]) -> Self;
}

impl Animatable for f32 {
    const CHANNELS: usize = 1;

    fn channel(&self, _idx: usize) -> f32 {
        *self
    }

    fn assemble(channels: &[f32]) -> Self {
        debug_assert_eq!(channels.len(), 1);
        channels[0]
    }
}

impl Animatable for Vec2 {
    const CHANNELS: usize = 2;

    fn channel(&self, idx: usize) -> f32 {
        match idx {
            0 => self.x,
            _ => self.y,
        }
    }

    fn assemble(channels: &[f32]) -> Self {
        debug_assert_eq!(channels.len(), 2);
        Vec2::new(channels[0], channels[1])
    }
}

impl Animatable for Color {
    const CHANNELS: usize = 4;

    fn channel(&self, idx: usize) -> f32 {
        match idx {
            0 => self.r,
            1 => self.g,
            2 => self.b,
            _ => self.a,
        }
    }

    fn assemble(channels: &[f32]) -> Self {
        debug_assert_eq!(channels.len(), 4);
        Color::new(channels[0], channels[1], channels[2], channels[3])
    }
}
