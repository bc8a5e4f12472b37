//! Typed multi-channel animated values.
//!
//! An `AnimatedValue<T>` keeps one [`Curve`] per scalar channel of `T` and
//! edits them in lockstep, so compound types (vectors, colors) stay keyed
//! together by default. Per-channel curves remain reachable for advanced
//! editing. When bound, evaluation writes the assembled value through the
//! sink.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::binding::{DirectSink, ErasedSink, ProxySink, ValueSink};
use crate::curve::Curve;
use crate::error::CurveError;
use crate::value::{Animatable, MAX_CHANNELS};

/// One lockstep key across all channels of `T`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypedKey<T> {
    pub position: f32,
    pub value: T,
}

impl<T> TypedKey<T> {
    pub fn new(position: f32, value: T) -> Self {
        Self { position, value }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(
    from = "AnimatedValueData",
    into = "AnimatedValueData",
    bound(serialize = "", deserialize = "")
)]
pub struct AnimatedValue<T: Animatable> {
    curves: Vec<Curve>,
    sink: Option<Box<dyn ValueSink<T>>>,
}

/// Serialized form: channel curves only. The curve count is normalized to
/// `T::CHANNELS` on load, so hand-edited documents cannot desync the
/// lockstep layout.
#[derive(Clone, Serialize, Deserialize)]
struct AnimatedValueData {
    curves: Vec<Curve>,
}

impl<T: Animatable> From<AnimatedValueData> for AnimatedValue<T> {
    fn from(data: AnimatedValueData) -> Self {
        let mut curves = data.curves;
        curves.truncate(T::CHANNELS);
        while curves.len() < T::CHANNELS {
            curves.push(Curve::new());
        }
        Self { curves, sink: None }
    }
}

impl<T: Animatable> From<AnimatedValue<T>> for AnimatedValueData {
    fn from(value: AnimatedValue<T>) -> Self {
        Self {
            curves: value.curves,
        }
    }
}

impl<T: Animatable> Default for AnimatedValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Animatable> AnimatedValue<T> {
    pub fn new() -> Self {
        Self {
            curves: (0..T::CHANNELS).map(|_| Curve::new()).collect(),
            sink: None,
        }
    }

    // ---- factories --------------------------------------------------------

    /// 2-key animated value from `begin` to `end` over `duration`, with raw
    /// CSS-style cubic-bezier control of the transition.
    pub fn parametric(
        begin: T,
        end: T,
        duration: f32,
        begin_coef: f32,
        begin_coef_position: f32,
        end_coef: f32,
        end_coef_position: f32,
    ) -> Self {
        let mut out = Self::new();
        for (ch, curve) in out.curves.iter_mut().enumerate() {
            let b = begin.channel(ch);
            let span = end.channel(ch) - b;
            let k0 = crate::key::Key::with_supports(
                0.0,
                b,
                0.0,
                0.0,
                begin_coef * span,
                begin_coef_position * duration,
            );
            let k1 = crate::key::Key::with_supports(
                duration,
                end.channel(ch),
                (end_coef - 1.0) * span,
                (end_coef_position - 1.0) * duration,
                0.0,
                0.0,
            );
            *curve = Curve::from_keys(vec![k0, k1]);
        }
        out
    }

    pub fn ease_in(begin: T, end: T, duration: f32) -> Self {
        Self::parametric(begin, end, duration, 0.0, 0.42, 1.0, 1.0)
    }

    pub fn ease_out(begin: T, end: T, duration: f32) -> Self {
        Self::parametric(begin, end, duration, 0.0, 0.0, 1.0, 0.58)
    }

    pub fn ease_in_out(begin: T, end: T, duration: f32) -> Self {
        Self::parametric(begin, end, duration, 0.0, 0.42, 1.0, 0.58)
    }

    pub fn linear(begin: T, end: T, duration: f32) -> Self {
        let mut out = Self::new();
        for (ch, curve) in out.curves.iter_mut().enumerate() {
            *curve = Curve::from_keys(vec![
                crate::key::Key::linear(0.0, begin.channel(ch)),
                crate::key::Key::linear(duration, end.channel(ch)),
            ]);
        }
        out
    }

    // ---- channel access ---------------------------------------------------

    pub fn channels(&self) -> usize {
        T::CHANNELS
    }

    pub fn curve(&self, idx: usize) -> Option<&Curve> {
        self.curves.get(idx)
    }

    /// Per-channel escape hatch; edits made here are picked up by owners
    /// through the channel version counters.
    pub fn curve_mut(&mut self, idx: usize) -> Option<&mut Curve> {
        self.curves.get_mut(idx)
    }

    // ---- key editing (broadcast across channels) --------------------------

    /// Smooth key at `position` with the default coefficient.
    pub fn add_key(&mut self, position: f32, value: T) {
        self.add_smooth_key(position, value, 1.0);
    }

    pub fn add_smooth_key(&mut self, position: f32, value: T, smooth_coef: f32) {
        for (ch, curve) in self.curves.iter_mut().enumerate() {
            curve.insert_smooth_key(position, value.channel(ch), smooth_coef);
        }
    }

    pub fn add_flat_key(&mut self, position: f32, value: T) {
        for (ch, curve) in self.curves.iter_mut().enumerate() {
            curve.insert_flat_key(position, value.channel(ch));
        }
    }

    /// Explicit Bezier form; the same support offsets are applied on every
    /// channel.
    pub fn add_key_supports(
        &mut self,
        position: f32,
        value: T,
        left_support_value: f32,
        left_support_position: f32,
        right_support_value: f32,
        right_support_position: f32,
    ) {
        for (ch, curve) in self.curves.iter_mut().enumerate() {
            curve.insert_key_supports(
                position,
                value.channel(ch),
                left_support_value,
                left_support_position,
                right_support_value,
                right_support_position,
            );
        }
    }

    pub fn add_linear_key(&mut self, position: f32, value: T) {
        for (ch, curve) in self.curves.iter_mut().enumerate() {
            curve.insert_key(crate::key::Key::linear(position, value.channel(ch)));
        }
    }

    pub fn remove_key(&mut self, position: f32) -> bool {
        self.remove_key_within(position, crate::curve::POSITION_EPSILON)
    }

    pub fn remove_key_within(&mut self, position: f32, epsilon: f32) -> bool {
        let mut removed = false;
        for curve in &mut self.curves {
            removed |= curve.remove_key_within(position, epsilon);
        }
        removed
    }

    pub fn remove_all_keys(&mut self) {
        for curve in &mut self.curves {
            curve.remove_all_keys();
        }
    }

    pub fn smooth_key(&mut self, position: f32, smooth_coef: f32) -> bool {
        let mut smoothed = false;
        for curve in &mut self.curves {
            smoothed |= curve.smooth_key(position, smooth_coef);
        }
        smoothed
    }

    /// Replaces all keys with smooth keys at the given positions, batching
    /// each channel so approximation runs once per curve.
    pub fn set_keys(&mut self, keys: &[TypedKey<T>]) -> Result<(), CurveError> {
        for curve in &mut self.curves {
            curve.remove_all_keys();
            curve.begin_keys_batch_change()?;
        }
        for key in keys {
            for (ch, curve) in self.curves.iter_mut().enumerate() {
                curve.insert_smooth_key(key.position, key.value.channel(ch), 1.0);
            }
        }
        for curve in &mut self.curves {
            curve.complete_keys_batch_change()?;
        }
        Ok(())
    }

    /// Lockstep keys, assembled per index across channels.
    pub fn keys(&self) -> Vec<TypedKey<T>> {
        let Some(first) = self.curves.first() else {
            return Vec::new();
        };
        first
            .keys()
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let mut parts = [0.0f32; MAX_CHANNELS];
                for (ch, curve) in self.curves.iter().enumerate() {
                    parts[ch] = curve.keys().get(i).map(|k| k.value).unwrap_or(key.value);
                }
                TypedKey::new(key.position, T::assemble(&parts[..T::CHANNELS]))
            })
            .collect()
    }

    // ---- evaluation / binding ---------------------------------------------

    /// Longest channel length.
    pub fn length(&self) -> f32 {
        self.curves.iter().map(Curve::length).fold(0.0, f32::max)
    }

    /// Combined channel version; changes whenever any channel's keys change.
    pub fn version(&self) -> u64 {
        self.curves
            .iter()
            .fold(0u64, |acc, c| acc.wrapping_add(c.version()))
    }

    /// Evaluates every channel, reassembles `T`, and writes it through the
    /// bound sink if any. Unbound evaluation still returns the value.
    pub fn evaluate(&mut self, position: f32) -> Result<T, CurveError> {
        let mut parts = [0.0f32; MAX_CHANNELS];
        for (ch, curve) in self.curves.iter().enumerate() {
            parts[ch] = curve.evaluate(position)?;
        }
        let value = T::assemble(&parts[..T::CHANNELS]);
        if let Some(sink) = self.sink.as_mut() {
            sink.set(value);
        }
        Ok(value)
    }

    pub fn bind_sink(&mut self, sink: Box<dyn ValueSink<T>>) {
        self.sink = Some(sink);
    }

    /// Binds a resolver-provided sink; comes back unconsumed on a kind
    /// mismatch.
    pub fn bind_erased(&mut self, sink: ErasedSink) -> Result<(), ErasedSink> {
        self.sink = Some(sink.downcast::<T>()?);
        Ok(())
    }

    /// Plain-field binding through a shared cell.
    pub fn bind_direct(&mut self, slot: Rc<Cell<T>>) {
        self.sink = Some(Box::new(DirectSink::new(slot)));
    }

    /// Property binding through a setter closure.
    pub fn bind_proxy(&mut self, setter: Box<dyn FnMut(T)>) {
        self.sink = Some(Box::new(ProxySink::new(setter)));
    }

    pub fn unbind(&mut self) {
        self.sink = None;
    }

    pub fn is_bound(&self) -> bool {
        self.sink.is_some()
    }
}

// Clones carry key data only; bindings are per-instance runtime state and
// must be re-established on the copy.
impl<T: Animatable> Clone for AnimatedValue<T> {
    fn clone(&self) -> Self {
        Self {
            curves: self.curves.clone(),
            sink: None,
        }
    }
}

impl<T: Animatable> PartialEq for AnimatedValue<T> {
    fn eq(&self, other: &Self) -> bool {
        self.curves == other.curves
    }
}

impl<T: Animatable> fmt::Debug for AnimatedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedValue")
            .field("curves", &self.curves)
            .field("bound", &self.is_bound())
            .finish()
    }
}
