//! Bezier-segmented keyframe curve.
//!
//! Model:
//! - Keys are kept sorted ascending by position (stable for ties).
//! - The segment between two consecutive keys is the cubic Bezier
//!   `(A) (A + A.right_support) (B + B.left_support) (B)`.
//! - Each segment is pre-sampled into a fixed table of [`APPROX_SAMPLES`]
//!   points stored on the left key; evaluation is a piecewise-linear lookup
//!   over that table (bounded-error approximation, not analytic solving).
//! - `begin_keys_batch_change`/`complete_keys_batch_change` bracket many
//!   edits so re-approximation runs once instead of per-edit. Evaluating
//!   while a batch is open is an explicit error.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::error::CurveError;
use crate::ids::UidAllocator;
use crate::key::{Key, Rect, SupportsType, APPROX_SAMPLES};
use crate::value::Vec2;

/// Default tolerance used when matching keys by position.
pub const POSITION_EPSILON: f32 = 1e-4;

/// Cubic Bezier basis function.
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "CurveData", into = "CurveData")]
pub struct Curve {
    keys: Vec<Key>,
    uids: UidAllocator,
    batch: bool,
    changed_during_batch: bool,
    // Custom-coefficient smoothings deferred inside a batch, keyed by uid;
    // reapplied after the completion-time smoothing pass so they land the
    // same way they would unbatched.
    pending_smooth: Vec<(u64, f32)>,
    version: u64,
}

/// Serialized form: keys only; approximation tables are derived data and
/// rebuilt on load.
#[derive(Clone, Serialize, Deserialize)]
struct CurveData {
    keys: Vec<Key>,
}

impl From<CurveData> for Curve {
    fn from(data: CurveData) -> Self {
        Curve::from_keys(data.keys)
    }
}

impl From<Curve> for CurveData {
    fn from(curve: Curve) -> Self {
        CurveData { keys: curve.keys }
    }
}

impl Default for Curve {
    fn default() -> Self {
        Self::new()
    }
}

impl Curve {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            uids: UidAllocator::new(),
            batch: false,
            changed_during_batch: false,
            pending_smooth: Vec::new(),
            version: 0,
        }
    }

    /// Curve from (position, value) pairs; `smooth` derives supports from
    /// neighbor slopes, otherwise keys are linear.
    pub fn from_points(points: &[(f32, f32)], smooth: bool) -> Self {
        let mut curve = Self::new();
        let _ = curve.begin_keys_batch_change();
        for &(position, value) in points {
            let key = if smooth {
                Key::new(position, value)
            } else {
                Key::linear(position, value)
            };
            curve.insert_key(key);
        }
        let _ = curve.complete_keys_batch_change();
        curve
    }

    /// Curve from fully-specified keys; sorts, assigns missing uids and
    /// rebuilds approximation without re-smoothing (authored supports win).
    pub fn from_keys(keys: Vec<Key>) -> Self {
        let mut curve = Self::new();
        curve.keys = keys;
        curve
            .keys
            .sort_by(|a, b| a.position.total_cmp(&b.position));
        for key in &mut curve.keys {
            if key.uid == 0 {
                key.uid = curve.uids.alloc();
            } else {
                curve.uids.reserve_past(key.uid);
            }
        }
        curve.update_approximation();
        curve
    }

    // ---- presets ----------------------------------------------------------

    /// 2-key curve by CSS-style cubic-bezier coefficients: the begin pair is
    /// the first control point (value, position), the end pair the second.
    pub fn parametric(
        begin_coef: f32,
        begin_coef_position: f32,
        end_coef: f32,
        end_coef_position: f32,
    ) -> Self {
        let k0 = Key::with_supports(0.0, 0.0, 0.0, 0.0, begin_coef, begin_coef_position);
        let k1 = Key::with_supports(
            1.0,
            1.0,
            end_coef - 1.0,
            end_coef_position - 1.0,
            0.0,
            0.0,
        );
        Self::from_keys(vec![k0, k1])
    }

    pub fn ease_in() -> Self {
        Self::parametric(0.0, 0.42, 1.0, 1.0)
    }

    pub fn ease_out() -> Self {
        Self::parametric(0.0, 0.0, 1.0, 0.58)
    }

    pub fn ease_in_out() -> Self {
        Self::parametric(0.0, 0.42, 1.0, 0.58)
    }

    pub fn linear() -> Self {
        Self::from_keys(vec![Key::linear(0.0, 0.0), Key::linear(1.0, 1.0)])
    }

    // ---- queries ----------------------------------------------------------

    /// Max key position, or 0 for an empty curve.
    pub fn length(&self) -> f32 {
        self.keys.last().map(|k| k.position).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Bumped on every committed structural change; lets owners detect key
    /// edits without subscribing to callbacks.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_batching(&self) -> bool {
        self.batch
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn key_at(&self, idx: usize) -> Option<Key> {
        self.keys.get(idx).copied()
    }

    pub fn key(&self, position: f32) -> Option<Key> {
        self.find_idx_by_position(position, POSITION_EPSILON)
            .map(|i| self.keys[i])
    }

    pub fn contains_key(&self, position: f32) -> bool {
        self.find_idx_by_position(position, POSITION_EPSILON)
            .is_some()
    }

    pub fn find_key(&self, uid: u64) -> Option<Key> {
        self.find_key_idx(uid).map(|i| self.keys[i])
    }

    pub fn find_key_idx(&self, uid: u64) -> Option<usize> {
        self.keys.iter().position(|k| k.uid == uid)
    }

    /// Union of all segment bounds.
    pub fn rect(&self) -> Rect {
        let mut keys = self.keys.iter();
        let Some(first) = keys.next() else {
            return Rect::default();
        };
        let mut rect = first.approx_bounds;
        for key in keys {
            rect = rect.union(key.approx_bounds);
        }
        rect
    }

    // ---- evaluation -------------------------------------------------------

    /// Value at `position`: clamped hold outside the key range, 0 for an
    /// empty curve, piecewise-linear lookup over the precomputed samples
    /// inside a segment. Errors while a keys batch change is open.
    pub fn evaluate(&self, position: f32) -> Result<f32, CurveError> {
        if self.batch {
            return Err(CurveError::EvaluateDuringBatch);
        }
        let n = self.keys.len();
        if n == 0 {
            return Ok(0.0);
        }
        let first = &self.keys[0];
        if position <= first.position {
            return Ok(first.value);
        }
        let last = &self.keys[n - 1];
        if position >= last.position {
            return Ok(last.value);
        }

        // First key strictly right of position; >= 1 given the clamps above.
        let right = self.keys.partition_point(|k| k.position <= position);
        let left = &self.keys[right - 1];
        if left.supports == SupportsType::Discrete {
            return Ok(left.value);
        }

        for pair in left.approx.windows(2) {
            let (p, q) = (pair[0], pair[1]);
            if position >= p.x && position <= q.x {
                let dx = q.x - p.x;
                if dx <= f32::EPSILON {
                    return Ok(q.y);
                }
                let t = (position - p.x) / dx;
                return Ok(p.y + (q.y - p.y) * t);
            }
        }
        Ok(self.keys[right].value)
    }

    // ---- insertion --------------------------------------------------------

    /// Inserts at the sorted position (stable for equal positions), assigns
    /// a fresh uid when unset, returns the insertion index.
    pub fn insert_key(&mut self, mut key: Key) -> usize {
        if key.uid == 0 {
            key.uid = self.uids.alloc();
        } else {
            self.uids.reserve_past(key.uid);
        }
        key.left_support_position = key.left_support_position.min(0.0);
        key.right_support_position = key.right_support_position.max(0.0);
        let idx = self.keys.partition_point(|k| k.position <= key.position);
        self.keys.insert(idx, key);
        self.commit();
        idx
    }

    /// Explicit 6-value Bezier support form.
    pub fn insert_key_supports(
        &mut self,
        position: f32,
        value: f32,
        left_support_value: f32,
        left_support_position: f32,
        right_support_value: f32,
        right_support_position: f32,
    ) -> usize {
        self.insert_key(Key::with_supports(
            position,
            value,
            left_support_value,
            left_support_position,
            right_support_value,
            right_support_position,
        ))
    }

    /// Inserts a key whose supports are derived from neighbor slopes, scaled
    /// by `smooth_coef` (1.0 ≈ Catmull-Rom thirds). The coefficient holds
    /// until a later structural edit re-smooths the neighborhood at 1.0.
    pub fn insert_smooth_key(&mut self, position: f32, value: f32, smooth_coef: f32) -> usize {
        let mut key = Key::new(position, value);
        key.uid = self.uids.alloc();
        let uid = key.uid;
        let idx = self.keys.partition_point(|k| k.position <= key.position);
        self.keys.insert(idx, key);
        if self.batch {
            self.smooth_supports_at(idx, smooth_coef);
            // Unbatched, this insert's smoothing pass would clobber any
            // earlier custom coefficient; keep that ordering.
            self.pending_smooth.clear();
            self.pending_smooth.push((uid, smooth_coef));
            self.changed_during_batch = true;
        } else {
            self.check_smooth_keys();
            self.smooth_supports_at(idx, smooth_coef);
            self.update_approximation();
            self.version = self.version.wrapping_add(1);
        }
        idx
    }

    pub fn insert_flat_key(&mut self, position: f32, value: f32) -> usize {
        self.insert_key(Key::flat(position, value))
    }

    pub fn insert_discrete_key(&mut self, position: f32, value: f32) -> usize {
        self.insert_key(Key::discrete(position, value))
    }

    /// Flat key at `length() + offset`.
    pub fn append_key(&mut self, offset: f32, value: f32) -> usize {
        let position = self.length() + offset;
        self.insert_flat_key(position, value)
    }

    pub fn append_smooth_key(&mut self, offset: f32, value: f32, smooth_coef: f32) -> usize {
        let position = self.length() + offset;
        self.insert_smooth_key(position, value, smooth_coef)
    }

    pub fn append_key_supports(
        &mut self,
        offset: f32,
        value: f32,
        left_support_value: f32,
        left_support_position: f32,
        right_support_value: f32,
        right_support_position: f32,
    ) -> usize {
        let position = self.length() + offset;
        self.insert_key_supports(
            position,
            value,
            left_support_value,
            left_support_position,
            right_support_value,
            right_support_position,
        )
    }

    fn first_position(&self) -> f32 {
        self.keys.first().map(|k| k.position).unwrap_or(0.0)
    }

    /// Flat key at `first key position - offset`.
    pub fn prepend_key(&mut self, offset: f32, value: f32) -> usize {
        let position = self.first_position() - offset;
        self.insert_flat_key(position, value)
    }

    pub fn prepend_smooth_key(&mut self, offset: f32, value: f32, smooth_coef: f32) -> usize {
        let position = self.first_position() - offset;
        self.insert_smooth_key(position, value, smooth_coef)
    }

    pub fn prepend_key_supports(
        &mut self,
        offset: f32,
        value: f32,
        left_support_value: f32,
        left_support_position: f32,
        right_support_value: f32,
        right_support_position: f32,
    ) -> usize {
        let position = self.first_position() - offset;
        self.insert_key_supports(
            position,
            value,
            left_support_value,
            left_support_position,
            right_support_value,
            right_support_position,
        )
    }

    // ---- removal / replacement -------------------------------------------

    pub fn remove_key_at(&mut self, idx: usize) -> bool {
        if idx >= self.keys.len() {
            return false;
        }
        self.keys.remove(idx);
        self.commit();
        true
    }

    pub fn remove_key(&mut self, position: f32) -> bool {
        self.remove_key_within(position, POSITION_EPSILON)
    }

    pub fn remove_key_within(&mut self, position: f32, epsilon: f32) -> bool {
        match self.find_idx_by_position(position, epsilon) {
            Some(idx) => self.remove_key_at(idx),
            None => false,
        }
    }

    pub fn remove_all_keys(&mut self) {
        self.keys.clear();
        self.commit();
    }

    /// Replaces all keys; sorts and assigns missing uids.
    pub fn set_keys(&mut self, keys: Vec<Key>) {
        self.keys = keys;
        self.keys
            .sort_by(|a, b| a.position.total_cmp(&b.position));
        for key in &mut self.keys {
            if key.uid == 0 {
                key.uid = self.uids.alloc();
            } else {
                self.uids.reserve_past(key.uid);
            }
            key.left_support_position = key.left_support_position.min(0.0);
            key.right_support_position = key.right_support_position.max(0.0);
        }
        self.commit();
    }

    /// Replaces the key at `idx`, re-sorting if the position moved. Keeps
    /// the old uid when the replacement has none.
    pub fn set_key(&mut self, key: Key, idx: usize) -> bool {
        if idx >= self.keys.len() {
            return false;
        }
        let mut key = key;
        if key.uid == 0 {
            key.uid = self.keys[idx].uid;
        }
        self.keys.remove(idx);
        self.insert_key(key);
        true
    }

    // ---- smoothing --------------------------------------------------------

    /// Tags the key at `idx` as `Smooth` and recomputes its supports from
    /// the neighbor tangent scaled by `smooth_coef`. Idempotent for an
    /// unmodified neighborhood.
    pub fn smooth_key_at(&mut self, idx: usize, smooth_coef: f32) -> bool {
        if idx >= self.keys.len() {
            return false;
        }
        self.keys[idx].supports = SupportsType::Smooth;
        self.smooth_supports_at(idx, smooth_coef);
        if self.batch {
            self.pending_smooth.push((self.keys[idx].uid, smooth_coef));
            self.changed_during_batch = true;
        } else {
            self.update_approximation();
            self.version = self.version.wrapping_add(1);
        }
        true
    }

    pub fn smooth_key(&mut self, position: f32, smooth_coef: f32) -> bool {
        match self.find_idx_by_position(position, POSITION_EPSILON) {
            Some(idx) => self.smooth_key_at(idx, smooth_coef),
            None => false,
        }
    }

    /// Reapplies default smoothing to every `Smooth` key, so they react to
    /// edits of their neighbors. Runs after every committed change.
    fn check_smooth_keys(&mut self) {
        for idx in 0..self.keys.len() {
            if self.keys[idx].supports == SupportsType::Smooth {
                self.smooth_supports_at(idx, 1.0);
            }
        }
    }

    /// Recomputes supports for the key at `idx` from the averaged tangent
    /// between its neighbors, without updating approximation.
    fn smooth_supports_at(&mut self, idx: usize, smooth_coef: f32) {
        let key = self.keys[idx];
        let left = (idx > 0).then(|| self.keys[idx - 1]);
        let right = self.keys.get(idx + 1).copied();

        let mut lsp = 0.0f32;
        let mut lsv = 0.0f32;
        let mut rsp = 0.0f32;
        let mut rsv = 0.0f32;

        match (left, right) {
            (Some(l), Some(r)) => {
                let dx = (r.position - l.position).max(f32::EPSILON);
                let slope = (r.value - l.value) / dx;
                lsp = -(key.position - l.position) / 3.0 * smooth_coef;
                rsp = (r.position - key.position) / 3.0 * smooth_coef;
                lsv = slope * lsp;
                rsv = slope * rsp;
            }
            (Some(l), None) => {
                let dx = (key.position - l.position).max(f32::EPSILON);
                let slope = (key.value - l.value) / dx;
                lsp = -dx / 3.0 * smooth_coef;
                lsv = slope * lsp;
            }
            (None, Some(r)) => {
                let dx = (r.position - key.position).max(f32::EPSILON);
                let slope = (r.value - key.value) / dx;
                rsp = dx / 3.0 * smooth_coef;
                rsv = slope * rsp;
            }
            (None, None) => {}
        }

        // Supports stay on their own side of the key and never cross a
        // neighboring key's position.
        if let Some(l) = left {
            lsp = lsp.max(l.position - key.position);
        }
        if let Some(r) = right {
            rsp = rsp.min(r.position - key.position);
        }
        lsp = lsp.min(0.0);
        rsp = rsp.max(0.0);

        let key = &mut self.keys[idx];
        key.left_support_position = lsp;
        key.left_support_value = lsv;
        key.right_support_position = rsp;
        key.right_support_value = rsv;
    }

    // ---- batch change -----------------------------------------------------

    /// Defers smoothing/approximation until the matching
    /// [`complete_keys_batch_change`](Self::complete_keys_batch_change).
    /// Nesting is not supported.
    pub fn begin_keys_batch_change(&mut self) -> Result<(), CurveError> {
        if self.batch {
            return Err(CurveError::BatchAlreadyActive);
        }
        self.batch = true;
        self.changed_during_batch = false;
        self.pending_smooth.clear();
        Ok(())
    }

    /// Ends a batch; runs the deferred smoothing pass and one
    /// re-approximation if any key changed.
    pub fn complete_keys_batch_change(&mut self) -> Result<(), CurveError> {
        if !self.batch {
            return Err(CurveError::BatchNotActive);
        }
        self.batch = false;
        if self.changed_during_batch {
            self.changed_during_batch = false;
            self.check_smooth_keys();
            for (uid, coef) in std::mem::take(&mut self.pending_smooth) {
                if let Some(idx) = self.find_key_idx(uid) {
                    self.smooth_supports_at(idx, coef);
                }
            }
            self.update_approximation();
            self.version = self.version.wrapping_add(1);
        }
        self.pending_smooth.clear();
        Ok(())
    }

    // ---- composition ------------------------------------------------------

    /// Appends the other curve's keys after this curve's last key.
    pub fn append_curve(&mut self, other: &Curve) {
        let offset = self.length();
        self.splice(other.keys.iter().copied(), offset);
    }

    /// Inserts the other curve's keys at the front, shifting existing keys
    /// right by the other curve's length.
    pub fn prepend_curve(&mut self, other: &Curve) {
        let shift = other.length();
        for key in &mut self.keys {
            key.position += shift;
        }
        self.splice(other.keys.iter().copied(), 0.0);
    }

    /// Splices the other curve's keys in at `position`, shifting the keys at
    /// or after it right by the other curve's length.
    pub fn insert_curve(&mut self, other: &Curve, position: f32) {
        let shift = other.length();
        for key in &mut self.keys {
            if key.position >= position - POSITION_EPSILON {
                key.position += shift;
            }
        }
        self.splice(other.keys.iter().copied(), position);
    }

    fn splice(&mut self, keys: impl Iterator<Item = Key>, offset: f32) {
        for mut key in keys {
            key.position += offset;
            key.uid = self.uids.alloc();
            let idx = self.keys.partition_point(|k| k.position <= key.position);
            self.keys.insert(idx, key);
        }
        self.commit();
    }

    /// Shifts all key positions by `offset`.
    pub fn move_keys(&mut self, offset: f32) {
        self.move_keys_from(f32::NEG_INFINITY, offset);
    }

    /// Shifts keys at or after `begin` by `offset`, preserving relative
    /// shape within the moved range.
    pub fn move_keys_from(&mut self, begin: f32, offset: f32) {
        for key in &mut self.keys {
            if key.position >= begin {
                key.position += offset;
            }
        }
        self.keys
            .sort_by(|a, b| a.position.total_cmp(&b.position));
        self.commit();
    }

    // ---- internals --------------------------------------------------------

    fn find_idx_by_position(&self, position: f32, epsilon: f32) -> Option<usize> {
        self.keys
            .iter()
            .position(|k| (k.position - position).abs() <= epsilon)
    }

    /// Finishes a structural edit: inside a batch only marks pending work,
    /// otherwise re-smooths, re-approximates and bumps the version.
    fn commit(&mut self) {
        if self.batch {
            self.changed_during_batch = true;
            // An unbatched commit re-smooths everything at the default
            // coefficient, which discards earlier custom coefficients.
            self.pending_smooth.clear();
            return;
        }
        self.check_smooth_keys();
        self.update_approximation();
        self.version = self.version.wrapping_add(1);
    }

    /// Regenerates the per-segment sample tables for every key. The last
    /// key has no outgoing segment; its table collapses to its own point.
    fn update_approximation(&mut self) {
        let n = self.keys.len();
        for i in 0..n {
            let a = self.keys[i];
            if i + 1 == n {
                let p = Vec2::new(a.position, a.value);
                let key = &mut self.keys[i];
                key.approx = [p; APPROX_SAMPLES];
                key.approx_bounds = Rect::point(p.x, p.y);
                continue;
            }
            let b = self.keys[i + 1];
            let p0 = Vec2::new(a.position, a.value);
            let p1 = Vec2::new(
                a.position + a.right_support_position,
                a.value + a.right_support_value,
            );
            let p2 = Vec2::new(
                b.position + b.left_support_position,
                b.value + b.left_support_value,
            );
            let p3 = Vec2::new(b.position, b.value);

            let mut table = [Vec2::default(); APPROX_SAMPLES];
            let mut bounds = Rect::point(p0.x, p0.y);
            for (s, slot) in table.iter_mut().enumerate() {
                let t = s as f32 / (APPROX_SAMPLES - 1) as f32;
                let x = cubic_bezier(p0.x, p1.x, p2.x, p3.x, t);
                let y = cubic_bezier(p0.y, p1.y, p2.y, p3.y, t);
                *slot = Vec2::new(x, y);
                bounds.expand(x, y);
            }
            let key = &mut self.keys[i];
            key.approx = table;
            key.approx_bounds = bounds;
        }
    }
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl AddAssign<&Curve> for Curve {
    fn add_assign(&mut self, other: &Curve) {
        self.append_curve(other);
    }
}
