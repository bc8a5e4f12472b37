//! Step-sampled timelines for non-interpolatable value types.
//!
//! A `DiscreteTrack<T>` holds sorted `(position, sample)` pairs and
//! evaluates with hold-left step semantics: the sample at or before the
//! queried position wins, and the first sample holds before the start.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::binding::{DirectSink, ErasedSink, ProxySink, ValueSink};
use crate::curve::POSITION_EPSILON;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscreteKey<T> {
    pub position: f32,
    pub value: T,
}

impl<T> DiscreteKey<T> {
    pub fn new(position: f32, value: T) -> Self {
        Self { position, value }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct DiscreteTrack<T: Clone> {
    samples: Vec<DiscreteKey<T>>,
    #[serde(skip)]
    version: u64,
    #[serde(skip)]
    sink: Option<Box<dyn ValueSink<T>>>,
}

impl<T: Clone> Default for DiscreteTrack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> DiscreteTrack<T> {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            version: 0,
            sink: None,
        }
    }

    pub fn from_samples(samples: Vec<DiscreteKey<T>>) -> Self {
        let mut track = Self::new();
        track.set_samples(samples);
        track
    }

    /// Inserts sorted by position (stable for ties), returns the index.
    pub fn add_sample(&mut self, position: f32, value: T) -> usize {
        let idx = self
            .samples
            .partition_point(|s| s.position <= position);
        self.samples.insert(idx, DiscreteKey::new(position, value));
        self.version = self.version.wrapping_add(1);
        idx
    }

    pub fn remove_sample(&mut self, position: f32) -> bool {
        self.remove_sample_within(position, POSITION_EPSILON)
    }

    pub fn remove_sample_within(&mut self, position: f32, epsilon: f32) -> bool {
        match self
            .samples
            .iter()
            .position(|s| (s.position - position).abs() <= epsilon)
        {
            Some(idx) => {
                self.samples.remove(idx);
                self.version = self.version.wrapping_add(1);
                true
            }
            None => false,
        }
    }

    pub fn remove_all_samples(&mut self) {
        self.samples.clear();
        self.version = self.version.wrapping_add(1);
    }

    pub fn set_samples(&mut self, mut samples: Vec<DiscreteKey<T>>) {
        samples.sort_by(|a, b| a.position.total_cmp(&b.position));
        self.samples = samples;
        self.version = self.version.wrapping_add(1);
    }

    pub fn samples(&self) -> &[DiscreteKey<T>] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Last sample position, or 0 when empty.
    pub fn length(&self) -> f32 {
        self.samples.last().map(|s| s.position).unwrap_or(0.0)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Hold-left step sample; `None` for an empty track.
    pub fn sample_at(&self, position: f32) -> Option<T> {
        if self.samples.is_empty() {
            return None;
        }
        let idx = self
            .samples
            .partition_point(|s| s.position <= position);
        let idx = idx.saturating_sub(1);
        Some(self.samples[idx].value.clone())
    }

    /// Samples and writes through the bound sink when present.
    pub fn evaluate(&mut self, position: f32) -> Option<T> {
        let value = self.sample_at(position);
        if let (Some(value), Some(sink)) = (value.clone(), self.sink.as_mut()) {
            sink.set(value);
        }
        value
    }

    pub fn bind_sink(&mut self, sink: Box<dyn ValueSink<T>>) {
        self.sink = Some(sink);
    }

    pub fn bind_erased(&mut self, sink: ErasedSink) -> Result<(), ErasedSink>
    where
        T: 'static,
    {
        self.sink = Some(sink.downcast::<T>()?);
        Ok(())
    }

    pub fn bind_proxy(&mut self, setter: Box<dyn FnMut(T)>)
    where
        T: 'static,
    {
        self.sink = Some(Box::new(ProxySink::new(setter)));
    }

    pub fn unbind(&mut self) {
        self.sink = None;
    }

    pub fn is_bound(&self) -> bool {
        self.sink.is_some()
    }
}

impl<T: Clone + Copy + 'static> DiscreteTrack<T> {
    pub fn bind_direct(&mut self, slot: Rc<Cell<T>>) {
        self.sink = Some(Box::new(DirectSink::new(slot)));
    }
}

impl<T: Clone> Clone for DiscreteTrack<T> {
    fn clone(&self) -> Self {
        Self {
            samples: self.samples.clone(),
            version: self.version,
            sink: None,
        }
    }
}

impl<T: Clone + PartialEq> PartialEq for DiscreteTrack<T> {
    fn eq(&self, other: &Self) -> bool {
        self.samples == other.samples
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for DiscreteTrack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscreteTrack")
            .field("samples", &self.samples)
            .field("bound", &self.is_bound())
            .finish()
    }
}
