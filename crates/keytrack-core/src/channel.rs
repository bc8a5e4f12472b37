//! Type-erased channel surface used by `Animation`.
//!
//! `ChannelData` is the serializable form: a tagged enum over the supported
//! value kinds, standing in for reflection-driven polymorphic serialization.

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::animated_value::AnimatedValue;
use crate::binding::ErasedSink;
use crate::discrete::DiscreteTrack;
use crate::error::CurveError;
use crate::value::{Animatable, Color, Vec2};

/// One animated channel, independent of its value type. Evaluation performs
/// the channel's own write-back; the owner never buffers results.
pub trait Channel: Any {
    fn evaluate(&mut self, time: f32) -> Result<(), CurveError>;

    /// Longest keyed position in this channel.
    fn length(&self) -> f32;

    /// Changes whenever the channel's key set changes.
    fn version(&self) -> u64;

    /// Binds a resolver-provided sink; the sink comes back on kind mismatch.
    fn bind_erased(&mut self, sink: ErasedSink) -> Result<(), ErasedSink>;

    fn unbind(&mut self);

    fn is_bound(&self) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn to_data(&self) -> ChannelData;
}

/// Serializable form of a channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelData {
    Float(AnimatedValue<f32>),
    Vec2(AnimatedValue<Vec2>),
    Color(AnimatedValue<Color>),
    Bool(DiscreteTrack<bool>),
}

impl ChannelData {
    pub fn into_channel(self) -> Box<dyn Channel> {
        match self {
            ChannelData::Float(value) => Box::new(value),
            ChannelData::Vec2(value) => Box::new(value),
            ChannelData::Color(value) => Box::new(value),
            ChannelData::Bool(track) => Box::new(track),
        }
    }
}

/// Interpolatable value types that can live in an `Animation` channel.
pub trait ChannelKind: Animatable {
    fn wrap(value: AnimatedValue<Self>) -> ChannelData;
}

impl ChannelKind for f32 {
    fn wrap(value: AnimatedValue<Self>) -> ChannelData {
        ChannelData::Float(value)
    }
}

impl ChannelKind for Vec2 {
    fn wrap(value: AnimatedValue<Self>) -> ChannelData {
        ChannelData::Vec2(value)
    }
}

impl ChannelKind for Color {
    fn wrap(value: AnimatedValue<Self>) -> ChannelData {
        ChannelData::Color(value)
    }
}

/// Non-interpolatable value types animated as discrete sample timelines.
pub trait DiscreteKind: Clone + PartialEq + std::fmt::Debug + 'static {
    fn wrap(track: DiscreteTrack<Self>) -> ChannelData;
}

impl DiscreteKind for bool {
    fn wrap(track: DiscreteTrack<Self>) -> ChannelData {
        ChannelData::Bool(track)
    }
}

impl<T: ChannelKind> Channel for AnimatedValue<T> {
    fn evaluate(&mut self, time: f32) -> Result<(), CurveError> {
        AnimatedValue::evaluate(self, time).map(|_| ())
    }

    fn length(&self) -> f32 {
        AnimatedValue::length(self)
    }

    fn version(&self) -> u64 {
        AnimatedValue::version(self)
    }

    fn bind_erased(&mut self, sink: ErasedSink) -> Result<(), ErasedSink> {
        AnimatedValue::bind_erased(self, sink)
    }

    fn unbind(&mut self) {
        AnimatedValue::unbind(self);
    }

    fn is_bound(&self) -> bool {
        AnimatedValue::is_bound(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn to_data(&self) -> ChannelData {
        T::wrap(self.clone())
    }
}

impl<T: DiscreteKind> Channel for DiscreteTrack<T> {
    fn evaluate(&mut self, time: f32) -> Result<(), CurveError> {
        DiscreteTrack::evaluate(self, time);
        Ok(())
    }

    fn length(&self) -> f32 {
        DiscreteTrack::length(self)
    }

    fn version(&self) -> u64 {
        DiscreteTrack::version(self)
    }

    fn bind_erased(&mut self, sink: ErasedSink) -> Result<(), ErasedSink> {
        DiscreteTrack::bind_erased(self, sink)
    }

    fn unbind(&mut self) {
        DiscreteTrack::unbind(self);
    }

    fn is_bound(&self) -> bool {
        DiscreteTrack::is_bound(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn to_data(&self) -> ChannelData {
        T::wrap(self.clone())
    }
}
