//! Keyframe curves and animations over arbitrary targets.
//!
//! The crate is layered bottom-up:
//!
//! - [`curve`]: Bezier-segmented scalar keyframe curves with cached
//!   approximation tables and batch editing.
//! - [`animated_value`]: typed multi-channel values, one curve per scalar
//!   channel, edited in lockstep.
//! - [`animation`]: named channels resolved against a target and evaluated
//!   together, with change events and a cached duration.
//!
//! Targets are reached through the [`binding::TargetResolver`] seam; the
//! crate itself never inspects host object graphs.

pub mod animated_value;
pub mod animation;
pub mod binding;
pub mod channel;
pub mod config;
pub mod curve;
pub mod diagnostics;
pub mod discrete;
pub mod error;
pub mod events;
pub mod ids;
pub mod key;
pub mod value;

pub use animated_value::{AnimatedValue, TypedKey};
pub use animation::{Animation, AnimationData, ChannelDef, ChannelDefData};
pub use binding::{DirectSink, ErasedSink, ProxySink, TargetResolver, ValueSink};
pub use channel::{Channel, ChannelData, ChannelKind, DiscreteKind};
pub use config::Config;
pub use curve::{Curve, POSITION_EPSILON};
pub use diagnostics::{Diagnostic, Severity};
pub use discrete::{DiscreteKey, DiscreteTrack};
pub use error::{AnimationError, CurveError};
pub use events::{AnimationEvent, EventQueue};
pub use key::{Key, Rect, SupportsType, APPROX_SAMPLES};
pub use value::{Animatable, Color, Vec2, MAX_CHANNELS};
