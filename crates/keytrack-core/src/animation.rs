//! Animations: named channels bound to a target through a resolver.
//!
//! An `Animation` owns a set of path-addressed channels (`"position/x"`,
//! `"color"`, ...) and a cached duration. Setting a target resolves every
//! path to a sink via [`TargetResolver`]; unresolved paths degrade to
//! warnings and the channel keeps evaluating without a write-back.
//! Structural changes surface on a drained [`EventQueue`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::animated_value::{AnimatedValue, TypedKey};
use crate::binding::TargetResolver;
use crate::channel::{Channel, ChannelData, ChannelKind, DiscreteKind};
use crate::config::Config;
use crate::diagnostics::Diagnostic;
use crate::discrete::DiscreteTrack;
use crate::error::{AnimationError, CurveError};
use crate::events::{AnimationEvent, EventQueue};

/// One channel and its binding state.
pub struct ChannelDef {
    path: String,
    resolved: bool,
    channel: Box<dyn Channel>,
    last_version: u64,
}

impl ChannelDef {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the last target resolution produced a usable sink.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

pub struct Animation {
    defs: Vec<ChannelDef>,
    resolver: Option<Box<dyn TargetResolver>>,
    duration: f32,
    cfg: Config,
    events: EventQueue,
    diagnostics: Vec<Diagnostic>,
}

impl Default for Animation {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(cfg: Config) -> Self {
        Self {
            defs: Vec::new(),
            resolver: None,
            duration: 0.0,
            cfg,
            events: EventQueue::with_limit(cfg.max_events),
            diagnostics: Vec::new(),
        }
    }

    // ---- factories --------------------------------------------------------

    /// Single-channel animation from `begin` to `end` with raw CSS-style
    /// cubic-bezier transition control.
    pub fn parametric<T: ChannelKind>(
        path: &str,
        begin: T,
        end: T,
        duration: f32,
        begin_coef: f32,
        begin_coef_position: f32,
        end_coef: f32,
        end_coef_position: f32,
    ) -> Self {
        Self::from_value(
            path,
            AnimatedValue::parametric(
                begin,
                end,
                duration,
                begin_coef,
                begin_coef_position,
                end_coef,
                end_coef_position,
            ),
        )
    }

    pub fn ease_in<T: ChannelKind>(path: &str, begin: T, end: T, duration: f32) -> Self {
        Self::from_value(path, AnimatedValue::ease_in(begin, end, duration))
    }

    pub fn ease_out<T: ChannelKind>(path: &str, begin: T, end: T, duration: f32) -> Self {
        Self::from_value(path, AnimatedValue::ease_out(begin, end, duration))
    }

    pub fn ease_in_out<T: ChannelKind>(path: &str, begin: T, end: T, duration: f32) -> Self {
        Self::from_value(path, AnimatedValue::ease_in_out(begin, end, duration))
    }

    pub fn linear<T: ChannelKind>(path: &str, begin: T, end: T, duration: f32) -> Self {
        Self::from_value(path, AnimatedValue::linear(begin, end, duration))
    }

    fn from_value<T: ChannelKind>(path: &str, value: AnimatedValue<T>) -> Self {
        let mut animation = Self::new();
        animation.insert_def(path.to_owned(), Box::new(value));
        animation.recalculate_duration();
        animation
    }

    // ---- target binding ---------------------------------------------------

    /// Binds every channel through `resolver`. Paths the resolver cannot
    /// satisfy stay unresolved; with `report_errors` they also produce
    /// warning diagnostics.
    pub fn set_target(&mut self, mut resolver: Box<dyn TargetResolver>, report_errors: bool) {
        for def in &mut self.defs {
            resolve_def(resolver.as_mut(), def, report_errors, &mut self.diagnostics);
        }
        self.resolver = Some(resolver);
        self.events.push(AnimationEvent::TargetRebound);
        self.recalculate_duration();
    }

    /// Drops the resolver and unbinds every channel.
    pub fn clear_target(&mut self) {
        self.resolver = None;
        for def in &mut self.defs {
            def.channel.unbind();
            def.resolved = false;
        }
        self.events.push(AnimationEvent::TargetRebound);
    }

    pub fn has_target(&self) -> bool {
        self.resolver.is_some()
    }

    // ---- channel management -----------------------------------------------

    /// Adds an interpolated channel for `path` and returns it for keying.
    pub fn add_channel<T: ChannelKind>(
        &mut self,
        path: &str,
    ) -> Result<&mut AnimatedValue<T>, AnimationError> {
        self.add_boxed(path, Box::new(AnimatedValue::<T>::new()))?;
        self.channel_mut::<T>(path)
    }

    /// Adds a step-sampled channel for `path`.
    pub fn add_discrete_channel<T: DiscreteKind>(
        &mut self,
        path: &str,
    ) -> Result<&mut DiscreteTrack<T>, AnimationError> {
        self.add_boxed(path, Box::new(DiscreteTrack::<T>::new()))?;
        self.discrete_channel_mut::<T>(path)
    }

    fn add_boxed(
        &mut self,
        path: &str,
        channel: Box<dyn Channel>,
    ) -> Result<(), AnimationError> {
        if self.contains_channel(path) {
            return Err(AnimationError::DuplicatePath(path.to_owned()));
        }
        self.insert_def(path.to_owned(), channel);
        if let Some(resolver) = self.resolver.as_mut() {
            if let Some(def) = self.defs.last_mut() {
                resolve_def(resolver.as_mut(), def, true, &mut self.diagnostics);
            }
        }
        self.events.push(AnimationEvent::ChannelAdded {
            path: path.to_owned(),
        });
        self.recalculate_duration();
        Ok(())
    }

    fn insert_def(&mut self, path: String, channel: Box<dyn Channel>) {
        let last_version = channel.version();
        self.defs.push(ChannelDef {
            path,
            resolved: false,
            channel,
            last_version,
        });
    }

    pub fn contains_channel(&self, path: &str) -> bool {
        self.defs.iter().any(|d| d.path == path)
    }

    pub fn channel_defs(&self) -> &[ChannelDef] {
        &self.defs
    }

    pub fn channel<T: ChannelKind>(
        &self,
        path: &str,
    ) -> Result<&AnimatedValue<T>, AnimationError> {
        let def = self
            .defs
            .iter()
            .find(|d| d.path == path)
            .ok_or_else(|| AnimationError::ChannelNotFound(path.to_owned()))?;
        def.channel
            .as_any()
            .downcast_ref::<AnimatedValue<T>>()
            .ok_or_else(|| AnimationError::TypeMismatch(path.to_owned()))
    }

    pub fn channel_mut<T: ChannelKind>(
        &mut self,
        path: &str,
    ) -> Result<&mut AnimatedValue<T>, AnimationError> {
        let def = self
            .defs
            .iter_mut()
            .find(|d| d.path == path)
            .ok_or_else(|| AnimationError::ChannelNotFound(path.to_owned()))?;
        def.channel
            .as_any_mut()
            .downcast_mut::<AnimatedValue<T>>()
            .ok_or_else(|| AnimationError::TypeMismatch(path.to_owned()))
    }

    pub fn discrete_channel_mut<T: DiscreteKind>(
        &mut self,
        path: &str,
    ) -> Result<&mut DiscreteTrack<T>, AnimationError> {
        let def = self
            .defs
            .iter_mut()
            .find(|d| d.path == path)
            .ok_or_else(|| AnimationError::ChannelNotFound(path.to_owned()))?;
        def.channel
            .as_any_mut()
            .downcast_mut::<DiscreteTrack<T>>()
            .ok_or_else(|| AnimationError::TypeMismatch(path.to_owned()))
    }

    pub fn remove_channel(&mut self, path: &str) -> bool {
        match self.defs.iter().position(|d| d.path == path) {
            Some(idx) => {
                self.defs.remove(idx);
                self.events.push(AnimationEvent::ChannelRemoved {
                    path: path.to_owned(),
                });
                self.recalculate_duration();
                true
            }
            None => false,
        }
    }

    /// Removes every channel; the target stays set.
    pub fn clear(&mut self) {
        let paths: Vec<String> = self.defs.iter().map(|d| d.path.clone()).collect();
        self.defs.clear();
        for path in paths {
            self.events.push(AnimationEvent::ChannelRemoved { path });
        }
        self.recalculate_duration();
    }

    // ---- keying through paths ---------------------------------------------

    /// Smooth key on `path`, creating the channel on first use.
    pub fn add_key<T: ChannelKind>(
        &mut self,
        path: &str,
        position: f32,
        value: T,
    ) -> Result<(), AnimationError> {
        if !self.contains_channel(path) {
            self.add_channel::<T>(path)?;
        }
        self.channel_mut::<T>(path)?.add_key(position, value);
        self.sync();
        Ok(())
    }

    pub fn remove_key<T: ChannelKind>(
        &mut self,
        path: &str,
        position: f32,
    ) -> Result<bool, AnimationError> {
        let epsilon = self.cfg.position_epsilon;
        let removed = self
            .channel_mut::<T>(path)?
            .remove_key_within(position, epsilon);
        self.sync();
        Ok(removed)
    }

    pub fn keys<T: ChannelKind>(&self, path: &str) -> Result<Vec<TypedKey<T>>, AnimationError> {
        Ok(self.channel::<T>(path)?.keys())
    }

    pub fn set_keys<T: ChannelKind>(
        &mut self,
        path: &str,
        keys: &[TypedKey<T>],
    ) -> Result<(), AnimationError> {
        self.channel_mut::<T>(path)?.set_keys(keys)?;
        self.sync();
        Ok(())
    }

    // ---- evaluation -------------------------------------------------------

    /// Cached duration; the longest channel length.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Evaluates every channel at `time`, writing through bound sinks.
    /// Picks up out-of-band curve edits first.
    pub fn evaluate(&mut self, time: f32) -> Result<(), CurveError> {
        self.sync();
        for def in &mut self.defs {
            def.channel.evaluate(time)?;
        }
        Ok(())
    }

    /// Detects channel edits made through `curve_mut` or direct channel
    /// access, emitting `KeysChanged` and refreshing the duration.
    pub fn sync(&mut self) {
        let mut changed = false;
        for def in &mut self.defs {
            let version = def.channel.version();
            if version != def.last_version {
                def.last_version = version;
                self.events.push(AnimationEvent::KeysChanged {
                    path: def.path.clone(),
                });
                changed = true;
            }
        }
        if changed {
            self.recalculate_duration();
        }
    }

    fn recalculate_duration(&mut self) {
        let new = self
            .defs
            .iter()
            .map(|d| d.channel.length())
            .fold(0.0, f32::max);
        if (new - self.duration).abs() > f32::EPSILON {
            self.events.push(AnimationEvent::DurationChanged {
                old: self.duration,
                new,
            });
            self.duration = new;
        }
    }

    // ---- observation ------------------------------------------------------

    pub fn take_events(&mut self) -> Vec<AnimationEvent> {
        self.events.drain()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // ---- data form --------------------------------------------------------

    pub fn to_data(&self) -> AnimationData {
        AnimationData {
            channels: self
                .defs
                .iter()
                .map(|d| ChannelDefData {
                    path: d.path.clone(),
                    value: d.channel.to_data(),
                })
                .collect(),
        }
    }

    /// Rebuilds from data; the target must be re-set afterwards.
    pub fn from_data(data: AnimationData) -> Self {
        let mut animation = Self::new();
        for entry in data.channels {
            animation.insert_def(entry.path, entry.value.into_channel());
        }
        animation.recalculate_duration();
        animation.events.drain();
        animation
    }
}

fn resolve_def(
    resolver: &mut dyn TargetResolver,
    def: &mut ChannelDef,
    report_errors: bool,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match resolver.resolve(&def.path) {
        Some(sink) => match def.channel.bind_erased(sink) {
            Ok(()) => def.resolved = true,
            Err(_) => {
                log::warn!("sink kind mismatch for animated path '{}'", def.path);
                if report_errors {
                    diagnostics.push(Diagnostic::warning(
                        Some(def.path.clone()),
                        "resolved sink does not match the channel's value kind",
                    ));
                }
                def.channel.unbind();
                def.resolved = false;
            }
        },
        None => {
            log::warn!("can't resolve animated path '{}'", def.path);
            if report_errors {
                diagnostics.push(Diagnostic::warning(
                    Some(def.path.clone()),
                    "target has no field at this path",
                ));
            }
            def.channel.unbind();
            def.resolved = false;
        }
    }
}

/// Serializable form of an animation: its channels only. Bindings, events
/// and diagnostics are runtime state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationData {
    pub channels: Vec<ChannelDefData>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelDefData {
    pub path: String,
    pub value: ChannelData,
}

impl Serialize for Animation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_data().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Animation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Animation::from_data(AnimationData::deserialize(
            deserializer,
        )?))
    }
}

impl Clone for Animation {
    fn clone(&self) -> Self {
        let mut animation = Animation::with_config(self.cfg);
        for entry in self.to_data().channels {
            animation.insert_def(entry.path, entry.value.into_channel());
        }
        animation.recalculate_duration();
        animation.events.drain();
        animation
    }
}

impl PartialEq for Animation {
    fn eq(&self, other: &Self) -> bool {
        self.to_data() == other.to_data()
    }
}

impl std::fmt::Debug for Animation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("channels", &self.defs.iter().map(|d| &d.path).collect::<Vec<_>>())
            .field("duration", &self.duration)
            .field("has_target", &self.has_target())
            .finish()
    }
}
