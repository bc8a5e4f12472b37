//! Change notifications as a drained event queue.
//!
//! Edits fire synchronously into the owner's queue; consumers (timeline UI,
//! dependent systems) drain it after the mutating call. This replaces
//! subscriber lists with something that is removal-safe by construction.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationEvent {
    /// Some channel's key set changed.
    KeysChanged { path: String },
    /// Recomputed duration differs from the cached one.
    DurationChanged { old: f32, new: f32 },
    ChannelAdded { path: String },
    ChannelRemoved { path: String },
    /// Target was set or cleared.
    TargetRebound,
}

/// Bounded FIFO; the oldest events are dropped past the cap.
#[derive(Debug)]
pub struct EventQueue {
    events: Vec<AnimationEvent>,
    cap: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_limit(1024)
    }
}

impl EventQueue {
    pub fn with_limit(cap: usize) -> Self {
        Self {
            events: Vec::new(),
            cap: cap.max(1),
        }
    }

    pub fn push(&mut self, event: AnimationEvent) {
        if self.events.len() == self.cap {
            self.events.remove(0);
        }
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_past_cap() {
        let mut queue = EventQueue::with_limit(2);
        queue.push(AnimationEvent::TargetRebound);
        queue.push(AnimationEvent::KeysChanged { path: "a".into() });
        queue.push(AnimationEvent::KeysChanged { path: "b".into() });
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(
            drained[0],
            AnimationEvent::KeysChanged { path: "a".into() }
        );
        assert!(queue.is_empty());
    }
}
