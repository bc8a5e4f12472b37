use std::cell::Cell;
use std::rc::Rc;

use keytrack_core::{
    Animation, AnimationError, AnimationEvent, ErasedSink, TargetResolver, TypedKey, Vec2,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// A test target: a couple of named fields exposed through shared cells.
struct World {
    health: Rc<Cell<f32>>,
    position: Rc<Cell<Vec2>>,
    visible: Rc<Cell<bool>>,
}

impl World {
    fn new() -> Self {
        Self {
            health: Rc::new(Cell::new(0.0)),
            position: Rc::new(Cell::new(Vec2::default())),
            visible: Rc::new(Cell::new(false)),
        }
    }

    fn resolver(&self) -> Box<dyn TargetResolver> {
        Box::new(WorldResolver {
            health: self.health.clone(),
            position: self.position.clone(),
            visible: self.visible.clone(),
        })
    }
}

struct WorldResolver {
    health: Rc<Cell<f32>>,
    position: Rc<Cell<Vec2>>,
    visible: Rc<Cell<bool>>,
}

impl TargetResolver for WorldResolver {
    fn resolve(&mut self, path: &str) -> Option<ErasedSink> {
        match path {
            "health" => Some(ErasedSink::direct(self.health.clone())),
            "position" => Some(ErasedSink::direct(self.position.clone())),
            "visible" => Some(ErasedSink::direct(self.visible.clone())),
            _ => None,
        }
    }
}

/// it should evaluate bound channels into the target's fields
#[test]
fn evaluate_writes_target() {
    let world = World::new();
    let mut animation = Animation::new();
    animation
        .add_key("health", 0.0, 0.0f32)
        .unwrap();
    animation.add_key("health", 2.0, 100.0f32).unwrap();
    animation
        .add_key("position", 0.0, Vec2::new(0.0, 0.0))
        .unwrap();
    animation
        .add_key("position", 2.0, Vec2::new(10.0, 20.0))
        .unwrap();
    animation.set_target(world.resolver(), true);
    assert!(animation.take_diagnostics().is_empty());

    animation.evaluate(2.0).unwrap();
    approx(world.health.get(), 100.0, 1e-3);
    approx(world.position.get().x, 10.0, 1e-3);
    approx(world.position.get().y, 20.0, 1e-3);
}

/// it should evaluate discrete channels with step semantics into the target
#[test]
fn discrete_channel_writes_target() {
    let world = World::new();
    let mut animation = Animation::new();
    {
        let track = animation.add_discrete_channel::<bool>("visible").unwrap();
        track.add_sample(0.0, false);
        track.add_sample(1.0, true);
    }
    animation.set_target(world.resolver(), true);

    animation.evaluate(1.5).unwrap();
    assert!(world.visible.get());
    animation.evaluate(0.5).unwrap();
    assert!(!world.visible.get());
    assert_eq!(animation.duration(), 1.0);
}

/// it should keep unresolved paths evaluable and report a warning diagnostic
#[test]
fn unresolved_path_degrades_gracefully() {
    let world = World::new();
    let mut animation = Animation::new();
    animation.add_key("no/such/field", 0.0, 1.0f32).unwrap();
    animation.add_key("health", 0.0, 7.0f32).unwrap();
    animation.set_target(world.resolver(), true);

    let diagnostics = animation.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].path.as_deref(), Some("no/such/field"));

    // evaluation still succeeds; only the resolved channel writes
    animation.evaluate(0.0).unwrap();
    approx(world.health.get(), 7.0, 1e-3);

    let defs = animation.channel_defs();
    assert!(defs.iter().any(|d| d.path() == "health" && d.is_resolved()));
    assert!(defs
        .iter()
        .any(|d| d.path() == "no/such/field" && !d.is_resolved()));
}

/// it should report a kind mismatch when the resolved sink has another type
#[test]
fn kind_mismatch_diagnostic() {
    let world = World::new();
    let mut animation = Animation::new();
    // "health" resolves to an f32 sink; a Vec2 channel cannot bind to it
    animation
        .add_key("health", 0.0, Vec2::new(1.0, 2.0))
        .unwrap();
    animation.set_target(world.resolver(), true);

    let diagnostics = animation.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].path.as_deref(), Some("health"));
    assert!(animation
        .channel_defs()
        .iter()
        .all(|d| !d.is_resolved()));
    animation.evaluate(0.0).unwrap();
}

/// it should reject duplicate channel paths
#[test]
fn duplicate_path_rejected() {
    let mut animation = Animation::new();
    animation.add_channel::<f32>("x").unwrap();
    assert_eq!(
        animation.add_channel::<f32>("x").err(),
        Some(AnimationError::DuplicatePath("x".into()))
    );
    assert_eq!(
        animation.add_discrete_channel::<bool>("x").err(),
        Some(AnimationError::DuplicatePath("x".into()))
    );
}

/// it should error on typed access with the wrong value kind
#[test]
fn typed_access_mismatch() {
    let mut animation = Animation::new();
    animation.add_channel::<f32>("x").unwrap();
    assert_eq!(
        animation.channel::<Vec2>("x").err(),
        Some(AnimationError::TypeMismatch("x".into()))
    );
    assert_eq!(
        animation.channel::<f32>("missing").err(),
        Some(AnimationError::ChannelNotFound("missing".into()))
    );
}

/// it should track duration as the longest channel and emit one event per
/// actual change
#[test]
fn duration_tracking() {
    let mut animation = Animation::new();
    assert_eq!(animation.duration(), 0.0);
    animation.add_key("a", 0.0, 0.0f32).unwrap();
    animation.add_key("a", 2.0, 1.0f32).unwrap();
    animation.add_key("b", 0.0, 0.0f32).unwrap();
    assert_eq!(animation.duration(), 2.0);

    let events = animation.take_events();
    let duration_events: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, AnimationEvent::DurationChanged { .. }))
        .collect();
    assert_eq!(duration_events.len(), 1);
    assert!(matches!(
        duration_events[0],
        AnimationEvent::DurationChanged { old, new } if *old == 0.0 && *new == 2.0
    ));

    // removing the longest channel shrinks the duration
    assert!(animation.remove_channel("a"));
    assert_eq!(animation.duration(), 0.0);
}

/// it should emit channel lifecycle events
#[test]
fn channel_events() {
    let mut animation = Animation::new();
    animation.add_channel::<f32>("x").unwrap();
    animation.remove_channel("x");
    let events = animation.take_events();
    assert!(events.contains(&AnimationEvent::ChannelAdded { path: "x".into() }));
    assert!(events.contains(&AnimationEvent::ChannelRemoved { path: "x".into() }));
}

/// it should detect out-of-band curve edits via sync and emit KeysChanged
#[test]
fn sync_detects_curve_edits() {
    let mut animation = Animation::new();
    animation.add_key("x", 0.0, 0.0f32).unwrap();
    animation.take_events();

    animation
        .channel_mut::<f32>("x")
        .unwrap()
        .curve_mut(0)
        .unwrap()
        .insert_flat_key(5.0, 1.0);
    animation.sync();

    let events = animation.take_events();
    assert!(events.contains(&AnimationEvent::KeysChanged { path: "x".into() }));
    assert_eq!(animation.duration(), 5.0);

    // a second sync with no edits stays quiet
    animation.sync();
    assert!(animation.take_events().is_empty());
}

/// it should bind channels added after the target was set
#[test]
fn late_channel_binds() {
    let world = World::new();
    let mut animation = Animation::new();
    animation.set_target(world.resolver(), true);
    animation.add_key("health", 0.0, 42.0f32).unwrap();
    animation.evaluate(0.0).unwrap();
    approx(world.health.get(), 42.0, 1e-3);
}

/// it should unbind everything on clear_target
#[test]
fn clear_target_unbinds() {
    let world = World::new();
    let mut animation = Animation::new();
    animation.add_key("health", 0.0, 5.0f32).unwrap();
    animation.set_target(world.resolver(), true);
    animation.clear_target();
    assert!(!animation.has_target());

    animation.evaluate(0.0).unwrap();
    approx(world.health.get(), 0.0, 1e-3);
    assert!(animation.channel_defs().iter().all(|d| !d.is_resolved()));
}

/// it should edit keys through path-addressed helpers
#[test]
fn keying_by_path() {
    let mut animation = Animation::new();
    animation
        .set_keys(
            "x",
            &[TypedKey::new(0.0, 0.0f32), TypedKey::new(1.0, 1.0f32)],
        )
        .err()
        .expect("set_keys on a missing channel must fail");

    animation.add_key("x", 0.0, 0.0f32).unwrap();
    animation
        .set_keys(
            "x",
            &[TypedKey::new(0.0, 2.0f32), TypedKey::new(3.0, 5.0f32)],
        )
        .unwrap();
    assert_eq!(animation.keys::<f32>("x").unwrap().len(), 2);
    assert_eq!(animation.duration(), 3.0);

    assert!(animation.remove_key::<f32>("x", 3.0).unwrap());
    assert!(!animation.remove_key::<f32>("x", 3.0).unwrap());
    assert_eq!(animation.duration(), 0.0);
}

/// it should build single-channel animations from the ease factories
#[test]
fn factories_single_channel() {
    let world = World::new();
    let mut animation = Animation::ease_in_out("health", 0.0f32, 10.0f32, 2.0);
    assert_eq!(animation.duration(), 2.0);
    animation.set_target(world.resolver(), true);
    animation.evaluate(2.0).unwrap();
    approx(world.health.get(), 10.0, 1e-3);

    let linear = Animation::linear("position", Vec2::default(), Vec2::new(4.0, 4.0), 1.0);
    assert_eq!(linear.duration(), 1.0);
    assert!(linear.contains_channel("position"));
}

/// it should clear channels but keep the target resolver
#[test]
fn clear_keeps_target() {
    let world = World::new();
    let mut animation = Animation::new();
    animation.add_key("health", 0.0, 1.0f32).unwrap();
    animation.set_target(world.resolver(), true);
    animation.clear();
    assert!(animation.has_target());
    assert_eq!(animation.duration(), 0.0);

    // a channel added after clear still binds
    animation.add_key("health", 0.0, 9.0f32).unwrap();
    animation.evaluate(0.0).unwrap();
    approx(world.health.get(), 9.0, 1e-3);
}
