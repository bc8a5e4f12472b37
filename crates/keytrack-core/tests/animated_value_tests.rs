use std::cell::Cell;
use std::rc::Rc;

use keytrack_core::{AnimatedValue, Color, DiscreteKey, DiscreteTrack, TypedKey, Vec2};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// it should keep one curve per scalar channel
#[test]
fn channel_counts() {
    assert_eq!(AnimatedValue::<f32>::new().channels(), 1);
    assert_eq!(AnimatedValue::<Vec2>::new().channels(), 2);
    assert_eq!(AnimatedValue::<Color>::new().channels(), 4);
    assert!(AnimatedValue::<Color>::new().curve(3).is_some());
    assert!(AnimatedValue::<Color>::new().curve(4).is_none());
}

/// it should key all channels in lockstep and reassemble compound values
#[test]
fn lockstep_keys_roundtrip() {
    let mut value = AnimatedValue::<Vec2>::new();
    value.add_key(0.0, Vec2::new(0.0, 10.0));
    value.add_key(1.0, Vec2::new(4.0, -2.0));

    let keys = value.keys();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], TypedKey::new(0.0, Vec2::new(0.0, 10.0)));
    assert_eq!(keys[1], TypedKey::new(1.0, Vec2::new(4.0, -2.0)));

    let mid = value.evaluate(0.5).unwrap();
    assert!(mid.x > 0.0 && mid.x < 4.0);
    assert!(mid.y < 10.0 && mid.y > -2.0);
}

/// it should evaluate endpoints of linear compound values exactly
#[test]
fn linear_factory_endpoints() {
    let mut value = AnimatedValue::<Vec2>::linear(
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 20.0),
        2.0,
    );
    let at_end = value.evaluate(2.0).unwrap();
    approx(at_end.x, 10.0, 1e-3);
    approx(at_end.y, 20.0, 1e-3);
    let mid = value.evaluate(1.0).unwrap();
    approx(mid.x, 5.0, 1e-3);
    approx(mid.y, 10.0, 1e-3);
}

/// it should start and end at the given values for every ease factory
#[test]
fn ease_factory_endpoints() {
    let factories: [fn(f32, f32, f32) -> AnimatedValue<f32>; 3] = [
        AnimatedValue::<f32>::ease_in,
        AnimatedValue::<f32>::ease_out,
        AnimatedValue::<f32>::ease_in_out,
    ];
    for make in factories {
        let mut value = make(2.0, 8.0, 1.5);
        approx(value.evaluate(0.0).unwrap(), 2.0, 1e-3);
        approx(value.evaluate(1.5).unwrap(), 8.0, 1e-3);
        assert_eq!(value.length(), 1.5);
    }
}

/// it should ease in: slower than linear in the first half
#[test]
fn ease_in_shape() {
    let mut eased = AnimatedValue::<f32>::ease_in(0.0, 1.0, 1.0);
    assert!(eased.evaluate(0.25).unwrap() < 0.25);
}

/// it should write evaluated values through a direct sink
#[test]
fn direct_sink_writeback() {
    let slot = Rc::new(Cell::new(0.0f32));
    let mut value = AnimatedValue::<f32>::ease_in_out(0.0, 1.0, 1.0);
    value.bind_direct(slot.clone());
    assert!(value.is_bound());

    value.evaluate(0.0).unwrap();
    approx(slot.get(), 0.0, 1e-3);
    value.evaluate(1.0).unwrap();
    approx(slot.get(), 1.0, 1e-3);

    value.unbind();
    assert!(!value.is_bound());
    value.evaluate(0.0).unwrap();
    // unbound evaluation leaves the slot alone
    approx(slot.get(), 1.0, 1e-3);
}

/// it should write through a proxy setter closure
#[test]
fn proxy_sink_writeback() {
    let seen = Rc::new(Cell::new(Vec2::default()));
    let seen_in = seen.clone();
    let mut value = AnimatedValue::<Vec2>::linear(
        Vec2::new(0.0, 0.0),
        Vec2::new(2.0, 4.0),
        1.0,
    );
    value.bind_proxy(Box::new(move |v| seen_in.set(v)));
    value.evaluate(0.5).unwrap();
    approx(seen.get().x, 1.0, 1e-3);
    approx(seen.get().y, 2.0, 1e-3);
}

/// it should replace the whole key set with set_keys, batched per channel
#[test]
fn set_keys_replaces() {
    let mut value = AnimatedValue::<f32>::new();
    value.add_key(0.0, 100.0);
    value
        .set_keys(&[TypedKey::new(0.0, 0.0), TypedKey::new(2.0, 4.0)])
        .unwrap();
    assert_eq!(value.keys().len(), 2);
    approx(value.evaluate(0.0).unwrap(), 0.0, 1e-3);
    assert_eq!(value.length(), 2.0);
}

/// it should remove keys across all channels at once
#[test]
fn remove_broadcasts() {
    let mut value = AnimatedValue::<Color>::new();
    value.add_key(0.0, Color::new(0.0, 0.0, 0.0, 1.0));
    value.add_key(1.0, Color::default());
    assert!(value.remove_key(1.0));
    for ch in 0..value.channels() {
        assert_eq!(value.curve(ch).unwrap().keys().len(), 1);
    }
    value.remove_all_keys();
    for ch in 0..value.channels() {
        assert!(value.curve(ch).unwrap().is_empty());
    }
}

/// it should bump the combined version on edits through any channel
#[test]
fn version_tracks_channel_edits() {
    let mut value = AnimatedValue::<Vec2>::new();
    let v0 = value.version();
    value.add_key(0.0, Vec2::default());
    let v1 = value.version();
    assert_ne!(v0, v1);

    // out-of-band edit through a single channel curve
    value.curve_mut(1).unwrap().insert_flat_key(3.0, 1.0);
    assert_ne!(value.version(), v1);
}

/// it should drop the binding on clone but keep the keys
#[test]
fn clone_drops_binding() {
    let slot = Rc::new(Cell::new(0.0f32));
    let mut value = AnimatedValue::<f32>::linear(0.0, 1.0, 1.0);
    value.bind_direct(slot);
    let copy = value.clone();
    assert!(!copy.is_bound());
    assert_eq!(copy, value);
}

/// it should hold the left sample in a discrete track
#[test]
fn discrete_track_steps() {
    let mut track = DiscreteTrack::<bool>::new();
    assert_eq!(track.sample_at(0.0), None);
    track.add_sample(0.0, false);
    track.add_sample(2.0, true);
    assert_eq!(track.sample_at(-1.0), Some(false));
    assert_eq!(track.sample_at(1.999), Some(false));
    assert_eq!(track.sample_at(2.0), Some(true));
    assert_eq!(track.sample_at(50.0), Some(true));
    assert_eq!(track.length(), 2.0);
}

/// it should write discrete samples through a bound sink
#[test]
fn discrete_track_sink() {
    let slot = Rc::new(Cell::new(false));
    let mut track = DiscreteTrack::from_samples(vec![
        DiscreteKey::new(0.0, false),
        DiscreteKey::new(1.0, true),
    ]);
    track.bind_direct(slot.clone());
    track.evaluate(1.5);
    assert!(slot.get());
    track.evaluate(0.5);
    assert!(!slot.get());
}

/// it should keep discrete samples sorted and removable by position
#[test]
fn discrete_track_editing() {
    let mut track = DiscreteTrack::<bool>::new();
    track.add_sample(2.0, true);
    track.add_sample(0.0, false);
    let positions: Vec<f32> = track.samples().iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![0.0, 2.0]);

    let v0 = track.version();
    assert!(track.remove_sample(2.0));
    assert_ne!(track.version(), v0);
    assert!(!track.remove_sample(2.0));
}
