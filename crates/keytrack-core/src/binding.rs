//! Value sinks and target resolution.
//!
//! The reflection layer is an external collaborator: it sits behind
//! [`TargetResolver`], which maps a field path (like `"transform/position"`)
//! to a type-erased sink. Sinks are selected once at bind time; per-frame
//! writes go through the chosen sink without re-resolving.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

/// Write-back destination for an evaluated value.
pub trait ValueSink<T> {
    fn set(&mut self, value: T);
    /// Current target value, when the binding can read it back.
    fn get(&self) -> Option<T>;
}

/// Binds a plain field through a shared cell.
pub struct DirectSink<T: Copy> {
    slot: Rc<Cell<T>>,
}

impl<T: Copy> DirectSink<T> {
    pub fn new(slot: Rc<Cell<T>>) -> Self {
        Self { slot }
    }
}

impl<T: Copy + 'static> ValueSink<T> for DirectSink<T> {
    fn set(&mut self, value: T) {
        self.slot.set(value);
    }

    fn get(&self) -> Option<T> {
        Some(self.slot.get())
    }
}

/// Binds a virtual/computed property through get/set closures.
pub struct ProxySink<T> {
    getter: Option<Box<dyn Fn() -> T>>,
    setter: Box<dyn FnMut(T)>,
}

impl<T> ProxySink<T> {
    pub fn new(setter: Box<dyn FnMut(T)>) -> Self {
        Self {
            getter: None,
            setter,
        }
    }

    pub fn with_getter(getter: Box<dyn Fn() -> T>, setter: Box<dyn FnMut(T)>) -> Self {
        Self {
            getter: Some(getter),
            setter,
        }
    }
}

impl<T: 'static> ValueSink<T> for ProxySink<T> {
    fn set(&mut self, value: T) {
        (self.setter)(value);
    }

    fn get(&self) -> Option<T> {
        self.getter.as_ref().map(|g| g())
    }
}

/// Type-erased sink handed out by resolvers; the typed channel downcasts it
/// at bind time. A kind mismatch is recoverable (the sink comes back).
pub struct ErasedSink {
    inner: Box<dyn Any>,
}

impl ErasedSink {
    pub fn new<T: 'static>(sink: Box<dyn ValueSink<T>>) -> Self {
        Self {
            inner: Box::new(sink),
        }
    }

    pub fn direct<T: Copy + 'static>(slot: Rc<Cell<T>>) -> Self {
        Self::new::<T>(Box::new(DirectSink::new(slot)))
    }

    pub fn proxy<T: 'static>(setter: Box<dyn FnMut(T)>) -> Self {
        Self::new::<T>(Box::new(ProxySink::new(setter)))
    }

    pub fn downcast<T: 'static>(self) -> Result<Box<dyn ValueSink<T>>, ErasedSink> {
        match self.inner.downcast::<Box<dyn ValueSink<T>>>() {
            Ok(sink) => Ok(*sink),
            Err(inner) => Err(ErasedSink { inner }),
        }
    }
}

/// Resolves field paths on the bound target to writable sinks. Implemented
/// by host adapters; this crate never walks object graphs itself.
pub trait TargetResolver {
    fn resolve(&mut self, path: &str) -> Option<ErasedSink>;
}
