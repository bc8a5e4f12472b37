//! Key uid allocation.

use serde::{Deserialize, Serialize};

/// Monotonic allocator for key uids. Uid 0 is reserved as "unassigned";
/// allocation starts at 1. Deterministic replacement for ambient random ids.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct UidAllocator {
    next: u64,
}

impl Default for UidAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl UidAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.wrapping_add(1).max(1);
        id
    }

    /// Keeps future allocations clear of an already-present uid
    /// (e.g. one restored from serialized data).
    #[inline]
    pub fn reserve_past(&mut self, uid: u64) {
        if uid >= self.next {
            self.next = uid.wrapping_add(1).max(1);
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
