//! # Global reference registry for long-lived handles.
//!
//! Handles held in process-wide storage must not rely on ordinary static
//! destruction order: by the time a program winds down, a handle stored in
//! a `static` may point at an object whose collaborators are already gone.
//! [`StaticSlot`] plus [`teardown`] give those handles a controlled exit:
//! every slot registers itself in a process-wide list on first use, and one
//! teardown pass erases them all, in registration order, exactly once.
//!
//! ## Architecture
//! ```text
//! static FONT:  StaticSlot<FontAtlas>  ──┐   set() registers the slot
//! static QUADS: StaticSlot<MeshPool>   ──┼──► process-wide registry list
//! static ...                           ──┘
//!
//! registry::teardown()
//!    └─► for each registered slot, in order: erase()
//!           └─► slot handle → null; displaced handle dropped
//!               *after* the slot lock is released
//! ```
//!
//! ## Rules
//! - `teardown()` is idempotent: a second pass finds only null slots and
//!   does nothing.
//! - Erasure never runs the target's cleanup while a slot lock is held;
//!   the handle is moved out first and dropped outside the lock.
//! - After teardown, [`StaticSlot::get`] returns a null handle.
//!
//! ## Example
//! ```
//! use frameflow::{registry, Handle, StaticSlot};
//!
//! static BANNER: StaticSlot<String> = StaticSlot::new();
//!
//! BANNER.set(Handle::new("frame 0".to_string()));
//! assert_eq!(&*BANNER.get(), "frame 0");
//!
//! registry::teardown();
//! assert!(BANNER.get().is_null());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::handle::Handle;

/// Erasure hook held by the process-wide registry list.
trait Erase: Sync {
    fn erase(&self);
}

/// All registered slots, in first-set order.
static REGISTRY: Mutex<Vec<&'static dyn Erase>> = Mutex::new(Vec::new());

/// A handle slot for process-wide (`static`) storage.
///
/// Const-constructible, so it can be declared directly:
///
/// ```
/// use frameflow::StaticSlot;
/// static POOL: StaticSlot<Vec<u8>> = StaticSlot::new();
/// ```
///
/// The slot starts null; the first [`set`](StaticSlot::set) registers it
/// for [`teardown`].
pub struct StaticSlot<T: ?Sized + Send + Sync + 'static> {
    slot: Mutex<Handle<T>>,
    registered: AtomicBool,
}

impl<T: ?Sized + Send + Sync + 'static> StaticSlot<T> {
    /// Creates an empty, unregistered slot.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Handle::null()),
            registered: AtomicBool::new(false),
        }
    }

    /// Stores a handle in the slot, registering the slot on first use.
    ///
    /// The displaced handle (if any) is released after the slot lock is
    /// dropped, so its cleanup never runs under the lock.
    pub fn set(&'static self, value: Handle<T>) {
        if !self.registered.swap(true, Ordering::SeqCst) {
            REGISTRY
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(self);
        }
        let displaced = {
            let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, value)
        };
        drop(displaced);
    }

    /// Returns a clone of the held handle (null before the first `set` and
    /// after teardown).
    pub fn get(&self) -> Handle<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Erase for StaticSlot<T> {
    fn erase(&self) {
        let displaced = {
            let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, Handle::null())
        };
        drop(displaced);
    }
}

/// Erases every registered slot once, in registration order.
///
/// Call at the end of the process lifetime, before collaborator systems go
/// away. Safe to call again: erased slots are null and erasing them is a
/// no-op. Slots set *after* a teardown pass are live again until the next
/// pass.
pub fn teardown() {
    let slots: Vec<&'static dyn Erase> = REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    for slot in slots {
        slot.erase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct Probe {
        drops: Arc<AtomicUsize>,
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    // One test covers the whole lifecycle: the registry is process-wide
    // state, and parallel test threads calling teardown() would observe
    // each other.
    #[test]
    fn test_slot_lifecycle_and_idempotent_teardown() {
        static FIRST: StaticSlot<Probe> = StaticSlot::new();
        static SECOND: StaticSlot<Probe> = StaticSlot::new();

        let drops = Arc::new(AtomicUsize::new(0));
        FIRST.set(Handle::new(Probe { drops: drops.clone() }));
        SECOND.set(Handle::new(Probe { drops: drops.clone() }));
        assert!(!FIRST.get().is_null());

        // Replacing a value releases the displaced handle exactly once.
        FIRST.set(Handle::new(Probe { drops: drops.clone() }));
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        teardown();
        assert!(FIRST.get().is_null());
        assert!(SECOND.get().is_null());
        assert_eq!(drops.load(Ordering::SeqCst), 3);

        // Second pass finds only null slots.
        teardown();
        assert_eq!(drops.load(Ordering::SeqCst), 3);

        // A slot refilled after teardown is erased by the next pass.
        FIRST.set(Handle::new(Probe { drops: drops.clone() }));
        teardown();
        assert!(FIRST.get().is_null());
        assert_eq!(drops.load(Ordering::SeqCst), 4);
    }
}
