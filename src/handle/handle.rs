//! # Reference-counted, non-silently-null handle.
//!
//! [`Handle`] is the ownership primitive used for every shared object in
//! the crate: tasks, factories, contexts, scene interfaces. It wraps an
//! optional [`Arc`], so copying a handle is an atomic acquire and dropping
//! one is an atomic release; the target's `Drop` implementation is the
//! destruction hook and runs exactly once, when the last handle goes away.
//!
//! ## Rules
//! - A handle is either null or points to a live object. **Dereferencing a
//!   null handle panics** with an explicit message; it is never a silent
//!   no-op. Use [`Handle::try_get`] for the rare caller that genuinely
//!   handles nullness.
//! - Cloning acquires the new reference before any old reference is
//!   released (ordinary Rust drop ordering), so alias and self assignment
//!   are safe.
//! - [`Handle::downcast`] is the checked cast: it yields a **null handle**
//!   when the dynamic type does not match. [`Handle::downcast_unchecked`]
//!   is caller-guaranteed; a mismatch is an ownership-contract violation
//!   and panics.
//! - Equality compares target identity, never target contents.
//!
//! ## Example
//! ```
//! use frameflow::Handle;
//!
//! let a: Handle<String> = Handle::new("mesh".to_string());
//! let b = a.clone();
//! assert!(a.ptr_eq(&b));
//! assert_eq!(&*b, "mesh");
//!
//! let n: Handle<String> = Handle::null();
//! assert!(n.is_null());
//! assert!(n.try_get().is_none());
//! ```

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::any::AsAnyArc;

/// Shared handle to a reference-counted object.
///
/// `T` is usually an object trait (`dyn Task`, `dyn TaskFactory`,
/// `dyn NodeSet`); concrete types work too. The counter lives in the
/// shared allocation and is manipulated atomically, which makes handles
/// safe to clone and drop from any worker.
pub struct Handle<T: ?Sized> {
    target: Option<Arc<T>>,
}

impl<T: ?Sized> Handle<T> {
    /// Creates a null handle.
    pub const fn null() -> Self {
        Self { target: None }
    }

    /// Creates a handle from an existing shared pointer.
    ///
    /// Unsized coercion applies at the call site, so
    /// `Handle::<dyn Task>::from_arc(Arc::new(MyTask))` works directly.
    pub fn from_arc(target: Arc<T>) -> Self {
        Self { target: Some(target) }
    }

    /// True if this handle points at nothing.
    pub fn is_null(&self) -> bool {
        self.target.is_none()
    }

    /// Returns the target object.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null. This is an ownership-contract
    /// violation and is reported immediately rather than masked.
    pub fn get(&self) -> &T {
        match &self.target {
            Some(t) => t,
            None => panic!("null handle dereferenced (ownership contract violation)"),
        }
    }

    /// Returns the target object, or `None` for a null handle.
    pub fn try_get(&self) -> Option<&T> {
        self.target.as_deref()
    }

    /// True if both handles point to the same object (or are both null).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.target, &other.target) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> Handle<T> {
    /// Creates a handle owning a fresh object.
    pub fn new(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }
}

impl<T: ?Sized + AsAnyArc> Handle<T> {
    /// Checked cast to a concrete type.
    ///
    /// Returns a null handle when the dynamic type does not match; the
    /// original handle is unaffected either way.
    ///
    /// # Example
    /// ```
    /// use frameflow::{Handle, TaskFn, TaskGraph, TaskRef};
    ///
    /// let graph: TaskRef = Handle::from_arc(std::sync::Arc::new(TaskGraph::new()));
    /// assert!(!graph.downcast::<TaskGraph>().is_null());
    ///
    /// let leaf: TaskRef = TaskFn::handle("noop", || async { Ok(()) });
    /// assert!(leaf.downcast::<TaskGraph>().is_null());
    /// ```
    pub fn downcast<U: Any + Send + Sync>(&self) -> Handle<U> {
        match &self.target {
            Some(arc) => match Arc::clone(arc).as_any_arc().downcast::<U>() {
                Ok(hit) => Handle::from_arc(hit),
                Err(_) => Handle::null(),
            },
            None => Handle::null(),
        }
    }

    /// Unchecked cast to a concrete type; the caller guarantees the match.
    ///
    /// A null handle casts to a null handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is non-null and the dynamic type does not
    /// match (ownership-contract violation).
    pub fn downcast_unchecked<U: Any + Send + Sync>(&self) -> Handle<U> {
        let hit = self.downcast::<U>();
        if !self.is_null() && hit.is_null() {
            panic!("handle cast to wrong concrete type (ownership contract violation)");
        }
        hit
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T: ?Sized> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T: ?Sized> From<Arc<T>> for Handle<T> {
    fn from(target: Arc<T>) -> Self {
        Self::from_arc(target)
    }
}

impl<T: ?Sized> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: ?Sized> Eq for Handle<T> {}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(t) => write!(f, "Handle({:p})", Arc::as_ptr(t)),
            None => write!(f, "Handle(null)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Probe {
        drops: Arc<AtomicUsize>,
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_clone_keeps_target_alive_until_last_drop() {
        let drops = Arc::new(AtomicUsize::new(0));
        let first = Handle::new(Probe { drops: drops.clone() });

        let copies: Vec<_> = (0..8).map(|_| first.clone()).collect();
        drop(copies);
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        drop(first);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reassignment_is_alias_safe() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut a = Handle::new(Probe { drops: drops.clone() });
        let alias = a.clone();

        a = alias.clone();
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert!(a.ptr_eq(&alias));

        drop(a);
        drop(alias);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "null handle dereferenced")]
    fn test_null_deref_panics() {
        let h: Handle<u32> = Handle::null();
        let _ = *h;
    }

    #[test]
    fn test_identity_equality() {
        let a = Handle::new(5u32);
        let b = Handle::new(5u32);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(Handle::<u32>::null(), Handle::null());
        assert_ne!(a, Handle::null());
    }

    trait Shape: AsAnyArc {}

    struct Circle;
    struct Square;
    impl Shape for Circle {}
    impl Shape for Square {}

    #[test]
    fn test_downcast_checked() {
        let h: Handle<dyn Shape> = Handle::from_arc(Arc::new(Circle));
        assert!(!h.downcast::<Circle>().is_null());
        assert!(h.downcast::<Square>().is_null());

        let null: Handle<dyn Shape> = Handle::null();
        assert!(null.downcast::<Circle>().is_null());
    }

    #[test]
    #[should_panic(expected = "wrong concrete type")]
    fn test_downcast_unchecked_mismatch_panics() {
        let h: Handle<dyn Shape> = Handle::from_arc(Arc::new(Circle));
        let _ = h.downcast_unchecked::<Square>();
    }
}
