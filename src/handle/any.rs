//! # `Arc`-level any-casting support.
//!
//! [`AsAnyArc`] is the upcast hook behind [`Handle::downcast`](crate::Handle::downcast):
//! it turns a shared reference-counted object into `Arc<dyn Any + Send + Sync>`
//! so the concrete type can be recovered without consuming the original handle.
//!
//! The trait is blanket-implemented for every `Any + Send + Sync` type, so
//! object traits in this crate ([`Task`](crate::Task),
//! [`TaskFactory`](crate::TaskFactory), the scene interfaces) only need to
//! name it as a supertrait to make their handles castable.

use std::any::Any;
use std::sync::Arc;

/// Upcast to [`Any`], both by reference and at the `Arc` level.
///
/// Automatically implemented for all compatible types; never implement it
/// by hand.
pub trait AsAnyArc: Any + Send + Sync {
    /// Upcasts a shared pointer to `Arc<dyn Any + Send + Sync>`.
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Upcasts a plain reference to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
