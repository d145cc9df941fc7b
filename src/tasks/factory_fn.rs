//! # Function-backed factory (`FactoryFn`)
//!
//! [`FactoryFn`] wraps a closure `F: Fn(&Context) -> Result<TaskRef,
//! ProduceError>`, the quickest way for collaborators (and tests) to supply
//! leaf factories without defining a new type.
//!
//! ## Example
//! ```rust
//! use frameflow::{Context, FactoryFn, FactoryRef, Task, TaskError, TaskFactory, TaskFn};
//!
//! let draw: FactoryRef = FactoryFn::handle(|_ctx: &Context| {
//!     Ok(TaskFn::handle("draw", || async { Ok::<_, TaskError>(()) }))
//! });
//!
//! let task = draw.produce(&Context::detached()).unwrap();
//! assert_eq!(task.name(), "draw");
//! ```

use std::sync::Arc;

use crate::context::Context;
use crate::error::ProduceError;
use crate::handle::Handle;
use crate::tasks::factory::{FactoryRef, TaskFactory};
use crate::tasks::task::TaskRef;

/// Function-backed factory implementation.
pub struct FactoryFn<F> {
    f: F,
}

impl<F> FactoryFn<F> {
    /// Creates a new function-backed factory.
    ///
    /// Prefer [`FactoryFn::handle`] when you immediately need a
    /// [`FactoryRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> FactoryFn<F>
where
    F: Fn(&Context) -> Result<TaskRef, ProduceError> + Send + Sync + 'static,
{
    /// Creates the factory and returns it as a shared handle.
    pub fn handle(f: F) -> FactoryRef {
        Handle::from_arc(Arc::new(Self::new(f)))
    }
}

impl<F> TaskFactory for FactoryFn<F>
where
    F: Fn(&Context) -> Result<TaskRef, ProduceError> + Send + Sync + 'static,
{
    fn produce(&self, ctx: &Context) -> Result<TaskRef, ProduceError> {
        (self.f)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::task_fn::TaskFn;

    #[test]
    fn test_produce_yields_fresh_tasks() {
        let fac = FactoryFn::handle(|_ctx: &Context| {
            Ok(TaskFn::handle("leaf", || async { Ok::<_, TaskError>(()) }))
        });
        let ctx = Context::detached();
        let a = fac.produce(&ctx).unwrap();
        let b = fac.produce(&ctx).unwrap();
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_produce_error_surfaces() {
        let fac = FactoryFn::handle(|_ctx: &Context| Err(ProduceError::failed("no mesh")));
        let err = fac.produce(&Context::detached()).unwrap_err();
        assert_eq!(err.as_label(), "produce_failed");
    }
}
