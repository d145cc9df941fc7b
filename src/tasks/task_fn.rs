//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future
//! per run. This avoids shared mutable state: each run owns its own
//! future, and state shared between runs must be an explicit `Arc` inside
//! the closure.
//!
//! ## Example
//! ```rust
//! use frameflow::{Task, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::handle("upload-uniforms", || async {
//!     // push the buffer...
//!     Ok::<_, TaskError>(())
//! });
//!
//! assert_eq!(t.name(), "upload-uniforms");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::handle::Handle;
use crate::tasks::task::{Task, TaskRef};

/// Function-backed task implementation.
///
/// Wraps a closure that *creates* a new future per run.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::handle`] when you immediately need a [`TaskRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F, Fut> TaskFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    /// Creates the task and returns it as a shared handle.
    ///
    /// ## Example
    /// ```rust
    /// use frameflow::{Task, TaskError, TaskFn, TaskRef};
    ///
    /// let t: TaskRef = TaskFn::handle("hello", || async { Ok::<_, TaskError>(()) });
    /// assert_eq!(t.name(), "hello");
    /// ```
    pub fn handle(name: impl Into<Cow<'static, str>>, f: F) -> TaskRef {
        Handle::from_arc(Arc::new(Self::new(name, f)))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), TaskError> {
        (self.f)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_run_invokes_closure_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let t = TaskFn::handle("counter", move || {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        assert!(t.run().await.is_ok());
        assert!(t.run().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let t = TaskFn::handle("broken", || async { Err(TaskError::failed("boom")) });
        let err = t.run().await.unwrap_err();
        assert_eq!(err.as_label(), "task_failed");
    }
}
