//! Tasks and the factories that produce them.

mod factory;
mod factory_fn;
mod task;
mod task_fn;

pub use factory::{FactoryRef, TaskFactory};
pub use factory_fn::FactoryFn;
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
