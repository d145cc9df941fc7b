//! Subscribers: the fan-out layer between the event bus and user
//! observability code.

mod set;
mod stats;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use stats::{FrameSnapshot, FrameStats};
pub use subscriber::Subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
