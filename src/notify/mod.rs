// Notification module
// Delivers session transition notifications to external listeners

pub mod emitter;
pub mod sink;
pub mod types;

pub use emitter::Notifier;
pub use sink::{MemorySink, NotificationSink};
pub use types::SessionNotification;
