pub mod platform;
pub mod service;

pub use platform::{LogPlatform, NotificationPlatform, NotifyError};
pub use service::{NotificationConfig, NotificationHandle, NotificationService};
