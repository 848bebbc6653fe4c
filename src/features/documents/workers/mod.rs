mod expiry_sweeper;
mod notification_consumer;

pub use expiry_sweeper::ExpirySweeper;
pub use notification_consumer::{LoggingEventHandler, NotificationConsumer};
