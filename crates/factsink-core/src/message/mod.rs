//! Inbound notifications.
//!
//! - `envelope` -- decoding Lambda, SNS HTTP and bare notification events
//! - `processor` -- `NotificationProcessor` trait and `BoxNotificationProcessor`

pub mod envelope;
pub mod processor;

pub use envelope::{InboundEvent, decode_event, decode_message};
pub use processor::{BoxNotificationProcessor, NotificationProcessor};
