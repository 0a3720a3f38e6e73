//! Completion notifier
//!
//! Delivers a "finished" alert to the per-machine automation webhook and to
//! the shared push service. The sinks are independent: one failing never
//! prevents the other from being attempted.

pub mod dispatch;
pub mod http;

pub use dispatch::{push_message, DeliveryReport, Notifier, SinkOutcome, PUSH_MESSAGE_MAX};
pub use http::{parse_status_line, write_post_request, HttpUrl};
