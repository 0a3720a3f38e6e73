//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod led;
pub mod monitor;
pub mod net;
pub mod notify;
pub mod status;

pub use led::{led_task, BlinkCode};
pub use monitor::{monitor_task, WiredSensor};
pub use net::{cyw43_task, net_task};
pub use notify::notify_task;
pub use status::status_task;
