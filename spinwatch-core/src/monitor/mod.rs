//! Monitor
//!
//! Owns one state machine per configured appliance and publishes
//! point-in-time copies of their state for the status page.

pub mod calibration;
pub mod engine;
pub mod snapshot;

pub use calibration::calibration_line;
pub use engine::{MachineId, Monitor};
pub use snapshot::{MachineSnapshot, StatusBoard};
