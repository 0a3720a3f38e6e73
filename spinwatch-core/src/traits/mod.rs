//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and board-specific implementations.

pub mod sensor;
pub mod webhook;

pub use sensor::{SensorFault, VibrationSensor};
pub use webhook::{DeliveryFault, WebhookClient};
