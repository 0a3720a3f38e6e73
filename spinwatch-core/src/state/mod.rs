//! Vibration state machine
//!
//! Infers whether an appliance is idle, possibly starting, or running from
//! a stream of representative readings. The machine is explicit, finite,
//! and deterministic; it performs no I/O.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{DetectionParams, MachineState, Phase};
