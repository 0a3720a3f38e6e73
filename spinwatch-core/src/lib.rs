//! Board-agnostic core logic for the Spinwatch laundry monitor
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (vibration sensor, webhook client)
//! - Sampler reducing raw ADC reads to one reading per poll
//! - Per-appliance vibration state machine
//! - Monitor holding every appliance and publishing snapshots
//! - Completion notifier
//! - Status page rendering
//! - Configuration types and the `monitor.toml` parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod monitor;
pub mod notify;
pub mod sampler;
pub mod state;
pub mod status;
pub mod traits;
