//! RP2040-specific HAL for the Spinwatch laundry monitor
//!
//! Provides RP2040 implementations of the `spinwatch-core` sensor trait:
//!
//! - ADC channel mapping and pin allocation for config-driven setup
//! - Vibration sensor backed by the on-chip 12-bit ADC

#![no_std]

pub mod adc;

pub use adc::{AdcChannel, AdcPins, AdcSensor};
