//! Sampler
//!
//! Turns several raw sensor reads into one representative reading per poll.

pub mod reduce;

pub use reduce::{normalize_12bit, reduce, sample, Accumulator, ADC_12BIT_MAX};
