//! Configuration types
//!
//! Board-agnostic configuration structures, parsed from `monitor.toml`.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ConfigError};
pub use types::*;
