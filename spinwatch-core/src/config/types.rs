//! Configuration type definitions
//!
//! Configuration is loaded once at boot and never mutated afterwards.

use heapless::{String, Vec};

/// Maximum machine name length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum webhook URL length
pub const MAX_URL_LEN: usize = 128;

/// Maximum monitored machines
pub const MAX_MACHINES: usize = 4;

/// How raw samples are reduced into one reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleMode {
    /// Integer mean of all samples
    #[default]
    Average,
    /// Largest sample
    Peak,
}

/// Sampling policy for one sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplingPolicy {
    /// Reduction mode
    pub mode: SampleMode,
    /// Raw reads per poll (at least 1)
    pub count: u16,
    /// Delay between consecutive raw reads (ms)
    pub delay_ms: u32,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            mode: SampleMode::Average,
            count: 30,
            delay_ms: 1,
        }
    }
}

impl SamplingPolicy {
    /// Upper bound on the time spent waiting between reads (ms)
    pub fn max_wait_ms(&self) -> u64 {
        self.count.saturating_sub(1) as u64 * self.delay_ms as u64
    }
}

/// Per-appliance configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineConfig {
    /// Machine identifier, shown on the status page and in push messages
    pub name: String<MAX_LABEL_LEN>,
    /// Disabled machines are dropped at load time
    pub enabled: bool,
    /// ADC-capable GPIO the vibration sensor is wired to
    pub sensor_pin: u8,
    /// Automation webhook, POSTed with an empty body on completion
    pub webhook_url: String<MAX_URL_LEN>,
    /// Reading above which vibration counts as active
    pub threshold: u16,
    /// Sustained vibration required before a cycle counts as started (s)
    pub start_confirm_s: u32,
    /// Silence required before a running cycle counts as finished (s)
    pub cooldown_s: u32,
    /// Silence after which an unconfirmed start is dropped (s)
    pub false_alarm_s: u32,
    /// Sampling policy
    pub sampling: SamplingPolicy,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            sensor_pin: 27,
            webhook_url: String::new(),
            threshold: 1500,
            start_confirm_s: 60,
            cooldown_s: 300,
            false_alarm_s: 10,
            sampling: SamplingPolicy::default(),
        }
    }
}

/// Global monitor settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorSettings {
    /// Log every reading and suppress notifications
    pub calibration_mode: bool,
    /// Driver period in normal operation (ms)
    pub poll_interval_ms: u32,
    /// Driver period in calibration mode (ms)
    pub calibration_poll_interval_ms: u32,
    /// TCP port of the status page
    pub status_port: u16,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            calibration_mode: false,
            poll_interval_ms: 1000,
            calibration_poll_interval_ms: 200,
            status_port: 80,
        }
    }
}

impl MonitorSettings {
    /// Driver period for the configured mode (ms)
    pub fn active_poll_interval_ms(&self) -> u32 {
        if self.calibration_mode {
            self.calibration_poll_interval_ms
        } else {
            self.poll_interval_ms
        }
    }
}

/// Notification endpoints shared by all machines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotifyConfig {
    /// Push service URL (empty disables the push sink)
    pub push_url: String<MAX_URL_LEN>,
}

/// Complete monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorConfig {
    /// Global settings
    pub monitor: MonitorSettings,
    /// Notification endpoints
    pub notify: NotifyConfig,
    /// Enabled machines, in declaration order
    pub machines: Vec<MachineConfig, MAX_MACHINES>,
}

impl MonitorConfig {
    /// Create an empty configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a machine by name
    pub fn find_machine(&self, name: &str) -> Option<&MachineConfig> {
        self.machines.iter().find(|m| m.name.as_str() == name)
    }

    /// Whether a finished cycle can reach anyone
    ///
    /// True when the push URL or any machine's webhook URL is set.
    pub fn has_sinks(&self) -> bool {
        !self.notify.push_url.is_empty()
            || self.machines.iter().any(|m| !m.webhook_url.is_empty())
    }
}
