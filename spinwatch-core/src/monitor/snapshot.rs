//! Read-only copies of machine state

use heapless::{String, Vec};

use crate::config::{MachineConfig, MAX_LABEL_LEN, MAX_MACHINES};
use crate::state::{MachineState, Phase};

/// Display state of one machine at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineSnapshot {
    pub name: String<MAX_LABEL_LEN>,
    pub phase: Phase,
    pub phase_entered_ms: u64,
    pub current_reading: u16,
    pub session_peak: u16,
}

impl MachineSnapshot {
    pub(crate) fn capture(config: &MachineConfig, state: &MachineState) -> Self {
        Self {
            name: config.name.clone(),
            phase: state.phase(),
            phase_entered_ms: state.phase_entered_ms(),
            current_reading: state.current_reading(),
            session_peak: state.session_peak(),
        }
    }

    /// Time spent in Running at `now_ms`, or None in any other phase
    pub fn running_for_ms(&self, now_ms: u64) -> Option<u64> {
        match self.phase {
            Phase::Running => Some(now_ms.saturating_sub(self.phase_entered_ms)),
            _ => None,
        }
    }
}

/// Consistent copy of every machine, taken after one driver cycle
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusBoard {
    /// Machines in configuration order
    pub machines: Vec<MachineSnapshot, MAX_MACHINES>,
    /// Uptime when the copy was taken (ms)
    pub taken_at_ms: u64,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    /// Empty board, usable in a `static`
    pub const fn new() -> Self {
        Self {
            machines: Vec::new(),
            taken_at_ms: 0,
        }
    }

    /// True if any machine is mid-cycle
    pub fn any_running(&self) -> bool {
        self.machines.iter().any(|m| m.phase == Phase::Running)
    }

    /// Look up a machine by name
    pub fn get(&self, name: &str) -> Option<&MachineSnapshot> {
        self.machines.iter().find(|m| m.name.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MachineSnapshot> {
        self.machines.iter()
    }
}
