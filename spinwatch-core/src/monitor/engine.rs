//! Per-appliance evaluation

use heapless::Vec;

use super::snapshot::{MachineSnapshot, StatusBoard};
use crate::config::{MachineConfig, MAX_MACHINES};
use crate::state::{DetectionParams, Event, MachineState};

/// Index of a machine inside a [`Monitor`]
///
/// Ids follow configuration order and stay valid for the monitor's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineId(u8);

impl MachineId {
    /// Position in configuration order
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct Slot {
    config: MachineConfig,
    params: DetectionParams,
    state: MachineState,
}

/// All monitored appliances
///
/// Machines are evaluated independently; ticking one never reads or
/// writes another.
#[derive(Debug, Clone)]
pub struct Monitor {
    slots: Vec<Slot, MAX_MACHINES>,
}

impl Monitor {
    /// Create an idle state machine for every configured appliance
    pub fn new(machines: &[MachineConfig], now_ms: u64) -> Self {
        let mut slots = Vec::new();
        for config in machines.iter().take(MAX_MACHINES) {
            // Capacity bounded by take()
            let _ = slots.push(Slot {
                config: config.clone(),
                params: DetectionParams::from(config),
                state: MachineState::new(now_ms),
            });
        }
        Self { slots }
    }

    /// Number of monitored machines
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when nothing is monitored
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Ids of all machines in configuration order
    pub fn ids(&self) -> impl Iterator<Item = MachineId> {
        (0..self.slots.len() as u8).map(MachineId)
    }

    /// Look up a machine by name
    pub fn find(&self, name: &str) -> Option<MachineId> {
        self.slots
            .iter()
            .position(|s| s.config.name.as_str() == name)
            .map(|i| MachineId(i as u8))
    }

    /// Configuration of a machine
    pub fn config(&self, id: MachineId) -> Option<&MachineConfig> {
        self.slots.get(id.index()).map(|s| &s.config)
    }

    /// Current state of a machine
    pub fn state(&self, id: MachineId) -> Option<&MachineState> {
        self.slots.get(id.index()).map(|s| &s.state)
    }

    /// Advance one machine
    ///
    /// A `None` reading (sensor fault) skips the tick and leaves state and
    /// timers untouched.
    pub fn tick(&mut self, id: MachineId, reading: Option<u16>, now_ms: u64) -> Option<Event> {
        let slot = self.slots.get_mut(id.index())?;
        let reading = reading?;
        slot.state.tick(&slot.params, reading, now_ms)
    }

    /// Copy every machine's display state
    pub fn snapshot(&self, now_ms: u64) -> StatusBoard {
        let mut board = StatusBoard::new();
        board.taken_at_ms = now_ms;
        for slot in &self.slots {
            // Same capacity as slots
            let _ = board.machines.push(MachineSnapshot::capture(&slot.config, &slot.state));
        }
        board
    }
}
