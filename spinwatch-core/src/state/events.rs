//! Events emitted by state transitions

/// Transition reported by a tick
///
/// A tick reports at most one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Idle machine crossed the threshold; verification started
    MovementDetected,
    /// Vibration outlasted the start-confirm window; cycle is running
    ConfirmedStarted,
    /// Verification abandoned after the grace period of silence
    FalseAlarm,
    /// Running machine stayed silent past the cooldown; cycle is done
    Finished,
}

impl Event {
    /// Check if this event should trigger a completion notification
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_finished_is_completion() {
        assert!(Event::Finished.is_completion());
        assert!(!Event::MovementDetected.is_completion());
        assert!(!Event::ConfirmedStarted.is_completion());
        assert!(!Event::FalseAlarm.is_completion());
    }
}
