//! Per-appliance state machine
//!
//! Every tick consumes one representative reading and the current
//! monotonic time. Rules run in a fixed order:
//!
//! 1. Vibration: a reading above threshold refreshes the activity stamp and
//!    may move Idle to Verifying or Verifying to Running.
//! 2. Silence: time since the last activity may drop Verifying back to Idle
//!    (false alarm) or finish a Running cycle.
//! 3. Display: the current reading and session peak are updated.
//!
//! Vibration is evaluated before silence so a reading that arrives after a
//! long gap restarts activity tracking instead of completing the cycle.

use super::events::Event;
use crate::config::MachineConfig;

/// Inferred appliance phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No sustained vibration
    #[default]
    Idle,
    /// Vibration seen, waiting for it to last the start-confirm window
    Verifying,
    /// Cycle confirmed; waiting for the cooldown of silence
    Running,
}

impl Phase {
    /// Upper-case label used on the status page and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Verifying => "VERIFYING",
            Phase::Running => "RUNNING",
        }
    }
}

/// Thresholds and timings driving one state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DetectionParams {
    /// Reading above which vibration counts as active
    pub threshold: u16,
    /// Verifying must last longer than this to become Running (ms)
    pub start_confirm_ms: u64,
    /// Running ends after silence longer than this (ms)
    pub cooldown_ms: u64,
    /// Verifying is abandoned after silence longer than this (ms)
    pub false_alarm_ms: u64,
}

impl From<&MachineConfig> for DetectionParams {
    fn from(config: &MachineConfig) -> Self {
        Self {
            threshold: config.threshold,
            start_confirm_ms: config.start_confirm_s as u64 * 1000,
            cooldown_ms: config.cooldown_s as u64 * 1000,
            false_alarm_ms: config.false_alarm_s as u64 * 1000,
        }
    }
}

/// Mutable state of one appliance
///
/// Fields are private: [`MachineState::tick`] is the only mutator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineState {
    phase: Phase,
    last_active_ms: u64,
    phase_entered_ms: u64,
    current_reading: u16,
    session_peak: u16,
}

impl MachineState {
    /// Create an idle machine at boot time `now_ms`
    pub fn new(now_ms: u64) -> Self {
        Self {
            phase: Phase::Idle,
            last_active_ms: now_ms,
            phase_entered_ms: now_ms,
            current_reading: 0,
            session_peak: 0,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Time of the last above-threshold reading (ms)
    pub fn last_active_ms(&self) -> u64 {
        self.last_active_ms
    }

    /// Time the current phase began (ms)
    pub fn phase_entered_ms(&self) -> u64 {
        self.phase_entered_ms
    }

    /// Most recent representative reading
    pub fn current_reading(&self) -> u16 {
        self.current_reading
    }

    /// Highest reading since the last completed cycle
    pub fn session_peak(&self) -> u16 {
        self.session_peak
    }

    /// Time spent in Running, or None in any other phase
    pub fn running_for_ms(&self, now_ms: u64) -> Option<u64> {
        match self.phase {
            Phase::Running => Some(now_ms.saturating_sub(self.phase_entered_ms)),
            _ => None,
        }
    }

    /// Advance the machine by one reading
    ///
    /// Returns the transition taken, if any. A completion tick leaves the
    /// session peak at zero.
    pub fn tick(&mut self, params: &DetectionParams, reading: u16, now_ms: u64) -> Option<Event> {
        let mut event = None;

        if reading > params.threshold {
            self.last_active_ms = now_ms;

            match self.phase {
                Phase::Idle => {
                    self.enter(Phase::Verifying, now_ms);
                    event = Some(Event::MovementDetected);
                }
                Phase::Verifying
                    if now_ms.saturating_sub(self.phase_entered_ms) > params.start_confirm_ms =>
                {
                    self.enter(Phase::Running, now_ms);
                    event = Some(Event::ConfirmedStarted);
                }
                _ => {}
            }
        }

        let silence_ms = now_ms.saturating_sub(self.last_active_ms);

        match self.phase {
            Phase::Verifying if silence_ms > params.false_alarm_ms => {
                self.enter(Phase::Idle, now_ms);
                event = Some(Event::FalseAlarm);
            }
            Phase::Running if silence_ms > params.cooldown_ms => {
                self.enter(Phase::Idle, now_ms);
                self.session_peak = 0;
                event = Some(Event::Finished);
            }
            _ => {}
        }

        self.current_reading = reading;
        if event != Some(Event::Finished) && reading > self.session_peak {
            self.session_peak = reading;
        }

        event
    }

    fn enter(&mut self, phase: Phase, now_ms: u64) {
        self.phase = phase;
        self.phase_entered_ms = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SEC: u64 = 1000;

    /// threshold=1500, start_confirm=60s, cooldown=300s, false_alarm=10s
    fn reference() -> DetectionParams {
        DetectionParams::from(&MachineConfig::default())
    }

    /// Feed `reading` once per second for seconds `from..to`
    fn feed(
        state: &mut MachineState,
        params: &DetectionParams,
        reading: u16,
        from: u64,
        to: u64,
    ) -> std::vec::Vec<(u64, Event)> {
        (from..to)
            .filter_map(|t| state.tick(params, reading, t * SEC).map(|e| (t, e)))
            .collect()
    }

    /// Machine confirmed Running at t=61
    fn running_machine(params: &DetectionParams) -> MachineState {
        let mut state = MachineState::new(0);
        feed(&mut state, params, 2000, 0, 62);
        assert_eq!(state.phase(), Phase::Running);
        state
    }

    #[test]
    fn test_quiet_machine_stays_idle() {
        let params = reference();
        let mut state = MachineState::new(0);

        let events = feed(&mut state, &params, 100, 0, 3600);

        assert!(events.is_empty());
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let params = reference();
        let mut state = MachineState::new(0);

        assert_eq!(state.tick(&params, 1500, 0), None);
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.tick(&params, 1501, SEC), Some(Event::MovementDetected));
    }

    #[test]
    fn test_scenario_a_confirms_after_start_window() {
        let params = reference();
        let mut state = MachineState::new(0);

        let events = feed(&mut state, &params, 2000, 0, 65);

        assert_eq!(
            events,
            vec![(0, Event::MovementDetected), (61, Event::ConfirmedStarted)]
        );
        assert_eq!(state.phase(), Phase::Running);
        assert_eq!(state.phase_entered_ms(), 61 * SEC);
    }

    #[test]
    fn test_not_running_at_exactly_start_window() {
        let params = reference();
        let mut state = MachineState::new(0);

        feed(&mut state, &params, 2000, 0, 61);

        // 60s elapsed is not strictly greater than start_confirm
        assert_eq!(state.phase(), Phase::Verifying);
    }

    #[test]
    fn test_scenario_b_finishes_once_after_cooldown() {
        let params = reference();
        let mut state = running_machine(&params);

        let active = feed(&mut state, &params, 2000, 62, 67);
        assert!(active.is_empty());
        assert_eq!(state.last_active_ms(), 66 * SEC);
        assert_eq!(state.session_peak(), 2000);

        let quiet = feed(&mut state, &params, 100, 67, 67 + 310);

        assert_eq!(quiet, vec![(367, Event::Finished)]);
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.phase_entered_ms(), 367 * SEC);
    }

    #[test]
    fn test_finished_resets_session_peak() {
        let params = reference();
        let mut state = running_machine(&params);
        feed(&mut state, &params, 9000, 62, 63);
        assert_eq!(state.session_peak(), 9000);

        // Last active at 62; 363 is the first second past cooldown
        feed(&mut state, &params, 100, 63, 363);
        assert_eq!(state.phase(), Phase::Running);

        assert_eq!(state.tick(&params, 100, 363 * SEC), Some(Event::Finished));
        assert_eq!(state.session_peak(), 0);
        assert_eq!(state.current_reading(), 100);
    }

    #[test]
    fn test_pause_shorter_than_cooldown_keeps_running() {
        let params = reference();
        let mut state = running_machine(&params);

        // Washer fill: four minutes of silence
        let quiet = feed(&mut state, &params, 100, 62, 62 + 240);
        assert!(quiet.is_empty());

        let resumed = feed(&mut state, &params, 2000, 302, 303);
        assert!(resumed.is_empty());
        assert_eq!(state.phase(), Phase::Running);
        // Running clock keeps its original baseline
        assert_eq!(state.phase_entered_ms(), 61 * SEC);
    }

    #[test]
    fn test_late_vibration_beats_cooldown() {
        let params = reference();
        let mut state = running_machine(&params);

        // Long gap, then vibration arriving on the tick that would finish
        assert_eq!(state.tick(&params, 2000, 1000 * SEC), None);
        assert_eq!(state.phase(), Phase::Running);
        assert_eq!(state.last_active_ms(), 1000 * SEC);
    }

    #[test]
    fn test_scenario_c_short_gap_keeps_verifying_window() {
        let params = reference();
        let mut state = MachineState::new(0);

        assert_eq!(state.tick(&params, 2000, 0), Some(Event::MovementDetected));
        let gap = feed(&mut state, &params, 100, 1, 6);
        assert!(gap.is_empty());
        assert_eq!(state.phase(), Phase::Verifying);

        let resumed = feed(&mut state, &params, 2000, 6, 62);
        assert_eq!(resumed, vec![(61, Event::ConfirmedStarted)]);
    }

    #[test]
    fn test_scenario_c_expired_grace_needs_fresh_window() {
        let params = reference();
        let mut state = MachineState::new(0);

        state.tick(&params, 2000, 0);
        let gap = feed(&mut state, &params, 100, 1, 12);
        assert_eq!(gap, vec![(11, Event::FalseAlarm)]);
        assert_eq!(state.phase(), Phase::Idle);

        let restarted = feed(&mut state, &params, 2000, 12, 74);
        assert_eq!(
            restarted,
            vec![(12, Event::MovementDetected), (73, Event::ConfirmedStarted)]
        );
    }

    #[test]
    fn test_false_alarm_keeps_session_peak() {
        let params = reference();
        let mut state = running_machine(&params);
        feed(&mut state, &params, 100, 62, 363);
        assert_eq!(state.phase(), Phase::Idle);

        // Idle noise raises the display peak to the noise floor
        feed(&mut state, &params, 400, 363, 365);
        assert_eq!(state.session_peak(), 400);

        // A bump raises it to the bump, and the false alarm keeps it
        state.tick(&params, 3000, 365 * SEC);
        let events = feed(&mut state, &params, 100, 366, 377);
        assert_eq!(events, vec![(376, Event::FalseAlarm)]);
        assert_eq!(state.session_peak(), 3000);
    }

    #[test]
    fn test_running_for() {
        let params = reference();
        let mut state = MachineState::new(0);
        assert_eq!(state.running_for_ms(10 * SEC), None);

        feed(&mut state, &params, 2000, 0, 62);
        assert_eq!(state.running_for_ms(61 * SEC), Some(0));
        assert_eq!(state.running_for_ms(200 * SEC), Some(139 * SEC));
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::Idle.as_str(), "IDLE");
        assert_eq!(Phase::Verifying.as_str(), "VERIFYING");
        assert_eq!(Phase::Running.as_str(), "RUNNING");
    }

    fn readings() -> impl Strategy<Value = std::vec::Vec<(u16, u64)>> {
        // (reading, seconds since previous tick)
        prop::collection::vec((0u16..4000, 0u64..400), 1..400)
    }

    proptest! {
        #[test]
        fn prop_below_threshold_stays_idle(
            steps in prop::collection::vec((0u16..=1500, 0u64..10_000), 1..300)
        ) {
            let params = reference();
            let mut state = MachineState::new(0);
            let mut now = 0;
            for (reading, dt) in steps {
                now += dt;
                prop_assert_eq!(state.tick(&params, reading, now), None);
                prop_assert_eq!(state.phase(), Phase::Idle);
            }
        }

        #[test]
        fn prop_transitions_follow_the_graph(steps in readings()) {
            let params = reference();
            let mut state = MachineState::new(0);
            let mut now = 0;
            for (reading, dt) in steps {
                now += dt * SEC;
                let before = state.clone();
                let event = state.tick(&params, reading, now);

                match (before.phase(), state.phase()) {
                    (Phase::Idle, Phase::Verifying) => {
                        prop_assert_eq!(event, Some(Event::MovementDetected))
                    }
                    (Phase::Verifying, Phase::Running) => {
                        prop_assert_eq!(event, Some(Event::ConfirmedStarted))
                    }
                    (Phase::Verifying, Phase::Idle) => {
                        prop_assert_eq!(event, Some(Event::FalseAlarm))
                    }
                    (Phase::Running, Phase::Idle) => {
                        prop_assert_eq!(event, Some(Event::Finished));
                        prop_assert_eq!(state.session_peak(), 0);
                    }
                    (a, b) => {
                        // Idle never jumps to Running, Running never drops to Verifying
                        prop_assert_eq!(a, b);
                        prop_assert_eq!(event, None);
                    }
                }

                if before.phase() == state.phase() {
                    prop_assert_eq!(before.phase_entered_ms(), state.phase_entered_ms());
                } else {
                    prop_assert_eq!(state.phase_entered_ms(), now);
                }
            }
        }

        #[test]
        fn prop_machines_are_independent(
            a in readings(),
            b in prop::collection::vec(0u16..4000, 400)
        ) {
            let params = reference();
            let mut alone = MachineState::new(0);
            let mut paired = MachineState::new(0);
            let mut other = MachineState::new(0);
            let mut now = 0;
            for (i, (reading, dt)) in a.into_iter().enumerate() {
                now += dt * SEC;
                let solo = alone.tick(&params, reading, now);
                other.tick(&params, b[i], now);
                let together = paired.tick(&params, reading, now);
                prop_assert_eq!(solo, together);
                prop_assert_eq!(&alone, &paired);
            }
        }
    }
}
