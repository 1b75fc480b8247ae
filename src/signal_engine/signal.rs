use crate::errors::ControlError;
use crate::global_variables::{ALL_RED_TIME_PER_PHASE, YELLOW_TIME};
use crate::topology::{validate_green_times, Junction, SignalMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightColor {
    Green,
    Yellow,
    Red,
}

/// Live signal state for one junction. Exactly one phase index is non-red at
/// any instant: the active one, whose color is `current_light`. Every other
/// phase index is implicitly red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    pub active_phase_index: usize,
    pub current_light: LightColor,
    pub time_remaining: u32,
}

/// Derived timing for one phase. Red here is how long the phase waits while
/// the rest of the cycle runs, not a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    pub green: u32,
    pub yellow: u32,
    pub red: u32,
}

/// Derives the per-phase timing table from a green-time array.
pub fn phase_timings(green_times: &[u32]) -> Vec<PhaseTiming> {
    let phase_count = green_times.len() as u32;
    let total_green: u32 = green_times.iter().sum();
    let all_red_time = phase_count * ALL_RED_TIME_PER_PHASE;
    green_times
        .iter()
        .map(|&green| {
            let other_green = total_green - green;
            let other_yellow = (phase_count - 1) * YELLOW_TIME;
            PhaseTiming {
                green,
                yellow: YELLOW_TIME,
                red: other_green + other_yellow + all_red_time,
            }
        })
        .collect()
}

/// Per-junction cyclic state machine: green -> yellow -> all-red -> next
/// phase, forever. Strict round-robin, no skipping, no priority.
#[derive(Debug, Clone)]
pub struct JunctionSignal {
    pub junction: Junction,
    pub state: SignalState,
}

impl JunctionSignal {
    /// Builds the signal for a junction, validating the timing configuration
    /// so `tick` can never run without a usable green-time array.
    pub fn new(junction: Junction) -> Result<Self, ControlError> {
        validate_green_times(junction.phase_count, &junction.green_times)?;
        if let Some(ref manual) = junction.manual_green_times {
            validate_green_times(junction.phase_count, manual)?;
        }
        let initial = SignalState {
            active_phase_index: 0,
            current_light: LightColor::Green,
            time_remaining: junction.effective_green_times()[0],
        };
        Ok(Self {
            junction,
            state: initial,
        })
    }

    /// Restarts the cycle at phase 0 / green. Called whenever the junction's
    /// mode or timing configuration changes.
    pub fn reset(&mut self) {
        self.state = SignalState {
            active_phase_index: 0,
            current_light: LightColor::Green,
            time_remaining: self.junction.effective_green_times()[0],
        };
    }

    /// Advances the signal by one elapsed second.
    pub fn tick(&mut self) {
        if self.state.time_remaining > 1 {
            self.state.time_remaining -= 1;
            return;
        }
        let green_times = self.junction.effective_green_times();
        match self.state.current_light {
            LightColor::Green => {
                self.state.current_light = LightColor::Yellow;
                self.state.time_remaining = YELLOW_TIME;
            }
            LightColor::Yellow => {
                // End-of-phase all-red clearance, not the implicit red of the
                // other phases.
                self.state.current_light = LightColor::Red;
                self.state.time_remaining = ALL_RED_TIME_PER_PHASE;
            }
            LightColor::Red => {
                let next = (self.state.active_phase_index + 1) % self.junction.phase_count;
                self.state.active_phase_index = next;
                self.state.current_light = LightColor::Green;
                self.state.time_remaining = green_times[next];
            }
        }
    }

    /// The derived light for a given phase index: the active phase shows the
    /// running light, every other phase is red.
    pub fn phase_light(&self, phase_index: usize) -> LightColor {
        if phase_index == self.state.active_phase_index {
            self.state.current_light
        } else {
            LightColor::Red
        }
    }

    /// Seconds until `target_phase_index` goes green: the remainder of the
    /// current phase plus the full green+yellow+all-red of every phase
    /// strictly in between, wrapping around the cycle. Display only; returns
    /// None for the active phase.
    pub fn red_time_remaining(&self, target_phase_index: usize) -> Option<u32> {
        if target_phase_index >= self.junction.phase_count
            || target_phase_index == self.state.active_phase_index
        {
            return None;
        }
        let green_times = self.junction.effective_green_times();
        let mut time_until_green = match self.state.current_light {
            LightColor::Green => {
                self.state.time_remaining + YELLOW_TIME + ALL_RED_TIME_PER_PHASE
            }
            LightColor::Yellow => self.state.time_remaining + ALL_RED_TIME_PER_PHASE,
            LightColor::Red => self.state.time_remaining,
        };
        let mut index = (self.state.active_phase_index + 1) % self.junction.phase_count;
        while index != target_phase_index {
            time_until_green += green_times[index] + YELLOW_TIME + ALL_RED_TIME_PER_PHASE;
            index = (index + 1) % self.junction.phase_count;
        }
        Some(time_until_green)
    }

    /// Total cycle time: sum of greens plus per-phase yellow and all-red.
    pub fn total_cycle_time(&self) -> u32 {
        let phase_count = self.junction.phase_count as u32;
        let total_green: u32 = self.junction.effective_green_times().iter().sum();
        total_green + phase_count * YELLOW_TIME + phase_count * ALL_RED_TIME_PER_PHASE
    }

    /// Switches the operating mode. Entering Manual requires a full
    /// green-time array; the switch is rejected otherwise. A successful
    /// switch restarts the cycle.
    pub fn set_mode(
        &mut self,
        mode: SignalMode,
        manual_green_times: Option<Vec<u32>>,
    ) -> Result<(), ControlError> {
        if mode == SignalMode::Manual {
            let manual = manual_green_times.ok_or_else(|| {
                ControlError::InvalidTimingValue(
                    "switching to manual mode requires a full green-time array".to_string(),
                )
            })?;
            validate_green_times(self.junction.phase_count, &manual)?;
            self.junction.manual_green_times = Some(manual);
        }
        self.junction.mode = mode;
        self.reset();
        Ok(())
    }

    /// Replaces the configured green times (e.g. an adaptive rewrite or an
    /// operator edit). Validated at this boundary, never clamped.
    pub fn set_green_times(&mut self, green_times: Vec<u32>) -> Result<(), ControlError> {
        validate_green_times(self.junction.phase_count, &green_times)?;
        self.junction.green_times = green_times;
        self.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Junction;

    fn test_signal() -> JunctionSignal {
        let junction = Junction::new(
            "J-100",
            "Test Junction",
            12.97,
            77.59,
            vec![],
            vec![10, 20, 30],
            SignalMode::Default,
        );
        JunctionSignal::new(junction).unwrap()
    }

    #[test]
    fn starts_at_phase_zero_green() {
        let signal = test_signal();
        assert_eq!(
            signal.state,
            SignalState {
                active_phase_index: 0,
                current_light: LightColor::Green,
                time_remaining: 10,
            }
        );
    }

    #[test]
    fn green_counts_down_then_turns_yellow() {
        let mut signal = test_signal();
        for expected in (1..10).rev() {
            signal.tick();
            assert_eq!(signal.state.current_light, LightColor::Green);
            assert_eq!(signal.state.time_remaining, expected);
        }
        signal.tick();
        assert_eq!(signal.state.current_light, LightColor::Yellow);
        assert_eq!(signal.state.time_remaining, 3);
        assert_eq!(signal.state.active_phase_index, 0);
    }

    #[test]
    fn yellow_turns_to_all_red_then_next_phase() {
        let mut signal = test_signal();
        for _ in 0..10 {
            signal.tick();
        }
        assert_eq!(signal.state.current_light, LightColor::Yellow);
        for _ in 0..3 {
            signal.tick();
        }
        assert_eq!(signal.state.current_light, LightColor::Red);
        assert_eq!(signal.state.time_remaining, 1);
        signal.tick();
        assert_eq!(signal.state.active_phase_index, 1);
        assert_eq!(signal.state.current_light, LightColor::Green);
        assert_eq!(signal.state.time_remaining, 20);
    }

    #[test]
    fn full_cycle_returns_to_initial_state() {
        let mut signal = test_signal();
        let initial = signal.state;
        let cycle = signal.total_cycle_time();
        assert_eq!(cycle, 10 + 20 + 30 + 3 * 3 + 3 * 1);
        for _ in 0..cycle {
            signal.tick();
        }
        assert_eq!(signal.state, initial);
    }

    #[test]
    fn exactly_one_phase_is_non_red_every_tick() {
        let mut signal = test_signal();
        for _ in 0..(signal.total_cycle_time() * 2) {
            let non_red = (0..signal.junction.phase_count)
                .filter(|&i| signal.phase_light(i) != LightColor::Red)
                .count();
            // During all-red clearance the active phase itself shows red.
            assert!(non_red <= 1);
            if signal.state.current_light != LightColor::Red {
                assert_eq!(non_red, 1);
            }
            signal.tick();
        }
    }

    #[test]
    fn red_time_remaining_for_upcoming_phase() {
        let signal = test_signal();
        // Phase 1: remainder of phase 0 green (10) + yellow + all-red.
        assert_eq!(signal.red_time_remaining(1), Some(10 + 3 + 1));
        // Phase 2 additionally waits through phase 1's full slot.
        assert_eq!(signal.red_time_remaining(2), Some(10 + 3 + 1 + 20 + 3 + 1));
        assert_eq!(signal.red_time_remaining(0), None);
        assert_eq!(signal.red_time_remaining(7), None);
    }

    #[test]
    fn red_time_remaining_wraps_behind_active_phase() {
        let mut signal = test_signal();
        // Run into phase 1 green.
        for _ in 0..(10 + 3 + 1) {
            signal.tick();
        }
        assert_eq!(signal.state.active_phase_index, 1);
        assert_eq!(signal.state.time_remaining, 20);
        // Phase 0 is behind: remainder of phase 1 + phase 2's full slot.
        assert_eq!(
            signal.red_time_remaining(0),
            Some(20 + 3 + 1 + 30 + 3 + 1)
        );
    }

    #[test]
    fn red_time_remaining_mid_yellow_and_all_red() {
        let mut signal = test_signal();
        for _ in 0..10 {
            signal.tick();
        }
        assert_eq!(signal.state.current_light, LightColor::Yellow);
        assert_eq!(signal.red_time_remaining(1), Some(3 + 1));
        for _ in 0..3 {
            signal.tick();
        }
        assert_eq!(signal.state.current_light, LightColor::Red);
        assert_eq!(signal.red_time_remaining(1), Some(1));
    }

    #[test]
    fn phase_timings_derive_red_from_rest_of_cycle() {
        let timings = phase_timings(&[10, 20, 30]);
        // red = other greens + other yellows + all all-red slots
        assert_eq!(
            timings[0],
            PhaseTiming {
                green: 10,
                yellow: 3,
                red: (20 + 30) + 2 * 3 + 3 * 1,
            }
        );
        for timing in &timings {
            assert_eq!(timing.green + timing.yellow + timing.red, 60 + 9 + 3);
        }
    }

    #[test]
    fn manual_mode_requires_full_timing_array() {
        let mut signal = test_signal();
        assert!(matches!(
            signal.set_mode(SignalMode::Manual, None),
            Err(ControlError::InvalidTimingValue(_))
        ));
        assert!(matches!(
            signal.set_mode(SignalMode::Manual, Some(vec![15, 15])),
            Err(ControlError::InvalidTimingValue(_))
        ));
        assert_eq!(signal.junction.mode, SignalMode::Default);

        signal
            .set_mode(SignalMode::Manual, Some(vec![15, 15, 15]))
            .unwrap();
        assert_eq!(signal.junction.mode, SignalMode::Manual);
        assert_eq!(signal.state.time_remaining, 15);
        assert_eq!(signal.total_cycle_time(), 45 + 9 + 3);
    }

    #[test]
    fn mode_or_timing_change_resets_state() {
        let mut signal = test_signal();
        for _ in 0..25 {
            signal.tick();
        }
        assert_ne!(signal.state.active_phase_index, 0);
        signal.set_green_times(vec![12, 22, 32]).unwrap();
        assert_eq!(
            signal.state,
            SignalState {
                active_phase_index: 0,
                current_light: LightColor::Green,
                time_remaining: 12,
            }
        );

        assert!(matches!(
            signal.set_green_times(vec![4, 22, 32]),
            Err(ControlError::InvalidTimingValue(_))
        ));
        // Rejected edit leaves the running configuration untouched.
        assert_eq!(signal.junction.green_times, vec![12, 22, 32]);
    }
}
