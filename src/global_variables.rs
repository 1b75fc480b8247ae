// Signal timing constants (seconds). Yellow and all-red are identical for
// every phase of every junction.
pub const YELLOW_TIME: u32 = 3;
pub const ALL_RED_TIME_PER_PHASE: u32 = 1;

// Configured bounds for a single phase's green time.
pub const MIN_GREEN_TIME: u32 = 5;
pub const MAX_GREEN_TIME: u32 = 120;

// A junction runs between 2 and 6 phases.
pub const MIN_PHASE_COUNT: usize = 2;
pub const MAX_PHASE_COUNT: usize = 6;

// Public-notice period broadcast before any signal is touched (seconds).
pub const NOTICE_COUNTDOWN_SECS: u32 = 120;

// Settle delay between the notice period ending and overrides being applied,
// so a phase already in progress is not cut off mid-green.
pub const CYCLE_SETTLE_SECS: u32 = 5;

// Well-known record used for restart recovery of an active corridor.
pub const CORRIDOR_STATE_FILE: &str = "active_corridor.json";
