// signal_engine/mod.rs
pub mod engine;
pub mod signal;

pub use engine::SignalEngine;
pub use signal::{phase_timings, JunctionSignal, LightColor, PhaseTiming, SignalState};
