pub mod corridor;
pub mod display;
pub mod errors;
pub mod global_variables;
pub mod signal_engine;
pub mod topology;
