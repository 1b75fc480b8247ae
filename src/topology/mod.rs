// topology/mod.rs
pub mod junctions;

pub use junctions::{
    create_junctions, validate_green_times, Junction, JunctionId, Position, SignalMode,
    TopologyRegistry,
};
