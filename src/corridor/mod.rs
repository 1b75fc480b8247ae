// corridor/mod.rs
pub mod coordinator;
pub mod persistence;
pub mod planner;

pub use coordinator::{
    current_timestamp, CorridorCoordinator, CorridorRequest, CorridorSnapshot, CorridorStatus,
    CorridorType, RouteJunction,
};
pub use planner::{
    direction_between, plan_overrides, validate_route, Direction, DirectionalOverride,
    OverrideRole,
};
