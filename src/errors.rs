use crate::topology::JunctionId;
use std::error::Error;
use std::fmt;

/// All rejections this subsystem can return to a caller. None of these are
/// fatal to the process; every one is a synchronous rejection with no state
/// change behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The route is too short, repeats a junction, or a consecutive pair is
    /// not road-adjacent.
    InvalidRoute(String),
    /// A corridor request arrived while another corridor is pending or active.
    CorridorAlreadyActive,
    /// A junction id not present in the topology registry.
    UnknownJunction(JunctionId),
    /// A green time outside the configured bounds, or a timing array whose
    /// shape does not match the junction's phase count.
    InvalidTimingValue(String),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::InvalidRoute(reason) => write!(f, "invalid route: {}", reason),
            ControlError::CorridorAlreadyActive => {
                write!(f, "a corridor is already pending or active; cancel it first")
            }
            ControlError::UnknownJunction(id) => write!(f, "unknown junction: {}", id),
            ControlError::InvalidTimingValue(reason) => {
                write!(f, "invalid timing value: {}", reason)
            }
        }
    }
}

impl Error for ControlError {}
