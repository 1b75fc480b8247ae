use crate::corridor::coordinator::{CorridorType, RouteJunction};
use crate::corridor::planner::DirectionalOverride;
use crate::topology::JunctionId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// The single well-known record written when a corridor activates and
/// removed when it returns to idle. Carries enough to redisplay the route
/// after a restart without consulting the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedCorridor {
    pub route: Vec<RouteJunction>,
    pub corridor_type: CorridorType,
    pub duration_minutes: u32,
    pub start_time: u64,
    pub end_time: u64,
    pub phase_overrides: HashMap<JunctionId, DirectionalOverride>,
}

pub fn save(path: &Path, record: &PersistedCorridor) -> io::Result<()> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    fs::write(path, json)
}

/// Loads the persisted corridor record, if any. An unreadable record is
/// discarded rather than propagated; recovery then boots into idle.
pub fn load(path: &Path) -> Option<PersistedCorridor> {
    let json = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&json) {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!(
                "discarding unreadable corridor record at {}: {}",
                path.display(),
                e
            );
            let _ = fs::remove_file(path);
            None
        }
    }
}

pub fn clear(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!("failed to remove corridor record {}: {}", path.display(), e);
        }
    }
}
