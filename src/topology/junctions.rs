use crate::errors::ControlError;
use crate::global_variables::{
    MAX_GREEN_TIME, MAX_PHASE_COUNT, MIN_GREEN_TIME, MIN_PHASE_COUNT,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a junction (e.g. "J-001").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JunctionId(pub String);

impl JunctionId {
    pub fn new(id: &str) -> Self {
        JunctionId(id.to_string())
    }
}

impl fmt::Display for JunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JunctionId {
    fn from(id: &str) -> Self {
        JunctionId(id.to_string())
    }
}

/// Geographic position of a junction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// Which timing source drives the junction's signal cycle:
/// - Default: the fixed configured green times (failsafe).
/// - Adaptive: green times rewritten by an upstream process; ticks the same.
/// - Manual: an operator-supplied green-time array replaces the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalMode {
    Default,
    Manual,
    Adaptive,
}

/// A signal-controlled road junction (node).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    /// Unique identifier for the junction.
    pub id: JunctionId,
    /// Display name.
    pub name: String,
    /// Geographic position, used for corridor direction planning.
    pub position: Position,
    /// Number of signal phases at this junction (2-6).
    pub phase_count: usize,
    /// Directly road-connected neighbor junctions. Adjacency is not
    /// transitive; the source data is symmetric.
    pub adjacent: Vec<JunctionId>,
    /// Configured green time per phase index (seconds).
    pub green_times: Vec<u32>,
    /// Operator-supplied green times, used only in Manual mode.
    pub manual_green_times: Option<Vec<u32>>,
    /// Current operating mode.
    pub mode: SignalMode,
}

impl Junction {
    pub fn new(
        id: &str,
        name: &str,
        lat: f64,
        lng: f64,
        adjacent: Vec<&str>,
        green_times: Vec<u32>,
        mode: SignalMode,
    ) -> Self {
        Self {
            id: JunctionId::new(id),
            name: name.to_string(),
            position: Position { lat, lng },
            phase_count: green_times.len(),
            adjacent: adjacent.into_iter().map(JunctionId::new).collect(),
            green_times,
            manual_green_times: None,
            mode,
        }
    }

    /// The green times the phase engine actually runs on: the manual array
    /// when the junction is in Manual mode and one is present, the configured
    /// array otherwise.
    pub fn effective_green_times(&self) -> &[u32] {
        if self.mode == SignalMode::Manual {
            if let Some(ref manual) = self.manual_green_times {
                return manual;
            }
        }
        &self.green_times
    }
}

/// Checks a green-time array against a junction's phase count and the
/// configured per-phase bounds. Rejected values are never clamped.
pub fn validate_green_times(phase_count: usize, green_times: &[u32]) -> Result<(), ControlError> {
    if green_times.len() != phase_count {
        return Err(ControlError::InvalidTimingValue(format!(
            "expected {} green times, got {}",
            phase_count,
            green_times.len()
        )));
    }
    for (index, &green) in green_times.iter().enumerate() {
        if !(MIN_GREEN_TIME..=MAX_GREEN_TIME).contains(&green) {
            return Err(ControlError::InvalidTimingValue(format!(
                "phase {} green time {}s is outside {}-{}s",
                index, green, MIN_GREEN_TIME, MAX_GREEN_TIME
            )));
        }
    }
    Ok(())
}

/// Read-only (after load) directory of junctions keyed by id.
#[derive(Debug)]
pub struct TopologyRegistry {
    junctions: HashMap<JunctionId, Junction>,
}

impl TopologyRegistry {
    /// Builds the registry, validating every junction's configuration up
    /// front so the phase engine is never handed a malformed timing array.
    pub fn from_junctions(junctions: Vec<Junction>) -> Result<Self, ControlError> {
        let mut map = HashMap::new();
        for junction in junctions {
            if !(MIN_PHASE_COUNT..=MAX_PHASE_COUNT).contains(&junction.phase_count) {
                return Err(ControlError::InvalidTimingValue(format!(
                    "junction {} has {} phases, expected {}-{}",
                    junction.id, junction.phase_count, MIN_PHASE_COUNT, MAX_PHASE_COUNT
                )));
            }
            validate_green_times(junction.phase_count, &junction.green_times)?;
            if let Some(ref manual) = junction.manual_green_times {
                validate_green_times(junction.phase_count, manual)?;
            }
            map.insert(junction.id.clone(), junction);
        }
        Ok(Self { junctions: map })
    }

    pub fn get(&self, id: &JunctionId) -> Result<&Junction, ControlError> {
        self.junctions
            .get(id)
            .ok_or_else(|| ControlError::UnknownJunction(id.clone()))
    }

    /// All junctions directly road-connected to `id`.
    pub fn adjacent_to(&self, id: &JunctionId) -> Result<Vec<&Junction>, ControlError> {
        let junction = self.get(id)?;
        Ok(junction
            .adjacent
            .iter()
            .filter_map(|adj| self.junctions.get(adj))
            .collect())
    }

    /// True iff `b` appears in `a`'s adjacency list.
    pub fn are_adjacent(&self, a: &JunctionId, b: &JunctionId) -> bool {
        match self.junctions.get(a) {
            Some(junction) => junction.adjacent.contains(b),
            None => false,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &Junction> {
        self.junctions.values()
    }

    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }
}

/// The seeded city network: eight signal-controlled junctions with their
/// road adjacency, phase counts, and configured green times.
pub fn create_junctions() -> Vec<Junction> {
    let mut junctions = vec![
        Junction::new(
            "J-001",
            "City Center",
            12.9716,
            77.5946,
            vec!["J-002", "J-005"],
            vec![40, 25, 40, 25],
            SignalMode::Adaptive,
        ),
        Junction::new(
            "J-002",
            "MG Road Crossing",
            12.9756,
            77.6066,
            vec!["J-001", "J-003", "J-006"],
            vec![35, 30, 35, 30],
            SignalMode::Adaptive,
        ),
        Junction::new(
            "J-003",
            "Railway Station",
            12.9779,
            77.5728,
            vec!["J-002", "J-004", "J-005"],
            vec![45, 35, 45],
            SignalMode::Default,
        ),
        Junction::new(
            "J-004",
            "Industrial Area",
            12.9850,
            77.6150,
            vec!["J-003", "J-006"],
            vec![30, 20, 30, 20],
            SignalMode::Manual,
        ),
        Junction::new(
            "J-005",
            "Hospital Road",
            12.9600,
            77.5800,
            vec!["J-001", "J-003", "J-007"],
            vec![35, 25, 35, 25],
            SignalMode::Adaptive,
        ),
        Junction::new(
            "J-006",
            "Tech Park Gate",
            12.9680,
            77.6200,
            vec!["J-002", "J-004", "J-008"],
            vec![30, 30, 30, 30],
            SignalMode::Default,
        ),
        Junction::new(
            "J-007",
            "Stadium Junction",
            12.9550,
            77.5900,
            vec!["J-005", "J-008"],
            vec![35, 25, 35, 25],
            SignalMode::Adaptive,
        ),
        Junction::new(
            "J-008",
            "Market Square",
            12.9620,
            77.6100,
            vec!["J-006", "J-007"],
            vec![40, 20, 40, 20],
            SignalMode::Default,
        ),
    ];

    // J-004 runs in manual mode with operator-set green times.
    junctions[3].manual_green_times = Some(vec![30, 20, 30, 20]);

    junctions
}
