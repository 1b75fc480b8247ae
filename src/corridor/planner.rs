use crate::errors::ControlError;
use crate::signal_engine::LightColor;
use crate::topology::{Junction, JunctionId, Position, TopologyRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}

/// Compass direction of travel from one position to another, by comparing
/// geographic deltas. The larger delta wins; its sign picks the side.
pub fn direction_between(from: &Position, to: &Position) -> Direction {
    let lat_diff = to.lat - from.lat;
    let lng_diff = to.lng - from.lng;
    if lat_diff.abs() > lng_diff.abs() {
        if lat_diff > 0.0 {
            Direction::North
        } else {
            Direction::South
        }
    } else if lng_diff > 0.0 {
        Direction::East
    } else {
        Direction::West
    }
}

/// Where a junction sits on the corridor route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideRole {
    Start,
    Middle,
    End,
}

/// Per-direction green/red assignment imposed on one junction while a
/// corridor is active. Directions not set green stay red.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalOverride {
    pub role: OverrideRole,
    pub north: LightColor,
    pub east: LightColor,
    pub south: LightColor,
    pub west: LightColor,
    pub entry_direction: Option<Direction>,
    pub exit_direction: Option<Direction>,
}

impl DirectionalOverride {
    fn all_red(role: OverrideRole) -> Self {
        Self {
            role,
            north: LightColor::Red,
            east: LightColor::Red,
            south: LightColor::Red,
            west: LightColor::Red,
            entry_direction: None,
            exit_direction: None,
        }
    }

    pub fn light_for(&self, direction: Direction) -> LightColor {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }

    fn set_green(&mut self, direction: Direction) {
        match direction {
            Direction::North => self.north = LightColor::Green,
            Direction::East => self.east = LightColor::Green,
            Direction::South => self.south = LightColor::Green,
            Direction::West => self.west = LightColor::Green,
        }
    }

    pub fn green_directions(&self) -> Vec<Direction> {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
        .into_iter()
        .filter(|&d| self.light_for(d) == LightColor::Green)
        .collect()
    }
}

/// Resolves and validates a proposed route: at least two junctions, no
/// repeats, and every consecutive pair road-adjacent in both directions.
/// Returns the resolved junctions in route order.
pub fn validate_route<'a>(
    registry: &'a TopologyRegistry,
    route: &[JunctionId],
) -> Result<Vec<&'a Junction>, ControlError> {
    if route.len() < 2 {
        return Err(ControlError::InvalidRoute(
            "a corridor needs at least 2 junctions".to_string(),
        ));
    }
    let mut junctions = Vec::with_capacity(route.len());
    for id in route {
        junctions.push(registry.get(id)?);
    }
    for (index, id) in route.iter().enumerate() {
        if route[index + 1..].contains(id) {
            return Err(ControlError::InvalidRoute(format!(
                "junction {} appears more than once",
                id
            )));
        }
    }
    for pair in route.windows(2) {
        if !registry.are_adjacent(&pair[0], &pair[1]) || !registry.are_adjacent(&pair[1], &pair[0])
        {
            return Err(ControlError::InvalidRoute(format!(
                "junctions {} and {} are not adjacent",
                pair[0], pair[1]
            )));
        }
    }
    Ok(junctions)
}

/// Computes the directional override for every junction on a validated
/// route. The start junction greens the opposite of its exit direction so
/// traffic can leave toward the next junction; the end junction greens its
/// entry direction; interior junctions green both legs of the through-route.
pub fn plan_overrides(route: &[&Junction]) -> HashMap<JunctionId, DirectionalOverride> {
    let mut overrides = HashMap::new();
    let last = route.len() - 1;

    for (index, junction) in route.iter().enumerate() {
        let entry_direction = if index > 0 {
            Some(direction_between(
                &route[index - 1].position,
                &junction.position,
            ))
        } else {
            None
        };
        let exit_direction = if index < last {
            Some(direction_between(
                &junction.position,
                &route[index + 1].position,
            ))
        } else {
            None
        };

        let role = if index == 0 {
            OverrideRole::Start
        } else if index == last {
            OverrideRole::End
        } else {
            OverrideRole::Middle
        };

        let mut junction_override = DirectionalOverride::all_red(role);
        junction_override.entry_direction = entry_direction;
        junction_override.exit_direction = exit_direction;

        match role {
            OverrideRole::Start => {
                if let Some(exit) = exit_direction {
                    junction_override.set_green(exit.opposite());
                }
            }
            OverrideRole::End => {
                if let Some(entry) = entry_direction {
                    junction_override.set_green(entry);
                }
            }
            OverrideRole::Middle => {
                if let Some(entry) = entry_direction {
                    junction_override.set_green(entry);
                }
                if let Some(exit) = exit_direction {
                    junction_override.set_green(exit.opposite());
                }
            }
        }

        overrides.insert(junction.id.clone(), junction_override);
    }

    overrides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{create_junctions, SignalMode};

    fn registry() -> TopologyRegistry {
        TopologyRegistry::from_junctions(create_junctions()).unwrap()
    }

    fn ids(route: &[&str]) -> Vec<JunctionId> {
        route.iter().map(|id| JunctionId::new(id)).collect()
    }

    #[test]
    fn direction_prefers_larger_delta() {
        let a = Position { lat: 12.90, lng: 77.50 };
        let b = Position { lat: 12.90, lng: 77.60 };
        assert_eq!(direction_between(&a, &b), Direction::East);
        assert_eq!(direction_between(&b, &a), Direction::West);

        let c = Position { lat: 13.10, lng: 77.51 };
        assert_eq!(direction_between(&a, &c), Direction::North);
        assert_eq!(direction_between(&c, &a), Direction::South);
    }

    #[test]
    fn opposites_reverse() {
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::West.opposite(), Direction::East);
        for d in [Direction::North, Direction::East, Direction::South, Direction::West] {
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn two_junction_route_greens_one_direction_each() {
        let registry = registry();
        let route = validate_route(&registry, &ids(&["J-001", "J-002"])).unwrap();
        let overrides = plan_overrides(&route);
        assert_eq!(overrides.len(), 2);

        // J-002 is east of J-001 (lng delta dominates).
        let start = &overrides[&JunctionId::new("J-001")];
        assert_eq!(start.role, OverrideRole::Start);
        assert_eq!(start.green_directions(), vec![Direction::West]);
        assert_eq!(start.exit_direction, Some(Direction::East));

        let end = &overrides[&JunctionId::new("J-002")];
        assert_eq!(end.role, OverrideRole::End);
        assert_eq!(end.green_directions(), vec![Direction::East]);
        assert_eq!(end.entry_direction, Some(Direction::East));
    }

    #[test]
    fn interior_junction_greens_both_legs() {
        let registry = registry();
        let route = validate_route(&registry, &ids(&["J-001", "J-002", "J-006"])).unwrap();
        let overrides = plan_overrides(&route);

        let middle = &overrides[&JunctionId::new("J-002")];
        assert_eq!(middle.role, OverrideRole::Middle);
        // Both legs are longitude-dominant, so the through-route runs east:
        // the entry side and the opposite of the exit side both go green.
        assert_eq!(middle.entry_direction, Some(Direction::East));
        assert_eq!(middle.exit_direction, Some(Direction::East));
        let mut greens = middle.green_directions();
        greens.sort_by_key(|d| *d as usize);
        assert_eq!(greens, vec![Direction::East, Direction::West]);
    }

    #[test]
    fn short_route_is_rejected() {
        let registry = registry();
        assert!(matches!(
            validate_route(&registry, &ids(&["J-001"])),
            Err(ControlError::InvalidRoute(_))
        ));
    }

    #[test]
    fn non_adjacent_pair_is_rejected() {
        let registry = registry();
        // J-001 and J-004 are not road-connected.
        assert!(matches!(
            validate_route(&registry, &ids(&["J-001", "J-004"])),
            Err(ControlError::InvalidRoute(_))
        ));
    }

    #[test]
    fn repeated_junction_is_rejected() {
        let registry = registry();
        assert!(matches!(
            validate_route(&registry, &ids(&["J-001", "J-002", "J-001"])),
            Err(ControlError::InvalidRoute(_))
        ));
    }

    #[test]
    fn unknown_junction_is_rejected() {
        let registry = registry();
        assert_eq!(
            validate_route(&registry, &ids(&["J-001", "J-999"])),
            Err(ControlError::UnknownJunction(JunctionId::new("J-999")))
        );
    }

    #[test]
    fn asymmetric_adjacency_is_rejected() {
        let junctions = vec![
            Junction::new("A-001", "A", 12.90, 77.50, vec!["A-002"], vec![30, 30], SignalMode::Default),
            Junction::new("A-002", "B", 12.90, 77.51, vec![], vec![30, 30], SignalMode::Default),
        ];
        let registry = TopologyRegistry::from_junctions(junctions).unwrap();
        assert!(matches!(
            validate_route(&registry, &ids(&["A-001", "A-002"])),
            Err(ControlError::InvalidRoute(_))
        ));
    }
}
