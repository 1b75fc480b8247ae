use crate::corridor::{CorridorCoordinator, CorridorType, Direction};
use crate::errors::ControlError;
use crate::signal_engine::{LightColor, SignalEngine};
use crate::topology::JunctionId;
use serde::Serialize;

/// Fixed phase-index to compass convention for corridor overrides:
/// 0=north, 1=east, 2=south, 3=west. Phase indices beyond four have no
/// compass mapping and keep their engine-driven value under an override.
pub fn direction_for_phase(phase_index: usize) -> Option<Direction> {
    match phase_index {
        0 => Some(Direction::North),
        1 => Some(Direction::East),
        2 => Some(Direction::South),
        3 => Some(Direction::West),
        _ => None,
    }
}

/// The effective displayed/controlling state of one junction after the
/// corridor override rule is applied.
#[derive(Debug, Clone, Serialize)]
pub struct JunctionDisplayState {
    pub junction_id: JunctionId,
    pub active_phase_index: usize,
    pub current_light: LightColor,
    pub time_remaining: u32,
    /// Effective light per phase index, override included.
    pub phase_lights: Vec<LightColor>,
    pub overridden_by: Option<CorridorType>,
}

/// Merges corridor coordinator output with phase engine output. While the
/// corridor is active and covers this junction, each phase's compass
/// direction takes the override's green/red value; otherwise the phase
/// engine's own state is authoritative. The engine keeps ticking silently
/// underneath an override, so normal cycling resumes from live state the
/// moment the corridor ends.
pub fn junction_display_state(
    engine: &SignalEngine,
    coordinator: &CorridorCoordinator,
    id: &JunctionId,
) -> Result<JunctionDisplayState, ControlError> {
    let signal = engine.signal(id)?;
    let signal = signal.lock().unwrap();
    let state = signal.state;
    let phase_count = signal.junction.phase_count;

    let mut phase_lights: Vec<LightColor> =
        (0..phase_count).map(|index| signal.phase_light(index)).collect();
    let mut overridden_by = None;

    if let Some(junction_override) = coordinator.override_for(id) {
        for (index, light) in phase_lights.iter_mut().enumerate() {
            if let Some(direction) = direction_for_phase(index) {
                *light = junction_override.light_for(direction);
            }
        }
        overridden_by = coordinator.active_type();
    }

    Ok(JunctionDisplayState {
        junction_id: id.clone(),
        active_phase_index: state.active_phase_index,
        current_light: state.current_light,
        time_remaining: state.time_remaining,
        phase_lights,
        overridden_by,
    })
}
