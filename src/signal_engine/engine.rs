use crate::errors::ControlError;
use crate::signal_engine::signal::{JunctionSignal, SignalState};
use crate::topology::{JunctionId, SignalMode, TopologyRegistry};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Owns one `JunctionSignal` per observed junction. Each signal is its own
/// lock so junction timers tick independently, with no cross-junction
/// ordering.
pub struct SignalEngine {
    signals: HashMap<JunctionId, Arc<Mutex<JunctionSignal>>>,
}

impl SignalEngine {
    /// Creates a signal for every junction in the registry.
    pub fn initialize(registry: &TopologyRegistry) -> Result<Self, ControlError> {
        let mut signals = HashMap::new();
        for junction in registry.all() {
            let signal = JunctionSignal::new(junction.clone())?;
            signals.insert(junction.id.clone(), Arc::new(Mutex::new(signal)));
        }
        Ok(Self { signals })
    }

    pub fn signal(&self, id: &JunctionId) -> Result<Arc<Mutex<JunctionSignal>>, ControlError> {
        self.signals
            .get(id)
            .cloned()
            .ok_or_else(|| ControlError::UnknownJunction(id.clone()))
    }

    pub fn junction_ids(&self) -> Vec<JunctionId> {
        self.signals.keys().cloned().collect()
    }

    /// Current raw signal state for a junction, before any corridor override
    /// is applied.
    pub fn signal_state(&self, id: &JunctionId) -> Result<SignalState, ControlError> {
        let signal = self.signal(id)?;
        let state = signal.lock().unwrap().state;
        Ok(state)
    }

    /// Advances every junction by one second. The per-junction tasks are the
    /// normal driver; this is for tests and single-threaded callers.
    pub fn update_all(&self) {
        for signal in self.signals.values() {
            signal.lock().unwrap().tick();
        }
    }

    /// Switches a junction's operating mode, resetting its cycle on success.
    pub fn set_junction_mode(
        &self,
        id: &JunctionId,
        mode: SignalMode,
        manual_green_times: Option<Vec<u32>>,
    ) -> Result<(), ControlError> {
        let signal = self.signal(id)?;
        let mut signal = signal.lock().unwrap();
        signal.set_mode(mode, manual_green_times)?;
        log::info!("junction {} switched to {:?} mode, cycle restarted", id, mode);
        Ok(())
    }

    /// Replaces a junction's configured green times, resetting its cycle.
    pub fn set_junction_green_times(
        &self,
        id: &JunctionId,
        green_times: Vec<u32>,
    ) -> Result<(), ControlError> {
        let signal = self.signal(id)?;
        let mut signal = signal.lock().unwrap();
        signal.set_green_times(green_times)?;
        log::info!("junction {} green times updated, cycle restarted", id);
        Ok(())
    }

    /// Spawns one ticking task per junction, each firing once per second.
    /// The signal keeps ticking even while a corridor override is displayed
    /// in its place, so normal cycling resumes from live state when the
    /// corridor ends.
    pub fn spawn_tick_tasks(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for (id, signal) in &self.signals {
            let id = id.clone();
            let signal = Arc::clone(signal);
            handles.push(tokio::spawn(async move {
                log::debug!("signal tick task started for {}", id);
                loop {
                    sleep(Duration::from_secs(1)).await;
                    {
                        let mut signal = signal.lock().unwrap();
                        signal.tick();
                    }
                }
            }));
        }
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_engine::signal::LightColor;
    use crate::topology::create_junctions;

    fn test_engine() -> SignalEngine {
        let registry = TopologyRegistry::from_junctions(create_junctions()).unwrap();
        SignalEngine::initialize(&registry).unwrap()
    }

    #[test]
    fn engine_covers_every_seeded_junction() {
        let engine = test_engine();
        assert_eq!(engine.junction_ids().len(), 8);
        let state = engine.signal_state(&JunctionId::new("J-001")).unwrap();
        assert_eq!(state.active_phase_index, 0);
        assert_eq!(state.current_light, LightColor::Green);
        assert_eq!(state.time_remaining, 40);
    }

    #[test]
    fn update_all_ticks_every_junction_once() {
        let engine = test_engine();
        engine.update_all();
        for id in engine.junction_ids() {
            let state = engine.signal_state(&id).unwrap();
            assert_eq!(state.active_phase_index, 0);
            assert_eq!(state.current_light, LightColor::Green);
        }
        let state = engine.signal_state(&JunctionId::new("J-002")).unwrap();
        assert_eq!(state.time_remaining, 34);
    }

    #[test]
    fn mode_switch_through_engine_resets_cycle() {
        let engine = test_engine();
        let id = JunctionId::new("J-006");
        for _ in 0..17 {
            engine.update_all();
        }
        engine
            .set_junction_mode(&id, SignalMode::Manual, Some(vec![20, 20, 20, 20]))
            .unwrap();
        let state = engine.signal_state(&id).unwrap();
        assert_eq!(state.time_remaining, 20);
        assert_eq!(state.active_phase_index, 0);

        assert_eq!(
            engine.set_junction_mode(&JunctionId::new("J-999"), SignalMode::Default, None),
            Err(ControlError::UnknownJunction(JunctionId::new("J-999")))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tick_tasks_wait_a_full_second_before_first_tick() {
        let engine = test_engine();
        let id = JunctionId::new("J-001");
        let handles = engine.spawn_tick_tasks();

        // Let every task run up to its first timer; no simulated time has
        // passed yet, so no junction may have ticked.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(engine.signal_state(&id).unwrap().time_remaining, 40);

        tokio::time::advance(Duration::from_secs(1)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(engine.signal_state(&id).unwrap().time_remaining, 39);

        for handle in handles {
            handle.abort();
        }
    }
}
