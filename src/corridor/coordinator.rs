use crate::corridor::persistence::{self, PersistedCorridor};
use crate::corridor::planner::{plan_overrides, validate_route, DirectionalOverride};
use crate::errors::ControlError;
use crate::global_variables::{CYCLE_SETTLE_SECS, NOTICE_COUNTDOWN_SECS};
use crate::topology::{JunctionId, Position, TopologyRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{sleep, Duration};

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorridorType {
    Emergency,
    Vip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorridorStatus {
    Idle,
    Notice,
    #[serde(rename = "waiting-cycle")]
    WaitingForCycle,
    Active,
}

/// An accepted corridor request: an ordered, adjacency-validated sequence of
/// junctions plus how long the corridor should hold once active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorridorRequest {
    pub route: Vec<JunctionId>,
    pub duration_minutes: u32,
    pub corridor_type: CorridorType,
}

/// Minimal redisplay fields for one junction on the route, kept so the
/// corridor can be shown (and recovered) without the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteJunction {
    pub id: JunctionId,
    pub name: String,
    pub position: Position,
    pub phase_count: usize,
}

/// Read-only view of the coordinator for display/query consumers.
#[derive(Debug, Clone, Serialize)]
pub struct CorridorSnapshot {
    pub status: CorridorStatus,
    pub route: Vec<JunctionId>,
    pub corridor_type: Option<CorridorType>,
    pub notice_countdown: u32,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
}

/// Process-wide corridor state machine:
/// idle -> notice -> waiting-cycle -> active -> idle.
///
/// Only one corridor may exist at a time. The notice period broadcasts
/// advance public warning before any signal is touched; the waiting-cycle
/// step is a fixed settle delay so a phase already in progress when the
/// notice ended is not cut off mid-green (a bounded approximation of
/// observing every route junction's phase boundary).
pub struct CorridorCoordinator {
    status: CorridorStatus,
    request: Option<CorridorRequest>,
    route_junctions: Vec<RouteJunction>,
    notice_countdown: u32,
    settle_remaining: u32,
    start_time: Option<u64>,
    end_time: Option<u64>,
    phase_overrides: HashMap<JunctionId, DirectionalOverride>,
    state_path: PathBuf,
}

impl CorridorCoordinator {
    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        Self {
            status: CorridorStatus::Idle,
            request: None,
            route_junctions: Vec::new(),
            notice_countdown: 0,
            settle_remaining: 0,
            start_time: None,
            end_time: None,
            phase_overrides: HashMap::new(),
            state_path: state_path.into(),
        }
    }

    /// Boot-time recovery: resume an active corridor whose end time is still
    /// in the future, discard anything expired, otherwise start idle.
    pub fn recover(state_path: impl Into<PathBuf>, now: u64) -> Self {
        let mut coordinator = Self::new(state_path);
        if let Some(record) = persistence::load(&coordinator.state_path) {
            if record.end_time > now {
                log::info!(
                    "resuming {:?} corridor over {} junctions, {}s remaining",
                    record.corridor_type,
                    record.route.len(),
                    record.end_time - now
                );
                coordinator.status = CorridorStatus::Active;
                coordinator.request = Some(CorridorRequest {
                    route: record.route.iter().map(|j| j.id.clone()).collect(),
                    duration_minutes: record.duration_minutes,
                    corridor_type: record.corridor_type,
                });
                coordinator.route_junctions = record.route;
                coordinator.start_time = Some(record.start_time);
                coordinator.end_time = Some(record.end_time);
                coordinator.phase_overrides = record.phase_overrides;
            } else {
                log::info!("discarding expired corridor record");
                persistence::clear(&coordinator.state_path);
            }
        }
        coordinator
    }

    /// Accepts a corridor request while idle: validates the route, plans the
    /// directional overrides, and enters the notice period. Nothing is
    /// applied to any signal until activation.
    pub fn request_corridor(
        &mut self,
        registry: &TopologyRegistry,
        route: &[JunctionId],
        duration_minutes: u32,
        corridor_type: CorridorType,
    ) -> Result<(), ControlError> {
        if self.status != CorridorStatus::Idle {
            return Err(ControlError::CorridorAlreadyActive);
        }
        let junctions = validate_route(registry, route)?;
        self.phase_overrides = plan_overrides(&junctions);
        self.route_junctions = junctions
            .iter()
            .map(|junction| RouteJunction {
                id: junction.id.clone(),
                name: junction.name.clone(),
                position: junction.position,
                phase_count: junction.phase_count,
            })
            .collect();
        self.request = Some(CorridorRequest {
            route: route.to_vec(),
            duration_minutes,
            corridor_type,
        });
        self.status = CorridorStatus::Notice;
        self.notice_countdown = NOTICE_COUNTDOWN_SECS;
        self.settle_remaining = 0;
        log::info!(
            "{:?} corridor requested over {} junctions for {} minutes; public notice for {}s",
            corridor_type,
            route.len(),
            duration_minutes,
            NOTICE_COUNTDOWN_SECS
        );
        Ok(())
    }

    /// Operator abort from any state. Cancelling an idle coordinator is a
    /// no-op. Takes effect before the next tick of any junction because the
    /// caller serializes access to this coordinator.
    pub fn cancel_corridor(&mut self) {
        if self.status == CorridorStatus::Idle {
            return;
        }
        log::info!("corridor cancelled while {:?}", self.status);
        self.reset_to_idle();
    }

    /// One elapsed second of coordinator time: counts the notice period
    /// down, runs the settle delay, and expires an active corridor.
    pub fn tick_second(&mut self, now: u64) {
        match self.status {
            CorridorStatus::Idle => {}
            CorridorStatus::Notice => {
                if self.notice_countdown > 0 {
                    self.notice_countdown -= 1;
                }
                if self.notice_countdown == 0 {
                    self.status = CorridorStatus::WaitingForCycle;
                    self.settle_remaining = CYCLE_SETTLE_SECS;
                    log::info!(
                        "notice period over; waiting {}s for running phases to complete",
                        CYCLE_SETTLE_SECS
                    );
                }
            }
            CorridorStatus::WaitingForCycle => {
                if self.settle_remaining > 0 {
                    self.settle_remaining -= 1;
                }
                if self.settle_remaining == 0 {
                    self.activate(now);
                }
            }
            CorridorStatus::Active => {
                if let Some(end_time) = self.end_time {
                    if now >= end_time {
                        log::info!("corridor expired, releasing overrides");
                        self.reset_to_idle();
                    }
                }
            }
        }
    }

    fn activate(&mut self, now: u64) {
        let request = match self.request {
            Some(ref request) => request,
            // Cancelled underneath us; nothing to activate.
            None => {
                self.reset_to_idle();
                return;
            }
        };
        let end_time = now + u64::from(request.duration_minutes) * 60;
        self.start_time = Some(now);
        self.end_time = Some(end_time);
        self.status = CorridorStatus::Active;
        log::info!(
            "{:?} corridor active across {} junctions until {}",
            request.corridor_type,
            self.route_junctions.len(),
            end_time
        );
        let record = PersistedCorridor {
            route: self.route_junctions.clone(),
            corridor_type: request.corridor_type,
            duration_minutes: request.duration_minutes,
            start_time: now,
            end_time,
            phase_overrides: self.phase_overrides.clone(),
        };
        if let Err(e) = persistence::save(&self.state_path, &record) {
            log::warn!("failed to persist corridor record: {}", e);
        }
    }

    fn reset_to_idle(&mut self) {
        self.status = CorridorStatus::Idle;
        self.request = None;
        self.route_junctions.clear();
        self.notice_countdown = 0;
        self.settle_remaining = 0;
        self.start_time = None;
        self.end_time = None;
        self.phase_overrides.clear();
        persistence::clear(&self.state_path);
    }

    pub fn status(&self) -> CorridorStatus {
        self.status
    }

    pub fn snapshot(&self) -> CorridorSnapshot {
        CorridorSnapshot {
            status: self.status,
            route: self
                .route_junctions
                .iter()
                .map(|junction| junction.id.clone())
                .collect(),
            corridor_type: self.request.as_ref().map(|r| r.corridor_type),
            notice_countdown: self.notice_countdown,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    /// The directional override controlling a junction, present only while
    /// the corridor is active and the junction is on the route.
    pub fn override_for(&self, id: &JunctionId) -> Option<&DirectionalOverride> {
        if self.status != CorridorStatus::Active {
            return None;
        }
        self.phase_overrides.get(id)
    }

    /// The corridor type currently overriding signals, if any.
    pub fn active_type(&self) -> Option<CorridorType> {
        if self.status != CorridorStatus::Active {
            return None;
        }
        self.request.as_ref().map(|r| r.corridor_type)
    }

    pub fn is_junction_in_corridor(&self, id: &JunctionId) -> bool {
        self.override_for(id).is_some()
    }

    /// Singleton 1-second loop driving the notice countdown and expiry
    /// check. Intended to be spawned as an async task.
    pub async fn run_update_loop(coordinator: Arc<Mutex<Self>>) {
        loop {
            sleep(Duration::from_secs(1)).await;
            {
                let mut coordinator = coordinator.lock().unwrap();
                coordinator.tick_second(current_timestamp());
            }
        }
    }
}
