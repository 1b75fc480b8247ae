// corridor_control_main.rs
use corridor_control::corridor::{current_timestamp, CorridorCoordinator, CorridorType};
use corridor_control::display::junction_display_state;
use corridor_control::global_variables::CORRIDOR_STATE_FILE;
use corridor_control::signal_engine::SignalEngine;
use corridor_control::topology::{create_junctions, JunctionId, TopologyRegistry};
use rand::Rng;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() {
    env_logger::init();

    let registry = match TopologyRegistry::from_junctions(create_junctions()) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to load junction topology: {}", e);
            return;
        }
    };
    let engine = match SignalEngine::initialize(&registry) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            eprintln!("Failed to initialize signal engine: {}", e);
            return;
        }
    };

    // Stagger the junctions so their cycles drift apart like a real network.
    let mut rng = rand::rng();
    for id in engine.junction_ids() {
        if let Ok(signal) = engine.signal(&id) {
            let mut signal = signal.lock().unwrap();
            let offset = rng.random_range(0..signal.total_cycle_time());
            for _ in 0..offset {
                signal.tick();
            }
        }
    }
    engine.spawn_tick_tasks();

    let coordinator = Arc::new(Mutex::new(CorridorCoordinator::recover(
        CORRIDOR_STATE_FILE,
        current_timestamp(),
    )));
    tokio::spawn(CorridorCoordinator::run_update_loop(Arc::clone(&coordinator)));

    // Demo: request an emergency corridor through the city center.
    let route = vec![
        JunctionId::new("J-001"),
        JunctionId::new("J-002"),
        JunctionId::new("J-006"),
    ];
    {
        let mut coordinator = coordinator.lock().unwrap();
        match coordinator.request_corridor(&registry, &route, 15, CorridorType::Emergency) {
            Ok(()) => println!("Emergency corridor requested: J-001 -> J-002 -> J-006"),
            Err(e) => println!("Corridor request rejected: {}", e),
        }
    }

    loop {
        {
            let coordinator = coordinator.lock().unwrap();
            let snapshot = coordinator.snapshot();
            println!(
                "Corridor status: {:?} (notice countdown: {}s)",
                snapshot.status, snapshot.notice_countdown
            );
            for id in &route {
                match junction_display_state(&engine, &coordinator, id) {
                    Ok(display) => println!(
                        "  {} phase {} {:?} {}s remaining, overridden by {:?}",
                        display.junction_id,
                        display.active_phase_index,
                        display.current_light,
                        display.time_remaining,
                        display.overridden_by
                    ),
                    Err(e) => println!("  {}: {}", id, e),
                }
            }
        }
        sleep(Duration::from_secs(5)).await;
    }
}
