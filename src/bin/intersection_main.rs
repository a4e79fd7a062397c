// intersection_main.rs
use intersection_sim::{
    IntersectionController, SimulationConfig, Street, Vehicle, VehicleType,
};
use rand::Rng;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const STREET_NAMES: [&str; 4] = ["North Road", "East Road", "South Road", "West Road"];

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SimulationConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config error: {}", e);
                return;
            }
        },
        None => SimulationConfig::default(),
    };
    println!(
        "Starting intersection simulation with {} vehicles...",
        config.vehicle_count
    );

    let intersection = Arc::new(IntersectionController::new(1, config.intersection.clone()));
    let streets: Vec<Arc<Street>> = STREET_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| Arc::new(Street::new(i as u32 + 1, *name, 150.0)))
        .collect();
    for street in &streets {
        intersection.add_street(Arc::clone(street));
    }
    if let Err(e) = intersection.simulate() {
        eprintln!("Intersection error: {}", e);
        return;
    }

    let mut handles = Vec::new();
    for id in 1..=config.vehicle_count as u64 {
        let mut rng = rand::rng();
        let rand_val: f64 = rng.random_range(0.0..1.0);
        let vehicle_type = if rand_val < 0.50 {
            VehicleType::Car
        } else if rand_val < 0.81 {
            VehicleType::Truck
        } else if rand_val < 0.99 {
            VehicleType::Bus
        } else {
            VehicleType::EmergencyVan
        };
        let speed = match vehicle_type {
            VehicleType::Car => rng.random_range(11.0..28.0),
            VehicleType::Bus => rng.random_range(11.0..22.0),
            VehicleType::Truck => rng.random_range(11.0..19.0),
            VehicleType::EmergencyVan => rng.random_range(16.0..33.0),
        };
        let vehicle = Vehicle::new(id, vehicle_type, speed);
        let incoming = Arc::clone(&streets[rng.random_range(0..streets.len())]);
        let approach = Duration::from_millis(rng.random_range(0..=config.max_approach_ms));
        let crossing = Duration::from_millis(config.crossing_ms);
        let intersection = Arc::clone(&intersection);

        // request_entry blocks, so every vehicle gets its own blocking thread
        handles.push(tokio::task::spawn_blocking(move || {
            drive_through(&intersection, &vehicle, &incoming, approach, crossing)
        }));
    }

    let mut waits = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(waited)) => waits.push(waited),
            Ok(Err(e)) => eprintln!("Vehicle error: {}", e),
            Err(e) => eprintln!("Vehicle task failed: {}", e),
        }
    }

    let mean_wait = if waits.is_empty() {
        0.0
    } else {
        waits.iter().map(Duration::as_secs_f64).sum::<f64>() / waits.len() as f64
    };
    println!(
        "Simulation finished: {} of {} vehicles crossed, mean wait {:.2} seconds.",
        waits.len(),
        config.vehicle_count,
        mean_wait
    );
    intersection.shutdown();
}

/// Drives one vehicle up to the intersection, across it and onto a random
/// outgoing street. Returns how long the vehicle waited to get in.
fn drive_through(
    intersection: &IntersectionController,
    vehicle: &Vehicle,
    incoming: &Street,
    approach: Duration,
    crossing: Duration,
) -> intersection_sim::Result<Duration> {
    thread::sleep(approach);
    println!(
        "Vehicle {:?} {} approaching intersection {} from {}.",
        vehicle.vehicle_type,
        vehicle.id,
        intersection.id(),
        incoming.name
    );

    let arrived = Instant::now();
    intersection.request_entry(vehicle.id)?;
    let waited = arrived.elapsed();
    println!(
        "Vehicle {:?} {} entered after waiting {:.2} seconds.",
        vehicle.vehicle_type,
        vehicle.id,
        waited.as_secs_f64()
    );

    thread::sleep(crossing);
    intersection.notify_exit(vehicle.id);

    let outgoing = intersection.query_streets(incoming);
    if !outgoing.is_empty() {
        let next = &outgoing[rand::rng().random_range(0..outgoing.len())];
        println!(
            "Vehicle {:?} {} continues on {} ({:.1} seconds to the next intersection).",
            vehicle.vehicle_type,
            vehicle.id,
            next.name,
            vehicle.travel_time_secs(next.length_meters)
        );
    }
    Ok(waited)
}
