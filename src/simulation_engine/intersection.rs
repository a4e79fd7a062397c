use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::config::IntersectionConfig;
use crate::control_system::traffic_light_controller::{Phase, TrafficLightController};
use crate::error::{IntersectionError, Result};
use crate::simulation_engine::admission_gate::AdmissionGate;
use crate::simulation_engine::streets::Street;
use crate::simulation_engine::vehicles::VehicleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntersectionId(pub u32);

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A traffic light controlled intersection that lets vehicles in one at a
/// time, in the order they arrived.
///
/// Entry is gated twice: a vehicle first waits for its turn in the
/// [`AdmissionGate`], then for the light to turn green. The intersection
/// counts as occupied from the moment a vehicle is released from the gate,
/// so a released vehicle still waiting on red holds everyone behind it.
pub struct IntersectionController {
    id: IntersectionId,
    streets: Mutex<Vec<Arc<Street>>>,
    waiting_vehicles: AdmissionGate,
    traffic_light: Arc<TrafficLightController>,
    is_blocked: AtomicBool,
    config: IntersectionConfig,
    started: AtomicBool,
    running: AtomicBool,
}

impl IntersectionController {
    pub fn new(id: u32, config: IntersectionConfig) -> Self {
        let id = IntersectionId(id);
        Self {
            id,
            streets: Mutex::new(Vec::new()),
            waiting_vehicles: AdmissionGate::new(),
            traffic_light: Arc::new(TrafficLightController::new(
                format!("Intersection {}", id),
                config.light.clone(),
            )),
            is_blocked: AtomicBool::new(false),
            config,
            started: AtomicBool::new(false),
            running: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> IntersectionId {
        self.id
    }

    pub fn add_street(&self, street: Arc<Street>) {
        self.streets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(street);
    }

    /// All streets leaving this intersection except the one `incoming` arrives on.
    pub fn query_streets(&self, incoming: &Street) -> Vec<Arc<Street>> {
        self.streets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|street| street.id != incoming.id)
            .cloned()
            .collect()
    }

    /// Queues the vehicle and blocks until it may drive into the intersection.
    ///
    /// Must not be called from inside an async context; run it on a plain
    /// thread or `spawn_blocking`. Fails only if the intersection is shut
    /// down before the vehicle is let in.
    pub fn request_entry(&self, vehicle: VehicleId) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(IntersectionError::AdmissionClosed(vehicle));
        }

        let (permit, entry) = oneshot::channel();
        let waiting = self.waiting_vehicles.push_back(vehicle, permit);
        log::debug!(
            "Intersection {}: vehicle {} queued, {} waiting",
            self.id,
            vehicle,
            waiting
        );
        // shutdown may have drained the gate just before our push
        if !self.running.load(Ordering::SeqCst) {
            self.waiting_vehicles.close();
        }

        entry
            .blocking_recv()
            .map_err(|_| IntersectionError::AdmissionClosed(vehicle))?;
        log::info!("Intersection {}: vehicle {} is granted entry", self.id, vehicle);

        if self.traffic_light.current_phase() == Phase::Red {
            log::debug!(
                "Intersection {}: vehicle {} waiting for green",
                self.id,
                vehicle
            );
            self.traffic_light.wait_for_green();
        }
        Ok(())
    }

    /// Frees the intersection so the next vehicle in line can be let in.
    pub fn notify_exit(&self, vehicle: VehicleId) {
        log::info!("Intersection {}: vehicle {} has left", self.id, vehicle);
        self.set_is_blocked(false);
    }

    /// Starts the traffic light and the admission loop on detached threads.
    pub fn simulate(self: &Arc<Self>) -> Result<()> {
        if let Err(err) = self.config.validate() {
            log::error!("Intersection {}: not started: {}", self.id, err);
            return Err(err);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            log::error!("Intersection {}: simulate() called twice", self.id);
            return Err(IntersectionError::AlreadySimulating {
                component: "intersection",
            });
        }
        self.traffic_light.simulate()?;

        let intersection = Arc::clone(self);
        thread::spawn(move || intersection.process_vehicle_queue());
        Ok(())
    }

    /// Stops both background loops and fails every vehicle still in line.
    ///
    /// A vehicle already let in but waiting for green stays blocked, since the
    /// light no longer changes.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.traffic_light.shutdown();
        let abandoned = self.waiting_vehicles.close();
        if !abandoned.is_empty() {
            log::warn!(
                "Intersection {}: shut down with {} vehicles still waiting: {:?}",
                self.id,
                abandoned.len(),
                abandoned
            );
        }
    }

    pub fn traffic_light_is_green(&self) -> bool {
        self.traffic_light.is_green()
    }

    pub fn current_phase(&self) -> Phase {
        self.traffic_light.current_phase()
    }

    pub fn traffic_light(&self) -> &Arc<TrafficLightController> {
        &self.traffic_light
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting_vehicles.size()
    }

    pub fn is_occupied(&self) -> bool {
        self.is_blocked.load(Ordering::Acquire)
    }

    fn set_is_blocked(&self, is_blocked: bool) {
        self.is_blocked.store(is_blocked, Ordering::Release);
        log::debug!("Intersection {} isBlocked={}", self.id, is_blocked);
    }

    fn process_vehicle_queue(&self) {
        log::info!("Intersection {}: admission loop started", self.id);
        let poll = self.config.admission_poll_interval();
        while self.running.load(Ordering::SeqCst) {
            thread::sleep(poll);

            if self.waiting_vehicles.size() > 0 && !self.is_occupied() {
                self.set_is_blocked(true);
                match self.waiting_vehicles.permit_entry_to_first_in_queue() {
                    Ok(vehicle) => {
                        log::debug!("Intersection {}: released vehicle {}", self.id, vehicle)
                    }
                    // already popped, the rest of the line keeps its order
                    Err(IntersectionError::PermitDropped(vehicle)) => {
                        log::warn!(
                            "Intersection {}: vehicle {} left the line, skipping it",
                            self.id,
                            vehicle
                        );
                        self.set_is_blocked(false);
                    }
                    Err(err) => {
                        log::error!(
                            "Intersection {}: {}, stopping admission loop",
                            self.id,
                            err
                        );
                        self.shutdown();
                        return;
                    }
                }
            }
        }
        log::info!("Intersection {}: admission loop stopped", self.id);
    }
}
