//! Concurrent admission control for a traffic light intersection.
//!
//! Vehicles call [`IntersectionController::request_entry`] from their own
//! threads and are let in strictly in arrival order, one at a time, and only
//! while the light is green.

pub mod config;
pub mod control_system;
pub mod error;
pub mod global_variables;
pub mod simulation_engine;

pub use config::{IntersectionConfig, LightTiming, SimulationConfig};
pub use control_system::phase_queue::PhaseQueue;
pub use control_system::traffic_light_controller::{Phase, TrafficLightController};
pub use error::{IntersectionError, Result};
pub use simulation_engine::admission_gate::{AdmissionGate, EntryPermit, Waiter};
pub use simulation_engine::intersection::{IntersectionController, IntersectionId};
pub use simulation_engine::streets::{Street, StreetId};
pub use simulation_engine::vehicles::{Vehicle, VehicleId, VehicleType};
