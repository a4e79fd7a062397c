use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity handed to an intersection. Nothing else about the vehicle is
/// looked at by the admission logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Different types of vehicles in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    Car,
    Bus,
    Truck,
    EmergencyVan,
}

/// A vehicle driven by the simulation driver.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub vehicle_type: VehicleType,
    /// Speed in meters per second.
    pub speed: f64,
}

impl Vehicle {
    pub fn new(id: u64, vehicle_type: VehicleType, speed: f64) -> Self {
        Self {
            id: VehicleId(id),
            vehicle_type,
            speed,
        }
    }

    /// Seconds needed to drive `length_meters` at the current speed.
    pub fn travel_time_secs(&self, length_meters: f64) -> f64 {
        if self.speed <= 0.0 {
            return f64::INFINITY;
        }
        length_meters / self.speed
    }
}
