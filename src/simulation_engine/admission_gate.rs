use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::{IntersectionError, Result};
use crate::simulation_engine::vehicles::VehicleId;

/// Sending half of a vehicle's entry permit. Firing it consumes it, so a
/// permit can never be granted twice.
pub type EntryPermit = oneshot::Sender<()>;

/// A vehicle waiting in line together with its entry permit.
#[derive(Debug)]
pub struct Waiter {
    pub vehicle: VehicleId,
    permit: EntryPermit,
}

/// FIFO line of vehicles waiting to enter an intersection.
///
/// All operations take the same lock, so size reads, appends and releases
/// never interleave. The line is never reordered.
#[derive(Debug, Default)]
pub struct AdmissionGate {
    waiting: Mutex<VecDeque<Waiter>>,
}

impl AdmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Appends a waiter and returns the new length of the line.
    pub fn push_back(&self, vehicle: VehicleId, permit: EntryPermit) -> usize {
        let mut waiting = self.lock();
        waiting.push_back(Waiter { vehicle, permit });
        waiting.len()
    }

    /// Grants entry to the vehicle at the front of the line and removes it.
    ///
    /// Releasing from an empty gate is a caller bug and comes back as
    /// [`IntersectionError::EmptyGate`]. If the front vehicle is no longer
    /// listening, it is still removed and [`IntersectionError::PermitDropped`]
    /// is returned.
    pub fn permit_entry_to_first_in_queue(&self) -> Result<VehicleId> {
        let mut waiting = self.lock();
        let Waiter { vehicle, permit } = waiting.pop_front().ok_or(IntersectionError::EmptyGate)?;
        permit
            .send(())
            .map_err(|_| IntersectionError::PermitDropped(vehicle))?;
        Ok(vehicle)
    }

    /// Drops every pending permit unfired. Blocked vehicles see their wait fail.
    pub fn close(&self) -> Vec<VehicleId> {
        self.lock().drain(..).map(|waiter| waiter.vehicle).collect()
    }

    /// Vehicles currently in line, front first.
    pub fn waiting_vehicles(&self) -> Vec<VehicleId> {
        self.lock().iter().map(|waiter| waiter.vehicle).collect()
    }

    // Waiters are pushed and popped whole, a poisoned line is still valid.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Waiter>> {
        self.waiting.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
