//! Door Actuator
//!
//! The verdict pipeline treats the door as fire-and-forget: a failed
//! pulse is logged but never changes an Allowed decision.

/// Pulse interface for the door lock
pub trait DoorActuator: Send + Sync {
    /// Trigger one open pulse. Returns false when the hardware
    /// rejected the command.
    fn open_door(&self) -> bool;
}

/// Development actuator: logs the pulse and always succeeds
pub struct SimulatedActuator;

impl DoorActuator for SimulatedActuator {
    fn open_door(&self) -> bool {
        tracing::info!("Door pulse (simulated)");
        true
    }
}
