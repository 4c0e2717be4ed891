//! Card Reader Module
//!
//! Hardware-facing edge of the system. A reader source pushes
//! [`ReaderEvent`]s into an mpsc channel; the [`AccessWorker`] consumes
//! them and drives the authorization engine. The door actuator sits
//! behind a trait so the engine never knows which hardware (if any) is
//! attached.

pub mod actuator;
pub mod simulator;
pub mod worker;

// Re-exports
pub use actuator::{DoorActuator, SimulatedActuator};
pub use simulator::SimulatedReader;
pub use worker::AccessWorker;

/// Event emitted by a reader source
#[derive(Debug, Clone)]
pub enum ReaderEvent {
    /// A card was presented; payload is the UID as read
    CardRead(String),
    /// Reader connectivity changed
    Connected(bool),
    /// Reader-level fault, non-fatal
    Error(String),
}
