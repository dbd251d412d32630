//! Simulated collaborators
//!
//! Stand-ins for the accessory data channel and the vendor ranging engine so
//! a full session can run without hardware.

pub mod accessory;
pub mod engine;

pub use accessory::SimulatedAccessory;
pub use engine::SimulatedRangingEngine;
