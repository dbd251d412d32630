//! Host-side control logic for ranging with one nearby UWB accessory.
//!
//! ## Layout
//!
//! - [`domain`] - protocol codec, smoothing, feedback, orientation and the
//!   session controller
//! - [`infrastructure`] - logging, the serialized session task and simulated
//!   collaborators
//! - [`presentation`] - headless rendering of session output

pub mod domain;
pub mod infrastructure;
pub mod presentation;
