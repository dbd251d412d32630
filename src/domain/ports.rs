//! Collaborators driven by the session controller.
//!
//! Implementations deliver their asynchronous callbacks as
//! [`SessionEvent`](crate::domain::models::SessionEvent)s on the session
//! channel; the methods here are only called from the session task.

use crate::domain::errors::{ConfigurationError, TransportError};
use crate::domain::models::RangingConfiguration;

/// Byte transport to the connected accessory
pub trait DataChannel: Send {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// Vendor ranging engine producing distance/direction samples
pub trait RangingEngine: Send {
    /// Parse the accessory's configuration bytes
    fn configuration_from_data(
        &self,
        data: &[u8],
    ) -> Result<RangingConfiguration, ConfigurationError>;

    fn run(&mut self, configuration: &RangingConfiguration);
}

/// Builds a fresh engine after the previous one was invalidated
pub type EngineFactory = Box<dyn FnMut() -> Box<dyn RangingEngine> + Send>;
