//! Error taxonomy for the accessory session.
//!
//! Every variant here is recoverable: callers log it, surface it on the
//! status line and keep the event loop running.

use thiserror::Error;

/// Violations of the single-byte-prefixed accessory protocol
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Accessory message was empty")]
    EmptyMessage,

    #[error("{0:#04x} is not a valid message id")]
    UnknownMessageId(u8),

    #[error("Message {0:#04x} requires a payload")]
    MissingPayload(u8),

    #[error("Message {id:#04x} is not allowed in the {direction} direction")]
    DirectionViolation { id: u8, direction: &'static str },
}

/// Failure to turn accessory configuration bytes into a ranging configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Invalid accessory configuration data: {0}")]
    InvalidConfigurationData(String),
}

/// Failure reported by the data channel while sending
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("No accessory is connected")]
    NotConnected,

    #[error("Data channel closed")]
    ChannelClosed,

    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Umbrella error returned by the session controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to send data to accessory: {0}")]
    Transport(#[from] TransportError),

    #[error("Nearby interaction access was denied by the user")]
    PermissionDenied,

    #[error("No accessory connected")]
    NotConnected,
}
