use crate::domain::feedback::{FeedbackLevel, FeedbackState, PulseSpec};
use crate::domain::orientation::{OrientationState, RotationDelta};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit direction vector reported by the ranging engine
pub type Direction = Vector3<f32>;

/// Opaque identifier the ranging engine assigns to an accessory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscoveryToken(pub u64);

impl fmt::Display for DiscoveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Ranging configuration built from the accessory's configuration bytes
#[derive(Debug, Clone, PartialEq)]
pub struct RangingConfiguration {
    pub accessory_discovery_token: DiscoveryToken,
    pub data: Vec<u8>,
}

/// One nearby object as reported in an engine update
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyObject {
    pub discovery_token: DiscoveryToken,
    pub distance: Option<f32>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Timeout,
    PeerEnded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationReason {
    /// The user has not granted nearby interaction access
    PermissionDenied,
    InvalidConfiguration,
    Other(String),
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::InvalidConfiguration => write!(f, "invalid configuration"),
            Self::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// Callbacks from the ranging engine, marshaled onto the session task
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ShareableConfiguration {
        discovery_token: DiscoveryToken,
        data: Vec<u8>,
    },
    Updated(Vec<NearbyObject>),
    Removed {
        objects: Vec<NearbyObject>,
        reason: RemovalReason,
    },
    Suspended,
    SuspensionEnded,
    Invalidated(InvalidationReason),
}

/// Orientation indicator behaviour selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    /// The indicator follows both azimuth and elevation
    #[default]
    Free,
    /// The indicator lies flat and spins with azimuth
    FixedSpin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    /// The run/stop action
    ToggleSession,
    SetFeedbackEnabled(bool),
    SetInteractionMode(InteractionMode),
}

/// Everything that can reach the serialized session task
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    AccessoryConnected { name: String },
    AccessoryDisconnected,
    AccessoryData { data: Vec<u8>, accessory_name: String },
    Engine(EngineEvent),
    User(UserCommand),
    FeedbackTick,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    AwaitingConfiguration,
    EngineConfiguring,
    Active,
    Suspended,
    Invalidated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "Disconnected",
            Self::AwaitingConfiguration => "Awaiting configuration",
            Self::EngineConfiguring => "Engine configuring",
            Self::Active => "Active",
            Self::Suspended => "Suspended",
            Self::Invalidated => "Invalidated",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}

/// Smoothed sample after orientation and feedback processing
#[derive(Debug, Clone, PartialEq)]
pub struct RangingReading {
    pub accessory_name: Option<String>,
    pub distance: f32,
    pub azimuth: i32,
    pub elevation: i32,
    pub rotation: RotationDelta,
    pub feedback_level: FeedbackLevel,
}

/// Output of the session task towards the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    Status {
        accessory_name: Option<String>,
        status: StatusMessage,
    },
    StateChanged(SessionState),
    Reading(RangingReading),
    Pulse {
        pulse: PulseSpec,
        sound: bool,
        haptics: bool,
    },
}

/// Read-only view of the controller for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub connected: bool,
    pub accessory_name: Option<String>,
    pub can_start: bool,
    pub ranging_active: bool,
    pub feedback_enabled: bool,
    pub feedback: FeedbackState,
    pub orientation: OrientationState,
    pub status: Option<StatusMessage>,
}
