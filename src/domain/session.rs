//! Accessory Session Controller
//!
//! Owns the protocol state for the single connected accessory and drives the
//! ranging engine through the configuration handshake:
//!
//! ```text
//! Disconnected ──connect──▶ AwaitingConfiguration ──config data──▶ EngineConfiguring
//!      ▲                          ▲        ▲                              │
//!      │ disconnect / did stop    │        │ resume             did start │
//!      │                          │        │                              ▼
//!      └──────────────────────────┼─── Suspended ◀──suspend─────────── Active
//!                                 │
//!                    Invalidated ─┘ (engine replaced, unless access was denied)
//! ```
//!
//! All methods run on the session task; collaborators reach it only through
//! [`SessionEvent`]s.

use crate::domain::errors::{ProtocolError, SessionError};
use crate::domain::feedback::{FeedbackSelector, PulseSpec};
use crate::domain::models::{
    DiscoveryToken, EngineEvent, InvalidationReason, MessageSeverity, NearbyObject,
    PresentationEvent, RangingConfiguration, RangingReading, RemovalReason, SessionEvent,
    SessionSnapshot, SessionState, StatusMessage, UserCommand,
};
use crate::domain::orientation::{self, OrientationMapper};
use crate::domain::ports::{DataChannel, EngineFactory, RangingEngine};
use crate::domain::protocol::{self, AccessoryMessage};
use crate::domain::settings::Settings;
use crate::domain::smoothing::SpatialSmoother;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Connection and handshake data for the one supported accessory
#[derive(Debug, Default)]
struct AccessorySession {
    connected: bool,
    accessory_name: Option<String>,
    // At most one entry
    accessory_map: HashMap<DiscoveryToken, String>,
    configuration: Option<RangingConfiguration>,
}

impl AccessorySession {
    fn cache_token(&mut self, token: DiscoveryToken, accessory_name: &str) {
        self.accessory_map.clear();
        self.accessory_map.insert(token, accessory_name.to_string());
    }
}

pub struct SessionController {
    channel: Box<dyn DataChannel>,
    engine: Box<dyn RangingEngine>,
    engine_factory: EngineFactory,
    event_sender: mpsc::UnboundedSender<PresentationEvent>,

    state: SessionState,
    session: AccessorySession,
    status: Option<StatusMessage>,

    smoother: SpatialSmoother,
    feedback: FeedbackSelector,
    orientation: OrientationMapper,

    feedback_enabled: bool,
    sound_enabled: bool,
    haptics_enabled: bool,
}

impl SessionController {
    pub fn new(
        channel: Box<dyn DataChannel>,
        mut engine_factory: EngineFactory,
        event_sender: mpsc::UnboundedSender<PresentationEvent>,
        settings: &Settings,
    ) -> Self {
        let engine = engine_factory();
        Self {
            channel,
            engine,
            engine_factory,
            event_sender,
            state: SessionState::Disconnected,
            session: AccessorySession::default(),
            status: None,
            smoother: SpatialSmoother::new(),
            feedback: FeedbackSelector::new(),
            orientation: OrientationMapper::new(settings.interaction_mode),
            feedback_enabled: settings.feedback_enabled,
            sound_enabled: settings.feedback_sound_enabled,
            haptics_enabled: settings.feedback_haptics_enabled,
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::AccessoryConnected { name } => {
                self.accessory_connected(name);
                Ok(())
            }
            SessionEvent::AccessoryDisconnected => {
                self.accessory_disconnected();
                Ok(())
            }
            SessionEvent::AccessoryData {
                data,
                accessory_name,
            } => self.accessory_shared_data(&data, &accessory_name),
            SessionEvent::Engine(event) => self.handle_engine_event(event),
            SessionEvent::User(command) => self.handle_user_command(command),
            SessionEvent::FeedbackTick => {
                self.tick();
                Ok(())
            }
            SessionEvent::Shutdown => Ok(()),
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) -> Result<(), SessionError> {
        match event {
            EngineEvent::ShareableConfiguration {
                discovery_token,
                data,
            } => self.shareable_configuration_ready(discovery_token, data),
            EngineEvent::Updated(objects) => {
                self.process_update(&objects);
                Ok(())
            }
            EngineEvent::Removed { objects, reason } => {
                self.objects_removed(&objects, reason);
                Ok(())
            }
            EngineEvent::Suspended => self.engine_suspended(),
            EngineEvent::SuspensionEnded => self.engine_suspension_ended(),
            EngineEvent::Invalidated(reason) => self.engine_invalidated(reason),
        }
    }

    fn handle_user_command(&mut self, command: UserCommand) -> Result<(), SessionError> {
        match command {
            UserCommand::ToggleSession => self.toggle_session(),
            UserCommand::SetFeedbackEnabled(enabled) => {
                info!("Feedback {}", if enabled { "enabled" } else { "disabled" });
                self.feedback_enabled = enabled;
                Ok(())
            }
            UserCommand::SetInteractionMode(mode) => {
                info!("Interaction mode set to {:?}", mode);
                self.orientation.set_mode(mode);
                Ok(())
            }
        }
    }

    // Data channel

    fn accessory_connected(&mut self, name: String) {
        self.session.connected = true;
        self.session.accessory_name = Some(name);
        if self.state == SessionState::Disconnected {
            self.set_state(SessionState::AwaitingConfiguration);
        }
        self.update_status("Accessory connected", MessageSeverity::Success);
    }

    fn accessory_disconnected(&mut self) {
        self.session = AccessorySession::default();
        self.set_state(SessionState::Disconnected);
        self.update_status("Accessory disconnected", MessageSeverity::Warning);
    }

    fn accessory_shared_data(
        &mut self,
        data: &[u8],
        accessory_name: &str,
    ) -> Result<(), SessionError> {
        let message = match protocol::decode(data) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping message from {}: {}", accessory_name, e);
                self.update_status(
                    &format!("Dropped invalid accessory message: {}", e),
                    MessageSeverity::Warning,
                );
                return Err(e.into());
            }
        };

        match message {
            AccessoryMessage::AccessoryConfigurationData(payload) => {
                self.setup_accessory(&payload, accessory_name)
            }
            AccessoryMessage::AccessoryUwbDidStart => {
                self.accessory_uwb_did_start();
                Ok(())
            }
            AccessoryMessage::AccessoryUwbDidStop => {
                self.accessory_uwb_did_stop();
                Ok(())
            }
            other => Err(ProtocolError::DirectionViolation {
                id: other.id().as_byte(),
                direction: "accessory to host",
            }
            .into()),
        }
    }

    // Accessory messages

    fn setup_accessory(&mut self, data: &[u8], accessory_name: &str) -> Result<(), SessionError> {
        self.update_status(
            "Received configuration data. Running session.",
            MessageSeverity::Info,
        );

        let configuration = match self.engine.configuration_from_data(data) {
            Ok(configuration) => configuration,
            Err(e) => {
                self.update_status(
                    &format!("Failed to create ranging configuration. Error: {}", e),
                    MessageSeverity::Error,
                );
                return Err(e.into());
            }
        };

        // Cache the token to correlate updates with this accessory
        self.session
            .cache_token(configuration.accessory_discovery_token, accessory_name);
        self.engine.run(&configuration);
        self.session.configuration = Some(configuration);
        self.set_state(SessionState::EngineConfiguring);
        Ok(())
    }

    fn accessory_uwb_did_start(&mut self) {
        if !self.expect_state(SessionState::EngineConfiguring, "accessory did start") {
            return;
        }
        self.set_state(SessionState::Active);
        self.update_status("Accessory session started.", MessageSeverity::Success);
    }

    fn accessory_uwb_did_stop(&mut self) {
        self.session.accessory_map.clear();
        self.set_state(SessionState::Disconnected);
        self.update_status("Accessory session stopped.", MessageSeverity::Info);
    }

    // Ranging engine

    fn shareable_configuration_ready(
        &mut self,
        discovery_token: DiscoveryToken,
        data: Vec<u8>,
    ) -> Result<(), SessionError> {
        let expected = self
            .session
            .configuration
            .as_ref()
            .map(|c| c.accessory_discovery_token);
        if expected != Some(discovery_token) {
            debug!(
                "Ignoring shareable configuration for unknown token {}",
                discovery_token
            );
            return Ok(());
        }

        self.send_to_accessory(AccessoryMessage::ConfigureAndStart(data))?;
        self.update_status("Sent shareable configuration data.", MessageSeverity::Info);
        Ok(())
    }

    /// Smooth a new sample and, while ranging is active, derive the readout
    pub fn process_update(&mut self, objects: &[NearbyObject]) -> Option<RangingReading> {
        let accessory = objects.first()?;
        let (distance, direction) = (accessory.distance?, accessory.direction?);

        if !self.session.connected {
            return None;
        }

        // The window fills in every connected state; only derivation is gated on Active
        self.smoother.push_distance(distance);
        self.smoother.push_direction(direction);
        let distance = self.smoother.average_distance();
        let direction = self.smoother.average_direction();

        if !self.processing_enabled() {
            trace!("Sample smoothed while {}: {:.2} m", self.state, distance);
            return None;
        }

        let (azimuth, elevation) = orientation::derive_angles(&direction);
        let mode = self.orientation.mode();
        let rotation = self.orientation.apply(azimuth, elevation, mode);
        let feedback_level = self.feedback.select_level(distance);

        let reading = RangingReading {
            accessory_name: self
                .session
                .accessory_map
                .get(&accessory.discovery_token)
                .or(self.session.accessory_name.as_ref())
                .cloned(),
            distance,
            azimuth,
            elevation,
            rotation,
            feedback_level,
        };
        trace!("{:?}", reading);
        let _ = self
            .event_sender
            .send(PresentationEvent::Reading(reading.clone()));
        Some(reading)
    }

    fn objects_removed(&mut self, objects: &[NearbyObject], reason: RemovalReason) {
        // Only a peer timeout is worth reacting to
        if reason != RemovalReason::Timeout {
            debug!("Nearby object removed: {:?}", reason);
            return;
        }
        self.update_status("Session timed out.", MessageSeverity::Warning);

        let Some(accessory) = objects.first() else {
            return;
        };
        self.session.accessory_map.remove(&accessory.discovery_token);

        if self.should_retry() {
            debug!("Accessory still connected; waiting for it to restart the handshake");
        }
    }

    pub fn should_retry(&self) -> bool {
        self.session.connected
    }

    fn engine_suspended(&mut self) -> Result<(), SessionError> {
        if !self.expect_state(SessionState::Active, "engine suspension") {
            return Ok(());
        }
        self.set_state(SessionState::Suspended);
        self.update_status("Session was suspended.", MessageSeverity::Warning);
        self.send_to_accessory(AccessoryMessage::Stop)
    }

    fn engine_suspension_ended(&mut self) -> Result<(), SessionError> {
        if !self.expect_state(SessionState::Suspended, "engine suspension end") {
            return Ok(());
        }
        self.update_status("Session suspension ended.", MessageSeverity::Info);
        // Restart the configuration procedure with the accessory
        self.send_to_accessory(AccessoryMessage::Initialize)?;
        self.set_state(SessionState::AwaitingConfiguration);
        Ok(())
    }

    fn engine_invalidated(&mut self, reason: InvalidationReason) -> Result<(), SessionError> {
        self.set_state(SessionState::Invalidated);

        if reason == InvalidationReason::PermissionDenied {
            self.update_status(
                "Nearby interactions access required. You can change access in Settings.",
                MessageSeverity::Error,
            );
            return Err(SessionError::PermissionDenied);
        }

        self.update_status(
            &format!("Session invalidated ({}). Restarting.", reason),
            MessageSeverity::Warning,
        );

        // Keep going on a failed stop so the engine is still replaced
        let stopped = self.send_to_accessory(AccessoryMessage::Stop);
        self.replace_engine();
        let initialized = self.send_to_accessory(AccessoryMessage::Initialize);
        self.set_state(SessionState::AwaitingConfiguration);

        stopped.and(initialized)
    }

    fn replace_engine(&mut self) {
        self.engine = (self.engine_factory)();
        self.session.configuration = None;
        self.session.accessory_map.clear();
        info!("Ranging engine replaced");
    }

    // Feedback

    /// Advance the pulse gate by one tick
    pub fn tick(&mut self) -> Option<PulseSpec> {
        if !self.feedback_enabled || !self.processing_enabled() {
            return None;
        }

        let pulse = self.feedback.tick()?;
        let _ = self.event_sender.send(PresentationEvent::Pulse {
            pulse,
            sound: self.sound_enabled,
            haptics: self.haptics_enabled,
        });
        Some(pulse)
    }

    // User commands

    fn toggle_session(&mut self) -> Result<(), SessionError> {
        if !self.session.connected {
            warn!("Run/stop requested without a connected accessory");
            return Err(SessionError::NotConnected);
        }

        if self.state == SessionState::Active {
            self.update_status("Requesting accessory to stop", MessageSeverity::Info);
            return self.send_to_accessory(AccessoryMessage::Stop);
        }

        if self.state == SessionState::Invalidated {
            self.replace_engine();
        }
        self.update_status(
            "Requesting configuration data from accessory",
            MessageSeverity::Info,
        );
        self.send_to_accessory(AccessoryMessage::Initialize)?;
        self.set_state(SessionState::AwaitingConfiguration);
        Ok(())
    }

    // Helpers

    fn processing_enabled(&self) -> bool {
        self.session.connected && self.state == SessionState::Active
    }

    /// Whether `trigger` is legal from the current state; logs and rejects otherwise
    fn expect_state(&self, required: SessionState, trigger: &str) -> bool {
        if self.state == required {
            return true;
        }
        warn!(
            "Ignoring {} in state {} (expected {})",
            trigger, self.state, required
        );
        false
    }

    fn send_to_accessory(&mut self, message: AccessoryMessage) -> Result<(), SessionError> {
        let bytes = protocol::encode(&message)?;

        if let AccessoryMessage::ConfigureAndStart(_) = message {
            info!(
                "Sending shareable configuration bytes: {}",
                protocol::hex_dump(&bytes)
            );
        } else {
            debug!("Sending {:?} to accessory", message.id());
        }

        if let Err(e) = self.channel.send(&bytes) {
            let err = SessionError::from(e);
            self.update_status(&err.to_string(), MessageSeverity::Error);
            return Err(err);
        }
        Ok(())
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        debug!("Session state: {} -> {}", self.state, state);
        self.state = state;
        let _ = self
            .event_sender
            .send(PresentationEvent::StateChanged(state));
    }

    fn update_status(&mut self, text: &str, severity: MessageSeverity) {
        match severity {
            MessageSeverity::Error => error!("{}", text),
            MessageSeverity::Warning => warn!("{}", text),
            MessageSeverity::Info | MessageSeverity::Success => info!("{}", text),
        }

        let status = StatusMessage {
            message: text.to_string(),
            severity,
        };
        self.status = Some(status.clone());
        let _ = self.event_sender.send(PresentationEvent::Status {
            accessory_name: self.session.accessory_name.clone(),
            status,
        });
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Name cached for a discovery token by the last handshake
    pub fn accessory_for_token(&self, token: &DiscoveryToken) -> Option<&str> {
        self.session.accessory_map.get(token).map(String::as_str)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            connected: self.session.connected,
            accessory_name: self.session.accessory_name.clone(),
            can_start: self.session.connected,
            ranging_active: self.processing_enabled(),
            feedback_enabled: self.feedback_enabled,
            feedback: self.feedback.state(),
            orientation: self.orientation.state(),
            status: self.status.clone(),
        }
    }
}
