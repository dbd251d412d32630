//! In-process accessory answering the host protocol the way firmware would.

use crate::domain::errors::TransportError;
use crate::domain::models::{DiscoveryToken, SessionEvent};
use crate::domain::ports::DataChannel;
use crate::domain::protocol::{self, AccessoryMessage};
use tokio::sync::mpsc;
use tracing::debug;

/// Marker following the discovery token in the configuration blob
pub const CONFIGURATION_MAGIC: &[u8] = b"UWBCFG";

/// Configuration blob understood by the simulated ranging engine
pub fn configuration_blob(token: DiscoveryToken) -> Vec<u8> {
    let mut blob = token.0.to_le_bytes().to_vec();
    blob.extend_from_slice(CONFIGURATION_MAGIC);
    blob
}

#[derive(Clone)]
pub struct SimulatedAccessory {
    name: String,
    discovery_token: DiscoveryToken,
    event_sender: mpsc::UnboundedSender<SessionEvent>,
}

impl SimulatedAccessory {
    pub fn new(
        name: impl Into<String>,
        discovery_token: DiscoveryToken,
        event_sender: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            name: name.into(),
            discovery_token,
            event_sender,
        }
    }

    pub fn connect(&self) -> Result<(), TransportError> {
        self.deliver(SessionEvent::AccessoryConnected {
            name: self.name.clone(),
        })
    }

    pub fn disconnect(&self) -> Result<(), TransportError> {
        self.deliver(SessionEvent::AccessoryDisconnected)
    }

    fn reply(&self, message: AccessoryMessage) -> Result<(), TransportError> {
        let data = protocol::encode_from_accessory(&message)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.deliver(SessionEvent::AccessoryData {
            data,
            accessory_name: self.name.clone(),
        })
    }

    fn deliver(&self, event: SessionEvent) -> Result<(), TransportError> {
        self.event_sender
            .send(event)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

impl DataChannel for SimulatedAccessory {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let message = protocol::decode_from_host(bytes)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        debug!("{} received {:?}", self.name, message.id());

        match message {
            AccessoryMessage::Initialize => self.reply(
                AccessoryMessage::AccessoryConfigurationData(configuration_blob(
                    self.discovery_token,
                )),
            ),
            AccessoryMessage::ConfigureAndStart(_) => {
                self.reply(AccessoryMessage::AccessoryUwbDidStart)
            }
            AccessoryMessage::Stop => self.reply(AccessoryMessage::AccessoryUwbDidStop),
            // decode_from_host only yields host commands
            _ => Ok(()),
        }
    }
}
