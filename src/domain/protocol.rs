//! Accessory Message Protocol
//!
//! Every message starts with a one-byte identifier. Only configuration
//! messages carry a payload, and the payload is opaque to the codec.
//!
//! ```text
//! 0x01  accessory -> host  configuration data (payload required)
//! 0x02  accessory -> host  UWB did start
//! 0x03  accessory -> host  UWB did stop
//! 0x0A  host -> accessory  initialize
//! 0x0B  host -> accessory  configure and start (shareable configuration)
//! 0x0C  host -> accessory  stop
//! ```

use crate::domain::errors::ProtocolError;

/// Leading byte of every accessory protocol message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageId {
    // Messages from the accessory
    AccessoryConfigurationData = 0x01,
    AccessoryUwbDidStart = 0x02,
    AccessoryUwbDidStop = 0x03,

    // Messages to the accessory
    Initialize = 0x0A,
    ConfigureAndStart = 0x0B,
    Stop = 0x0C,
}

impl MessageId {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Messages the accessory may send to the host
    pub fn is_from_accessory(self) -> bool {
        matches!(
            self,
            Self::AccessoryConfigurationData | Self::AccessoryUwbDidStart | Self::AccessoryUwbDidStop
        )
    }
}

impl TryFrom<u8> for MessageId {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(Self::AccessoryConfigurationData),
            0x02 => Ok(Self::AccessoryUwbDidStart),
            0x03 => Ok(Self::AccessoryUwbDidStop),
            0x0A => Ok(Self::Initialize),
            0x0B => Ok(Self::ConfigureAndStart),
            0x0C => Ok(Self::Stop),
            other => Err(ProtocolError::UnknownMessageId(other)),
        }
    }
}

/// A decoded accessory protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessoryMessage {
    AccessoryConfigurationData(Vec<u8>),
    AccessoryUwbDidStart,
    AccessoryUwbDidStop,
    Initialize,
    ConfigureAndStart(Vec<u8>),
    Stop,
}

impl AccessoryMessage {
    pub fn id(&self) -> MessageId {
        match self {
            Self::AccessoryConfigurationData(_) => MessageId::AccessoryConfigurationData,
            Self::AccessoryUwbDidStart => MessageId::AccessoryUwbDidStart,
            Self::AccessoryUwbDidStop => MessageId::AccessoryUwbDidStop,
            Self::Initialize => MessageId::Initialize,
            Self::ConfigureAndStart(_) => MessageId::ConfigureAndStart,
            Self::Stop => MessageId::Stop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    AccessoryToHost,
    HostToAccessory,
}

impl Direction {
    fn allows(self, id: MessageId) -> bool {
        match self {
            Self::AccessoryToHost => id.is_from_accessory(),
            Self::HostToAccessory => !id.is_from_accessory(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::AccessoryToHost => "accessory to host",
            Self::HostToAccessory => "host to accessory",
        }
    }

    fn check(self, id: MessageId) -> Result<(), ProtocolError> {
        if self.allows(id) {
            Ok(())
        } else {
            Err(ProtocolError::DirectionViolation {
                id: id.as_byte(),
                direction: self.label(),
            })
        }
    }
}

/// Decode bytes received by the host from the accessory
pub fn decode(bytes: &[u8]) -> Result<AccessoryMessage, ProtocolError> {
    decode_in(Direction::AccessoryToHost, bytes)
}

/// Encode a message the host sends to the accessory
pub fn encode(message: &AccessoryMessage) -> Result<Vec<u8>, ProtocolError> {
    encode_in(Direction::HostToAccessory, message)
}

/// Decode bytes received by the accessory from the host
pub fn decode_from_host(bytes: &[u8]) -> Result<AccessoryMessage, ProtocolError> {
    decode_in(Direction::HostToAccessory, bytes)
}

/// Encode a message the accessory sends to the host
pub fn encode_from_accessory(message: &AccessoryMessage) -> Result<Vec<u8>, ProtocolError> {
    encode_in(Direction::AccessoryToHost, message)
}

fn decode_in(direction: Direction, bytes: &[u8]) -> Result<AccessoryMessage, ProtocolError> {
    let (&first, payload) = bytes.split_first().ok_or(ProtocolError::EmptyMessage)?;
    let id = MessageId::try_from(first)?;
    direction.check(id)?;

    let message = match id {
        MessageId::AccessoryConfigurationData => {
            AccessoryMessage::AccessoryConfigurationData(require_payload(id, payload)?)
        }
        MessageId::AccessoryUwbDidStart => AccessoryMessage::AccessoryUwbDidStart,
        MessageId::AccessoryUwbDidStop => AccessoryMessage::AccessoryUwbDidStop,
        MessageId::Initialize => AccessoryMessage::Initialize,
        MessageId::ConfigureAndStart => {
            AccessoryMessage::ConfigureAndStart(require_payload(id, payload)?)
        }
        MessageId::Stop => AccessoryMessage::Stop,
    };

    Ok(message)
}

fn encode_in(direction: Direction, message: &AccessoryMessage) -> Result<Vec<u8>, ProtocolError> {
    let id = message.id();
    direction.check(id)?;

    let mut bytes = vec![id.as_byte()];
    match message {
        AccessoryMessage::AccessoryConfigurationData(payload) => {
            if payload.is_empty() {
                return Err(ProtocolError::MissingPayload(id.as_byte()));
            }
            bytes.extend_from_slice(payload);
        }
        // The shareable configuration is passed through untouched
        AccessoryMessage::ConfigureAndStart(payload) => bytes.extend_from_slice(payload),
        _ => {}
    }

    Ok(bytes)
}

fn require_payload(id: MessageId, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if payload.is_empty() {
        Err(ProtocolError::MissingPayload(id.as_byte()))
    } else {
        Ok(payload.to_vec())
    }
}

/// Format bytes as `0x01, 0x02, ` for logging
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("0x{:02x}, ", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_configuration_data() {
        let message = decode(&[0x01, 0xAA, 0xBB]).unwrap();
        assert_eq!(
            message,
            AccessoryMessage::AccessoryConfigurationData(vec![0xAA, 0xBB])
        );
    }

    #[test]
    fn test_decode_empty_and_unknown() {
        assert_eq!(decode(&[]), Err(ProtocolError::EmptyMessage));
        assert_eq!(decode(&[0xFF]), Err(ProtocolError::UnknownMessageId(0xFF)));
    }

    #[test]
    fn test_decode_configuration_without_payload() {
        assert_eq!(decode(&[0x01]), Err(ProtocolError::MissingPayload(0x01)));
    }

    #[test]
    fn test_decode_status_messages_ignore_trailing_bytes() {
        assert_eq!(decode(&[0x02]), Ok(AccessoryMessage::AccessoryUwbDidStart));
        assert_eq!(decode(&[0x03, 0x00]), Ok(AccessoryMessage::AccessoryUwbDidStop));
    }

    #[test]
    fn test_host_commands_from_accessory_are_rejected() {
        for byte in [0x0A, 0x0B, 0x0C] {
            match decode(&[byte, 0x01]) {
                Err(ProtocolError::DirectionViolation { id, .. }) => assert_eq!(id, byte),
                other => panic!("expected direction violation, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_encode_host_commands() {
        assert_eq!(encode(&AccessoryMessage::Initialize).unwrap(), vec![0x0A]);
        assert_eq!(encode(&AccessoryMessage::Stop).unwrap(), vec![0x0C]);
        assert_eq!(
            encode(&AccessoryMessage::ConfigureAndStart(vec![0x10, 0x20, 0x30])).unwrap(),
            vec![0x0B, 0x10, 0x20, 0x30]
        );
    }

    #[test]
    fn test_encode_accessory_message_from_host_is_rejected() {
        let err = encode(&AccessoryMessage::AccessoryUwbDidStart).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::DirectionViolation { id: 0x02, .. }
        ));
    }

    #[test]
    fn test_accessory_side_codec() {
        assert_eq!(
            decode_from_host(&[0x0B, 0x42]),
            Ok(AccessoryMessage::ConfigureAndStart(vec![0x42]))
        );
        assert!(decode_from_host(&[0x02]).is_err());
        assert_eq!(
            encode_from_accessory(&AccessoryMessage::AccessoryConfigurationData(vec![7])).unwrap(),
            vec![0x01, 7]
        );
        assert_eq!(
            encode_from_accessory(&AccessoryMessage::AccessoryConfigurationData(Vec::new())),
            Err(ProtocolError::MissingPayload(0x01))
        );
    }

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[0x0B, 0xFF]), "0x0b, 0xff, ");
    }
}
