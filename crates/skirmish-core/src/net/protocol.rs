use serde::{Deserialize, Serialize};

use super::messages::{
    ClientMessage, CollectPickupMsg, InitMsg, JoinMsg, JoinRejectedMsg, KillFeedMsg, MessageType,
    MoveMsg, PickupCollectedMsg, PickupRespawnMsg, PlayerJoinedMsg, PlayerLeftMsg, PlayerMovedMsg,
    PlayerRespawnMsg, PlayerShotMsg, ServerMessage, ShootMsg, TookDamageMsg, UpdateScoreMsg,
};

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Maximum message payload size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable payload with a 1-byte type prefix.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode a `ClientMessage` to wire format.
pub fn encode_client_message(msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ClientMessage::Join(m) => encode_message(MessageType::Join, m),
        ClientMessage::Move(m) => encode_message(MessageType::Move, m),
        ClientMessage::Shoot(m) => encode_message(MessageType::Shoot, m),
        ClientMessage::CollectPickup(m) => encode_message(MessageType::CollectPickup, m),
    }
}

/// Encode a `ServerMessage` to wire format.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ServerMessage::Init(m) => encode_message(MessageType::Init, m),
        ServerMessage::PlayerJoined(m) => encode_message(MessageType::PlayerJoined, m),
        ServerMessage::PlayerMoved(m) => encode_message(MessageType::PlayerMoved, m),
        ServerMessage::PlayerShot(m) => encode_message(MessageType::PlayerShot, m),
        ServerMessage::TookDamage(m) => encode_message(MessageType::TookDamage, m),
        ServerMessage::UpdateScore(m) => encode_message(MessageType::UpdateScore, m),
        ServerMessage::KillFeed(m) => encode_message(MessageType::KillFeed, m),
        ServerMessage::PlayerRespawn(m) => encode_message(MessageType::PlayerRespawn, m),
        ServerMessage::PickupCollected(m) => encode_message(MessageType::PickupCollected, m),
        ServerMessage::PickupRespawn(m) => encode_message(MessageType::PickupRespawn, m),
        ServerMessage::PlayerLeft(m) => encode_message(MessageType::PlayerLeft, m),
        ServerMessage::JoinRejected(m) => encode_message(MessageType::JoinRejected, m),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    let Some(&first) = data.first() else {
        return Err(ProtocolError::EmptyMessage);
    };
    MessageType::from_byte(first).ok_or(ProtocolError::UnknownMessageType(first))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    let Some(payload) = data.get(1..) else {
        return Err(ProtocolError::EmptyMessage);
    };
    rmp_serde::from_slice(payload).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a `ClientMessage`.
pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::Join => Ok(ClientMessage::Join(decode_payload::<JoinMsg>(data)?)),
        MessageType::Move => Ok(ClientMessage::Move(decode_payload::<MoveMsg>(data)?)),
        MessageType::Shoot => Ok(ClientMessage::Shoot(decode_payload::<ShootMsg>(data)?)),
        MessageType::CollectPickup => Ok(ClientMessage::CollectPickup(decode_payload::<
            CollectPickupMsg,
        >(data)?)),
        other => Err(ProtocolError::UnknownMessageType(other as u8)),
    }
}

/// Decode raw wire data into a `ServerMessage`.
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::Init => Ok(ServerMessage::Init(Box::new(decode_payload::<InitMsg>(
            data,
        )?))),
        MessageType::PlayerJoined => Ok(ServerMessage::PlayerJoined(Box::new(decode_payload::<
            PlayerJoinedMsg,
        >(data)?))),
        MessageType::PlayerMoved => Ok(ServerMessage::PlayerMoved(decode_payload::<
            PlayerMovedMsg,
        >(data)?)),
        MessageType::PlayerShot => Ok(ServerMessage::PlayerShot(decode_payload::<PlayerShotMsg>(
            data,
        )?)),
        MessageType::TookDamage => Ok(ServerMessage::TookDamage(decode_payload::<TookDamageMsg>(
            data,
        )?)),
        MessageType::UpdateScore => Ok(ServerMessage::UpdateScore(decode_payload::<
            UpdateScoreMsg,
        >(data)?)),
        MessageType::KillFeed => Ok(ServerMessage::KillFeed(decode_payload::<KillFeedMsg>(
            data,
        )?)),
        MessageType::PlayerRespawn => Ok(ServerMessage::PlayerRespawn(decode_payload::<
            PlayerRespawnMsg,
        >(data)?)),
        MessageType::PickupCollected => Ok(ServerMessage::PickupCollected(decode_payload::<
            PickupCollectedMsg,
        >(data)?)),
        MessageType::PickupRespawn => Ok(ServerMessage::PickupRespawn(decode_payload::<
            PickupRespawnMsg,
        >(data)?)),
        MessageType::PlayerLeft => Ok(ServerMessage::PlayerLeft(decode_payload::<PlayerLeftMsg>(
            data,
        )?)),
        MessageType::JoinRejected => Ok(ServerMessage::JoinRejected(decode_payload::<
            JoinRejectedMsg,
        >(data)?)),
        other => Err(ProtocolError::UnknownMessageType(other as u8)),
    }
}
