use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityState, PlayerColor};
use crate::pickup::PickupState;

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Client -> Server
    Join = 0x01,
    Move = 0x02,
    Shoot = 0x03,
    CollectPickup = 0x04,

    // Server -> Client
    Init = 0x10,
    PlayerJoined = 0x11,
    PlayerMoved = 0x12,
    PlayerShot = 0x13,
    TookDamage = 0x14,
    UpdateScore = 0x15,
    KillFeed = 0x16,
    PlayerRespawn = 0x17,
    PickupCollected = 0x18,
    PickupRespawn = 0x19,
    PlayerLeft = 0x1A,
    JoinRejected = 0x1F,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Join),
            0x02 => Some(Self::Move),
            0x03 => Some(Self::Shoot),
            0x04 => Some(Self::CollectPickup),
            0x10 => Some(Self::Init),
            0x11 => Some(Self::PlayerJoined),
            0x12 => Some(Self::PlayerMoved),
            0x13 => Some(Self::PlayerShot),
            0x14 => Some(Self::TookDamage),
            0x15 => Some(Self::UpdateScore),
            0x16 => Some(Self::KillFeed),
            0x17 => Some(Self::PlayerRespawn),
            0x18 => Some(Self::PickupCollected),
            0x19 => Some(Self::PickupRespawn),
            0x1A => Some(Self::PlayerLeft),
            0x1F => Some(Self::JoinRejected),
            _ => None,
        }
    }

    /// Whether clients are allowed to send this message type.
    pub fn is_client_message(self) -> bool {
        (self as u8) < 0x10
    }
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinMsg {
    pub color: Option<PlayerColor>,
    pub name: Option<String>,
    pub protocol_version: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveMsg {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub ry: f32,
}

/// A fired shot. `hit_id` is the victim the client believes it hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShootMsg {
    pub hit_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectPickupMsg {
    pub pickup_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    Join(JoinMsg),
    Move(MoveMsg),
    Shoot(ShootMsg),
    CollectPickup(CollectPickupMsg),
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Full world snapshot sent to a player right after joining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitMsg {
    pub id: EntityId,
    pub players: BTreeMap<EntityId, EntityState>,
    /// Only the pickups that are currently visible.
    pub pickups: Vec<PickupState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerJoinedMsg {
    pub id: EntityId,
    pub data: EntityState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMovedMsg {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub ry: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerShotMsg {
    pub id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TookDamageMsg {
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateScoreMsg {
    pub id: EntityId,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillFeedMsg {
    pub killer: String,
    pub victim: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRespawnMsg {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupCollectedMsg {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRespawnMsg {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLeftMsg {
    pub id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRejectedMsg {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    Init(Box<InitMsg>),
    PlayerJoined(Box<PlayerJoinedMsg>),
    PlayerMoved(PlayerMovedMsg),
    PlayerShot(PlayerShotMsg),
    TookDamage(TookDamageMsg),
    UpdateScore(UpdateScoreMsg),
    KillFeed(KillFeedMsg),
    PlayerRespawn(PlayerRespawnMsg),
    PickupCollected(PickupCollectedMsg),
    PickupRespawn(PickupRespawnMsg),
    PlayerLeft(PlayerLeftMsg),
    JoinRejected(JoinRejectedMsg),
}
