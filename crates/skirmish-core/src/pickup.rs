use serde::{Deserialize, Serialize};

use crate::entity::Vec3;

/// What a pickup represents. Only visibility is simulated server-side;
/// the effect of collecting one is applied by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Health,
    Ammo,
}

/// A collectible placed at a fixed position in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupState {
    pub id: String,
    pub kind: PickupKind,
    pub position: Vec3,
    pub visible: bool,
}
