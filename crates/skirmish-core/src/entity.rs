use serde::{Deserialize, Serialize};

/// Unique identifier for an entity (human connection or bot slot).
///
/// Allocated by the world in increasing order and never reused, so a stale
/// timer can never address a newer entity by accident.
pub type EntityId = u64;

/// A point in world space. `y` is eye height and is not simulated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Planar (x, z) distance to another point.
    pub fn planar_distance(&self, other: &Vec3) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Avatar color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for PlayerColor {
    fn default() -> Self {
        Self::PALETTE[0]
    }
}

impl PlayerColor {
    /// Colors handed out to players and bots that don't request one.
    pub const PALETTE: &[PlayerColor] = &[
        PlayerColor {
            r: 255,
            g: 0,
            b: 0,
        }, // Red
        PlayerColor {
            r: 0,
            g: 255,
            b: 0,
        }, // Green
        PlayerColor {
            r: 0,
            g: 0,
            b: 255,
        }, // Blue
        PlayerColor {
            r: 255,
            g: 255,
            b: 0,
        }, // Yellow
        PlayerColor {
            r: 0,
            g: 255,
            b: 255,
        }, // Cyan
        PlayerColor {
            r: 255,
            g: 0,
            b: 255,
        }, // Magenta
    ];

    /// Build a color from a `0xRRGGBB` value, as the web client stores it.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Broadcastable view of an entity, as sent in `init` and `playerJoined`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub ry: f32,
    pub hp: i32,
    pub score: u32,
    pub color: PlayerColor,
    pub name: String,
    pub is_bot: bool,
    pub invulnerable: bool,
}

impl EntityState {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}
