//! Authoritative arena state for Skirmish.
//!
//! [`World`] owns every entity and pickup and is the only way to mutate them.
//! Operations never broadcast; they return outcome values describing what
//! changed so the caller can fan the matching events out to clients. Delayed
//! effects come back as [`ScheduledTimer`]s that the caller must feed to
//! [`World::fire_timer`] once their delay has elapsed.
//!
//! This crate has no runtime or I/O dependency. Serializing concurrent
//! triggers (human input, the bot tick, timers) is the caller's job.

pub mod bot;
pub mod combat;
pub mod config;
pub mod error;
pub mod obstacles;
pub mod pickups;
pub mod sight;
pub mod world;

use std::time::Duration;

use skirmish_core::entity::{EntityId, Vec3};

pub use config::{BotTuning, WorldConfig};
pub use error::WorldError;
pub use obstacles::{Obstacle, ObstacleField};
pub use world::{BotBrain, Entity, World};

/// New pose of an entity after a move or a bot tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMoved {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub ry: f32,
}

/// A fired shot. Always broadcast, even when nothing was hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotOutcome {
    pub shooter: EntityId,
    pub hit: Option<HitOutcome>,
}

/// Damage applied to a victim.
#[derive(Debug, Clone, PartialEq)]
pub struct HitOutcome {
    pub victim: EntityId,
    pub damage: i32,
    /// Victim hp once the mutation completed. Equals max hp after a kill.
    pub hp_after: i32,
    pub death: Option<DeathOutcome>,
}

/// A kill and the victim's immediate respawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DeathOutcome {
    pub killer: EntityId,
    pub killer_name: String,
    pub killer_score: u32,
    pub victim: EntityId,
    pub victim_name: String,
    pub respawn: Vec3,
    pub clear_invulnerability: ScheduledTimer,
}

/// A pickup that was just hidden.
#[derive(Debug, Clone, PartialEq)]
pub struct PickupCollected {
    pub id: String,
    pub respawn: ScheduledTimer,
}

/// Delayed world mutation. Holds ids only, never references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timer {
    ClearInvulnerability(EntityId),
    RespawnPickup(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub delay: Duration,
    pub timer: Timer,
}

/// Effect of a timer that fired against a still-existing subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Internal state change only; clients are not told.
    InvulnerabilityCleared(EntityId),
    PickupRespawned(String),
}

/// Everything the bots did during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BotTickReport {
    /// Post-tick pose of every bot.
    pub moves: Vec<PlayerMoved>,
    pub shots: Vec<ShotOutcome>,
}
