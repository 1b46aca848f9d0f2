use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use skirmish_core::entity::{EntityId, EntityState, PlayerColor, Vec3};
use skirmish_core::pickup::{PickupKind, PickupState};

use crate::PlayerMoved;
use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::obstacles::ObstacleField;

/// Prefixes for generated display names.
const DEFAULT_NAMES: &[&str] = &["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot"];

/// Longest accepted display name, in characters.
pub const MAX_NAME_LEN: usize = 32;

/// Fixed pickup layout: (id, kind, x, y, z).
const PICKUP_LAYOUT: &[(&str, PickupKind, f32, f32, f32)] = &[
    ("health1", PickupKind::Health, 10.0, 1.0, 10.0),
    ("ammo1", PickupKind::Ammo, -10.0, 1.0, -10.0),
    ("health2", PickupKind::Health, 20.0, 1.0, -20.0),
    ("ammo2", PickupKind::Ammo, -20.0, 1.0, 20.0),
    ("health3", PickupKind::Health, 0.0, 1.0, 30.0),
    ("ammo3", PickupKind::Ammo, 0.0, 1.0, -30.0),
    ("ammo4", PickupKind::Ammo, 30.0, 1.0, 0.0),
    ("health4", PickupKind::Health, -30.0, 1.0, 0.0),
];

/// Bot-only control state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BotBrain {
    /// Current patrol destination (x, z).
    pub waypoint: Option<(f32, f32)>,
    /// Seeded at spawn so a new bot waits out one cooldown before firing.
    pub last_shot: Option<Instant>,
}

/// A live avatar: the broadcastable state plus bot control state.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub state: EntityState,
    /// Present for bots only.
    pub brain: Option<BotBrain>,
}

impl Entity {
    pub fn is_bot(&self) -> bool {
        self.brain.is_some()
    }

    pub fn position(&self) -> Vec3 {
        self.state.position()
    }
}

/// The single shared arena.
pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) entities: BTreeMap<EntityId, Entity>,
    pub(crate) pickups: Vec<PickupState>,
    pub(crate) obstacles: ObstacleField,
    pub(crate) rng: StdRng,
    next_id: EntityId,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self::build(config, StdRng::from_os_rng())
    }

    /// Deterministic world for tests and replays.
    pub fn with_seed(config: WorldConfig, seed: u64) -> Self {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    fn build(config: WorldConfig, rng: StdRng) -> Self {
        let obstacles = ObstacleField::generate(config.map_seed, config.obstacle_count);
        let pickups = PICKUP_LAYOUT
            .iter()
            .map(|&(id, kind, x, y, z)| PickupState {
                id: id.to_string(),
                kind,
                position: Vec3::new(x, y, z),
                visible: true,
            })
            .collect();

        let mut world = Self {
            config,
            entities: BTreeMap::new(),
            pickups,
            obstacles,
            rng,
            next_id: 1,
        };
        if world.config.bots_enabled {
            for slot in 0..world.config.bot_count {
                world.spawn_bot(slot);
            }
        }
        tracing::debug!(
            bots = world.bot_ids().len(),
            obstacles = world.obstacles.len(),
            "world initialised"
        );
        world
    }

    fn spawn_bot(&mut self, slot: u32) {
        let id = self.alloc_entity_id();
        let extent = self.config.bot_spawn_extent;
        let state = EntityState {
            x: self.rng.random_range(-extent..=extent),
            y: self.config.eye_height,
            z: self.rng.random_range(-extent..=extent),
            ry: self.rng.random_range(0.0..TAU),
            hp: self.config.max_hp,
            score: 0,
            color: self.random_color(),
            name: format!("Bot_{slot}"),
            is_bot: true,
            invulnerable: false,
        };
        self.entities.insert(
            id,
            Entity {
                id,
                state,
                brain: Some(BotBrain {
                    waypoint: None,
                    last_shot: Some(Instant::now()),
                }),
            },
        );
    }

    /// Reserve a fresh id. Ids are never reused.
    pub fn alloc_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a human at the origin.
    ///
    /// Fails only if `id` is already live, which means the caller handed out
    /// the same id twice.
    pub fn join(
        &mut self,
        id: EntityId,
        color: Option<PlayerColor>,
        name: Option<String>,
    ) -> Result<EntityState, WorldError> {
        if self.entities.contains_key(&id) {
            return Err(WorldError::DuplicateEntity(id));
        }
        let color = color.unwrap_or_else(|| self.random_color());
        let cleaned: String = name
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_control())
            .collect();
        let name = match cleaned.trim() {
            "" => self.random_name(),
            trimmed => trimmed.chars().take(MAX_NAME_LEN).collect(),
        };
        let state = EntityState {
            x: 0.0,
            y: self.config.eye_height,
            z: 0.0,
            ry: 0.0,
            hp: self.config.max_hp,
            score: 0,
            color,
            name,
            is_bot: false,
            invulnerable: false,
        };
        self.entities.insert(
            id,
            Entity {
                id,
                state: state.clone(),
                brain: None,
            },
        );
        tracing::info!(id, name = %state.name, "player joined");
        Ok(state)
    }

    /// Overwrite an entity's pose. Unknown ids and non-finite input are ignored.
    pub fn move_entity(
        &mut self,
        id: EntityId,
        x: f32,
        y: f32,
        z: f32,
        ry: f32,
    ) -> Option<PlayerMoved> {
        if ![x, y, z, ry].iter().all(|v| v.is_finite()) {
            tracing::debug!(id, "discarding non-finite move");
            return None;
        }
        let entity = self.entities.get_mut(&id)?;
        entity.state.x = x;
        entity.state.y = y;
        entity.state.z = z;
        entity.state.ry = ry;
        Some(PlayerMoved { id, x, y, z, ry })
    }

    /// Remove a human. Bots live for the whole process and are never removed.
    pub fn leave(&mut self, id: EntityId) -> bool {
        match self.entities.get(&id) {
            Some(e) if e.is_bot() => {
                tracing::debug!(id, "refusing to remove bot");
                false
            },
            Some(_) => {
                if let Some(e) = self.entities.remove(&id) {
                    tracing::info!(id, name = %e.state.name, "player left");
                }
                true
            },
            None => false,
        }
    }

    pub fn snapshot_all(&self) -> BTreeMap<EntityId, EntityState> {
        self.entities
            .iter()
            .map(|(&id, e)| (id, e.state.clone()))
            .collect()
    }

    pub fn visible_pickups(&self) -> Vec<PickupState> {
        self.pickups.iter().filter(|p| p.visible).cloned().collect()
    }

    pub fn pickups(&self) -> &[PickupState] {
        &self.pickups
    }

    pub fn pickup(&self, id: &str) -> Option<&PickupState> {
        self.pickups.iter().find(|p| p.id == id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn human_count(&self) -> usize {
        self.entities.values().filter(|e| !e.is_bot()).count()
    }

    pub fn bot_ids(&self) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.is_bot())
            .map(|e| e.id)
            .collect()
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    fn random_color(&mut self) -> PlayerColor {
        PlayerColor::PALETTE[self.rng.random_range(0..PlayerColor::PALETTE.len())]
    }

    fn random_name(&mut self) -> String {
        let prefix = DEFAULT_NAMES[self.rng.random_range(0..DEFAULT_NAMES.len())];
        let suffix = self.rng.random_range(0..100u32);
        format!("{prefix}{suffix}")
    }

    /// Uniform point in `[-extent, extent]` on both planar axes at eye height.
    pub(crate) fn random_point(&mut self, extent: f32) -> Vec3 {
        let x = self.rng.random_range(-extent..=extent);
        let z = self.rng.random_range(-extent..=extent);
        Vec3::new(x, self.config.eye_height, z)
    }
}
