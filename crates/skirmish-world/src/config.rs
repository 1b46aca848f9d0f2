use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Data-driven configuration for the shared arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Run the bot simulation. When false the world holds humans only.
    pub bots_enabled: bool,
    /// Number of bot slots created at startup.
    pub bot_count: u32,
    /// Bot AI tick interval (ms).
    pub bot_tick_ms: u64,
    /// Seed for the obstacle layout. Must match the web client's seed.
    pub map_seed: u32,
    pub obstacle_count: usize,
    /// Damage applied per hit.
    pub shot_damage: i32,
    /// Health on join and after respawn.
    pub max_hp: i32,
    /// Constant y of every entity.
    pub eye_height: f32,
    /// Respawned victims land at x, z in [-extent, extent].
    pub respawn_extent: f32,
    /// Bots start at x, z in [-extent, extent].
    pub bot_spawn_extent: f32,
    /// Post-respawn damage immunity (ms).
    pub invulnerability_ms: u64,
    /// Delay before a collected pickup reappears (ms).
    pub pickup_respawn_ms: u64,
    pub bot: BotTuning,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bots_enabled: true,
            bot_count: 3,
            bot_tick_ms: 100,
            map_seed: 12345,
            obstacle_count: 40,
            shot_damage: 10,
            max_hp: 100,
            eye_height: 2.0,
            respawn_extent: 50.0,
            bot_spawn_extent: 50.0,
            invulnerability_ms: 3000,
            pickup_respawn_ms: 10_000,
            bot: BotTuning::default(),
        }
    }
}

/// Steering, firing and accuracy parameters for bots.
///
/// Distances are planar world units, speeds are units per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotTuning {
    /// Beyond this distance the bot closes in.
    pub approach_distance: f32,
    /// Inside this distance the bot backs off.
    pub retreat_distance: f32,
    /// Upper bound of the strafing band (lower bound is `retreat_distance`).
    pub strafe_max_distance: f32,
    pub approach_speed: f32,
    pub retreat_speed: f32,
    pub strafe_speed: f32,
    /// Per-tick probability of a strafe step inside the strafing band.
    pub strafe_chance: f64,
    /// Fraction of the remaining yaw difference turned per tick.
    pub turn_rate: f32,
    /// Patrol waypoints are drawn from [-extent, extent].
    pub patrol_extent: f32,
    pub patrol_speed: f32,
    /// Distance at which a waypoint counts as reached.
    pub waypoint_reached: f32,
    /// Per-tick probability of abandoning the current waypoint.
    pub waypoint_reroll_chance: f64,
    pub fire_range: f32,
    pub fire_cooldown_ms: u64,
    /// Maximum aim error (radians) at which the bot attempts a shot.
    pub aim_tolerance: f32,
    pub base_accuracy: f32,
    /// Accuracy lost per 100 units of distance.
    pub distance_penalty: f32,
    /// Accuracy lost per radian of aim error.
    pub aim_penalty: f32,
    pub min_accuracy: f32,
    pub max_accuracy: f32,
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            approach_distance: 40.0,
            retreat_distance: 15.0,
            strafe_max_distance: 25.0,
            approach_speed: 0.2,
            retreat_speed: 0.15,
            strafe_speed: 0.15,
            strafe_chance: 0.02,
            turn_rate: 0.1,
            patrol_extent: 40.0,
            patrol_speed: 0.1,
            waypoint_reached: 2.0,
            waypoint_reroll_chance: 0.01,
            fire_range: 50.0,
            fire_cooldown_ms: 200,
            aim_tolerance: 0.26,
            base_accuracy: 0.5,
            distance_penalty: 0.3,
            aim_penalty: 2.0,
            min_accuracy: 0.15,
            max_accuracy: 0.6,
        }
    }
}

impl BotTuning {
    pub fn fire_cooldown(&self) -> Duration {
        Duration::from_millis(self.fire_cooldown_ms)
    }
}

impl WorldConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("SKIRMISH_WORLD_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/world.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }

    pub fn bot_tick(&self) -> Duration {
        Duration::from_millis(self.bot_tick_ms)
    }

    pub fn invulnerability(&self) -> Duration {
        Duration::from_millis(self.invulnerability_ms)
    }

    pub fn pickup_respawn(&self) -> Duration {
        Duration::from_millis(self.pickup_respawn_ms)
    }

    /// Reject values that would stall timers or invert ranges.
    pub fn validate(&self) -> Result<(), WorldError> {
        let invalid = |msg: &str| Err(WorldError::InvalidConfig(msg.to_string()));

        if self.bots_enabled && self.bot_tick_ms == 0 {
            return invalid("bot_tick_ms must be > 0");
        }
        if self.invulnerability_ms == 0 {
            return invalid("invulnerability_ms must be > 0");
        }
        if self.pickup_respawn_ms == 0 {
            return invalid("pickup_respawn_ms must be > 0");
        }
        if self.max_hp <= 0 {
            return invalid("max_hp must be > 0");
        }
        if self.shot_damage < 0 {
            return invalid("shot_damage must be >= 0");
        }
        if !self.eye_height.is_finite() {
            return invalid("eye_height must be finite");
        }
        for (name, extent) in [
            ("respawn_extent", self.respawn_extent),
            ("bot_spawn_extent", self.bot_spawn_extent),
            ("bot.patrol_extent", self.bot.patrol_extent),
        ] {
            if !(extent.is_finite() && extent >= 0.0) {
                return Err(WorldError::InvalidConfig(format!(
                    "{name} must be a finite value >= 0"
                )));
            }
        }

        let bot = &self.bot;
        if bot.min_accuracy > bot.max_accuracy {
            return invalid("bot.min_accuracy must be <= bot.max_accuracy");
        }
        if !(0.0..=1.0).contains(&bot.min_accuracy) || !(0.0..=1.0).contains(&bot.max_accuracy) {
            return invalid("bot accuracy bounds must lie in [0, 1]");
        }
        if !(0.0..=1.0).contains(&bot.strafe_chance)
            || !(0.0..=1.0).contains(&bot.waypoint_reroll_chance)
        {
            return invalid("bot probabilities must lie in [0, 1]");
        }
        if bot.retreat_distance > bot.strafe_max_distance
            || bot.strafe_max_distance > bot.approach_distance
        {
            return invalid("bot distances must satisfy retreat <= strafe_max <= approach");
        }
        if bot.distance_penalty < 0.0 || bot.aim_penalty < 0.0 {
            return invalid("bot accuracy penalties must be >= 0");
        }
        for (name, value) in [
            ("bot.approach_speed", bot.approach_speed),
            ("bot.retreat_speed", bot.retreat_speed),
            ("bot.strafe_speed", bot.strafe_speed),
            ("bot.patrol_speed", bot.patrol_speed),
            ("bot.waypoint_reached", bot.waypoint_reached),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(WorldError::InvalidConfig(format!(
                    "{name} must be a finite value >= 0"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = WorldConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.invulnerability(), Duration::from_millis(3000));
        assert_eq!(cfg.pickup_respawn(), Duration::from_secs(10));
        assert_eq!(cfg.bot.fire_cooldown(), Duration::from_millis(200));
    }

    #[test]
    fn parse_partial_toml_keeps_defaults() {
        let cfg: WorldConfig = toml::from_str(
            r#"
            bots_enabled = false
            [bot]
            fire_range = 30.0
            "#,
        )
        .unwrap();
        assert!(!cfg.bots_enabled);
        assert_eq!(cfg.bot_count, 3);
        assert_eq!(cfg.bot.fire_range, 30.0);
        assert_eq!(cfg.bot.approach_distance, 40.0);
    }

    #[test]
    fn zero_tick_rejected_only_with_bots() {
        let mut cfg = WorldConfig {
            bot_tick_ms: 0,
            ..WorldConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(WorldError::InvalidConfig(_))));
        cfg.bots_enabled = false;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn inverted_accuracy_bounds_rejected() {
        let mut cfg = WorldConfig::default();
        cfg.bot.min_accuracy = 0.7;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_extent_rejected() {
        let cfg = WorldConfig {
            respawn_extent: -1.0,
            ..WorldConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_waypoint_reach_rejected() {
        let mut cfg = WorldConfig::default();
        cfg.bot.waypoint_reached = -1.0;
        let Err(WorldError::InvalidConfig(msg)) = cfg.validate() else {
            panic!("negative waypoint_reached accepted");
        };
        assert!(msg.contains("bot.waypoint_reached"));
    }

    #[test]
    fn negative_or_nan_speeds_rejected() {
        let mut cfg = WorldConfig::default();
        cfg.bot.patrol_speed = -0.1;
        assert!(cfg.validate().is_err());

        let mut cfg = WorldConfig::default();
        cfg.bot.approach_speed = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = WorldConfig::default();
        cfg.bot.retreat_speed = 0.0;
        cfg.bot.strafe_speed = 0.0;
        assert!(cfg.validate().is_ok());
    }
}
