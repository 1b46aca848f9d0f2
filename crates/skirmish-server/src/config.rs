use serde::Deserialize;

use skirmish_core::entity::{EntityId, EntityState, PlayerColor};
use skirmish_core::net::messages::{InitMsg, ServerMessage};
use skirmish_core::net::protocol::{MAX_MESSAGE_SIZE, encode_server_message};
use skirmish_world::world::MAX_NAME_LEN;
use skirmish_world::{World, WorldConfig};

use crate::error::ServerError;

/// Top-level server configuration, loaded from `skirmish.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    pub limits: LimitsConfig,
    pub world: WorldConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            web_root: "web".to_string(),
            limits: LimitsConfig::default(),
            world: WorldConfig::default(),
        }
    }
}

/// Infrastructure limits (connection caps, buffer sizes, rate limits).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    pub ws_rate_limit_per_sec: f64,
    /// Outbound messages queued per connection before new ones are dropped.
    pub player_message_buffer: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 200,
            ws_rate_limit_per_sec: 60.0,
            player_message_buffer: 256,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ServerError::Config(format!(
                "listen_addr {:?} is not a valid socket address",
                self.listen_addr
            )));
        }
        if self.limits.max_ws_connections == 0 {
            return Err(ServerError::Config(
                "limits.max_ws_connections must be > 0".into(),
            ));
        }
        if !(self.limits.ws_rate_limit_per_sec > 0.0) {
            return Err(ServerError::Config(
                "limits.ws_rate_limit_per_sec must be > 0".into(),
            ));
        }
        if self.limits.player_message_buffer == 0 {
            return Err(ServerError::Config(
                "limits.player_message_buffer must be > 0".into(),
            ));
        }
        self.world
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;
        self.check_init_fits()
    }

    /// A full server must still be able to send its snapshot to the last
    /// joiner in one frame.
    fn check_init_fits(&self) -> Result<(), ServerError> {
        let bots = if self.world.bots_enabled {
            self.world.bot_count as usize
        } else {
            0
        };
        let population = self.limits.max_ws_connections.saturating_add(bots);
        let too_many = || {
            ServerError::Config(format!(
                "limits.max_ws_connections {} plus {bots} bots cannot fit one init snapshot in {MAX_MESSAGE_SIZE} bytes",
                self.limits.max_ws_connections
            ))
        };
        if population > MAX_MESSAGE_SIZE {
            return Err(too_many());
        }

        let widest = EntityState {
            x: f32::MAX,
            y: f32::MAX,
            z: f32::MAX,
            ry: f32::MAX,
            hp: i32::MIN,
            score: u32::MAX,
            color: PlayerColor {
                r: u8::MAX,
                g: u8::MAX,
                b: u8::MAX,
            },
            name: std::iter::repeat_n(char::MAX, MAX_NAME_LEN).collect(),
            is_bot: false,
            invulnerable: false,
        };
        let players = (0..population as u64)
            .map(|i| (EntityId::MAX - i, widest.clone()))
            .collect();
        let init = ServerMessage::Init(Box::new(InitMsg {
            id: EntityId::MAX,
            players,
            pickups: World::with_seed(self.world.clone(), 0).visible_pickups(),
        }));
        encode_server_message(&init).map(|_| ()).map_err(|_| too_many())
    }

    /// Load config from `skirmish.toml` if it exists, then apply env var overrides.
    ///
    /// Without a `skirmish.toml` the world section comes from
    /// [`WorldConfig::load`].
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("skirmish.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from skirmish.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse skirmish.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No skirmish.toml found, using defaults");
                ServerConfig {
                    world: WorldConfig::load(),
                    ..ServerConfig::default()
                }
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(port) = var("PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            self.listen_addr = format!("0.0.0.0:{port}");
        }
        if let Some(addr) = var("SKIRMISH_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(root) = var("SKIRMISH_WEB_ROOT") {
            self.web_root = root;
        }

        // World overrides
        if let Some(val) = var("SKIRMISH_BOTS_ENABLED")
            && let Some(enabled) = parse_flag(&val)
        {
            self.world.bots_enabled = enabled;
        }
        if let Some(val) = var("SKIRMISH_BOT_COUNT")
            && let Ok(n) = val.parse::<u32>()
        {
            self.world.bot_count = n;
        }

        // Limits overrides
        if let Some(val) = var("SKIRMISH_MAX_WS_CONNECTIONS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.limits.max_ws_connections = n;
        }
        if let Some(val) = var("SKIRMISH_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            self.limits.ws_rate_limit_per_sec = n;
        }
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
