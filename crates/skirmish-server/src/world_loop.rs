use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::time::DelayQueue;

use skirmish_core::entity::{EntityId, PlayerColor};
use skirmish_core::net::messages::{
    InitMsg, KillFeedMsg, PickupCollectedMsg, PickupRespawnMsg, PlayerJoinedMsg, PlayerLeftMsg,
    PlayerMovedMsg, PlayerRespawnMsg, PlayerShotMsg, ServerMessage, TookDamageMsg,
    UpdateScoreMsg,
};
use skirmish_core::net::protocol::encode_server_message;
use skirmish_world::{
    DeathOutcome, PlayerMoved, ScheduledTimer, ShotOutcome, Timer, TimerOutcome, World,
    WorldConfig,
};

use crate::error::JoinError;

/// Commands sent from the WebSocket handlers to the world task.
#[derive(Debug)]
pub enum WorldCommand {
    Join {
        color: Option<PlayerColor>,
        name: Option<String>,
        /// Outbox for everything the world sends to this player.
        sender: mpsc::Sender<Bytes>,
        reply: oneshot::Sender<Result<EntityId, JoinError>>,
    },
    Move {
        id: EntityId,
        x: f32,
        y: f32,
        z: f32,
        ry: f32,
    },
    Shoot {
        id: EntityId,
        hit_id: Option<EntityId>,
    },
    CollectPickup {
        id: EntityId,
        pickup_id: String,
    },
    Leave {
        id: EntityId,
    },
    Stats {
        reply: oneshot::Sender<WorldStats>,
    },
    Stop,
}

/// Population counts reported by the world task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorldStats {
    pub players: usize,
    pub bots: usize,
}

pub struct WorldHandle {
    pub commands: mpsc::UnboundedSender<WorldCommand>,
    pub task: JoinHandle<()>,
}

/// Spawn the task that owns the world. It is the only writer.
pub fn spawn_world_loop(config: WorldConfig) -> WorldHandle {
    spawn_with_world(World::new(config))
}

/// Spawn the world task around an already built world (seeded in tests).
pub fn spawn_with_world(world: World) -> WorldHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_world_loop(world, cmd_rx));
    WorldHandle {
        commands: cmd_tx,
        task,
    }
}

/// Who receives an outbound message.
#[derive(Debug, Clone, Copy)]
enum Audience {
    All,
    AllExcept(EntityId),
    Only(EntityId),
}

impl Audience {
    fn includes(self, id: EntityId) -> bool {
        match self {
            Self::All => true,
            Self::AllExcept(skip) => id != skip,
            Self::Only(target) => id == target,
        }
    }
}

struct WorldLoop {
    world: World,
    outboxes: BTreeMap<EntityId, mpsc::Sender<Bytes>>,
    timers: DelayQueue<Timer>,
}

async fn run_world_loop(world: World, mut cmd_rx: mpsc::UnboundedReceiver<WorldCommand>) {
    let bots_active = world.config().bots_enabled && !world.bot_ids().is_empty();
    let period = world.config().bot_tick().max(Duration::from_millis(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut state = WorldLoop {
        world,
        outboxes: BTreeMap::new(),
        timers: DelayQueue::new(),
    };

    tracing::info!(bots = bots_active, "world loop started");

    loop {
        tokio::select! {
            biased;

            Some(expired) = state.timers.next(), if !state.timers.is_empty() => {
                state.fire_timer(expired.into_inner());
            },
            _ = interval.tick(), if bots_active => {
                state.tick_bots();
            },
            cmd = cmd_rx.recv() => match cmd {
                Some(WorldCommand::Stop) | None => break,
                Some(cmd) => state.handle(cmd),
            },
        }
    }

    tracing::info!("world loop stopped");
}

impl WorldLoop {
    fn handle(&mut self, cmd: WorldCommand) {
        match cmd {
            WorldCommand::Join {
                color,
                name,
                sender,
                reply,
            } => self.join(color, name, sender, reply),
            WorldCommand::Move { id, x, y, z, ry } => {
                if let Some(moved) = self.world.move_entity(id, x, y, z, ry) {
                    self.send(Audience::AllExcept(id), &moved_message(moved));
                }
            },
            WorldCommand::Shoot { id, hit_id } => {
                if let Some(shot) = self.world.resolve_shot(id, hit_id) {
                    self.publish_shot(shot);
                }
            },
            WorldCommand::CollectPickup { id, pickup_id } => {
                if self.world.entity(id).is_none() {
                    tracing::debug!(id, pickup = %pickup_id, "collect from unknown entity ignored");
                    return;
                }
                if let Some(collected) = self.world.collect(&pickup_id) {
                    tracing::debug!(id, pickup = %collected.id, "pickup collected");
                    self.send(
                        Audience::All,
                        &ServerMessage::PickupCollected(PickupCollectedMsg {
                            id: collected.id,
                        }),
                    );
                    self.schedule(collected.respawn);
                }
            },
            WorldCommand::Leave { id } => {
                self.outboxes.remove(&id);
                if self.world.leave(id) {
                    self.send(Audience::All, &ServerMessage::PlayerLeft(PlayerLeftMsg { id }));
                }
            },
            WorldCommand::Stats { reply } => {
                let stats = WorldStats {
                    players: self.world.human_count(),
                    bots: self.world.bot_ids().len(),
                };
                let _ = reply.send(stats);
            },
            WorldCommand::Stop => {},
        }
    }

    fn join(
        &mut self,
        color: Option<PlayerColor>,
        name: Option<String>,
        sender: mpsc::Sender<Bytes>,
        reply: oneshot::Sender<Result<EntityId, JoinError>>,
    ) {
        let id = self.world.alloc_entity_id();
        let data = match self.world.join(id, color, name) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(id, error = %e, "join rejected");
                let _ = reply.send(Err(e.into()));
                return;
            },
        };

        // Nobody hears about the player until its snapshot is deliverable.
        let init = ServerMessage::Init(Box::new(InitMsg {
            id,
            players: self.world.snapshot_all(),
            pickups: self.world.visible_pickups(),
        }));
        let init = match encode_server_message(&init) {
            Ok(data) => Bytes::from(data),
            Err(e) => {
                tracing::error!(id, error = %e, "init snapshot unencodable, rolling back join");
                self.world.leave(id);
                let _ = reply.send(Err(JoinError::Snapshot(e.to_string())));
                return;
            },
        };

        self.outboxes.insert(id, sender);
        self.deliver(Audience::Only(id), init);
        self.send(
            Audience::AllExcept(id),
            &ServerMessage::PlayerJoined(Box::new(PlayerJoinedMsg { id, data })),
        );

        // The connection went away while the join was queued.
        if reply.send(Ok(id)).is_err() {
            self.outboxes.remove(&id);
            if self.world.leave(id) {
                self.send(Audience::All, &ServerMessage::PlayerLeft(PlayerLeftMsg { id }));
            }
        }
    }

    fn tick_bots(&mut self) {
        let now = tokio::time::Instant::now().into_std();
        let report = self.world.tick_bots(now);
        for shot in report.shots {
            self.publish_shot(shot);
        }
        for moved in report.moves {
            self.send(Audience::All, &moved_message(moved));
        }
    }

    fn fire_timer(&mut self, timer: Timer) {
        match self.world.fire_timer(timer) {
            Some(TimerOutcome::PickupRespawned(id)) => {
                self.send(
                    Audience::All,
                    &ServerMessage::PickupRespawn(PickupRespawnMsg { id }),
                );
            },
            Some(TimerOutcome::InvulnerabilityCleared(id)) => {
                tracing::debug!(id, "invulnerability cleared");
            },
            None => {},
        }
    }

    fn publish_shot(&mut self, shot: ShotOutcome) {
        self.send(
            Audience::All,
            &ServerMessage::PlayerShot(PlayerShotMsg { id: shot.shooter }),
        );
        let Some(hit) = shot.hit else {
            return;
        };
        self.send(
            Audience::Only(hit.victim),
            &ServerMessage::TookDamage(TookDamageMsg { amount: hit.damage }),
        );
        if let Some(death) = hit.death {
            self.publish_death(death);
        }
    }

    fn publish_death(&mut self, death: DeathOutcome) {
        self.send(
            Audience::All,
            &ServerMessage::UpdateScore(UpdateScoreMsg {
                id: death.killer,
                score: death.killer_score,
            }),
        );
        self.send(
            Audience::All,
            &ServerMessage::KillFeed(KillFeedMsg {
                killer: death.killer_name,
                victim: death.victim_name,
            }),
        );
        self.send(
            Audience::All,
            &ServerMessage::PlayerRespawn(PlayerRespawnMsg {
                id: death.victim,
                x: death.respawn.x,
                y: death.respawn.y,
                z: death.respawn.z,
            }),
        );
        self.schedule(death.clear_invulnerability);
    }

    fn schedule(&mut self, scheduled: ScheduledTimer) {
        self.timers.insert(scheduled.timer, scheduled.delay);
    }

    /// Encode once and fan the bytes out to every matching outbox.
    fn send(&self, audience: Audience, msg: &ServerMessage) {
        if !self.outboxes.keys().any(|&id| audience.includes(id)) {
            return;
        }
        let data = match encode_server_message(msg) {
            Ok(data) => Bytes::from(data),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode server message");
                return;
            },
        };
        self.deliver(audience, data);
    }

    fn deliver(&self, audience: Audience, data: Bytes) {
        for (&id, outbox) in &self.outboxes {
            if !audience.includes(id) {
                continue;
            }
            match outbox.try_send(data.clone()) {
                Ok(()) => {},
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(id, "outbox full, dropping message");
                },
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(id, "outbox closed");
                },
            }
        }
    }
}

fn moved_message(moved: PlayerMoved) -> ServerMessage {
    ServerMessage::PlayerMoved(PlayerMovedMsg {
        id: moved.id,
        x: moved.x,
        y: moved.y,
        z: moved.z,
        ry: moved.ry,
    })
}
