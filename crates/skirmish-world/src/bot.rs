//! Bot AI: target selection, steering and line-of-sight gated firing.
//!
//! Every tick each bot either engages the nearest eligible human or patrols
//! between random waypoints. Engagement behaviour depends only on the current
//! distance to the target, so no sub-state is carried between ticks apart
//! from the patrol waypoint and the time of the last shot.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::time::Instant;

use rand::Rng;

use skirmish_core::entity::{EntityId, Vec3};

use crate::config::BotTuning;
use crate::world::{Entity, World};
use crate::{BotTickReport, PlayerMoved, ShotOutcome};

/// Wrap an angle into `(-PI, PI]`.
pub fn normalize_angle(angle: f32) -> f32 {
    let a = angle % TAU;
    if a > PI {
        a - TAU
    } else if a <= -PI {
        a + TAU
    } else {
        a
    }
}

/// Yaw that faces along `(dx, dz)`. Zero yaw looks down +z.
pub fn bearing(dx: f32, dz: f32) -> f32 {
    dx.atan2(dz)
}

/// Chance that a bot shot lands, falling with distance and aim error.
///
/// Always within `[min_accuracy, max_accuracy]`.
pub fn hit_probability(distance: f32, aim_error: f32, tuning: &BotTuning) -> f32 {
    let p = tuning.base_accuracy
        - (distance / 100.0) * tuning.distance_penalty
        - aim_error * tuning.aim_penalty;
    p.max(tuning.min_accuracy).min(tuning.max_accuracy)
}

/// A human a bot has locked onto this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: EntityId,
    pub position: Vec3,
    pub distance: f32,
}

/// Nearest living, vulnerable human to `origin`. Ties go to the lowest id.
pub fn select_target<'a>(
    bot_id: EntityId,
    origin: Vec3,
    entities: impl IntoIterator<Item = &'a Entity>,
) -> Option<Target> {
    entities
        .into_iter()
        .filter(|e| e.id != bot_id && !e.is_bot() && e.state.hp > 0 && !e.state.invulnerable)
        .map(|e| Target {
            id: e.id,
            position: e.position(),
            distance: origin.planar_distance(&e.position()),
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

impl World {
    /// Run one AI step for every bot, in id order.
    pub fn tick_bots(&mut self, now: Instant) -> BotTickReport {
        let mut report = BotTickReport::default();
        for id in self.bot_ids() {
            if let Some(shot) = self.tick_bot(id, now) {
                report.shots.push(shot);
            }
            if let Some(bot) = self.entities.get(&id) {
                report.moves.push(PlayerMoved {
                    id,
                    x: bot.state.x,
                    y: bot.state.y,
                    z: bot.state.z,
                    ry: bot.state.ry,
                });
            }
        }
        report
    }

    fn tick_bot(&mut self, id: EntityId, now: Instant) -> Option<ShotOutcome> {
        let origin = self.entities.get(&id)?.position();
        match select_target(id, origin, self.entities.values()) {
            Some(target) => self.engage(id, target, now),
            None => {
                self.patrol(id);
                None
            },
        }
    }

    fn engage(&mut self, id: EntityId, target: Target, now: Instant) -> Option<ShotOutcome> {
        let tuning = self.config.bot.clone();
        let d = target.distance;

        let bot = self.entities.get(&id)?;
        let dx = target.position.x - bot.state.x;
        let dz = target.position.z - bot.state.z;
        let aim_diff = normalize_angle(bearing(dx, dz) - bot.state.ry);
        let aim_error = aim_diff.abs();
        let ry = normalize_angle(bot.state.ry + aim_diff * tuning.turn_rate);

        let (step_x, step_z) = if d <= f32::EPSILON {
            (0.0, 0.0)
        } else if d > tuning.approach_distance {
            (dx / d * tuning.approach_speed, dz / d * tuning.approach_speed)
        } else if d < tuning.retreat_distance {
            (-dx / d * tuning.retreat_speed, -dz / d * tuning.retreat_speed)
        } else if d <= tuning.strafe_max_distance && self.chance(tuning.strafe_chance) {
            let side = if self.rng.random_bool(0.5) {
                FRAC_PI_2
            } else {
                -FRAC_PI_2
            };
            let angle = ry + side;
            (angle.sin() * tuning.strafe_speed, angle.cos() * tuning.strafe_speed)
        } else {
            (0.0, 0.0)
        };

        let bot = self.entities.get_mut(&id)?;
        bot.state.ry = ry;
        bot.state.x += step_x;
        bot.state.z += step_z;
        let (bx, bz) = (bot.state.x, bot.state.z);
        let cooled = bot
            .brain
            .as_ref()
            .and_then(|b| b.last_shot)
            .is_none_or(|last| now.duration_since(last) >= tuning.fire_cooldown());

        if d >= tuning.fire_range || aim_error >= tuning.aim_tolerance || !cooled {
            return None;
        }
        if !self
            .obstacles
            .is_clear(bx, bz, target.position.x, target.position.z)
        {
            tracing::trace!(bot = id, target = target.id, "line of sight blocked");
            return None;
        }
        if let Some(brain) = self.entities.get_mut(&id)?.brain.as_mut() {
            brain.last_shot = Some(now);
        }

        let p = hit_probability(d, aim_error, &tuning);
        let hit = if self.rng.random::<f32>() < p {
            self.apply_hit(id, target.id)
        } else {
            None
        };
        Some(ShotOutcome { shooter: id, hit })
    }

    fn patrol(&mut self, id: EntityId) {
        let tuning = &self.config.bot;
        let (extent, speed, reached, reroll) = (
            tuning.patrol_extent,
            tuning.patrol_speed,
            tuning.waypoint_reached,
            tuning.waypoint_reroll_chance,
        );

        let Some(current) = self
            .entities
            .get(&id)
            .and_then(|e| e.brain.as_ref())
            .map(|b| b.waypoint)
        else {
            return;
        };
        let waypoint = match current {
            Some(w) if !self.chance(reroll) => w,
            _ => (
                self.rng.random_range(-extent..=extent),
                self.rng.random_range(-extent..=extent),
            ),
        };

        let Some(bot) = self.entities.get_mut(&id) else {
            return;
        };
        let dx = waypoint.0 - bot.state.x;
        let dz = waypoint.1 - bot.state.z;
        let dist = (dx * dx + dz * dz).sqrt();
        let next = if dist > reached && dist > 0.0 {
            bot.state.x += dx / dist * speed;
            bot.state.z += dz / dist * speed;
            bot.state.ry = bearing(dx, dz);
            Some(waypoint)
        } else {
            None
        };
        if let Some(brain) = bot.brain.as_mut() {
            brain.waypoint = next;
        }
    }

    /// Bernoulli draw that tolerates out-of-range probabilities.
    fn chance(&mut self, p: f64) -> bool {
        p > 0.0 && self.rng.random::<f64>() < p
    }
}
