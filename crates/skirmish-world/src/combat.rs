use skirmish_core::entity::EntityId;

use crate::world::World;
use crate::{DeathOutcome, HitOutcome, ScheduledTimer, ShotOutcome, Timer};

impl World {
    /// Resolve a shot fired by `shooter`, optionally reporting a victim.
    ///
    /// Returns `None` only when the shooter does not exist. Otherwise the shot
    /// counts as fired, and damage is applied when the victim exists, is not
    /// the shooter and is not invulnerable.
    pub fn resolve_shot(
        &mut self,
        shooter: EntityId,
        victim: Option<EntityId>,
    ) -> Option<ShotOutcome> {
        if !self.entities.contains_key(&shooter) {
            tracing::debug!(shooter, "shot from unknown entity ignored");
            return None;
        }
        let hit = victim.and_then(|victim| self.apply_hit(shooter, victim));
        Some(ShotOutcome { shooter, hit })
    }

    /// Damage `victim` on behalf of `shooter`. Shared by human and bot shots.
    ///
    /// A killing hit credits the shooter, then respawns the victim within the
    /// same call at full health, relocated and invulnerable, so no other
    /// operation can observe it dead.
    pub fn apply_hit(&mut self, shooter: EntityId, victim: EntityId) -> Option<HitOutcome> {
        if shooter == victim || !self.entities.contains_key(&shooter) {
            return None;
        }
        let damage = self.config.shot_damage;
        let target = self.entities.get_mut(&victim)?;
        if target.state.invulnerable {
            tracing::debug!(victim, "hit on invulnerable entity ignored");
            return None;
        }
        target.state.hp -= damage;
        if target.state.hp > 0 {
            return Some(HitOutcome {
                victim,
                damage,
                hp_after: target.state.hp,
                death: None,
            });
        }

        let respawn = self.random_point(self.config.respawn_extent);
        let max_hp = self.config.max_hp;
        let invulnerability = self.config.invulnerability();

        let killer = self.entities.get_mut(&shooter)?;
        killer.state.score = killer.state.score.saturating_add(1);
        let killer_name = killer.state.name.clone();
        let killer_score = killer.state.score;

        let target = self.entities.get_mut(&victim)?;
        target.state.hp = max_hp;
        target.state.x = respawn.x;
        target.state.y = respawn.y;
        target.state.z = respawn.z;
        target.state.invulnerable = true;
        let victim_name = target.state.name.clone();

        tracing::info!(
            killer = %killer_name,
            victim = %victim_name,
            score = killer_score,
            "kill"
        );

        Some(HitOutcome {
            victim,
            damage,
            hp_after: max_hp,
            death: Some(DeathOutcome {
                killer: shooter,
                killer_name,
                killer_score,
                victim,
                victim_name,
                respawn,
                clear_invulnerability: ScheduledTimer {
                    delay: invulnerability,
                    timer: Timer::ClearInvulnerability(victim),
                },
            }),
        })
    }
}
