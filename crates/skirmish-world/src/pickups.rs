use crate::world::World;
use crate::{PickupCollected, ScheduledTimer, Timer, TimerOutcome};

impl World {
    /// Hide a visible pickup and schedule its return.
    ///
    /// Unknown or already hidden pickups are a no-op.
    pub fn collect(&mut self, pickup_id: &str) -> Option<PickupCollected> {
        let delay = self.config.pickup_respawn();
        let Some(pickup) = self
            .pickups
            .iter_mut()
            .find(|p| p.id == pickup_id && p.visible)
        else {
            tracing::debug!(pickup_id, "collect ignored");
            return None;
        };
        pickup.visible = false;
        Some(PickupCollected {
            id: pickup.id.clone(),
            respawn: ScheduledTimer {
                delay,
                timer: Timer::RespawnPickup(pickup.id.clone()),
            },
        })
    }

    /// Apply a timer whose delay has elapsed.
    ///
    /// The subject is looked up again, so a timer outliving its entity does
    /// nothing.
    pub fn fire_timer(&mut self, timer: Timer) -> Option<TimerOutcome> {
        match timer {
            Timer::ClearInvulnerability(id) => {
                let entity = self.entities.get_mut(&id)?;
                if !entity.state.invulnerable {
                    return None;
                }
                entity.state.invulnerable = false;
                Some(TimerOutcome::InvulnerabilityCleared(id))
            },
            Timer::RespawnPickup(id) => {
                let pickup = self.pickups.iter_mut().find(|p| p.id == id)?;
                if pickup.visible {
                    return None;
                }
                pickup.visible = true;
                Some(TimerOutcome::PickupRespawned(id))
            },
        }
    }
}
