use std::any::Any;

use anyhow::Context;
use modkit_host::world::{PedTask, VehicleClass, VehicleDrivingFlags, VehicleSeat, World};
use modkit_host::{EntityId, MiniScript, ScriptContext};
use rand::Rng;
use tracing::debug;

use crate::skip_gone;

const SEARCH_RADIUS: f32 = 400.0;
const CHASE_SPEED: f32 = 100.0;
const CHASE_MIN_DISTANCE: f32 = 1.0;

/// Chance per frame of reporting the pilot count
const REPORT_CHANCE: f64 = 0.01;

/// Sends every NPC helicopter pilot around the player after the next one,
/// forming a ring of chases
#[derive(Default)]
pub struct HelicopterBuddies {
    active: bool,
    pilots: Vec<EntityId>,
}

impl HelicopterBuddies {
    pub fn pilots(&self) -> &[EntityId] {
        &self.pilots
    }
}

/// Alive NPC in the pilot seat of a helicopter
fn is_heli_pilot(world: &dyn World, ped: EntityId) -> bool {
    !world.is_player(ped)
        && world.is_alive(ped)
        && world.seat(ped) == Some(VehicleSeat::Driver)
        && world
            .current_vehicle(ped)
            .and_then(|vehicle| world.vehicle_class(vehicle))
            == Some(VehicleClass::Helicopter)
}

impl MiniScript for HelicopterBuddies {
    fn id(&self) -> &'static str {
        "helicopter_buddies"
    }

    fn name(&self) -> &'static str {
        "Helicopter Buddies"
    }

    fn description(&self) -> &'static str {
        "Nearby helicopter pilots chase each other in a ring"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn on_tick(&mut self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }

        let world = ctx.world();
        let Some(center) = world.player_position() else {
            return Ok(());
        };

        // Dead, despawned, or out of the cockpit
        self.pilots.retain(|&pilot| is_heli_pilot(&*world, pilot));

        for ped in world.nearby_peds(center, SEARCH_RADIUS) {
            if !self.pilots.contains(&ped) && is_heli_pilot(&*world, ped) {
                debug!(target: "scripts", "Tracking helicopter pilot {}", ped);
                self.pilots.push(ped);
            }
        }

        if self.pilots.len() >= 2 {
            for (idx, &pilot) in self.pilots.iter().enumerate() {
                let target = self.pilots[(idx + 1) % self.pilots.len()];
                let Some(vehicle) = world.current_vehicle(pilot) else {
                    continue;
                };

                skip_gone(world.assign_task(
                    pilot,
                    PedTask::VehicleFollow {
                        vehicle,
                        target,
                        speed: CHASE_SPEED,
                        flags: VehicleDrivingFlags::pursuit(),
                        min_distance: CHASE_MIN_DISTANCE,
                    },
                ))
                .with_context(|| format!("sending {} after {}", pilot, target))?;
            }
        }

        if rand::thread_rng().gen_bool(REPORT_CHANCE) {
            let count = self.pilots.len();
            debug!(target: "scripts", "Helicopter pilots tracked: {}", count);
            ctx.debug_msg(format!("# Pilots : {}", count));
        }

        Ok(())
    }

    fn on_deactivate(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        self.pilots.clear();
        Ok(())
    }

    fn on_unload(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        self.pilots.clear();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;
    use glam::Vec3;

    fn follow_target(h: &Harness, pilot: EntityId) -> Option<EntityId> {
        match h.world.entity(pilot)?.last_task()? {
            PedTask::VehicleFollow { target, .. } => Some(*target),
            _ => None,
        }
    }

    #[test]
    fn test_pilots_chase_in_a_ring() {
        let mut h = Harness::new(HelicopterBuddies::default());
        let (a, _) = h.world.spawn_driver(Vec3::new(50.0, 0.0, 80.0), VehicleClass::Helicopter);
        let (b, _) = h.world.spawn_driver(Vec3::new(-50.0, 0.0, 80.0), VehicleClass::Helicopter);
        let (c, _) = h.world.spawn_driver(Vec3::new(0.0, 90.0, 80.0), VehicleClass::Helicopter);
        let (car_driver, _) = h.world.spawn_driver(Vec3::new(10.0, 0.0, 0.0), VehicleClass::Car);

        h.toggle();
        h.tick();

        assert_eq!(h.script::<HelicopterBuddies>().pilots(), &[a, b, c]);
        assert_eq!(follow_target(&h, a), Some(b));
        assert_eq!(follow_target(&h, b), Some(c));
        assert_eq!(follow_target(&h, c), Some(a));
        assert!(h.world.entity(car_driver).unwrap().tasks.is_empty());
    }

    #[test]
    fn test_follow_task_parameters() {
        let mut h = Harness::new(HelicopterBuddies::default());
        let (a, heli) = h.world.spawn_driver(Vec3::new(5.0, 0.0, 0.0), VehicleClass::Helicopter);
        let (b, _) = h.world.spawn_driver(Vec3::new(6.0, 0.0, 0.0), VehicleClass::Helicopter);

        h.toggle();
        h.tick();

        assert_eq!(
            h.world.entity(a).unwrap().last_task(),
            Some(&PedTask::VehicleFollow {
                vehicle: heli,
                target: b,
                speed: 100.0,
                flags: VehicleDrivingFlags::pursuit(),
                min_distance: 1.0,
            })
        );
    }

    #[test]
    fn test_dead_and_dismounted_pilots_are_dropped() {
        let mut h = Harness::new(HelicopterBuddies::default());
        let (a, _) = h.world.spawn_driver(Vec3::X, VehicleClass::Helicopter);
        let (b, _) = h.world.spawn_driver(Vec3::Y, VehicleClass::Helicopter);
        let (c, _) = h.world.spawn_driver(Vec3::Z, VehicleClass::Helicopter);

        h.toggle();
        h.tick();
        assert_eq!(h.script::<HelicopterBuddies>().pilots().len(), 3);

        h.world.kill(a);
        h.world.leave_vehicle(b);
        h.tick();
        assert_eq!(h.script::<HelicopterBuddies>().pilots(), &[c]);

        h.world.despawn(c);
        h.tick();
        assert!(h.script::<HelicopterBuddies>().pilots().is_empty());
    }

    #[test]
    fn test_toggle_off_forgets_pilots() {
        let mut h = Harness::new(HelicopterBuddies::default());
        h.world.spawn_driver(Vec3::X, VehicleClass::Helicopter);

        h.toggle();
        h.tick();
        assert_eq!(h.script::<HelicopterBuddies>().pilots().len(), 1);

        h.toggle();
        assert!(h.script::<HelicopterBuddies>().pilots().is_empty());
    }
}
