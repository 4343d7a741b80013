use std::any::Any;
use std::collections::VecDeque;

use anyhow::Context;
use modkit_host::world::{DrivingStyle, PedTask, Rgb, VehicleDrivingFlags, World};
use modkit_host::{EntityId, MiniScript, ScriptContext};
use tracing::{debug, info, warn};

use crate::skip_gone;

const SEARCH_RADIUS: f32 = 500.0;
const FOLLOW_SPEED: f32 = 80.0;
const FOLLOW_MIN_DISTANCE: f32 = 1.0;

/// Followers beyond this are released oldest first
const MAX_FOLLOWERS: usize = 1000;

/// Marker color on the front neon of every follower
const FOLLOWER_NEON: Rgb = Rgb::DARK_RED;

/// Every NPC driver around the player starts chasing the player's vehicle
#[derive(Default)]
pub struct FollowMode {
    active: bool,
    followers: VecDeque<EntityId>,
}

impl FollowMode {
    pub fn followers(&self) -> impl Iterator<Item = &EntityId> {
        self.followers.iter()
    }

    pub fn follower_count(&self) -> usize {
        self.followers.len()
    }

    /// Mark a driver and put it on the player's tail
    fn recruit(world: &mut dyn World, driver: EntityId, player: EntityId) -> anyhow::Result<()> {
        let Some(vehicle) = world.current_vehicle(driver) else {
            return Ok(());
        };

        skip_gone(world.set_neon(vehicle, Some(FOLLOWER_NEON)))
            .with_context(|| format!("marking vehicle {}", vehicle))?;
        skip_gone(world.assign_task(driver, PedTask::ClearAll))?;
        skip_gone(world.set_keep_task(driver, true))?;
        skip_gone(world.set_driving_style(
            driver,
            DrivingStyle::Custom(VehicleDrivingFlags::pursuit()),
        ))?;
        skip_gone(world.assign_task(
            driver,
            PedTask::VehicleFollow {
                vehicle,
                target: player,
                speed: FOLLOW_SPEED,
                flags: VehicleDrivingFlags::pursuit(),
                min_distance: FOLLOW_MIN_DISTANCE,
            },
        ))
        .with_context(|| format!("sending {} after the player", driver))?;

        Ok(())
    }

    /// Undo everything [`FollowMode::recruit`] changed
    fn release(world: &mut dyn World, ped: EntityId) -> anyhow::Result<()> {
        if !world.exists(ped) {
            return Ok(());
        }

        if let Some(vehicle) = world.current_vehicle(ped) {
            skip_gone(world.set_neon(vehicle, None))
                .with_context(|| format!("clearing neon on {}", vehicle))?;
        }
        skip_gone(world.set_driving_style(ped, DrivingStyle::Normal))?;
        skip_gone(world.set_keep_task(ped, false))?;
        skip_gone(world.assign_task(ped, PedTask::ClearAll))
            .with_context(|| format!("releasing {}", ped))?;

        Ok(())
    }

    /// Release every follower, carrying on past failures. Returns the first one.
    fn release_all(&mut self, world: &mut dyn World) -> anyhow::Result<()> {
        let count = self.followers.len();
        let mut first_error = None;
        for ped in self.followers.drain(..) {
            if let Err(e) = Self::release(world, ped) {
                warn!(target: "scripts", "Could not release {}: {:#}", ped, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        if count > 0 {
            info!(target: "scripts", "Released {} follower(s)", count);
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl MiniScript for FollowMode {
    fn id(&self) -> &'static str {
        "follow_mode"
    }

    fn name(&self) -> &'static str {
        "Follow Mode"
    }

    fn description(&self) -> &'static str {
        "NPC drivers near the player follow the player"
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
        let player = world.player();
        let Some(center) = world.position(player) else {
            return Ok(());
        };

        self.followers.retain(|&ped| world.exists(ped));

        for ped in world.nearby_peds(center, SEARCH_RADIUS) {
            if self.followers.contains(&ped) || !world.is_npc_driver(ped) {
                continue;
            }

            // Tracked first so a half-finished recruit is still released
            self.followers.push_back(ped);
            Self::recruit(world, ped, player)?;
            debug!(target: "scripts", "Driver {} is now following", ped);

            if self.followers.len() > MAX_FOLLOWERS {
                if let Some(oldest) = self.followers.pop_front() {
                    Self::release(world, oldest)?;
                }
            }
        }

        Ok(())
    }

    fn on_deactivate(&mut self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        self.release_all(ctx.world())
    }

    fn on_unload(&mut self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        self.release_all(ctx.world())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, HOTKEY};
    use glam::Vec3;
    use modkit_host::world::{VehicleClass, VehicleSeat};

    #[test]
    fn test_drivers_are_recruited() {
        let mut h = Harness::new(FollowMode::default());
        let (driver, vehicle) = h.world.spawn_driver(Vec3::new(100.0, 0.0, 0.0), VehicleClass::Car);
        let walker = h.world.spawn_ped(Vec3::new(5.0, 0.0, 0.0));
        let (far_driver, _) = h.world.spawn_driver(Vec3::new(900.0, 0.0, 0.0), VehicleClass::Car);

        h.toggle();
        h.tick();

        let player = h.world.player();
        let recruited = h.world.entity(driver).unwrap();
        assert!(recruited.keep_task);
        assert_eq!(recruited.tasks[0], PedTask::ClearAll);
        assert_eq!(
            recruited.last_task(),
            Some(&PedTask::VehicleFollow {
                vehicle,
                target: player,
                speed: 80.0,
                flags: VehicleDrivingFlags::pursuit(),
                min_distance: 1.0,
            })
        );
        assert_eq!(h.world.entity(vehicle).unwrap().neon, Some(Rgb::DARK_RED));

        assert!(h.world.entity(walker).unwrap().tasks.is_empty());
        assert!(h.world.entity(far_driver).unwrap().tasks.is_empty());
        assert_eq!(h.script::<FollowMode>().follower_count(), 1);
    }

    #[test]
    fn test_drivers_recruited_once() {
        let mut h = Harness::new(FollowMode::default());
        let (driver, _) = h.world.spawn_driver(Vec3::X, VehicleClass::Car);

        h.toggle();
        h.tick();
        h.tick();
        h.tick();

        assert_eq!(h.world.entity(driver).unwrap().tasks.len(), 2);
    }

    #[test]
    fn test_passengers_and_player_are_skipped() {
        let mut h = Harness::new(FollowMode::default());
        let vehicle = h.world.spawn_vehicle(Vec3::X, VehicleClass::Car);
        let passenger = h.world.spawn_ped(Vec3::X);
        h.world.seat_ped(passenger, vehicle, VehicleSeat::Passenger);
        let player = h.world.player();
        let own_car = h.world.spawn_vehicle(Vec3::ZERO, VehicleClass::Car);
        h.world.seat_ped(player, own_car, VehicleSeat::Driver);

        h.toggle();
        h.tick();

        assert_eq!(h.script::<FollowMode>().follower_count(), 0);
        assert!(h.world.entity(player).unwrap().tasks.is_empty());
    }

    #[test]
    fn test_toggle_off_restores_followers() {
        let mut h = Harness::new(FollowMode::default());
        let (driver, vehicle) = h.world.spawn_driver(Vec3::X, VehicleClass::Car);

        assert!(h.toggle());
        h.tick();
        assert!(!h.toggle());

        let released = h.world.entity(driver).unwrap();
        assert!(!released.keep_task);
        assert_eq!(released.driving_style, Some(DrivingStyle::Normal));
        assert_eq!(released.last_task(), Some(&PedTask::ClearAll));
        assert_eq!(h.world.entity(vehicle).unwrap().neon, None);
        assert_eq!(h.script::<FollowMode>().follower_count(), 0);
    }

    #[test]
    fn test_despawned_followers_are_dropped() {
        let mut h = Harness::new(FollowMode::default());
        let (a, _) = h.world.spawn_driver(Vec3::X, VehicleClass::Car);
        let (b, _) = h.world.spawn_driver(Vec3::Y, VehicleClass::Car);

        h.toggle();
        h.tick();
        h.world.despawn(a);
        h.tick();

        let followers: Vec<_> = h.script::<FollowMode>().followers().copied().collect();
        assert_eq!(followers, vec![b]);

        // Release skips the vanished ped without faulting
        h.toggle();
        assert_eq!(h.script::<FollowMode>().follower_count(), 0);
    }

    #[test]
    fn test_half_recruited_driver_is_restored() {
        let mut h = Harness::new(FollowMode::default());
        let (driver, vehicle) = h.world.spawn_driver(Vec3::X, VehicleClass::Car);
        // The vehicle gets its neon, then every change to the driver fails
        h.world.set_locked(driver, true);

        h.toggle();
        h.runner
            .dispatch_tick(crate::test_support::FRAME, &mut h.world, &mut h.sink);

        let status = h.runner.statuses().remove(0);
        assert!(status.faulted);
        assert!(!status.active);
        assert_eq!(h.world.entity(vehicle).unwrap().neon, None);
        assert_eq!(h.script::<FollowMode>().follower_count(), 0);
    }

    #[test]
    fn test_release_continues_past_failures() {
        let mut h = Harness::new(FollowMode::default());
        let (a, car_a) = h.world.spawn_driver(Vec3::X, VehicleClass::Car);
        let (b, car_b) = h.world.spawn_driver(Vec3::Y, VehicleClass::Car);

        h.toggle();
        h.tick();
        h.world.set_locked(a, true);
        h.runner.dispatch_key_up(HOTKEY, &mut h.world, &mut h.sink);

        assert_eq!(h.world.entity(car_a).unwrap().neon, None);
        assert_eq!(h.world.entity(car_b).unwrap().neon, None);
        assert!(!h.world.entity(b).unwrap().keep_task);
        assert_eq!(h.script::<FollowMode>().follower_count(), 0);
    }

    #[test]
    fn test_unload_restores_followers() {
        let mut h = Harness::new(FollowMode::default());
        let (driver, _) = h.world.spawn_driver(Vec3::X, VehicleClass::Car);

        h.toggle();
        h.tick();
        h.unload();

        assert!(!h.world.entity(driver).unwrap().keep_task);
    }

    #[test]
    fn test_follower_list_is_capped() {
        let mut world = modkit_host::sandbox::SandboxWorld::new();
        let mut script = FollowMode::default();
        let first = world.spawn_driver(Vec3::X, VehicleClass::Car).0;
        script.followers.push_back(first);
        for _ in 1..MAX_FOLLOWERS {
            script.followers.push_back(world.spawn_ped(Vec3::X));
        }
        let (newcomer, _) = world.spawn_driver(Vec3::Y, VehicleClass::Car);
        script.set_active(true);

        let mut sink = modkit_host::sandbox::RecordingSink::new();
        let mut timers = modkit_host::TimerManager::new();
        let mut ctx = ScriptContext::new(
            &mut world,
            &mut sink,
            &mut timers,
            std::time::Duration::ZERO,
        );
        script.on_tick(&mut ctx).unwrap();
        drop(ctx);

        assert_eq!(script.follower_count(), MAX_FOLLOWERS);
        assert_eq!(script.followers.back(), Some(&newcomer));
        assert!(!script.followers.contains(&first));
        assert_eq!(
            world.entity(first).unwrap().driving_style,
            Some(DrivingStyle::Normal)
        );
    }
}
