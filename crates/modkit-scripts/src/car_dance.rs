use std::any::Any;
use std::time::Duration;

use anyhow::Context;
use modkit_host::{MiniScript, ScriptContext, TimerId};
use tracing::debug;

use crate::skip_gone;

/// Time between door flaps
const FLAP_INTERVAL: Duration = Duration::from_millis(500);

/// Flaps the doors of the player's vehicle open and shut
#[derive(Default)]
pub struct CarDance {
    active: bool,
    timer: Option<TimerId>,
    doors_open: bool,
}

impl CarDance {
    pub fn doors_open(&self) -> bool {
        self.doors_open
    }
}

impl MiniScript for CarDance {
    fn id(&self) -> &'static str {
        "car_dance"
    }

    fn name(&self) -> &'static str {
        "Car Dance"
    }

    fn description(&self) -> &'static str {
        "Flaps the doors of the player's vehicle"
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

        let timer = match self.timer {
            Some(timer) => timer,
            None => {
                let timer = ctx.schedule_recurring(FLAP_INTERVAL, "car-dance");
                self.timer = Some(timer);
                timer
            }
        };

        if !ctx.check_timer(timer) {
            return Ok(());
        }

        let world = ctx.world();
        let Some(vehicle) = world.current_vehicle(world.player()) else {
            return Ok(());
        };

        self.doors_open = !self.doors_open;
        skip_gone(world.set_doors_open(vehicle, self.doors_open))
            .with_context(|| format!("flapping doors of {}", vehicle))?;

        Ok(())
    }

    fn on_deactivate(&mut self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        if let Some(timer) = self.timer.take() {
            ctx.cancel_timer(timer);
        }

        if self.doors_open {
            self.doors_open = false;
            let world = ctx.world();
            if let Some(vehicle) = world.current_vehicle(world.player()) {
                debug!(target: "scripts", "Shutting doors of {}", vehicle);
                skip_gone(world.set_doors_open(vehicle, false))?;
            }
        }

        Ok(())
    }

    fn on_unload(&mut self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        self.on_deactivate(ctx)
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
    use modkit_host::world::{VehicleClass, VehicleSeat};
    use modkit_host::World;

    fn seated_harness() -> (Harness, modkit_host::EntityId) {
        let mut h = Harness::new(CarDance::default());
        let vehicle = h.world.spawn_vehicle(Vec3::ZERO, VehicleClass::Car);
        let player = h.world.player();
        h.world.seat_ped(player, vehicle, VehicleSeat::Driver);
        (h, vehicle)
    }

    #[test]
    fn test_doors_flap_every_interval() {
        let (mut h, vehicle) = seated_harness();
        h.toggle();

        h.tick();
        h.advance(Duration::from_millis(500));
        assert!(h.world.entity(vehicle).unwrap().doors_open);

        h.advance(Duration::from_millis(250));
        assert!(h.world.entity(vehicle).unwrap().doors_open);

        h.advance(Duration::from_millis(250));
        assert!(!h.world.entity(vehicle).unwrap().doors_open);
    }

    #[test]
    fn test_toggle_off_shuts_doors_and_stops_timer() {
        let (mut h, vehicle) = seated_harness();
        h.toggle();
        h.tick();
        h.advance(Duration::from_millis(500));
        assert!(h.world.entity(vehicle).unwrap().doors_open);

        h.toggle();
        assert!(!h.world.entity(vehicle).unwrap().doors_open);

        h.advance(Duration::from_millis(2000));
        assert!(!h.world.entity(vehicle).unwrap().doors_open);
        assert!(h.script::<CarDance>().timer.is_none());
    }

    #[test]
    fn test_on_foot_does_nothing() {
        let mut h = Harness::new(CarDance::default());
        h.toggle();
        h.tick();
        h.advance(Duration::from_millis(500));
        assert!(!h.script::<CarDance>().doors_open());
    }
}
