use std::any::Any;

use anyhow::Context;
use modkit_host::{KeyCode, MiniScript, ScriptContext, StepDirection, SteppedValue};
use tracing::info;

const DEFAULT_DISTANCE: f32 = 10.0;

/// Moves the player straight ahead by an adjustable distance
///
/// Like [`crate::RunThere`], only the press that activates the script
/// teleports; the next press just disables it.
pub struct PreciseTeleport {
    active: bool,
    distance: SteppedValue,
}

impl Default for PreciseTeleport {
    fn default() -> Self {
        Self {
            active: false,
            distance: SteppedValue::new(DEFAULT_DISTANCE),
        }
    }
}

impl PreciseTeleport {
    pub fn distance(&self) -> f32 {
        self.distance.get()
    }
}

impl MiniScript for PreciseTeleport {
    fn id(&self) -> &'static str {
        "precise_teleport"
    }

    fn name(&self) -> &'static str {
        "Precise Teleport"
    }

    fn description(&self) -> &'static str {
        "Teleports the player forward by a set distance"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn on_key_up(&mut self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }

        let world = ctx.world();
        let player = world.player();
        let (Some(position), Some(forward)) = (world.position(player), world.forward_vector(player))
        else {
            return Ok(());
        };

        let destination = position + forward * self.distance.get();
        world
            .set_position(player, destination)
            .context("teleporting the player")?;
        info!(target: "scripts", "Teleported player to {}", destination);

        Ok(())
    }

    fn accepts_input(&self, key: &KeyCode) -> bool {
        StepDirection::from_bracket(key).is_some()
    }

    fn on_input(&mut self, key: KeyCode, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        if let Some(direction) = StepDirection::from_bracket(&key) {
            ctx.step_value(&mut self.distance, direction, "Distance");
        }
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
    use modkit_host::World;

    #[test]
    fn test_teleports_forward_on_activation() {
        let mut h = Harness::new(PreciseTeleport::default());

        h.toggle();
        assert_eq!(h.world.player_position(), Some(Vec3::new(0.0, 10.0, 0.0)));

        // Toggling off leaves the player where they are
        h.toggle();
        assert_eq!(h.world.player_position(), Some(Vec3::new(0.0, 10.0, 0.0)));
    }

    #[test]
    fn test_distance_steps() {
        let mut h = Harness::new(PreciseTeleport::default());
        let player = h.world.player();
        h.world.set_forward(player, Vec3::NEG_X);

        h.toggle();
        h.key_up(KeyCode::Char('['));
        assert_eq!(h.script::<PreciseTeleport>().distance(), 5.0);
        h.toggle();
        h.toggle();

        assert_eq!(h.world.player_position(), Some(Vec3::new(-15.0, 0.0, 0.0)));
    }
}
