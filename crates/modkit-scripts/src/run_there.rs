use std::any::Any;

use anyhow::Context;
use modkit_host::world::PedTask;
use modkit_host::{KeyCode, MiniScript, ScriptContext, StepDirection, SteppedValue};
use tracing::info;

use crate::skip_gone;

/// NPCs this close to the player are sent
const PED_RADIUS: f32 = 100.0;

const DEFAULT_DISTANCE: f32 = 20.0;

/// Sends every nearby NPC running to a spot in front of the player
///
/// The hotkey still toggles: a press that activates the script sends the NPCs,
/// the next one only shows "Run There: Disabled". Sending again takes two
/// presses.
pub struct RunThere {
    active: bool,
    distance: SteppedValue,
}

impl Default for RunThere {
    fn default() -> Self {
        Self {
            active: false,
            distance: SteppedValue::new(DEFAULT_DISTANCE),
        }
    }
}

impl RunThere {
    pub fn distance(&self) -> f32 {
        self.distance.get()
    }

    fn send(&self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        let world = ctx.world();
        let player = world.player();
        let (Some(position), Some(forward)) = (world.position(player), world.forward_vector(player))
        else {
            return Ok(());
        };
        let target = position + forward * self.distance.get();

        let mut sent = 0;
        for ped in world.nearby_peds(position, PED_RADIUS) {
            if world.is_player(ped) {
                continue;
            }
            skip_gone(world.assign_task(ped, PedTask::ClearAllImmediately))?;
            skip_gone(world.assign_task(
                ped,
                PedTask::RunTo {
                    target,
                    ignore_paths: true,
                },
            ))
            .with_context(|| format!("sending {} to {}", ped, target))?;
            sent += 1;
        }

        info!(target: "scripts", "Sent {} ped(s) running to {}", sent, target);
        Ok(())
    }
}

impl MiniScript for RunThere {
    fn id(&self) -> &'static str {
        "run_there"
    }

    fn name(&self) -> &'static str {
        "Run There"
    }

    fn description(&self) -> &'static str {
        "Nearby NPCs run to a point in front of the player"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn on_key_up(&mut self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        if self.active {
            self.send(ctx)?;
        }
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
    fn test_activation_sends_nearby_npcs() {
        let mut h = Harness::new(RunThere::default());
        let near = h.world.spawn_ped(Vec3::new(-40.0, 0.0, 0.0));
        let far = h.world.spawn_ped(Vec3::new(150.0, 0.0, 0.0));

        h.toggle();

        assert_eq!(
            h.world.entity(near).unwrap().tasks,
            vec![
                PedTask::ClearAllImmediately,
                PedTask::RunTo {
                    target: Vec3::new(0.0, 20.0, 0.0),
                    ignore_paths: true,
                },
            ]
        );
        assert!(h.world.entity(far).unwrap().tasks.is_empty());
        let player = h.world.player();
        assert!(h.world.entity(player).unwrap().tasks.is_empty());
    }

    #[test]
    fn test_deactivation_sends_nobody() {
        let mut h = Harness::new(RunThere::default());
        let near = h.world.spawn_ped(Vec3::X);

        h.toggle();
        h.toggle();

        assert_eq!(h.world.entity(near).unwrap().tasks.len(), 2);
    }

    #[test]
    fn test_every_other_press_sends() {
        let mut h = Harness::new(RunThere::default());
        let near = h.world.spawn_ped(Vec3::X);

        assert!(h.toggle());
        assert!(!h.toggle());
        assert!(h.toggle());

        assert_eq!(h.world.entity(near).unwrap().tasks.len(), 4);
        assert_eq!(
            h.sink.shown_texts(),
            vec!["Run There: Active", "Run There: Disabled", "Run There: Active"]
        );
    }

    #[test]
    fn test_distance_follows_brackets() {
        let mut h = Harness::new(RunThere::default());
        let near = h.world.spawn_ped(Vec3::X);
        let player = h.world.player();
        h.world.set_forward(player, Vec3::X);

        h.toggle();
        h.key_up(KeyCode::Char(']'));
        assert_eq!(h.sink.last_subtitle(), Some("Distance: 25"));
        h.toggle();
        h.toggle();

        assert_eq!(
            h.world.entity(near).unwrap().last_task(),
            Some(&PedTask::RunTo {
                target: Vec3::new(25.0, 0.0, 0.0),
                ignore_paths: true,
            })
        );
    }
}
