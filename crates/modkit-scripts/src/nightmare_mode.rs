use std::any::Any;
use std::f32::consts::TAU;

use anyhow::Context;
use glam::Vec3;
use modkit_host::{KeyCode, MiniScript, ScriptContext, StepDirection, SteppedValue};

use crate::skip_gone;

const DEFAULT_RADIUS: f32 = 60.0;

/// Radians the torque direction turns each frame
const ANGLE_STEP: f32 = 0.1;

/// Peds hover between these heights above ground
const HOVER_MIN: f32 = 10.0;
const HOVER_MAX: f32 = 25.0;

const LIFT: f32 = 0.75;

/// Lifts nearby NPCs into the air and keeps them spinning there
pub struct NightmareMode {
    active: bool,
    angle: f32,
    radius: SteppedValue,
}

impl Default for NightmareMode {
    fn default() -> Self {
        Self {
            active: false,
            angle: 0.0,
            radius: SteppedValue::new(DEFAULT_RADIUS),
        }
    }
}

impl NightmareMode {
    pub fn radius(&self) -> f32 {
        self.radius.get()
    }

    fn rotation(&self) -> Vec3 {
        Vec3::new(self.angle.cos(), self.angle.sin(), 0.0)
    }
}

/// Vertical push that keeps a ped inside the hover band
fn lift_for_height(height: f32) -> Vec3 {
    if height < HOVER_MIN {
        Vec3::new(0.0, 0.0, LIFT)
    } else if height > HOVER_MAX {
        Vec3::new(0.0, 0.0, -LIFT)
    } else {
        Vec3::ZERO
    }
}

impl MiniScript for NightmareMode {
    fn id(&self) -> &'static str {
        "nightmare_mode"
    }

    fn name(&self) -> &'static str {
        "Nightmare Mode"
    }

    fn description(&self) -> &'static str {
        "Nearby NPCs float above the ground and spin"
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

        self.angle += ANGLE_STEP;
        if self.angle >= TAU {
            self.angle = 0.0;
        }
        let rotation = self.rotation();

        let world = ctx.world();
        let Some(center) = world.player_position() else {
            return Ok(());
        };

        for ped in world.nearby_peds(center, self.radius.get()) {
            if world.is_player(ped) {
                continue;
            }
            let Some(height) = world.height_above_ground(ped) else {
                continue;
            };

            skip_gone(world.apply_force(ped, lift_for_height(height), rotation))
                .with_context(|| format!("lifting {}", ped))?;
        }

        Ok(())
    }

    fn accepts_input(&self, key: &KeyCode) -> bool {
        StepDirection::from_bracket(key).is_some()
    }

    fn on_input(&mut self, key: KeyCode, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        if let Some(direction) = StepDirection::from_bracket(&key) {
            ctx.step_value(&mut self.radius, direction, "Radius");
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
