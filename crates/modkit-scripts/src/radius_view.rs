use std::any::Any;
use std::f32::consts::TAU;

use anyhow::Context;
use glam::Vec3;
use modkit_host::{KeyCode, MiniScript, ScriptContext, StepDirection, SteppedValue};

use crate::skip_gone;

const DEFAULT_RADIUS: f32 = 20.0;

/// Radians the target point advances each frame
const ANGLE_STEP: f32 = 0.05;

/// NPCs this close to the player are pulled toward the target point
const PULL_RANGE: f32 = 80.0;

const PULL_FORCE: f32 = 2.0;

/// Drags nearby NPCs toward a point circling the player at an adjustable radius
pub struct RadiusView {
    active: bool,
    angle: f32,
    radius: SteppedValue,
}

impl Default for RadiusView {
    fn default() -> Self {
        Self {
            active: false,
            angle: 0.0,
            radius: SteppedValue::new(DEFAULT_RADIUS),
        }
    }
}

impl RadiusView {
    pub fn radius(&self) -> f32 {
        self.radius.get()
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Point on the circle around `center` at the current angle
    pub fn target_point(&self, center: Vec3) -> Vec3 {
        center + self.radius.get() * Vec3::new(self.angle.cos(), self.angle.sin(), 0.0)
    }

    fn advance_angle(&mut self) {
        self.angle += ANGLE_STEP;
        if self.angle >= TAU {
            self.angle = 0.0;
        }
    }
}

impl MiniScript for RadiusView {
    fn id(&self) -> &'static str {
        "radius_view"
    }

    fn name(&self) -> &'static str {
        "Radius View"
    }

    fn description(&self) -> &'static str {
        "Pulls nearby NPCs toward a point circling the player"
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

        self.advance_angle();

        let world = ctx.world();
        let Some(center) = world.player_position() else {
            return Ok(());
        };
        let target = self.target_point(center);

        for ped in world.nearby_peds(center, PULL_RANGE) {
            if world.is_player(ped) {
                continue;
            }
            let Some(position) = world.position(ped) else {
                continue;
            };

            let pull = (target - position).normalize_or_zero() * PULL_FORCE;
            skip_gone(world.apply_force(ped, pull, Vec3::ZERO))
                .with_context(|| format!("pulling {}", ped))?;
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
