use std::any::Any;
use std::f32::consts::TAU;

use anyhow::Context;
use glam::Vec3;
use modkit_host::world::World;
use modkit_host::{EntityId, MiniScript, ScriptContext};
use rand::Rng;
use tracing::trace;

use crate::skip_gone;

/// Projectiles this close to the player get caught
const CAPTURE_RADIUS: f32 = 200.0;

/// Velocity multiplier applied once when a projectile is caught
const SLOWDOWN: f32 = 0.5;

const RETURN_FORCE: f32 = 2.0;

/// Radius of the random miss added to the return path
const AIM_SPREAD: f32 = 5.0;

/// Slows down incoming projectiles and throws them back at whoever fired them
#[derive(Default)]
pub struct MatrixMode {
    active: bool,
    /// Projectiles caught so far, in capture order
    tracked: Vec<EntityId>,
}

impl MatrixMode {
    pub fn tracked(&self) -> &[EntityId] {
        &self.tracked
    }

    /// Catch projectiles that entered range since the last frame
    fn capture(&mut self, world: &mut dyn World, center: Vec3) -> anyhow::Result<()> {
        for projectile in world.nearby_projectiles(center, CAPTURE_RADIUS) {
            if self.tracked.contains(&projectile) {
                continue;
            }
            self.tracked.push(projectile);

            if let Some(velocity) = world.velocity(projectile) {
                skip_gone(world.set_velocity(projectile, velocity * SLOWDOWN))
                    .with_context(|| format!("slowing projectile {}", projectile))?;
            }
        }
        Ok(())
    }

    /// Push every caught projectile back toward its owner, or stop it dead
    fn redirect(&mut self, world: &mut dyn World) -> anyhow::Result<()> {
        let mut rng = rand::thread_rng();

        for &projectile in &self.tracked {
            let Some(position) = world.position(projectile) else {
                continue;
            };

            let owner_position = world
                .projectile_owner(projectile)
                .and_then(|owner| world.position(owner));

            match owner_position {
                Some(owner_position) => {
                    let angle = rng.gen_range(0.0..TAU);
                    let miss = Vec3::new(angle.cos(), angle.sin(), 0.0) * AIM_SPREAD;
                    let away_from_owner = position - owner_position + miss;
                    skip_gone(world.apply_force(
                        projectile,
                        -RETURN_FORCE * away_from_owner,
                        Vec3::ZERO,
                    ))
                    .with_context(|| format!("returning projectile {}", projectile))?;
                }
                None => {
                    skip_gone(world.set_velocity(projectile, Vec3::ZERO))
                        .with_context(|| format!("stopping projectile {}", projectile))?;
                }
            }
        }
        Ok(())
    }
}

impl MiniScript for MatrixMode {
    fn id(&self) -> &'static str {
        "matrix_mode"
    }

    fn name(&self) -> &'static str {
        "Matrix Mode"
    }

    fn description(&self) -> &'static str {
        "Slows nearby projectiles and sends them back to their owner"
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

        self.capture(world, center)?;

        let before = self.tracked.len();
        self.tracked.retain(|p| world.exists(*p));
        if self.tracked.len() != before {
            trace!(target: "scripts", "Dropped {} stale projectile(s)", before - self.tracked.len());
        }

        self.redirect(world)
    }

    fn on_deactivate(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        self.tracked.clear();
        Ok(())
    }

    fn on_unload(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        self.tracked.clear();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
