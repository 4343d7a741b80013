use std::any::Any;

use anyhow::Context;
use modkit_host::world::PedTask;
use modkit_host::{MiniScript, ScriptContext};

use crate::skip_gone;

/// Peds this close to the player are picked up every frame
const SEARCH_RADIUS: f32 = 20.0;

/// How far a picked-up ped looks for someone to fight
const FIGHT_RADIUS: f32 = 300.0;

/// Makes every NPC near the player start a fight
#[derive(Default)]
pub struct NearbyFight {
    active: bool,
}

impl MiniScript for NearbyFight {
    fn id(&self) -> &'static str {
        "nearby_fight"
    }

    fn name(&self) -> &'static str {
        "Fight!"
    }

    fn description(&self) -> &'static str {
        "NPCs near the player fight any hated target in range"
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

        for ped in world.nearby_peds(center, SEARCH_RADIUS) {
            if world.is_player(ped) {
                continue;
            }
            skip_gone(world.assign_task(
                ped,
                PedTask::FightHatedTargets {
                    radius: FIGHT_RADIUS,
                },
            ))
            .with_context(|| format!("assigning fight task to {}", ped))?;
        }

        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
