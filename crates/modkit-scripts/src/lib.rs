//! Built-in mini-scripts for modkit
//!
//! Each module holds one hotkey-toggled gameplay behavior. They only touch the
//! game through [`modkit_host::World`], so every script can be driven by the
//! sandbox world in tests.

pub mod car_dance;
pub mod follow_mode;
pub mod helicopter_buddies;
pub mod key_code_checker;
pub mod matrix_mode;
pub mod nearby_fight;
pub mod nightmare_mode;
pub mod precise_teleport;
pub mod radius_view;
pub mod run_there;

#[cfg(test)]
mod test_support;

use modkit_host::world::WorldResult;
use modkit_host::{register_scripts, KeyCode, ScriptRegistry, WorldError};
use tracing::trace;

pub use car_dance::CarDance;
pub use follow_mode::FollowMode;
pub use helicopter_buddies::HelicopterBuddies;
pub use key_code_checker::KeyCodeChecker;
pub use matrix_mode::MatrixMode;
pub use nearby_fight::NearbyFight;
pub use nightmare_mode::NightmareMode;
pub use precise_teleport::PreciseTeleport;
pub use radius_view::RadiusView;
pub use run_there::RunThere;

/// Register every built-in script with its default hotkey
pub fn register_default_scripts(registry: &mut ScriptRegistry) {
    register_scripts!(registry,
        NearbyFight => Some(KeyCode::NumPad(3)),
        MatrixMode => Some(KeyCode::NumPad(2)),
        RadiusView => Some(KeyCode::Char('0')),
        CarDance => None,
        HelicopterBuddies => Some(KeyCode::NumPad(1)),
        FollowMode => Some(KeyCode::Char('\\')),
        RunThere => Some(KeyCode::Char('\'')),
        NightmareMode => Some(KeyCode::Char('9')),
        PreciseTeleport => Some(KeyCode::Char('/')),
        KeyCodeChecker => Some(KeyCode::F(12)),
    );
}

/// Create a registry with all built-in scripts
pub fn create_registry() -> ScriptRegistry {
    let mut registry = ScriptRegistry::new();
    register_default_scripts(&mut registry);
    registry
}

/// An entity that vanished between query and mutation is skipped; other
/// world errors still propagate
pub(crate) fn skip_gone(result: WorldResult<()>) -> WorldResult<()> {
    match result {
        Err(WorldError::EntityGone(entity)) => {
            trace!(target: "scripts", "Entity {} vanished mid-frame", entity);
            Ok(())
        }
        other => other,
    }
}
