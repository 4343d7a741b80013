//! Host runtime for modkit mini-scripts
//!
//! This crate owns the script registry and the dispatcher that routes the
//! host's key and frame events to each mini-script. Scripts implement
//! [`MiniScript`] and talk to the game only through [`ScriptContext`].

use std::any::Any;

pub mod context;
pub mod notification;
pub mod registry;
#[cfg(any(test, feature = "sandbox"))]
pub mod sandbox;
pub mod script_runner;
pub mod stepped_value;
pub mod timer;
pub mod world;

// Re-export commonly used types for script authors
pub use context::ScriptContext;
pub use modkit_events::KeyCode;
pub use notification::{NotificationHandle, NotificationSink, StatusNotifier};
pub use registry::{RunnerOptions, ScriptFactory, ScriptRegistry};
pub use script_runner::{ScriptRunner, ScriptStatus};
pub use stepped_value::{StepDirection, SteppedValue};
pub use timer::{TimerId, TimerManager};
pub use world::{EntityId, World, WorldError};

/// Trait that every mini-script implements.
///
/// All hooks default to no-ops. The runner calls `on_tick` every frame
/// whether or not the script is active, so tick work has to be guarded on
/// [`MiniScript::is_active`]. Toggling and the matching status notification
/// are done by the runner before `on_key_up` is called.
pub trait MiniScript: 'static {
    /// Unique identifier for this script (e.g., "follow_mode")
    fn id(&self) -> &'static str;

    /// Human-readable name, used in status notifications
    fn name(&self) -> &'static str;

    /// Description of what this script does
    fn description(&self) -> &'static str;

    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);

    /// Flip the active flag, returning the new state. No other side effects.
    fn toggle_active(&mut self) -> bool {
        let active = !self.is_active();
        self.set_active(active);
        active
    }

    /// Called once when the script is registered
    fn on_load(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when the plugin unloads; release anything the script tracks
    fn on_unload(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Hotkey pressed
    fn on_key_down(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Hotkey released, after the runner toggled the script
    fn on_key_up(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once per frame
    fn on_tick(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Cleanup when the script goes inactive (toggle or fault)
    fn on_deactivate(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether an active script wants key-ups for `key` besides its hotkey
    fn accepts_input(&self, _key: &KeyCode) -> bool {
        false
    }

    /// A secondary key accepted by [`MiniScript::accepts_input`] was released
    fn on_input(&mut self, _key: KeyCode, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Allow downcasting to concrete script type for state access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
