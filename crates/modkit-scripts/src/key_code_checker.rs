use std::any::Any;
use std::time::Duration;

use modkit_host::{KeyCode, MiniScript, ScriptContext};

const DISPLAY_TIME: Duration = Duration::from_millis(3000);

/// Shows the name of every released key, for finding hotkey names
#[derive(Default)]
pub struct KeyCodeChecker {
    active: bool,
}

impl MiniScript for KeyCodeChecker {
    fn id(&self) -> &'static str {
        "key_code_checker"
    }

    fn name(&self) -> &'static str {
        "Key Code Checker"
    }

    fn description(&self) -> &'static str {
        "Displays the name of each key as it is released"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn accepts_input(&self, _key: &KeyCode) -> bool {
        true
    }

    fn on_input(&mut self, key: KeyCode, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        ctx.show_subtitle(&format!("Key pressed: {}", key), DISPLAY_TIME);
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
