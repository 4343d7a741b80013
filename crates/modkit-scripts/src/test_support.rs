use std::any::Any;
use std::time::Duration;

use modkit_host::sandbox::{RecordingSink, SandboxWorld};
use modkit_host::{KeyCode, MiniScript, ScriptRunner};

pub const HOTKEY: KeyCode = KeyCode::F(1);

pub const FRAME: Duration = Duration::from_millis(16);

/// A runner holding a single script, bound to [`HOTKEY`], over a sandbox world
pub struct Harness {
    pub runner: ScriptRunner,
    pub world: SandboxWorld,
    pub sink: RecordingSink,
    id: &'static str,
}

impl Harness {
    pub fn new(script: impl MiniScript) -> Self {
        let id = script.id();
        let mut runner = ScriptRunner::new();
        runner.register(Box::new(script), Some(HOTKEY));

        Self {
            runner,
            world: SandboxWorld::new(),
            sink: RecordingSink::new(),
            id,
        }
    }

    /// Release the hotkey, returning the new active state
    pub fn toggle(&mut self) -> bool {
        self.key_up(HOTKEY);
        self.runner.is_active(self.id).unwrap_or(false)
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.runner.dispatch_key_up(key, &mut self.world, &mut self.sink);
        self.assert_healthy();
    }

    pub fn tick(&mut self) {
        self.advance(FRAME);
    }

    pub fn advance(&mut self, delta: Duration) {
        self.runner.dispatch_tick(delta, &mut self.world, &mut self.sink);
        self.assert_healthy();
    }

    pub fn unload(&mut self) {
        self.runner.unload_scripts(&mut self.world, &mut self.sink);
    }

    pub fn script<T: Any>(&mut self) -> &mut T {
        self.runner
            .script_mut::<T>(self.id)
            .expect("harness script has the requested type")
    }

    fn assert_healthy(&self) {
        if let Some(status) = self.runner.statuses().first() {
            assert!(!status.faulted, "script {} faulted", status.id);
        }
    }
}
