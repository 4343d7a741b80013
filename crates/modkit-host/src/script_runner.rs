use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use modkit_events::{HostEvent, KeyCode, KeyEventKind};
use tracing::{debug, error, info, warn};

use super::context::ScriptContext;
use super::notification::{NotificationSink, StatusNotifier, DEFAULT_NOTIFICATION_TIMEOUT};
use super::timer::TimerManager;
use super::world::World;
use super::MiniScript;

/// Hooks the runner can invoke, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    Load,
    Unload,
    KeyDown,
    KeyUp,
    Tick,
    Deactivate,
    Input,
}

impl Hook {
    fn as_str(&self) -> &'static str {
        match self {
            Hook::Load => "on_load",
            Hook::Unload => "on_unload",
            Hook::KeyDown => "on_key_down",
            Hook::KeyUp => "on_key_up",
            Hook::Tick => "on_tick",
            Hook::Deactivate => "on_deactivate",
            Hook::Input => "on_input",
        }
    }
}

/// A registered script and its binding
struct ScriptEntry {
    script: Box<dyn MiniScript>,
    hotkey: Option<KeyCode>,
    /// Set when a hook failed; cleared by the next hotkey toggle
    faulted: bool,
}

/// Snapshot of one registered script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStatus {
    pub id: &'static str,
    pub name: &'static str,
    pub hotkey: Option<KeyCode>,
    pub active: bool,
    pub faulted: bool,
}

/// Owns the mini-scripts and dispatches key and frame events to them.
///
/// Scripts run in registration order for every event. Each hook call is
/// isolated: an error or panic marks that script faulted, forces it inactive
/// and moves on to the next script.
pub struct ScriptRunner {
    /// All registered scripts, in registration order
    scripts: Vec<ScriptEntry>,
    /// Timer manager shared across all scripts
    timer_manager: TimerManager,
    /// Toggle notifications and their hide timers
    notifier: StatusNotifier,
}

impl ScriptRunner {
    /// Create a runner with the default notification timeout
    pub fn new() -> Self {
        Self::new_with_notification_timeout(DEFAULT_NOTIFICATION_TIMEOUT)
    }

    /// Create a runner whose toggle notifications hide after `timeout`
    pub fn new_with_notification_timeout(timeout: Duration) -> Self {
        Self {
            scripts: Vec::new(),
            timer_manager: TimerManager::new(),
            notifier: StatusNotifier::new(timeout),
        }
    }

    /// Register a script with an optional hotkey. Hotkeys may be shared.
    pub fn register(&mut self, mut script: Box<dyn MiniScript>, hotkey: Option<KeyCode>) {
        debug!(
            target: "scripting",
            "Registering script: {} ({}) on {}",
            script.name(),
            script.id(),
            hotkey.map(|k| k.to_string()).unwrap_or_else(|| "no hotkey".to_string())
        );

        let faulted = match run_isolated(|| script.on_load()) {
            Ok(()) => false,
            Err(message) => {
                error!(target: "scripting",
                    "Script {} ({}) failed in {}: {}",
                    script.name(),
                    script.id(),
                    Hook::Load.as_str(),
                    message
                );
                true
            }
        };

        self.scripts.push(ScriptEntry {
            script,
            hotkey,
            faulted,
        });
    }

    /// Get the number of registered scripts
    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    /// Get the IDs of all registered scripts, in registration order
    pub fn script_ids(&self) -> Vec<&str> {
        self.scripts.iter().map(|e| e.script.id()).collect()
    }

    /// Status of every registered script, in registration order
    pub fn statuses(&self) -> Vec<ScriptStatus> {
        self.scripts
            .iter()
            .map(|e| ScriptStatus {
                id: e.script.id(),
                name: e.script.name(),
                hotkey: e.hotkey,
                active: e.script.is_active(),
                faulted: e.faulted,
            })
            .collect()
    }

    /// Whether the first script with `id` is active
    pub fn is_active(&self, id: &str) -> Option<bool> {
        self.scripts
            .iter()
            .find(|e| e.script.id() == id)
            .map(|e| e.script.is_active())
    }

    /// Downcast the first script with `id` to its concrete type
    pub fn script_mut<T: Any>(&mut self, id: &str) -> Option<&mut T> {
        self.scripts
            .iter_mut()
            .find(|e| e.script.id() == id)
            .and_then(|e| e.script.as_any_mut().downcast_mut::<T>())
    }

    /// Number of toggle notifications still on screen
    pub fn pending_notifications(&self) -> usize {
        self.notifier.pending_count()
    }

    /// Route a host event to the matching dispatch method
    pub fn handle_event(
        &mut self,
        event: &HostEvent,
        world: &mut dyn World,
        sink: &mut dyn NotificationSink,
    ) {
        match event {
            HostEvent::Keyboard(keyboard) => match keyboard.kind {
                KeyEventKind::Press => self.dispatch_key_down(keyboard.key, world, sink),
                KeyEventKind::Release => self.dispatch_key_up(keyboard.key, world, sink),
                KeyEventKind::Repeat => {
                    debug!(target: "scripting", "Ignoring key repeat: {}", keyboard.key);
                }
            },
            HostEvent::Tick { delta } => self.dispatch_tick(*delta, world, sink),
            HostEvent::ReloadScripts | HostEvent::Shutdown => {
                // Lifecycle events are handled by whoever owns the runner
                debug!(target: "scripting", "Lifecycle event ignored by runner: {:?}", event);
            }
        }
    }

    /// Toggle every script bound to `key`, show its status, and run its
    /// key-up hook. Active scripts that accept `key` as a secondary input get
    /// `on_input` afterwards.
    pub fn dispatch_key_up(
        &mut self,
        key: KeyCode,
        world: &mut dyn World,
        sink: &mut dyn NotificationSink,
    ) {
        let Self {
            scripts,
            timer_manager,
            notifier,
        } = self;

        let mut matched = 0;

        for entry in scripts.iter_mut() {
            if entry.hotkey != Some(key) {
                continue;
            }
            matched += 1;

            if entry.faulted {
                info!(target: "scripting", "Clearing fault on {} ({})", entry.script.name(), entry.script.id());
                entry.faulted = false;
            }

            let active = entry.script.toggle_active();
            info!(target: "scripting",
                "{} ({}) is now {}",
                entry.script.name(),
                entry.script.id(),
                if active { "active" } else { "disabled" }
            );
            notifier.announce(sink, timer_manager, entry.script.name(), active);

            if !active
                && !call_hook(entry, Hook::Deactivate, world, sink, timer_manager, Duration::ZERO, |s, ctx| {
                    s.on_deactivate(ctx)
                })
            {
                fault(entry, world, sink, timer_manager, notifier);
                continue;
            }

            if !call_hook(entry, Hook::KeyUp, world, sink, timer_manager, Duration::ZERO, |s, ctx| {
                s.on_key_up(ctx)
            }) {
                fault(entry, world, sink, timer_manager, notifier);
            }
        }

        for entry in scripts.iter_mut() {
            if entry.hotkey == Some(key)
                || entry.faulted
                || !entry.script.is_active()
                || !entry.script.accepts_input(&key)
            {
                continue;
            }
            matched += 1;

            if !call_hook(entry, Hook::Input, world, sink, timer_manager, Duration::ZERO, |s, ctx| {
                s.on_input(key, ctx)
            }) {
                fault(entry, world, sink, timer_manager, notifier);
            }
        }

        if matched == 0 {
            debug!(target: "scripting", "No script bound to {}", key);
        }
    }

    /// Run the key-down hook of every script bound to `key`
    pub fn dispatch_key_down(
        &mut self,
        key: KeyCode,
        world: &mut dyn World,
        sink: &mut dyn NotificationSink,
    ) {
        let Self {
            scripts,
            timer_manager,
            notifier,
        } = self;

        for entry in scripts.iter_mut() {
            if entry.hotkey != Some(key) || entry.faulted {
                continue;
            }

            if !call_hook(entry, Hook::KeyDown, world, sink, timer_manager, Duration::ZERO, |s, ctx| {
                s.on_key_down(ctx)
            }) {
                fault(entry, world, sink, timer_manager, notifier);
            }
        }
    }

    /// Advance the frame clock, hide expired notifications, then tick every
    /// script in registration order
    pub fn dispatch_tick(
        &mut self,
        delta: Duration,
        world: &mut dyn World,
        sink: &mut dyn NotificationSink,
    ) {
        let Self {
            scripts,
            timer_manager,
            notifier,
        } = self;

        // Tick timers FIRST so scripts can detect fired timers
        for (id, name) in timer_manager.advance(delta) {
            if !notifier.on_timer_fired(sink, id) {
                debug!(target: "scripting", "Timer fired: {} ({:?})", name, id);
            }
        }

        for entry in scripts.iter_mut() {
            if entry.faulted {
                continue;
            }

            if !call_hook(entry, Hook::Tick, world, sink, timer_manager, delta, |s, ctx| {
                s.on_tick(ctx)
            }) {
                fault(entry, world, sink, timer_manager, notifier);
            }
        }
    }

    /// Unload all scripts
    ///
    /// Calls `on_unload` on every script so it can release tracked entities,
    /// hides any notification still on screen, and drops the scripts.
    pub fn unload_scripts(&mut self, world: &mut dyn World, sink: &mut dyn NotificationSink) {
        let count = self.scripts.len();

        if count == 0 {
            return;
        }

        debug!(target: "scripting", "Unloading {} script(s)", count);

        let Self {
            scripts,
            timer_manager,
            notifier,
        } = self;

        for entry in scripts.iter_mut() {
            debug!(target: "scripting", "Calling on_unload for: {} ({})", entry.script.name(), entry.script.id());
            call_hook(entry, Hook::Unload, world, sink, timer_manager, Duration::ZERO, |s, ctx| {
                s.on_unload(ctx)
            });
            entry.script.set_active(false);
        }

        notifier.clear(sink, timer_manager);
        scripts.clear();
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Call one hook of one script with a fresh context. Returns false if the hook
/// returned an error or panicked.
fn call_hook(
    entry: &mut ScriptEntry,
    hook: Hook,
    world: &mut dyn World,
    sink: &mut dyn NotificationSink,
    timers: &mut TimerManager,
    delta: Duration,
    f: impl FnOnce(&mut dyn MiniScript, &mut ScriptContext<'_>) -> anyhow::Result<()>,
) -> bool {
    let mut ctx = ScriptContext::new(world, sink, timers, delta);
    let script = entry.script.as_mut();

    match run_isolated(|| f(script, &mut ctx)) {
        Ok(()) => true,
        Err(message) => {
            error!(target: "scripting",
                "Script {} ({}) failed in {}: {}",
                entry.script.name(),
                entry.script.id(),
                hook.as_str(),
                message
            );
            false
        }
    }
}

/// Mark a script faulted and force it inactive until its hotkey toggles it again.
/// An active script gets its "Disabled" notification like a manual toggle.
fn fault(
    entry: &mut ScriptEntry,
    world: &mut dyn World,
    sink: &mut dyn NotificationSink,
    timers: &mut TimerManager,
    notifier: &mut StatusNotifier,
) {
    entry.faulted = true;

    if entry.script.is_active() {
        entry.script.set_active(false);
        notifier.announce(sink, timers, entry.script.name(), false);
        // Failures during cleanup are only logged
        call_hook(entry, Hook::Deactivate, world, sink, timers, Duration::ZERO, |s, ctx| {
            s.on_deactivate(ctx)
        });
    }

    warn!(target: "scripting",
        "Script {} ({}) disabled until toggled again",
        entry.script.name(),
        entry.script.id()
    );
}

/// Run a hook, turning both errors and panics into a message
fn run_isolated(f: impl FnOnce() -> anyhow::Result<()>) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{:#}", e)),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{RecordingSink, SandboxWorld};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Script that records every hook call into a shared log
    struct Recorder {
        id: &'static str,
        active: bool,
        log: Log,
        fail_tick: bool,
        panic_tick: bool,
        fail_up: bool,
    }

    impl Recorder {
        fn new(id: &'static str, log: &Log) -> Self {
            Self {
                id,
                active: false,
                log: log.clone(),
                fail_tick: false,
                panic_tick: false,
                fail_up: false,
            }
        }

        fn record(&self, hook: &str) {
            self.log.borrow_mut().push(format!("{}:{}", self.id, hook));
        }
    }

    impl MiniScript for Recorder {
        fn id(&self) -> &'static str {
            self.id
        }

        fn name(&self) -> &'static str {
            self.id
        }

        fn description(&self) -> &'static str {
            "records hook calls"
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn set_active(&mut self, active: bool) {
            self.active = active;
        }

        fn on_key_down(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
            self.record("down");
            Ok(())
        }

        fn on_key_up(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
            self.record("up");
            if self.fail_up {
                anyhow::bail!("key-up failure");
            }
            Ok(())
        }

        fn on_tick(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
            self.record("tick");
            if self.panic_tick {
                panic!("tick panic");
            }
            if self.fail_tick {
                anyhow::bail!("tick failure");
            }
            Ok(())
        }

        fn on_deactivate(&mut self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
            self.record("deactivate");
            Ok(())
        }

        fn accepts_input(&self, key: &KeyCode) -> bool {
            *key == KeyCode::Char(']')
        }

        fn on_input(&mut self, key: KeyCode, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
            self.record(&format!("input {}", key));
            Ok(())
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn setup() -> (ScriptRunner, SandboxWorld, RecordingSink, Log) {
        (
            ScriptRunner::new(),
            SandboxWorld::new(),
            RecordingSink::new(),
            Rc::new(RefCell::new(Vec::new())),
        )
    }

    #[test]
    fn test_key_up_toggles_and_notifies() {
        let (mut runner, mut world, mut sink, log) = setup();
        runner.register(Box::new(Recorder::new("a", &log)), Some(KeyCode::NumPad(3)));

        runner.dispatch_key_up(KeyCode::NumPad(3), &mut world, &mut sink);
        assert_eq!(runner.is_active("a"), Some(true));
        assert_eq!(sink.shown_texts(), vec!["a: Active"]);

        runner.dispatch_key_up(KeyCode::NumPad(3), &mut world, &mut sink);
        assert_eq!(runner.is_active("a"), Some(false));
        assert_eq!(sink.shown_texts(), vec!["a: Active", "a: Disabled"]);
        assert_eq!(*log.borrow(), vec!["a:up", "a:deactivate", "a:up"]);
    }

    #[test]
    fn test_shared_hotkey_fans_out_in_order() {
        let (mut runner, mut world, mut sink, log) = setup();
        runner.register(Box::new(Recorder::new("first", &log)), Some(KeyCode::Char('\\')));
        runner.register(Box::new(Recorder::new("other", &log)), Some(KeyCode::F(1)));
        runner.register(Box::new(Recorder::new("second", &log)), Some(KeyCode::Char('\\')));

        runner.dispatch_key_up(KeyCode::Char('\\'), &mut world, &mut sink);

        assert_eq!(sink.shown_texts(), vec!["first: Active", "second: Active"]);
        assert_eq!(runner.is_active("other"), Some(false));
        assert_eq!(*log.borrow(), vec!["first:up", "second:up"]);
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let (mut runner, mut world, mut sink, log) = setup();
        runner.register(Box::new(Recorder::new("a", &log)), Some(KeyCode::NumPad(1)));

        runner.dispatch_key_up(KeyCode::Char('z'), &mut world, &mut sink);
        runner.dispatch_key_down(KeyCode::Char('z'), &mut world, &mut sink);

        assert!(log.borrow().is_empty());
        assert!(sink.shown_texts().is_empty());
    }

    #[test]
    fn test_key_down_does_not_toggle() {
        let (mut runner, mut world, mut sink, log) = setup();
        runner.register(Box::new(Recorder::new("a", &log)), Some(KeyCode::NumPad(1)));

        runner.dispatch_key_down(KeyCode::NumPad(1), &mut world, &mut sink);

        assert_eq!(runner.is_active("a"), Some(false));
        assert!(sink.shown_texts().is_empty());
        assert_eq!(*log.borrow(), vec!["a:down"]);
    }

    #[test]
    fn test_tick_runs_every_script_in_order() {
        let (mut runner, mut world, mut sink, log) = setup();
        runner.register(Box::new(Recorder::new("a", &log)), Some(KeyCode::NumPad(1)));
        runner.register(Box::new(Recorder::new("b", &log)), None);
        runner.register(Box::new(Recorder::new("c", &log)), None);

        runner.dispatch_key_up(KeyCode::NumPad(1), &mut world, &mut sink);
        log.borrow_mut().clear();

        runner.dispatch_tick(Duration::from_millis(16), &mut world, &mut sink);
        assert_eq!(*log.borrow(), vec!["a:tick", "b:tick", "c:tick"]);
    }

    #[test]
    fn test_failing_tick_is_isolated() {
        let (mut runner, mut world, mut sink, log) = setup();
        let mut failing = Recorder::new("bad", &log);
        failing.fail_tick = true;
        failing.active = true;
        runner.register(Box::new(failing), Some(KeyCode::NumPad(2)));
        runner.register(Box::new(Recorder::new("good", &log)), None);

        runner.dispatch_tick(Duration::from_millis(16), &mut world, &mut sink);
        assert_eq!(*log.borrow(), vec!["bad:tick", "bad:deactivate", "good:tick"]);

        let bad = &runner.statuses()[0];
        assert!(bad.faulted);
        assert!(!bad.active);

        // Faulted scripts sit out until toggled again
        log.borrow_mut().clear();
        runner.dispatch_tick(Duration::from_millis(16), &mut world, &mut sink);
        assert_eq!(*log.borrow(), vec!["good:tick"]);

        runner.dispatch_key_up(KeyCode::NumPad(2), &mut world, &mut sink);
        let bad = &runner.statuses()[0];
        assert!(!bad.faulted);
        assert!(bad.active);
    }

    #[test]
    fn test_fault_after_toggle_announces_disabled() {
        let (mut runner, mut world, mut sink, log) = setup();
        let mut failing = Recorder::new("a", &log);
        failing.fail_up = true;
        runner.register(Box::new(failing), Some(KeyCode::NumPad(5)));

        runner.dispatch_key_up(KeyCode::NumPad(5), &mut world, &mut sink);

        assert_eq!(runner.is_active("a"), Some(false));
        assert!(runner.statuses()[0].faulted);
        assert_eq!(sink.shown_texts(), vec!["a: Active", "a: Disabled"]);
        assert_eq!(*log.borrow(), vec!["a:up", "a:deactivate"]);

        // Both notifications still hide on schedule
        runner.dispatch_tick(DEFAULT_NOTIFICATION_TIMEOUT, &mut world, &mut sink);
        assert!(sink.visible().is_empty());
    }

    #[test]
    fn test_fault_while_inactive_stays_quiet() {
        let (mut runner, mut world, mut sink, log) = setup();
        let mut failing = Recorder::new("idle", &log);
        failing.fail_tick = true;
        runner.register(Box::new(failing), None);

        runner.dispatch_tick(Duration::from_millis(16), &mut world, &mut sink);

        assert!(runner.statuses()[0].faulted);
        assert!(sink.shown_texts().is_empty());
    }

    #[test]
    fn test_panicking_tick_is_isolated() {
        let (mut runner, mut world, mut sink, log) = setup();
        let mut panicking = Recorder::new("boom", &log);
        panicking.panic_tick = true;
        runner.register(Box::new(panicking), None);
        runner.register(Box::new(Recorder::new("after", &log)), None);

        runner.dispatch_tick(Duration::from_millis(16), &mut world, &mut sink);

        assert_eq!(*log.borrow(), vec!["boom:tick", "after:tick"]);
        assert!(runner.statuses()[0].faulted);
    }

    #[test]
    fn test_secondary_input_only_reaches_active_scripts() {
        let (mut runner, mut world, mut sink, log) = setup();
        runner.register(Box::new(Recorder::new("on", &log)), Some(KeyCode::NumPad(1)));
        runner.register(Box::new(Recorder::new("off", &log)), Some(KeyCode::NumPad(2)));

        runner.dispatch_key_up(KeyCode::NumPad(1), &mut world, &mut sink);
        log.borrow_mut().clear();

        runner.dispatch_key_up(KeyCode::Char(']'), &mut world, &mut sink);
        assert_eq!(*log.borrow(), vec!["on:input ]"]);
        // No toggle notification for secondary inputs
        assert_eq!(sink.shown_texts(), vec!["on: Active"]);
    }

    #[test]
    fn test_notifications_hide_after_timeout() {
        let (_, mut world, mut sink, log) = setup();
        let mut runner = ScriptRunner::new_with_notification_timeout(Duration::from_millis(100));
        runner.register(Box::new(Recorder::new("a", &log)), Some(KeyCode::NumPad(1)));

        runner.dispatch_key_up(KeyCode::NumPad(1), &mut world, &mut sink);
        assert_eq!(sink.visible().len(), 1);
        assert_eq!(runner.pending_notifications(), 1);

        runner.dispatch_tick(Duration::from_millis(60), &mut world, &mut sink);
        assert_eq!(sink.visible().len(), 1);

        runner.dispatch_tick(Duration::from_millis(60), &mut world, &mut sink);
        assert!(sink.visible().is_empty());
        assert_eq!(runner.pending_notifications(), 0);
    }

    #[test]
    fn test_handle_event_routes_kinds() {
        let (mut runner, mut world, mut sink, log) = setup();
        runner.register(Box::new(Recorder::new("a", &log)), Some(KeyCode::NumPad(1)));

        runner.handle_event(&HostEvent::key_down(KeyCode::NumPad(1)), &mut world, &mut sink);
        runner.handle_event(&HostEvent::key_up(KeyCode::NumPad(1)), &mut world, &mut sink);
        runner.handle_event(&HostEvent::tick_millis(16), &mut world, &mut sink);

        assert_eq!(*log.borrow(), vec!["a:down", "a:up", "a:tick"]);
    }

    #[test]
    fn test_unload_clears_scripts_and_notifications() {
        let (mut runner, mut world, mut sink, log) = setup();
        runner.register(Box::new(Recorder::new("a", &log)), Some(KeyCode::NumPad(1)));
        runner.dispatch_key_up(KeyCode::NumPad(1), &mut world, &mut sink);

        runner.unload_scripts(&mut world, &mut sink);

        assert_eq!(runner.script_count(), 0);
        assert!(sink.visible().is_empty());
    }

    #[test]
    fn test_script_mut_downcasts() {
        let (mut runner, _, _, log) = setup();
        runner.register(Box::new(Recorder::new("a", &log)), None);

        let recorder = runner.script_mut::<Recorder>("a").unwrap();
        recorder.active = true;
        assert_eq!(runner.is_active("a"), Some(true));
    }
}
