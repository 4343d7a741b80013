use std::collections::{HashMap, HashSet};
use std::time::Duration;

use modkit_events::KeyCode;
use tracing::{debug, info, warn};

use super::notification::DEFAULT_NOTIFICATION_TIMEOUT;
use super::script_runner::ScriptRunner;
use super::MiniScript;

/// Factory function type for creating script instances
pub type ScriptFactory = fn() -> Box<dyn MiniScript>;

/// A script known to the registry
#[derive(Clone)]
struct RegisteredScript {
    id: String,
    default_hotkey: Option<KeyCode>,
    factory: ScriptFactory,
}

/// How to build a runner out of the registry
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub notification_timeout: Duration,
    /// Hotkey overrides by script id. `None` leaves the script unbound.
    pub hotkey_overrides: HashMap<String, Option<KeyCode>>,
    /// Script ids that are not instantiated at all
    pub disabled: HashSet<String>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            notification_timeout: DEFAULT_NOTIFICATION_TIMEOUT,
            hotkey_overrides: HashMap::new(),
            disabled: HashSet::new(),
        }
    }
}

/// Registry of available scripts, kept in registration order
pub struct ScriptRegistry {
    scripts: Vec<RegisteredScript>,
}

impl ScriptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            scripts: Vec::new(),
        }
    }

    /// Register a script factory. Registering an id twice replaces the
    /// earlier entry but keeps its position.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        default_hotkey: Option<KeyCode>,
        factory: ScriptFactory,
    ) {
        let id = id.into();
        debug!(target: "scripting", "Registering script factory: {}", id);

        let entry = RegisteredScript {
            id,
            default_hotkey,
            factory,
        };

        match self.scripts.iter_mut().find(|s| s.id == entry.id) {
            Some(existing) => {
                warn!(target: "scripting", "Script {} registered twice, replacing", entry.id);
                *existing = entry;
            }
            None => self.scripts.push(entry),
        }
    }

    /// Instantiate every registered script that isn't disabled, binding each
    /// to its configured or default hotkey
    pub fn create_runner(&self, options: &RunnerOptions) -> ScriptRunner {
        let mut runner = ScriptRunner::new_with_notification_timeout(options.notification_timeout);

        for id in options.hotkey_overrides.keys().chain(options.disabled.iter()) {
            if !self.contains(id) {
                warn!(target: "scripting", "Unknown script ID in config: {}", id);
            }
        }

        for entry in &self.scripts {
            if options.disabled.contains(&entry.id) {
                info!(target: "scripting", "Script disabled by config: {}", entry.id);
                continue;
            }

            let hotkey = options
                .hotkey_overrides
                .get(&entry.id)
                .copied()
                .unwrap_or(entry.default_hotkey);

            let script = (entry.factory)();
            debug!(target: "scripting", "Creating script instance: {}", entry.id);
            runner.register(script, hotkey);
        }

        runner
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scripts.iter().any(|s| s.id == id)
    }

    /// Default hotkey of a registered script
    pub fn default_hotkey(&self, id: &str) -> Option<KeyCode> {
        self.scripts
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| s.default_hotkey)
    }

    /// Get the list of all registered script IDs, in registration order
    pub fn available_scripts(&self) -> Vec<&str> {
        self.scripts.iter().map(|s| s.id.as_str()).collect()
    }
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Macro to register multiple scripts with their default hotkeys
///
/// # Example
/// ```ignore
/// let mut registry = ScriptRegistry::new();
/// register_scripts!(registry,
///     NearbyFight => Some(KeyCode::NumPad(3)),
///     CarDance => None,
/// );
/// ```
#[macro_export]
macro_rules! register_scripts {
    ($registry:expr, $($script:ty => $hotkey:expr),+ $(,)?) => {
        $(
            $registry.register(
                <$script as $crate::MiniScript>::id(&<$script>::default()),
                $hotkey,
                || Box::new(<$script>::default()),
            );
        )+
    };
}
