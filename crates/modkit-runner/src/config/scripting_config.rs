use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptingConfig {
    /// Whether any script is loaded at all (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How long a toggle notification stays on screen (default: 3000ms)
    #[serde(default = "default_notification_timeout")]
    pub notification_timeout_ms: u64,

    /// Script IDs that are never instantiated
    #[serde(default)]
    pub disabled_scripts: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_notification_timeout() -> u64 {
    3000
}

impl Default for ScriptingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            notification_timeout_ms: 3000,
            disabled_scripts: Vec::new(),
        }
    }
}

impl ScriptingConfig {
    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }
}
