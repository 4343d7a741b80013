use std::time::Duration;

use crate::keyboard_events::{KeyCode, KeyEventKind, KeyboardEvent};

/// Events delivered by the scripting host to the loaded plugin
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A raw keyboard event from the host's input hook
    Keyboard(KeyboardEvent),
    /// One rendered frame elapsed
    Tick { delta: Duration },
    /// Request to rebuild all scripts from the current configuration
    ReloadScripts,
    /// The host is unloading the plugin
    Shutdown,
}

impl HostEvent {
    /// Key-down event for `key` with no modifiers
    pub fn key_down(key: KeyCode) -> Self {
        HostEvent::Keyboard(KeyboardEvent::key_press(key))
    }

    /// Key-up event for `key` with no modifiers
    pub fn key_up(key: KeyCode) -> Self {
        HostEvent::Keyboard(KeyboardEvent::key_release(key))
    }

    /// Frame tick of `millis` milliseconds
    pub fn tick_millis(millis: u64) -> Self {
        HostEvent::Tick {
            delta: Duration::from_millis(millis),
        }
    }

    /// The key this event carries, if it is a press or release
    pub fn key(&self) -> Option<(KeyCode, KeyEventKind)> {
        match self {
            HostEvent::Keyboard(event) => Some((event.key, event.kind)),
            _ => None,
        }
    }
}

/// Trait for anything that consumes host events (the plugin, test recorders, ...)
pub trait EventConsumer {
    /// Handle a single host event
    fn handle_event(&mut self, event: HostEvent);
}
