//! Host-facing event types for modkit
//!
//! This crate holds the input and frame event types that flow from the
//! scripting host into the plugin, so the host glue and the script runner can
//! share them without depending on each other.

pub mod host_events;
pub mod keyboard_events;

pub use host_events::{EventConsumer, HostEvent};
pub use keyboard_events::{KeyCode, KeyEventKind, KeyModifiers, KeyParseError, KeyboardEvent};
