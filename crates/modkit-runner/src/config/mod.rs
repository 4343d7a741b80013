pub mod logging_config;
pub mod modkit_config;
pub mod scripting_config;

pub use logging_config::LoggingConfig;
pub use modkit_config::{ConfigError, ModkitConfig};
pub use scripting_config::ScriptingConfig;
