pub mod config;
pub mod logging;
mod plugin_host;

pub use config::{ConfigError, LoggingConfig, ModkitConfig, ScriptingConfig};
pub use logging::init_logging;
pub use plugin_host::ModHost;
