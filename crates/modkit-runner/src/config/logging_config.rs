use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to `<data_dir>/logs/<component>.log`
    #[serde(default)]
    pub file: bool,
}
