//! Bridge configuration.

use serde::{Deserialize, Serialize};

/// The default side-channel identifier, shared with the client mod.
pub const DEFAULT_CHANNEL: &str = "skillbridge:main";

/// Configuration for a bridge instance.
///
/// Supplied by the host at construction time; all fields have working
/// defaults so `BridgeConfig::default()` is a valid production setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// The named side channel used bidirectionally for all frames. Both
    /// ends must register the same name with the host messaging system.
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
        }
    }
}
