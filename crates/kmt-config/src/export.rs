//! Export defaults handed to the projector and the renderer.

use serde::{Deserialize, Serialize};

fn default_file_prefix() -> String {
    "KMT_requests".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Emit one row per item instead of one summary row per request.
    #[serde(default)]
    pub explode_items: bool,

    /// Prefix of rendered file names (`{prefix}_{area}_{date}.{ext}`).
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            explode_items: false,
            file_prefix: default_file_prefix(),
        }
    }
}
