//! Core configuration
//!
//! Hosts usually rely on the defaults (the bundled `RFB-320.mnn` model and
//! an 8 KiB copy buffer). The desktop CLI can load overrides from a JSON
//! file:
//!
//! ```json
//! {
//!   "model_name": "RFB-320.mnn",
//!   "chunk_size": 8192,
//!   "cache_dir": "/tmp/mnn-cache",
//!   "asset_dir": "./assets"
//! }
//! ```

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the face detection model shipped with the app
pub const DEFAULT_MODEL_NAME: &str = "RFB-320.mnn";

/// Copy buffer size used while extracting assets
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Logical name of the bundled model asset
    pub model_name: String,

    /// Bytes copied per read/write while provisioning
    pub chunk_size: usize,

    /// Cache directory override (platform default when absent)
    pub cache_dir: Option<PathBuf>,

    /// Directory holding bundled assets on desktop builds
    pub asset_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            cache_dir: None,
            asset_dir: None,
        }
    }
}

impl CoreConfig {
    /// Load configuration from a JSON file; missing fields keep defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let config: CoreConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(BridgeError::InvalidInput(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        crate::assets::validate_logical_name(&self.model_name)
    }

    /// Cache directory to provision into
    ///
    /// Falls back to `<system temp>/mnn-core` when no override is set.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("mnn-core"))
    }
}
