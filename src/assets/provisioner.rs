//! Model asset provisioning
//!
//! Native inference code can only open models as regular files, but the
//! model ships inside the application bundle. The provisioner copies the
//! asset into the app's private cache directory the first time it is
//! needed and reuses that copy afterwards.
//!
//! # Flow
//! 1. `cache_dir/<name>` exists → return it (stat only)
//! 2. Otherwise open the asset stream, copy it chunk by chunk into a
//!    temporary file next to the destination
//! 3. Flush and rename the temporary file into place
//!
//! The rename means a failed copy never leaves a partial model behind
//! that a later call would mistake for a finished one.

use crate::assets::source::AssetSource;
use crate::assets::validate_logical_name;
use crate::config::{CoreConfig, DEFAULT_CHUNK_SIZE};
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// How a provisioning call obtained its file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisionOutcome {
    /// File was already in the cache directory
    AlreadyPresent,
    /// File was copied from the bundle by this call
    Copied { bytes: u64 },
}

/// A bundled asset materialized on writable storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedAsset {
    pub logical_name: String,
    pub resolved_path: PathBuf,
    pub outcome: ProvisionOutcome,
}

impl ProvisionedAsset {
    pub fn was_copied(&self) -> bool {
        matches!(self.outcome, ProvisionOutcome::Copied { .. })
    }

    /// Path as a host string
    pub fn path_string(&self) -> String {
        self.resolved_path.to_string_lossy().into_owned()
    }
}

/// Copies bundled assets into a cache directory on demand
pub struct AssetProvisioner<S> {
    source: S,
    cache_dir: PathBuf,
    chunk_size: usize,
}

impl<S: AssetSource> AssetProvisioner<S> {
    pub fn new(source: S, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            cache_dir: cache_dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn from_config(source: S, config: &CoreConfig) -> Self {
        Self::new(source, config.resolved_cache_dir()).with_chunk_size(config.chunk_size)
    }

    /// Set the copy buffer size (values below 1 are clamped to 1)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Deterministic cache location for `logical_name`
    pub fn cache_path(&self, logical_name: &str) -> PathBuf {
        self.cache_dir.join(logical_name)
    }

    /// Whether `logical_name` is already materialized (filesystem stat only)
    pub fn is_ready(&self, logical_name: &str) -> bool {
        validate_logical_name(logical_name).is_ok() && self.cache_path(logical_name).is_file()
    }

    /// Make sure `logical_name` exists in the cache directory
    ///
    /// # Errors
    /// - `AssetMissing` if the bundle has no such asset
    /// - `WriteFailure` if the destination cannot be created or written
    /// - `InvalidInput` if the name is not a plain file name
    pub fn ensure_available(&self, logical_name: &str) -> Result<ProvisionedAsset> {
        validate_logical_name(logical_name)?;
        let destination = self.cache_path(logical_name);

        if destination.is_file() {
            debug!("Asset already provisioned: {}", destination.display());
            return Ok(ProvisionedAsset {
                logical_name: logical_name.to_string(),
                resolved_path: destination,
                outcome: ProvisionOutcome::AlreadyPresent,
            });
        }

        info!("Extracting {} from assets...", logical_name);

        // Open the asset before touching the cache so a missing asset
        // leaves nothing behind.
        let mut reader = self.source.open(logical_name)?;

        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| BridgeError::write_failure(&self.cache_dir, e))?;

        let mut staging = tempfile::Builder::new()
            .prefix(&format!(".{logical_name}."))
            .suffix(".partial")
            .tempfile_in(&self.cache_dir)
            .map_err(|e| BridgeError::write_failure(&destination, e))?;

        let bytes = copy_in_chunks(&mut reader, staging.as_file_mut(), self.chunk_size, &destination)?;

        staging
            .as_file()
            .sync_all()
            .map_err(|e| BridgeError::write_failure(&destination, e))?;
        staging
            .persist(&destination)
            .map_err(|e| BridgeError::write_failure(&destination, e.error))?;

        info!("Model extracted to: {} ({} bytes)", destination.display(), bytes);

        Ok(ProvisionedAsset {
            logical_name: logical_name.to_string(),
            resolved_path: destination,
            outcome: ProvisionOutcome::Copied { bytes },
        })
    }

    /// Host-facing variant of [`ensure_available`](Self::ensure_available)
    ///
    /// Logs the failure and returns an empty string instead of an error.
    /// Callers must treat `""` as "not ready".
    pub fn provision_or_sentinel(&self, logical_name: &str) -> String {
        match self.ensure_available(logical_name) {
            Ok(asset) => asset.path_string(),
            Err(e) => {
                error!("Failed to extract {}: [{}] {}", logical_name, e.code(), e);
                String::new()
            }
        }
    }
}

/// Copy `reader` into `writer` using a buffer of `chunk_size` bytes
fn copy_in_chunks(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    chunk_size: usize,
    destination: &Path,
) -> Result<u64> {
    let mut buffer = vec![0u8; chunk_size];
    let mut total = 0u64;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BridgeError::Io(e)),
        };

        writer
            .write_all(&buffer[..read])
            .map_err(|e| BridgeError::write_failure(destination, e))?;
        total += read as u64;
    }

    writer
        .flush()
        .map_err(|e| BridgeError::write_failure(destination, e))?;
    Ok(total)
}
