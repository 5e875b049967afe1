//! Error types for provisioning and bridge calls
//!
//! Every failure that crosses the native boundary is classified into one of
//! a small set of machine-readable codes. Hosts never need to inspect a
//! Rust error type: they receive a [`BridgeFailure`] (`code`, `message`).
//!
//! # Codes
//! - `ASSET_MISSING` - bundled asset absent from the package
//! - `WRITE_FAILURE` - cache destination could not be created or written
//! - `NOT_CONFIGURED` - model path or detector not set up yet
//! - `NATIVE_FAULT` - anything raised inside the native call itself
//! - `INVALID_INPUT` - malformed arguments

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for the core library
#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum BridgeError {
    /// Bundled asset does not exist
    #[error("Asset not found in bundle: {0}")]
    AssetMissing(String),

    /// Destination file could not be created or written during provisioning
    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation needs state that has not been set up yet
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Failure raised by the native side of a call
    #[error("Native call failed: {0}")]
    NativeFault(String),

    /// Malformed argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::AssetMissing(_) => "ASSET_MISSING",
            BridgeError::WriteFailure { .. } => "WRITE_FAILURE",
            BridgeError::NotConfigured(_) => "NOT_CONFIGURED",
            BridgeError::InvalidInput(_) => "INVALID_INPUT",
            BridgeError::NativeFault(_) | BridgeError::Io(_) | BridgeError::Json(_) => {
                "NATIVE_FAULT"
            }
        }
    }

    pub(crate) fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BridgeError::WriteFailure {
            path: path.into(),
            source,
        }
    }
}

/// Classified failure as seen by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeFailure {
    pub code: String,
    pub message: String,
}

impl BridgeFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Failure for a panic caught at the boundary
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::new("NATIVE_FAULT", format!("Native call panicked: {detail}"))
    }
}

impl From<BridgeError> for BridgeFailure {
    fn from(err: BridgeError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl std::fmt::Display for BridgeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for BridgeFailure {}
