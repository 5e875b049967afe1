uniffi::setup_scaffolding!();

// JNI bridge for Android
#[cfg(target_os = "android")]
mod jni_bridge;

// UniFFI exports (iOS / host bindings)
pub mod ffi;

// Core modules
pub mod error;
pub mod config;
pub mod assets;
pub mod detector;
pub mod bridge;

// Re-export commonly used types for convenience
pub use error::{BridgeError, BridgeFailure, Result};
pub use assets::{AssetProvisioner, AssetSource, ProvisionedAsset};
pub use bridge::{BridgeCall, BridgeValue, NativeBridge, Operation};
pub use config::CoreConfig;
pub use detector::{DetectionReport, DetectorHandle, FaceInfo};

/// Echo a message through the native log, for checking the host wiring
#[uniffi::export]
pub fn log_from_rust(message: String) -> String {
    let log_message = format!("Rust native module says: {message}");
    tracing::info!("{log_message}");
    log_message
}
