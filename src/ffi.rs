//! UniFFI exports
//!
//! Free functions mirroring the host TurboModule spec:
//!
//! ```ts
//! reverseString(input: string): string
//! addNumbers(a: number, b: number): number
//! initFaceDetector(): string
//! detectFace(imagePath: string): string
//! ```
//!
//! plus the model provisioning calls. The host runtime has no handle to
//! pass around, so these share one process-wide [`NativeBridge`].
//!
//! On iOS the app bundle is a plain directory, so bundled models are read
//! with [`DirAssetSource`]. Android goes through `jni_bridge` instead.

use crate::assets::{AssetProvisioner, DirAssetSource};
use crate::bridge::NativeBridge;
use crate::config::DEFAULT_MODEL_NAME;
use crate::error::BridgeError;
use lazy_static::lazy_static;

lazy_static! {
    static ref BRIDGE: NativeBridge = NativeBridge::with_default_backend();
}

/// The bridge shared by all host-facing entry points
pub fn global_bridge() -> &'static NativeBridge {
    &BRIDGE
}

fn provisioner(cache_dir: String, asset_dir: String) -> AssetProvisioner<DirAssetSource> {
    AssetProvisioner::new(DirAssetSource::new(asset_dir), cache_dir)
}

#[uniffi::export]
pub fn test_call() -> String {
    global_bridge().test_call()
}

#[uniffi::export]
pub fn reverse_string(input: String) -> String {
    global_bridge().reverse_text(&input)
}

#[uniffi::export]
pub fn add_numbers(a: f64, b: f64) -> Result<f64, BridgeError> {
    global_bridge().add_numbers(a, b)
}

#[uniffi::export]
pub fn init_face_detector() -> Result<String, BridgeError> {
    global_bridge().init_detector()
}

#[uniffi::export]
pub fn detect_face(image_path: String) -> Result<String, BridgeError> {
    global_bridge().detect_face(&image_path)
}

#[uniffi::export]
pub fn set_model_path(model_path: String) {
    global_bridge().set_model_path(model_path);
}

/// Copy the bundled model into `cache_dir` if it is not there yet
///
/// Returns the model path, or `""` on failure.
#[uniffi::export]
pub fn extract_model_if_needed(cache_dir: String, asset_dir: String) -> String {
    provisioner(cache_dir, asset_dir).provision_or_sentinel(DEFAULT_MODEL_NAME)
}

/// Extract the bundled model and hand its path to the detector
///
/// Returns the model path, or `""` on failure.
#[uniffi::export]
pub fn get_model_path(cache_dir: String, asset_dir: String) -> String {
    global_bridge().provision_model(&provisioner(cache_dir, asset_dir), DEFAULT_MODEL_NAME)
}

#[uniffi::export]
pub fn is_model_ready(cache_dir: String) -> bool {
    AssetProvisioner::new(DirAssetSource::new(""), cache_dir).is_ready(DEFAULT_MODEL_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stateless_exports() {
        assert_eq!(test_call(), "Native call successful!");
        assert_eq!(reverse_string("Hello".to_string()), "olleH");
        assert_eq!(add_numbers(10.0, 20.0).unwrap(), 30.0);
    }

    #[test]
    fn test_model_extraction_exports() {
        let assets = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let cache_dir = cache.path().to_string_lossy().into_owned();
        let asset_dir = assets.path().to_string_lossy().into_owned();

        assert!(!is_model_ready(cache_dir.clone()));
        assert_eq!(extract_model_if_needed(cache_dir.clone(), asset_dir.clone()), "");

        std::fs::write(assets.path().join(DEFAULT_MODEL_NAME), b"mnn model bytes").unwrap();
        let path = extract_model_if_needed(cache_dir.clone(), asset_dir);
        assert!(path.ends_with(DEFAULT_MODEL_NAME));
        assert!(is_model_ready(cache_dir));
    }
}
