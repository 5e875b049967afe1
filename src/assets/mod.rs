//! Bundled asset access and provisioning
//!
//! - [`AssetSource`] - where bundled assets are read from
//! - [`AssetProvisioner`] - materializes an asset in the cache directory once

pub mod provisioner;
pub mod source;

pub use provisioner::{AssetProvisioner, ProvisionOutcome, ProvisionedAsset};
pub use source::{AssetSource, DirAssetSource, StaticAssetSource};

use crate::error::{BridgeError, Result};
use std::path::{Component, Path};

/// Reject names that would escape the cache directory
///
/// A logical name must be a single, plain file name.
pub fn validate_logical_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(BridgeError::InvalidInput(format!(
            "Asset name must be a plain file name: {name:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_logical_name() {
        assert!(validate_logical_name("RFB-320.mnn").is_ok());
        assert!(validate_logical_name("det_10g.mnn").is_ok());

        assert!(validate_logical_name("").is_err());
        assert!(validate_logical_name("..").is_err());
        assert!(validate_logical_name(".").is_err());
        assert!(validate_logical_name("models/RFB-320.mnn").is_err());
        assert!(validate_logical_name("/abs.mnn").is_err());
        assert!(validate_logical_name("a\\b.mnn").is_err());
    }
}
