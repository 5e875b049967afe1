//! Read-only access to bundled application assets
//!
//! On Android the bundle lives inside the APK and is only reachable through
//! `AssetManager` (see `jni_bridge`). Desktop builds and tests read assets
//! from a plain directory or from memory.

use crate::error::{BridgeError, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// A bundle of named, read-only assets
pub trait AssetSource: Send + Sync {
    /// Open the asset stream for `name`
    ///
    /// Returns `BridgeError::AssetMissing` when the bundle has no such asset.
    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>>;
}

impl<S: AssetSource + ?Sized> AssetSource for &S {
    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>> {
        (**self).open(name)
    }
}

impl<S: AssetSource + ?Sized> AssetSource for Box<S> {
    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>> {
        (**self).open(name)
    }
}

/// Assets stored as files in a directory
#[derive(Debug, Clone)]
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirAssetSource {
    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>> {
        let path = self.root.join(name);
        match File::open(&path) {
            Ok(file) if path.is_file() => Ok(Box::new(file)),
            Ok(_) => Err(BridgeError::AssetMissing(name.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BridgeError::AssetMissing(name.to_string()))
            }
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}

/// Assets held in memory, e.g. models embedded with `include_bytes!`
#[derive(Debug, Clone, Default)]
pub struct StaticAssetSource {
    assets: HashMap<String, Cow<'static, [u8]>>,
}

impl StaticAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, name: impl Into<String>, bytes: impl Into<Cow<'static, [u8]>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Cow<'static, [u8]>>) {
        self.assets.insert(name.into(), bytes.into());
    }
}

impl AssetSource for StaticAssetSource {
    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>> {
        self.assets
            .get(name)
            .map(|bytes| Box::new(Cursor::new(bytes.as_ref())) as Box<dyn Read + '_>)
            .ok_or_else(|| BridgeError::AssetMissing(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_source_reads_bytes() {
        let source = StaticAssetSource::new().with_asset("model.bin", vec![1u8, 2, 3]);
        let mut buf = Vec::new();
        source.open("model.bin").unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, vec![1, 2, 3]);
    }

    #[test]
    fn test_static_source_missing() {
        let source = StaticAssetSource::new();
        let err = source.open("nope.mnn").err().unwrap();
        assert_eq!(err.code(), "ASSET_MISSING");
    }

    #[test]
    fn test_dir_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mnn"), b"abc").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let source = DirAssetSource::new(dir.path());
        let mut buf = String::new();
        source.open("a.mnn").unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "abc");

        assert_eq!(source.open("b.mnn").err().unwrap().code(), "ASSET_MISSING");
        // Directories are not assets
        assert_eq!(source.open("sub").err().unwrap().code(), "ASSET_MISSING");
    }
}
