//! Test helpers shared by the integration tests
//!
//! Provides an asset source that counts how often it is opened, a scripted
//! detector backend, and a promise that records how it was settled.

#![allow(dead_code)]

use mnn_core::assets::{AssetSource, StaticAssetSource};
use mnn_core::bridge::{BridgeValue, Promise};
use mnn_core::detector::{DetectorBackend, DetectorSession, FaceInfo};
use mnn_core::error::{BridgeError, Result};
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Asset source that records every `open` call
pub struct CountingSource {
    inner: StaticAssetSource,
    opens: AtomicUsize,
}

impl CountingSource {
    pub fn new(inner: StaticAssetSource) -> Self {
        Self {
            inner,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn with_asset(name: &str, bytes: Vec<u8>) -> Self {
        Self::new(StaticAssetSource::new().with_asset(name, bytes))
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl AssetSource for CountingSource {
    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open(name)
    }
}

/// Deterministic bytes of the given length
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// How a scripted detector behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Load succeeds, every image yields the given number of faces
    Faces(usize),
    /// Runtime refuses to load the model
    RejectModel,
    /// Runtime fails on every image
    RejectImage,
    /// Runtime panics on every image
    Panic,
}

pub struct ScriptedBackend {
    script: Script,
    pub loads: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            loads: AtomicUsize::new(0),
        })
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn load(&self, model_path: &Path) -> Result<Box<dyn DetectorSession>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.script == Script::RejectModel {
            return Err(BridgeError::NativeFault(format!(
                "Failed to load model: {}",
                model_path.display()
            )));
        }
        Ok(Box::new(ScriptedSession {
            script: self.script,
        }))
    }
}

struct ScriptedSession {
    script: Script,
}

impl DetectorSession for ScriptedSession {
    fn detect(&self, _image_path: &Path) -> Result<Vec<FaceInfo>> {
        match self.script {
            Script::Faces(n) => Ok((0..n)
                .map(|i| FaceInfo {
                    x: 10.0 * i as f32,
                    y: 5.0,
                    width: 40.0,
                    height: 40.0,
                    score: 0.96 + 0.01 * i as f32,
                })
                .collect()),
            Script::RejectImage => Err(BridgeError::NativeFault(
                "Input image is empty".to_string(),
            )),
            Script::Panic => panic!("tensor shape mismatch"),
            Script::RejectModel => unreachable!("session never created"),
        }
    }
}

/// Settlement observed by a [`RecordingPromise`]
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Resolved(BridgeValue),
    Rejected { code: String, message: String },
}

/// Promise that appends each settlement to a shared log
#[derive(Clone, Default)]
pub struct RecordingPromise {
    pub log: Arc<Mutex<Vec<Settled>>>,
}

impl RecordingPromise {
    pub fn settlements(&self) -> Vec<Settled> {
        self.log.lock().unwrap().clone()
    }
}

impl Promise for RecordingPromise {
    fn resolve(self, value: BridgeValue) {
        self.log.lock().unwrap().push(Settled::Resolved(value));
    }

    fn reject(self, code: &str, message: &str) {
        self.log.lock().unwrap().push(Settled::Rejected {
            code: code.to_string(),
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_bytes() {
        assert_eq!(sample_bytes(0).len(), 0);
        assert_eq!(sample_bytes(300).len(), 300);
    }
}
