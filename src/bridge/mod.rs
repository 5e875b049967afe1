//! Native call bridge
//!
//! [`NativeBridge`] is the typed boundary the host application calls into.
//! Every operation has a typed method returning [`Result`](crate::Result);
//! [`NativeBridge::call`] is the dynamic entry point used by generic
//! marshalling layers and always yields a classified [`BridgeFailure`] on
//! error.
//!
//! # Calling conventions
//! - Synchronous: [`NativeBridge::call`] returns the outcome directly
//! - Promise: [`promise::invoke_with_promise`] settles a [`Promise`] exactly once
//! - Async: [`promise::call_async`] runs the call on a tokio blocking worker
//!
//! # Detector state
//! The host API is stateful: `initFaceDetector` takes no arguments and reads
//! the model path pushed earlier by the provisioning flow, and `detectFace`
//! uses whatever detector was initialized last. Rust callers can skip that
//! state entirely with [`NativeBridge::init_detector_with`] and
//! [`NativeBridge::detect_faces`].

pub mod call;
pub mod ops;
pub mod promise;

pub use call::{BridgeCall, BridgeValue, Operation};
pub use promise::{call_async, invoke_deferred, invoke_with_promise, promise_channel, ChannelPromise, Promise};

use crate::assets::{AssetProvisioner, AssetSource};
use crate::detector::{self, DetectionReport, DetectorBackend, DetectorHandle};
use crate::error::{BridgeError, BridgeFailure, Result};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info, warn};

pub struct NativeBridge {
    backend: Arc<dyn DetectorBackend>,
    model_path: RwLock<Option<PathBuf>>,
    detector: RwLock<Option<DetectorHandle>>,
}

impl NativeBridge {
    pub fn new(backend: Arc<dyn DetectorBackend>) -> Self {
        Self {
            backend,
            model_path: RwLock::new(None),
            detector: RwLock::new(None),
        }
    }

    /// Bridge using the runtime selected by cargo features
    pub fn with_default_backend() -> Self {
        Self::new(detector::default_backend())
    }

    // ------------------------------------------------------------------
    // Model path configuration
    // ------------------------------------------------------------------

    /// Push a provisioned model path into the bridge
    ///
    /// An empty path is the provisioning failure sentinel and clears the
    /// configuration instead of storing it.
    pub fn set_model_path(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut slot = self.model_path.write().unwrap_or_else(PoisonError::into_inner);

        if path.as_os_str().is_empty() {
            warn!("Ignoring empty model path; detector stays unconfigured");
            *slot = None;
        } else {
            info!("Model path set to: {}", path.display());
            *slot = Some(path);
        }
    }

    pub fn model_path(&self) -> Option<PathBuf> {
        self.model_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Provision `logical_name` and push its path into the bridge
    ///
    /// Returns the path, or `""` when provisioning failed (the failure is
    /// logged). The path is only pushed when provisioning succeeded.
    pub fn provision_model<S: AssetSource>(
        &self,
        provisioner: &AssetProvisioner<S>,
        logical_name: &str,
    ) -> String {
        let path = provisioner.provision_or_sentinel(logical_name);
        if path.is_empty() {
            error!("Failed to get model path for {}", logical_name);
        } else {
            self.set_model_path(&path);
        }
        path
    }

    // ------------------------------------------------------------------
    // Typed operations
    // ------------------------------------------------------------------

    pub fn test_call(&self) -> String {
        ops::test_call()
    }

    pub fn reverse_text(&self, input: &str) -> String {
        ops::reverse_text(input)
    }

    pub fn add_numbers(&self, a: f64, b: f64) -> Result<f64> {
        ops::add_numbers(a, b)
    }

    /// Initialize a detector from an explicit model path
    ///
    /// Does not touch the bridge's own detector state.
    pub fn init_detector_with(&self, model_path: impl AsRef<Path>) -> Result<DetectorHandle> {
        DetectorHandle::initialize(self.backend.as_ref(), model_path)
    }

    /// Initialize the bridge's detector from the configured model path
    ///
    /// # Errors
    /// - `NotConfigured` if no model path has been pushed
    /// - `NativeFault` if the runtime rejects the model
    pub fn init_detector(&self) -> Result<String> {
        let model_path = self.model_path().ok_or_else(|| {
            BridgeError::NotConfigured("Model path not set; provision the model first".to_string())
        })?;

        let handle = self.init_detector_with(&model_path)?;
        let status = handle.status();
        *self.detector.write().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(status)
    }

    /// Current detector, if `init_detector` has succeeded
    pub fn detector(&self) -> Option<DetectorHandle> {
        self.detector
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run detection with an explicit handle
    pub fn detect_faces(&self, handle: &DetectorHandle, image_path: impl AsRef<Path>) -> Result<DetectionReport> {
        handle.detect(image_path)
    }

    /// Run detection with the bridge's detector and return the result string
    ///
    /// # Errors
    /// - `NotConfigured` if the detector was never initialized
    /// - `NativeFault` if the image is unreadable or detection fails
    pub fn detect_face(&self, image_path: &str) -> Result<String> {
        let handle = self.detector().ok_or_else(|| {
            BridgeError::NotConfigured("Face detector not initialized; call initFaceDetector first".to_string())
        })?;

        self.detect_faces(&handle, image_path)?.to_result_string()
    }

    // ------------------------------------------------------------------
    // Dynamic dispatch
    // ------------------------------------------------------------------

    /// Synchronous-style entry point
    ///
    /// Panics inside the call are caught and reported as `NATIVE_FAULT`.
    pub fn call(&self, call: &BridgeCall) -> std::result::Result<BridgeValue, BridgeFailure> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(call))) {
            Ok(outcome) => outcome.map_err(|e| {
                warn!("{} failed: [{}] {}", call.operation, e.code(), e);
                BridgeFailure::from(e)
            }),
            Err(payload) => {
                let failure = BridgeFailure::from_panic(payload);
                error!("{} panicked: {}", call.operation, failure.message);
                Err(failure)
            }
        }
    }

    fn dispatch(&self, call: &BridgeCall) -> Result<BridgeValue> {
        call.check_arity()?;

        let value: BridgeValue = match call.operation {
            Operation::TestCall => self.test_call().into(),
            Operation::ReverseText => self.reverse_text(call.text_arg(0)?).into(),
            Operation::AddNumbers => self.add_numbers(call.number_arg(0)?, call.number_arg(1)?)?.into(),
            Operation::InitDetector => self.init_detector()?.into(),
            Operation::DetectFace => self.detect_face(call.text_arg(0)?)?.into(),
        };
        Ok(value)
    }
}

impl Default for NativeBridge {
    fn default() -> Self {
        Self::with_default_backend()
    }
}
