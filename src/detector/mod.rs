//! Face detector glue
//!
//! The inference runtime itself is external. This module only binds a
//! runtime session to a provisioned model file and forwards images to it.
//!
//! Initialization returns an explicit [`DetectorHandle`]; detection takes
//! that handle, so "initialize before detect" is carried by the types
//! instead of by call order.

pub mod face;
#[cfg(feature = "mnn")]
pub mod mnn;
pub mod status;

pub use face::{DetectionReport, FaceInfo};

use crate::error::{BridgeError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// An inference runtime able to load face detection models
pub trait DetectorBackend: Send + Sync {
    /// Short runtime name used in status messages
    fn name(&self) -> &str;

    /// Load the model at `model_path` and create a detection session
    fn load(&self, model_path: &Path) -> Result<Box<dyn DetectorSession>>;
}

/// A loaded model, ready to run on images
pub trait DetectorSession: Send + Sync {
    fn detect(&self, image_path: &Path) -> Result<Vec<FaceInfo>>;
}

/// An initialized detector
#[derive(Clone)]
pub struct DetectorHandle {
    model_path: PathBuf,
    backend: String,
    session: Arc<dyn DetectorSession>,
}

impl DetectorHandle {
    /// Initialize `backend` with the model at `model_path`
    ///
    /// # Errors
    /// `NativeFault` if the model file is missing or the runtime rejects it.
    pub fn initialize(backend: &dyn DetectorBackend, model_path: impl AsRef<Path>) -> Result<Self> {
        let model_path = model_path.as_ref();
        info!("Model path: {}", model_path.display());

        if !model_path.is_file() {
            return Err(BridgeError::NativeFault(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let session = backend.load(model_path)?;
        info!("Face detector initialized ({})", backend.name());

        Ok(Self {
            model_path: model_path.to_path_buf(),
            backend: backend.name().to_string(),
            session: Arc::from(session),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn backend_name(&self) -> &str {
        &self.backend
    }

    /// Status line reported to the host after initialization
    pub fn status(&self) -> String {
        format!(
            "Face detector initialized ({}) with model: {}",
            self.backend,
            self.model_path.display()
        )
    }

    /// Run detection on the image at `image_path`
    ///
    /// # Errors
    /// `NativeFault` if the image cannot be read or the runtime fails.
    pub fn detect(&self, image_path: impl AsRef<Path>) -> Result<DetectionReport> {
        let image_path = image_path.as_ref();
        if !image_path.is_file() {
            return Err(BridgeError::NativeFault(format!(
                "Image not readable: {}",
                image_path.display()
            )));
        }

        let faces = self.session.detect(image_path)?;
        info!("Detected {} faces", faces.len());
        Ok(DetectionReport::new(faces))
    }
}

impl fmt::Debug for DetectorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorHandle")
            .field("model_path", &self.model_path)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

/// Backend used when no inference runtime is linked into the build
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

impl DetectorBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn load(&self, _model_path: &Path) -> Result<Box<dyn DetectorSession>> {
        Err(BridgeError::NativeFault(
            "No face detection runtime is linked into this build".to_string(),
        ))
    }
}

/// Backend selected by the enabled cargo features
pub fn default_backend() -> Arc<dyn DetectorBackend> {
    #[cfg(feature = "mnn")]
    {
        Arc::new(mnn::MnnBackend::default())
    }

    #[cfg(not(feature = "mnn"))]
    {
        Arc::new(UnavailableBackend)
    }
}
