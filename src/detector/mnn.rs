//! MNN face detector binding
//!
//! This crate does not build the detector itself. Enabling the `mnn` feature
//! links `libmnnface`, a C shim that must be built and shipped alongside the
//! crate. The shim wraps the C++ `NativeFaceDetector` (MNN interpreter plus
//! UltraFace RFB-320 pre/post-processing and image decoding) in this ABI:
//!
//! ```c
//! void* mnn_face_create(const char* model_path);   // NULL if init fails
//! int   mnn_face_detect(void* handle, const char* image_path,
//!                       MnnFaceBox* out, int capacity, int* count);
//! void  mnn_face_destroy(void* handle);
//! ```
//!
//! `mnn_face_detect` returns the detector's status (see [`super::status`])
//! and writes the number of boxes stored in `out` to `count`.

use super::{status, DetectorBackend, DetectorSession, FaceInfo};
use crate::error::{BridgeError, Result};
use std::ffi::{c_char, c_int, c_void, CString};
use std::path::Path;
use std::ptr::NonNull;
use std::sync::{Mutex, PoisonError};

/// Upper bound on faces returned per image
const MAX_FACES: usize = 256;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct MnnFaceBox {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    score: f32,
}

#[link(name = "mnnface")]
extern "C" {
    fn mnn_face_create(model_path: *const c_char) -> *mut c_void;
    fn mnn_face_detect(
        handle: *mut c_void,
        image_path: *const c_char,
        out: *mut MnnFaceBox,
        capacity: c_int,
        count: *mut c_int,
    ) -> c_int;
    fn mnn_face_destroy(handle: *mut c_void);
}

fn path_to_cstring(path: &Path) -> Result<CString> {
    CString::new(path.to_string_lossy().as_bytes())
        .map_err(|_| BridgeError::InvalidInput(format!("Path contains NUL byte: {}", path.display())))
}

/// MNN runtime backend
#[derive(Debug, Default)]
pub struct MnnBackend;

impl DetectorBackend for MnnBackend {
    fn name(&self) -> &str {
        "mnn"
    }

    fn load(&self, model_path: &Path) -> Result<Box<dyn DetectorSession>> {
        let c_path = path_to_cstring(model_path)?;
        // SAFETY: c_path is a valid NUL-terminated string for the call.
        let raw = unsafe { mnn_face_create(c_path.as_ptr()) };
        let handle = NonNull::new(raw).ok_or_else(|| {
            BridgeError::NativeFault(format!("Failed to load model: {}", model_path.display()))
        })?;

        Ok(Box::new(MnnSession {
            handle: Mutex::new(RawSession(handle)),
        }))
    }
}

struct RawSession(NonNull<c_void>);

// SAFETY: the glue handle is only used behind the session mutex.
unsafe impl Send for RawSession {}

struct MnnSession {
    handle: Mutex<RawSession>,
}

impl DetectorSession for MnnSession {
    fn detect(&self, image_path: &Path) -> Result<Vec<FaceInfo>> {
        let c_path = path_to_cstring(image_path)?;
        let mut boxes = vec![MnnFaceBox::default(); MAX_FACES];
        let mut count: c_int = 0;

        let guard = self
            .handle
            .lock()
            .map_err(|_| BridgeError::NativeFault("Detector session poisoned".to_string()))?;

        // SAFETY: handle came from mnn_face_create and is not destroyed
        // before drop; boxes has MAX_FACES slots.
        let code = unsafe {
            mnn_face_detect(
                guard.0.as_ptr(),
                c_path.as_ptr(),
                boxes.as_mut_ptr(),
                MAX_FACES as c_int,
                &mut count,
            )
        };
        status::check(code, "Detection")?;

        Ok(boxes
            .into_iter()
            .take(count.clamp(0, MAX_FACES as c_int) as usize)
            .map(|b| FaceInfo {
                x: b.x,
                y: b.y,
                width: b.width,
                height: b.height,
                score: b.score,
            })
            .collect())
    }
}

impl Drop for MnnSession {
    fn drop(&mut self) {
        let session = self.handle.get_mut().unwrap_or_else(PoisonError::into_inner);
        // SAFETY: handle is owned by this session and released once.
        unsafe { mnn_face_destroy(session.0.as_ptr()) };
    }
}
