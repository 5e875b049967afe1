//! JNI entry points for the Android app (`com.anonymous.test_mnn`)
//!
//! Kotlin declarations these symbols bind to:
//!
//! ```kotlin
//! class MnnTestModule {
//!     external fun nativeTestCall(): String
//!     external fun nativeReverseString(input: String): String
//!     external fun nativeAddNumbers(a: Double, b: Double): Double
//!     external fun nativeInitFaceDetector(): String
//!     external fun nativeDetectFace(imagePath: String): String
//! }
//!
//! object ModelExtractor {
//!     external fun nativeSetModelPath(modelPath: String)
//!     external fun nativeExtractModel(context: Context, modelName: String): String
//!     external fun nativeGetModelPath(context: Context, modelName: String): String
//!     external fun nativeIsModelReady(context: Context, modelName: String): Boolean
//! }
//! ```
//!
//! Bridge failures are thrown as `java.lang.RuntimeException` with the
//! message `"<CODE>: <message>"`; the Kotlin module turns that into
//! `promise.reject(code, message)`.
//!
//! `JNI_OnLoad` routes the crate's `tracing` events to logcat under the
//! [`LOG_TAG`] tag.

use crate::assets::{validate_logical_name, AssetProvisioner, AssetSource};
use crate::bridge::{BridgeCall, BridgeValue};
use crate::error::{BridgeError, BridgeFailure, Result};
use crate::ffi::global_bridge;
use jni::objects::{GlobalRef, JByteArray, JObject, JString, JValue};
use jni::sys::{jboolean, jdouble, jint, jstring, JNI_FALSE, JNI_TRUE, JNI_VERSION_1_6};
use jni::{JNIEnv, JavaVM};
use std::ffi::c_void;
use std::io::{self, Read};
use std::ptr;
use tracing::{error, info};

const EXCEPTION_CLASS: &str = "java/lang/RuntimeException";

/// Logcat tag for records from this library
pub const LOG_TAG: &str = "MnnCore";

/// Bytes requested from the Java stream per read
const READ_CHUNK: usize = 8192;

fn jni_fault(e: jni::errors::Error) -> BridgeError {
    BridgeError::NativeFault(format!("JNI error: {e}"))
}

/// Clear a Java exception left pending by a failed JNI call
///
/// Must run before any further JNI call that creates objects or throws.
fn clear_pending_exception(env: &mut JNIEnv) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
}

// ============================================================================
// LIBRARY LOAD
// ============================================================================

/// Route log records to logcat when `System.loadLibrary` loads us
#[no_mangle]
pub extern "system" fn JNI_OnLoad(_vm: JavaVM, _reserved: *mut c_void) -> jint {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag(LOG_TAG),
    );
    info!("mnn-core loaded");
    JNI_VERSION_1_6
}

// ============================================================================
// ASSET MANAGER SOURCE
// ============================================================================

/// Assets packaged in the APK, read through `android.content.res.AssetManager`
struct AndroidAssetSource {
    vm: JavaVM,
    assets: GlobalRef,
}

impl AndroidAssetSource {
    fn from_context(env: &mut JNIEnv, context: &JObject) -> Result<Self> {
        let assets = env
            .call_method(context, "getAssets", "()Landroid/content/res/AssetManager;", &[])
            .and_then(|v| v.l())
            .map_err(jni_fault)?;

        Ok(Self {
            vm: env.get_java_vm().map_err(jni_fault)?,
            assets: env.new_global_ref(assets).map_err(jni_fault)?,
        })
    }
}

impl AssetSource for AndroidAssetSource {
    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>> {
        let mut env = self.vm.attach_current_thread().map_err(jni_fault)?;
        let jname = env.new_string(name).map_err(jni_fault)?;

        let opened = env
            .call_method(
                &self.assets,
                "open",
                "(Ljava/lang/String;)Ljava/io/InputStream;",
                &[JValue::Object(&jname)],
            )
            .and_then(|v| v.l());

        let stream = match opened {
            Ok(stream) => stream,
            Err(jni::errors::Error::JavaException) => {
                // FileNotFoundException from AssetManager.open
                let _ = env.exception_clear();
                return Err(BridgeError::AssetMissing(name.to_string()));
            }
            Err(e) => return Err(jni_fault(e)),
        };

        let buffer = env.new_byte_array(READ_CHUNK as jint).map_err(jni_fault)?;

        Ok(Box::new(JavaInputStream {
            vm: &self.vm,
            stream: env.new_global_ref(stream).map_err(jni_fault)?,
            buffer: env.new_global_ref(buffer).map_err(jni_fault)?,
        }))
    }
}

/// `java.io.InputStream` adapted to `std::io::Read`
struct JavaInputStream<'a> {
    vm: &'a JavaVM,
    stream: GlobalRef,
    buffer: GlobalRef,
}

impl Read for JavaInputStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|e| io::Error::other(e.to_string()))?;
        let len = buf.len().min(READ_CHUNK) as jint;

        let read = env
            .call_method(
                &self.stream,
                "read",
                "([BII)I",
                &[JValue::Object(self.buffer.as_obj()), JValue::Int(0), JValue::Int(len)],
            )
            .and_then(|v| v.i());

        let read = match read {
            Ok(n) if n <= 0 => return Ok(0),
            Ok(n) => n as usize,
            Err(e) => {
                let _ = env.exception_clear();
                return Err(io::Error::other(e.to_string()));
            }
        };

        // SAFETY: buffer was created by new_byte_array and is kept alive by
        // the global ref for the lifetime of this stream.
        let array = unsafe { JByteArray::from_raw(self.buffer.as_raw()) };
        let mut chunk = vec![0i8; read];
        env.get_byte_array_region(&array, 0, &mut chunk)
            .map_err(|e| io::Error::other(e.to_string()))?;

        for (dst, src) in buf.iter_mut().zip(&chunk) {
            *dst = *src as u8;
        }
        Ok(read)
    }
}

impl Drop for JavaInputStream<'_> {
    fn drop(&mut self) {
        if let Ok(mut env) = self.vm.attach_current_thread() {
            if env.call_method(&self.stream, "close", "()V", &[]).is_err() {
                let _ = env.exception_clear();
            }
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn cache_dir(env: &mut JNIEnv, context: &JObject) -> Result<String> {
    let dir = env
        .call_method(context, "getCacheDir", "()Ljava/io/File;", &[])
        .and_then(|v| v.l())
        .map_err(jni_fault)?;
    let path = env
        .call_method(&dir, "getAbsolutePath", "()Ljava/lang/String;", &[])
        .and_then(|v| v.l())
        .map_err(jni_fault)?;
    read_string(env, &JString::from(path))
}

fn read_string(env: &mut JNIEnv, value: &JString) -> Result<String> {
    if value.is_null() {
        return Err(BridgeError::InvalidInput("String argument is null".to_string()));
    }
    Ok(env.get_string(value).map_err(jni_fault)?.into())
}

fn new_jstring(env: &mut JNIEnv, value: &str) -> jstring {
    clear_pending_exception(env);
    match env.new_string(value) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("Failed to create Java string: {}", e);
            ptr::null_mut()
        }
    }
}

fn throw_failure(env: &mut JNIEnv, failure: &BridgeFailure) {
    clear_pending_exception(env);
    if let Err(e) = env.throw_new(EXCEPTION_CLASS, failure.to_string()) {
        error!("Failed to throw {}: {}", failure, e);
    }
}

fn provisioner(env: &mut JNIEnv, context: &JObject) -> Result<AssetProvisioner<AndroidAssetSource>> {
    let source = AndroidAssetSource::from_context(env, context)?;
    Ok(AssetProvisioner::new(source, cache_dir(env, context)?))
}

/// Run a string-returning call, throwing on failure
fn string_call(env: &mut JNIEnv, call: BridgeCall) -> jstring {
    match global_bridge().call(&call) {
        Ok(BridgeValue::Text(text)) => new_jstring(env, &text),
        Ok(other) => {
            throw_failure(
                env,
                &BridgeFailure::new("NATIVE_FAULT", format!("Unexpected result type: {other:?}")),
            );
            ptr::null_mut()
        }
        Err(failure) => {
            throw_failure(env, &failure);
            ptr::null_mut()
        }
    }
}

fn string_arg_call(env: &mut JNIEnv, arg: &JString, build: fn(String) -> BridgeCall) -> jstring {
    match read_string(env, arg) {
        Ok(value) => string_call(env, build(value)),
        Err(e) => {
            throw_failure(env, &BridgeFailure::from(e));
            ptr::null_mut()
        }
    }
}

// ============================================================================
// MnnTestModule
// ============================================================================

#[no_mangle]
pub extern "system" fn Java_com_anonymous_test_1mnn_MnnTestModule_nativeTestCall<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jstring {
    string_call(&mut env, BridgeCall::test_call())
}

#[no_mangle]
pub extern "system" fn Java_com_anonymous_test_1mnn_MnnTestModule_nativeReverseString<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    input: JString<'local>,
) -> jstring {
    string_arg_call(&mut env, &input, |s| BridgeCall::reverse_text(s))
}

#[no_mangle]
pub extern "system" fn Java_com_anonymous_test_1mnn_MnnTestModule_nativeAddNumbers<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    a: jdouble,
    b: jdouble,
) -> jdouble {
    match global_bridge().call(&BridgeCall::add_numbers(a, b)) {
        Ok(BridgeValue::Number(sum)) => sum,
        Ok(other) => {
            throw_failure(
                &mut env,
                &BridgeFailure::new("NATIVE_FAULT", format!("Unexpected result type: {other:?}")),
            );
            0.0
        }
        Err(failure) => {
            throw_failure(&mut env, &failure);
            0.0
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_com_anonymous_test_1mnn_MnnTestModule_nativeInitFaceDetector<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jstring {
    string_call(&mut env, BridgeCall::init_detector())
}

#[no_mangle]
pub extern "system" fn Java_com_anonymous_test_1mnn_MnnTestModule_nativeDetectFace<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    image_path: JString<'local>,
) -> jstring {
    string_arg_call(&mut env, &image_path, |s| BridgeCall::detect_face(s))
}

// ============================================================================
// ModelExtractor
// ============================================================================

#[no_mangle]
pub extern "system" fn Java_com_anonymous_test_1mnn_ModelExtractor_nativeSetModelPath<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    model_path: JString<'local>,
) {
    match read_string(&mut env, &model_path) {
        Ok(path) => global_bridge().set_model_path(path),
        Err(e) => {
            clear_pending_exception(&mut env);
            error!("nativeSetModelPath: {}", e);
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_com_anonymous_test_1mnn_ModelExtractor_nativeExtractModel<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    context: JObject<'local>,
    model_name: JString<'local>,
) -> jstring {
    let path = read_string(&mut env, &model_name)
        .and_then(|name| Ok((name, provisioner(&mut env, &context)?)))
        .map(|(name, provisioner)| provisioner.provision_or_sentinel(&name))
        .unwrap_or_else(|e| {
            error!("Failed to extract model: {}", e);
            String::new()
        });
    new_jstring(&mut env, &path)
}

#[no_mangle]
pub extern "system" fn Java_com_anonymous_test_1mnn_ModelExtractor_nativeGetModelPath<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    context: JObject<'local>,
    model_name: JString<'local>,
) -> jstring {
    let path = read_string(&mut env, &model_name)
        .and_then(|name| Ok((name, provisioner(&mut env, &context)?)))
        .map(|(name, provisioner)| global_bridge().provision_model(&provisioner, &name))
        .unwrap_or_else(|e| {
            error!("Failed to get model path: {}", e);
            String::new()
        });
    if !path.is_empty() {
        info!("Model path set via JNI: {}", path);
    }
    new_jstring(&mut env, &path)
}

#[no_mangle]
pub extern "system" fn Java_com_anonymous_test_1mnn_ModelExtractor_nativeIsModelReady<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    context: JObject<'local>,
    model_name: JString<'local>,
) -> jboolean {
    let ready = read_string(&mut env, &model_name)
        .and_then(|name| Ok((name, cache_dir(&mut env, &context)?)))
        .map(|(name, dir)| {
            validate_logical_name(&name).is_ok() && std::path::Path::new(&dir).join(name).is_file()
        })
        .unwrap_or_else(|e| {
            clear_pending_exception(&mut env);
            error!("Failed to check model: {}", e);
            false
        });

    if ready {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}
