//! Native call bridge integration tests
//!
//! Covers the host-visible call surface: simple operations, the
//! init-before-detect ordering, error classification, and the promise and
//! async calling conventions.

mod helpers;

use helpers::{sample_bytes, RecordingPromise, Script, ScriptedBackend, Settled};
use mnn_core::assets::{AssetProvisioner, StaticAssetSource};
use mnn_core::bridge::{
    call_async, invoke_deferred, invoke_with_promise, promise::spawn_with_promise, BridgeCall,
    BridgeValue, NativeBridge, Operation,
};
use mnn_core::detector::DetectionReport;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const MODEL: &str = "RFB-320.mnn";

/// Bridge with a provisioned model and an image on disk
struct Fixture {
    _dir: tempfile::TempDir,
    bridge: NativeBridge,
    backend: Arc<ScriptedBackend>,
    image: PathBuf,
}

fn fixture(script: Script) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("face.jpg");
    fs::write(&image, b"\xFF\xD8\xFF\xE0 fake jpeg").unwrap();

    let backend = ScriptedBackend::new(script);
    let bridge = NativeBridge::new(backend.clone());

    let source = StaticAssetSource::new().with_asset(MODEL, sample_bytes(128));
    let provisioner = AssetProvisioner::new(source, dir.path().join("cache"));
    assert!(!bridge.provision_model(&provisioner, MODEL).is_empty());

    Fixture {
        _dir: dir,
        bridge,
        backend,
        image,
    }
}

fn text(s: &str) -> BridgeValue {
    BridgeValue::Text(s.to_string())
}

#[test]
fn test_reverse_text_round_trip() {
    let bridge = NativeBridge::new(ScriptedBackend::new(Script::Faces(0)));
    assert_eq!(bridge.call(&BridgeCall::reverse_text("Hello")), Ok(text("olleH")));
    assert_eq!(bridge.call(&BridgeCall::reverse_text("")), Ok(text("")));
}

#[test]
fn test_add_numbers() {
    let bridge = NativeBridge::new(ScriptedBackend::new(Script::Faces(0)));
    assert_eq!(bridge.call(&BridgeCall::add_numbers(10.0, 20.0)), Ok(BridgeValue::Number(30.0)));
    assert_eq!(bridge.call(&BridgeCall::add_numbers(-5.0, 5.0)), Ok(BridgeValue::Number(0.0)));

    let failure = bridge.call(&BridgeCall::add_numbers(f64::MAX, f64::MAX)).unwrap_err();
    assert_eq!(failure.code, "INVALID_INPUT");
}

#[test]
fn test_detect_before_init_is_not_configured() {
    let f = fixture(Script::Faces(1));
    let failure = f
        .bridge
        .call(&BridgeCall::detect_face(f.image.to_string_lossy()))
        .unwrap_err();
    assert_eq!(failure.code, "NOT_CONFIGURED");
    assert_eq!(f.backend.loads.load(Ordering::SeqCst), 0);
}

#[test]
fn test_init_without_model_path_is_not_configured() {
    let bridge = NativeBridge::new(ScriptedBackend::new(Script::Faces(1)));
    let failure = bridge.call(&BridgeCall::init_detector()).unwrap_err();
    assert_eq!(failure.code, "NOT_CONFIGURED");
}

#[test]
fn test_init_then_detect() {
    let f = fixture(Script::Faces(2));

    let status = f.bridge.call(&BridgeCall::init_detector()).unwrap();
    assert!(status.as_text().unwrap().contains(MODEL));

    let result = f
        .bridge
        .call(&BridgeCall::detect_face(f.image.to_string_lossy()))
        .unwrap();
    let report = DetectionReport::from_result_string(result.as_text().unwrap()).unwrap();
    assert_eq!(report.count, 2);
    assert!(report.faces[0].score >= report.faces[1].score);
}

#[test]
fn test_explicit_handle_api() {
    let f = fixture(Script::Faces(3));
    let model = f.bridge.model_path().unwrap();

    let handle = f.bridge.init_detector_with(&model).unwrap();
    let report = f.bridge.detect_faces(&handle, &f.image).unwrap();
    assert_eq!(report.count, 3);

    // Explicit handles leave the bridge's own detector untouched
    assert!(f.bridge.detector().is_none());
}

#[test]
fn test_rejected_model_is_native_fault() {
    let f = fixture(Script::RejectModel);
    let failure = f.bridge.call(&BridgeCall::init_detector()).unwrap_err();
    assert_eq!(failure.code, "NATIVE_FAULT");
    assert!(f.bridge.detector().is_none());
}

#[test]
fn test_unreadable_image_is_native_fault() {
    let f = fixture(Script::Faces(1));
    f.bridge.init_detector().unwrap();

    let failure = f
        .bridge
        .call(&BridgeCall::detect_face("/definitely/not/here.jpg"))
        .unwrap_err();
    assert_eq!(failure.code, "NATIVE_FAULT");
}

#[test]
fn test_invalid_image_is_native_fault() {
    let f = fixture(Script::RejectImage);
    f.bridge.init_detector().unwrap();

    let failure = f
        .bridge
        .call(&BridgeCall::detect_face(f.image.to_string_lossy()))
        .unwrap_err();
    assert_eq!(failure.code, "NATIVE_FAULT");
    assert!(failure.message.contains("empty"));
}

#[test]
fn test_backend_panic_is_classified() {
    let f = fixture(Script::Panic);
    f.bridge.init_detector().unwrap();

    let failure = f
        .bridge
        .call(&BridgeCall::detect_face(f.image.to_string_lossy()))
        .unwrap_err();
    assert_eq!(failure.code, "NATIVE_FAULT");
    assert!(failure.message.contains("tensor shape mismatch"));

    // The bridge stays usable afterwards
    assert_eq!(f.bridge.call(&BridgeCall::reverse_text("ok")), Ok(text("ko")));
}

#[test]
fn test_dispatch_by_name() {
    let bridge = NativeBridge::new(ScriptedBackend::new(Script::Faces(0)));
    let call = BridgeCall::by_name("reverseString", vec![text("abc")]).unwrap();
    assert_eq!(call.operation, Operation::ReverseText);
    assert_eq!(bridge.call(&call), Ok(text("cba")));
}

#[test]
fn test_promise_settles_exactly_once() {
    let f = fixture(Script::Panic);
    f.bridge.init_detector().unwrap();
    let image = f.image.to_string_lossy().into_owned();

    let cases = vec![
        BridgeCall::reverse_text("Hello"),
        BridgeCall::add_numbers(1.0, 2.0),
        BridgeCall::detect_face(image),
        BridgeCall::new(Operation::AddNumbers, Vec::new()),
    ];

    for call in cases {
        let promise = RecordingPromise::default();
        invoke_with_promise(&f.bridge, call.clone(), promise.clone());
        assert_eq!(promise.settlements().len(), 1, "{call:?} settled {:?}", promise.settlements());
    }
}

#[test]
fn test_promise_rejects_when_setup_panics() {
    let bridge = NativeBridge::new(ScriptedBackend::new(Script::Faces(0)));
    let promise = RecordingPromise::default();

    invoke_deferred(
        &bridge,
        || -> BridgeCall { panic!("could not read argument 0") },
        promise.clone(),
    );

    let settled = promise.settlements();
    assert_eq!(settled.len(), 1);
    match &settled[0] {
        Settled::Rejected { code, message } => {
            assert_eq!(code, "NATIVE_FAULT");
            assert!(message.contains("could not read argument 0"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn test_promise_resolves_value() {
    let bridge = NativeBridge::new(ScriptedBackend::new(Script::Faces(0)));
    let promise = RecordingPromise::default();
    invoke_with_promise(&bridge, BridgeCall::test_call(), promise.clone());
    assert_eq!(
        promise.settlements(),
        vec![Settled::Resolved(text("Native call successful!"))]
    );
}

#[tokio::test]
async fn test_async_calls() {
    let f = fixture(Script::Faces(1));
    let image = f.image.to_string_lossy().into_owned();
    let bridge = Arc::new(f.bridge);

    let failure = call_async(bridge.clone(), BridgeCall::detect_face(image.clone()))
        .await
        .unwrap_err();
    assert_eq!(failure.code, "NOT_CONFIGURED");

    call_async(bridge.clone(), BridgeCall::init_detector()).await.unwrap();
    let result = call_async(bridge, BridgeCall::detect_face(image)).await.unwrap();
    assert!(result.as_text().unwrap().contains("\"count\":1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_calls_run_independently() {
    let f = fixture(Script::Faces(1));
    f.bridge.init_detector().unwrap();
    let image = f.image.to_string_lossy().into_owned();
    let bridge = Arc::new(f.bridge);

    let tasks: Vec<_> = (0..8)
        .map(|_| tokio::spawn(call_async(bridge.clone(), BridgeCall::detect_face(image.clone()))))
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
}

#[tokio::test]
async fn test_spawn_with_promise() {
    let bridge = Arc::new(NativeBridge::new(ScriptedBackend::new(Script::Faces(0))));
    let promise = RecordingPromise::default();

    spawn_with_promise(
        &tokio::runtime::Handle::current(),
        bridge,
        BridgeCall::reverse_text("async"),
        promise.clone(),
    )
    .await
    .unwrap();

    assert_eq!(promise.settlements(), vec![Settled::Resolved(text("cnysa"))]);
}
