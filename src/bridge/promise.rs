//! Promise-style and async calling conventions
//!
//! Both are thin layers over [`NativeBridge::call`]. A [`Promise`] is
//! consumed when it settles, so the type system guarantees it can settle at
//! most once; [`invoke_deferred`] guarantees it settles at least once, even
//! when building the call panics.

use super::{BridgeCall, BridgeValue, NativeBridge};
use crate::error::BridgeFailure;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Outcome of one bridge call
pub type CallOutcome = std::result::Result<BridgeValue, BridgeFailure>;

/// Host-side deferred result
pub trait Promise {
    fn resolve(self, value: BridgeValue);

    fn reject(self, code: &str, message: &str);

    /// Settle with an outcome
    fn settle(self, outcome: CallOutcome)
    where
        Self: Sized,
    {
        match outcome {
            Ok(value) => self.resolve(value),
            Err(failure) => self.reject(&failure.code, &failure.message),
        }
    }
}

/// Run `call` and settle `promise` with the outcome
pub fn invoke_with_promise<P: Promise>(bridge: &NativeBridge, call: BridgeCall, promise: P) {
    invoke_deferred(bridge, move || call, promise)
}

/// Build a call with `setup`, run it, and settle `promise`
///
/// A panic in `setup` rejects the promise with `NATIVE_FAULT`.
pub fn invoke_deferred<P, F>(bridge: &NativeBridge, setup: F, promise: P)
where
    P: Promise,
    F: FnOnce() -> BridgeCall,
{
    let outcome = match panic::catch_unwind(AssertUnwindSafe(setup)) {
        Ok(call) => bridge.call(&call),
        Err(payload) => Err(BridgeFailure::from_panic(payload)),
    };
    promise.settle(outcome);
}

/// Run `call` on a blocking worker and await its outcome
pub async fn call_async(bridge: Arc<NativeBridge>, call: BridgeCall) -> CallOutcome {
    match tokio::task::spawn_blocking(move || bridge.call(&call)).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => Err(BridgeFailure::from_panic(e.into_panic())),
        Err(e) => Err(BridgeFailure::new("NATIVE_FAULT", e.to_string())),
    }
}

/// Run `call` on a blocking worker of `runtime`, settling `promise` there
pub fn spawn_with_promise<P>(
    runtime: &tokio::runtime::Handle,
    bridge: Arc<NativeBridge>,
    call: BridgeCall,
    promise: P,
) -> JoinHandle<()>
where
    P: Promise + Send + 'static,
{
    runtime.spawn_blocking(move || invoke_with_promise(&bridge, call, promise))
}

/// Promise backed by a oneshot channel
#[derive(Debug)]
pub struct ChannelPromise {
    sender: oneshot::Sender<CallOutcome>,
}

/// Create a promise and the receiver its outcome is delivered to
pub fn promise_channel() -> (ChannelPromise, oneshot::Receiver<CallOutcome>) {
    let (sender, receiver) = oneshot::channel();
    (ChannelPromise { sender }, receiver)
}

impl Promise for ChannelPromise {
    fn resolve(self, value: BridgeValue) {
        // Receiver gone means nobody is waiting
        let _ = self.sender.send(Ok(value));
    }

    fn reject(self, code: &str, message: &str) {
        let _ = self.sender.send(Err(BridgeFailure::new(code, message)));
    }
}
