//! Status codes returned by the native face detector
//!
//! `0` is success. Failures use the detector's own codes, starting at 10000.

use crate::error::{BridgeError, Result};
use std::ffi::c_int;

pub const OK: c_int = 0;
pub const NOT_INITIALIZED: c_int = 10000;
pub const EMPTY_IMAGE: c_int = 10001;
pub const MISSING_OUTPUTS: c_int = 10002;

pub fn describe(status: c_int) -> &'static str {
    match status {
        OK => "ok",
        NOT_INITIALIZED => "model not initialized",
        EMPTY_IMAGE => "input image is empty or not decodable",
        MISSING_OUTPUTS => "model outputs 'scores'/'boxes' not found",
        _ => "unknown runtime error",
    }
}

/// Turn a detector status into a `Result`
///
/// Any non-zero status is a `NativeFault` naming the failed step.
pub fn check(status: c_int, step: &str) -> Result<()> {
    if status == OK {
        return Ok(());
    }
    Err(BridgeError::NativeFault(format!(
        "{step} failed ({status}): {}",
        describe(status)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status() {
        assert!(check(OK, "Detection").is_ok());
    }

    #[test]
    fn test_detector_codes_are_native_faults() {
        let err = check(EMPTY_IMAGE, "Detection").unwrap_err();
        assert_eq!(err.code(), "NATIVE_FAULT");
        assert!(err.to_string().contains("10001"));
        assert!(err.to_string().contains("empty or not decodable"));

        assert!(check(NOT_INITIALIZED, "Detection")
            .unwrap_err()
            .to_string()
            .contains("not initialized"));
        assert!(check(MISSING_OUTPUTS, "Detection")
            .unwrap_err()
            .to_string()
            .contains("'scores'/'boxes'"));
    }

    #[test]
    fn test_unknown_status() {
        let err = check(-1, "Detection").unwrap_err();
        assert!(err.to_string().contains("unknown runtime error"));
    }
}
