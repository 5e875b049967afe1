//! Stateless bridge operations

use crate::error::{BridgeError, Result};

/// Reply to the connectivity ping
pub const TEST_CALL_MESSAGE: &str = "Native call successful!";

pub fn test_call() -> String {
    TEST_CALL_MESSAGE.to_string()
}

/// Reverse the character order of `input`
///
/// Works on Unicode scalar values, so multi-byte characters stay intact.
pub fn reverse_text(input: &str) -> String {
    input.chars().rev().collect()
}

/// Add two host numbers
///
/// Host numbers are IEEE doubles. Non-finite inputs and sums that overflow
/// to infinity are rejected rather than passed back as `Infinity`/`NaN`.
pub fn add_numbers(a: f64, b: f64) -> Result<f64> {
    if !a.is_finite() || !b.is_finite() {
        return Err(BridgeError::InvalidInput(format!(
            "addNumbers expects finite numbers, got {a} and {b}"
        )));
    }

    let sum = a + b;
    if !sum.is_finite() {
        return Err(BridgeError::InvalidInput(format!(
            "addNumbers overflow: {a} + {b}"
        )));
    }
    Ok(sum)
}
