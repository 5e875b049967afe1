//! Dynamic call description
//!
//! Hosts that marshal calls generically (by operation name plus an argument
//! list) use [`BridgeCall`]. Operation names match the TurboModule spec the
//! JavaScript side was generated from.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};

/// Operations callable across the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "testCall")]
    TestCall,
    #[serde(rename = "reverseString")]
    ReverseText,
    #[serde(rename = "addNumbers")]
    AddNumbers,
    #[serde(rename = "initFaceDetector")]
    InitDetector,
    #[serde(rename = "detectFace")]
    DetectFace,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::TestCall,
        Operation::ReverseText,
        Operation::AddNumbers,
        Operation::InitDetector,
        Operation::DetectFace,
    ];

    /// Host-side method name
    pub fn name(self) -> &'static str {
        match self {
            Operation::TestCall => "testCall",
            Operation::ReverseText => "reverseString",
            Operation::AddNumbers => "addNumbers",
            Operation::InitDetector => "initFaceDetector",
            Operation::DetectFace => "detectFace",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Number of arguments the operation takes
    pub fn arity(self) -> usize {
        match self {
            Operation::TestCall | Operation::InitDetector => 0,
            Operation::ReverseText | Operation::DetectFace => 1,
            Operation::AddNumbers => 2,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value crossing the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeValue {
    Null,
    Number(f64),
    Text(String),
}

impl BridgeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            BridgeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            BridgeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            BridgeValue::Null => "null",
            BridgeValue::Number(_) => "number",
            BridgeValue::Text(_) => "string",
        }
    }
}

impl From<String> for BridgeValue {
    fn from(s: String) -> Self {
        BridgeValue::Text(s)
    }
}

impl From<&str> for BridgeValue {
    fn from(s: &str) -> Self {
        BridgeValue::Text(s.to_string())
    }
}

impl From<f64> for BridgeValue {
    fn from(n: f64) -> Self {
        BridgeValue::Number(n)
    }
}

/// One invocation: operation plus ordered arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeCall {
    pub operation: Operation,
    #[serde(default)]
    pub args: Vec<BridgeValue>,
}

impl BridgeCall {
    pub fn new(operation: Operation, args: Vec<BridgeValue>) -> Self {
        Self { operation, args }
    }

    /// Build a call from a host method name
    pub fn by_name(name: &str, args: Vec<BridgeValue>) -> Result<Self> {
        let operation = Operation::from_name(name)
            .ok_or_else(|| BridgeError::InvalidInput(format!("Unknown operation: {name}")))?;
        Ok(Self::new(operation, args))
    }

    pub fn test_call() -> Self {
        Self::new(Operation::TestCall, Vec::new())
    }

    pub fn reverse_text(input: impl Into<String>) -> Self {
        Self::new(Operation::ReverseText, vec![BridgeValue::Text(input.into())])
    }

    pub fn add_numbers(a: f64, b: f64) -> Self {
        Self::new(Operation::AddNumbers, vec![a.into(), b.into()])
    }

    pub fn init_detector() -> Self {
        Self::new(Operation::InitDetector, Vec::new())
    }

    pub fn detect_face(image_path: impl Into<String>) -> Self {
        Self::new(Operation::DetectFace, vec![BridgeValue::Text(image_path.into())])
    }

    pub(crate) fn check_arity(&self) -> Result<()> {
        let expected = self.operation.arity();
        if self.args.len() != expected {
            return Err(BridgeError::InvalidInput(format!(
                "{} expects {} argument(s), got {}",
                self.operation,
                expected,
                self.args.len()
            )));
        }
        Ok(())
    }

    pub(crate) fn text_arg(&self, index: usize) -> Result<&str> {
        let value = self.arg(index)?;
        value.as_text().ok_or_else(|| self.type_error(index, "string", value))
    }

    pub(crate) fn number_arg(&self, index: usize) -> Result<f64> {
        let value = self.arg(index)?;
        value.as_number().ok_or_else(|| self.type_error(index, "number", value))
    }

    fn arg(&self, index: usize) -> Result<&BridgeValue> {
        self.args.get(index).ok_or_else(|| {
            BridgeError::InvalidInput(format!("{} is missing argument {}", self.operation, index))
        })
    }

    fn type_error(&self, index: usize, expected: &str, got: &BridgeValue) -> BridgeError {
        BridgeError::InvalidInput(format!(
            "{} argument {} must be a {}, got {}",
            self.operation,
            index,
            expected,
            got.kind()
        ))
    }
}
