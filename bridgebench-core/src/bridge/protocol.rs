// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Bridge message types.
//!
//! Every frame carries one [`Message`]. Values crossing the bridge are an
//! opaque tagged union; byte buffers travel base64-encoded so they survive the
//! JSON payload intact.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::types::ObjectId;

/// Correlates a `Call` with its `Return` or `Error`.
pub type CallId = u64;

/// Method names understood by the callee entry point.
pub mod method {
    pub const SEED: &str = "seed";
    pub const GET_BYTES: &str = "get_bytes";
    pub const ECHO: &str = "echo";
    pub const ECHO_BYTES: &str = "echo_bytes";
    pub const COUNTDOWN: &str = "countdown";
    pub const START_COUNTDOWN: &str = "start_countdown";
    pub const CALL_ECHO: &str = "call_echo";
}

/// An opaque value passed through the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    /// An object exported by the sender of the message.
    Ref(ObjectId),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Ref(_) => "ref",
        }
    }

    pub fn into_int(self, method: &'static str) -> BridgeResult<i64> {
        match self {
            Self::Int(v) => Ok(v),
            other => Err(type_mismatch(method, "int", &other)),
        }
    }

    pub fn into_bytes(self, method: &'static str) -> BridgeResult<Vec<u8>> {
        match self {
            Self::Bytes(v) => Ok(v),
            other => Err(type_mismatch(method, "bytes", &other)),
        }
    }

    pub fn into_ref(self, method: &'static str) -> BridgeResult<ObjectId> {
        match self {
            Self::Ref(id) => Ok(id),
            other => Err(type_mismatch(method, "ref", &other)),
        }
    }
}

fn type_mismatch(method: &'static str, expected: &str, actual: &Value) -> BridgeError {
    BridgeError::invalid_argument(
        method,
        format!("expected {}, got {}", expected, actual.kind()),
    )
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Self::Ref(v)
    }
}

/// A single frame payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Invoke `method` on the receiver's object `target`.
    Call {
        id: CallId,
        target: ObjectId,
        method: String,
        args: Vec<Value>,
    },
    /// Successful completion of call `id`.
    Return { id: CallId, result: Value },
    /// Failed completion of call `id`.
    Error { id: CallId, message: String },
}

/// Positional argument list with typed accessors.
pub(crate) struct Args {
    method: &'static str,
    values: std::vec::IntoIter<Value>,
    expected: usize,
}

impl Args {
    /// Check the arity of `values` for `method`.
    pub(crate) fn new(method: &'static str, values: Vec<Value>, expected: usize) -> BridgeResult<Self> {
        if values.len() != expected {
            return Err(BridgeError::invalid_argument(
                method,
                format!("expected {} argument(s), got {}", expected, values.len()),
            ));
        }
        Ok(Self {
            method,
            values: values.into_iter(),
            expected,
        })
    }

    fn next(&mut self) -> BridgeResult<Value> {
        self.values.next().ok_or_else(|| {
            BridgeError::invalid_argument(
                self.method,
                format!("expected {} argument(s)", self.expected),
            )
        })
    }

    pub(crate) fn value(&mut self) -> BridgeResult<Value> {
        self.next()
    }

    pub(crate) fn int(&mut self) -> BridgeResult<i64> {
        let method = self.method;
        self.next()?.into_int(method)
    }

    pub(crate) fn bytes(&mut self) -> BridgeResult<Vec<u8>> {
        let method = self.method;
        self.next()?.into_bytes(method)
    }

    pub(crate) fn object(&mut self) -> BridgeResult<ObjectId> {
        let method = self.method;
        self.next()?.into_ref(method)
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_travel_as_base64() {
        let json = serde_json::to_string(&Value::Bytes(vec![1, 2, 3])).unwrap();
        assert_eq!(json, r#"{"type":"bytes","value":"AQID"}"#);
    }

    #[test]
    fn test_null_has_no_content() {
        let json = serde_json::to_string(&Value::Null).unwrap();
        assert_eq!(json, r#"{"type":"null"}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Null);
    }

    #[test]
    fn test_call_message_shape() {
        let msg = Message::Call {
            id: 7,
            target: ObjectId::entry_point(),
            method: method::COUNTDOWN.to_string(),
            args: vec![Value::Int(3), Value::Ref(ObjectId::new("o1").unwrap())],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "call");
        assert_eq!(json["target"], "entry_point");
        assert_eq!(json["args"][1]["value"], "o1");
    }

    #[test]
    fn test_invalid_ref_rejected() {
        let json = r#"{"type":"ref","value":"not valid"}"#;
        assert!(serde_json::from_str::<Value>(json).is_err());
    }

    #[test]
    fn test_args_arity_and_types() {
        assert!(Args::new("echo", vec![], 1).is_err());

        let mut args = Args::new("get_bytes", vec![Value::Str("10".into())], 1).unwrap();
        let err = args.int().unwrap_err();
        assert!(err.to_string().contains("expected int, got str"));
    }
}
