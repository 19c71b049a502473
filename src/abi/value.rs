//! Typed argument and return values
//!
//! [`Value`] is the dynamic value shape shared by the encoder (input) and the
//! decoder (output): a tagged union rather than a trait hierarchy, so both
//! sides dispatch with plain pattern matching.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use num_bigint::{BigInt, BigUint};

use crate::error::{Error, Result};

/// A dynamic ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U32(u32),
    U64(u64),
    I32(i32),
    I64(i64),
    /// Non-negative arbitrary-precision integer
    BigUint(BigUint),
    /// Signed arbitrary-precision integer
    BigInt(BigInt),
    /// Bech32 address string (`klv1…`)
    Address(String),
    /// Arbitrary byte string (`ManagedBuffer`)
    Buffer(Vec<u8>),
    Option(Option<Box<Value>>),
    List(Vec<Value>),
    /// Ordered named fields, in declaration order
    Struct(Vec<(String, Value)>),
    /// Resolved enum variant
    Enum { name: String, discriminant: u64 },
    /// Fallback: raw hex the decoder could not interpret numerically
    Raw(String),
}

impl Value {
    /// Buffer value from raw text (UTF-8 bytes).
    pub fn buffer_from_text(text: impl AsRef<str>) -> Self {
        Value::Buffer(text.as_ref().as_bytes().to_vec())
    }

    /// Buffer value from a hex string.
    pub fn buffer_from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::encode("ManagedBuffer", hex_str, format!("invalid hex: {e}")))?;
        Ok(Value::Buffer(bytes))
    }

    /// Buffer value from a base64 string.
    pub fn buffer_from_base64(b64: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(b64)
            .map_err(|e| Error::encode("ManagedBuffer", b64, format!("invalid base64: {e}")))?;
        Ok(Value::Buffer(bytes))
    }

    /// `BigUint` value from a decimal digit string. Rejects anything that is
    /// not purely digits, including signs.
    pub fn big_uint(digits: &str) -> Result<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::encode(
                "BigUint",
                digits,
                "expected a non-negative decimal digit string",
            ));
        }
        let n = BigUint::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| Error::encode("BigUint", digits, "not a decimal number"))?;
        Ok(Value::BigUint(n))
    }

    /// `BigInt` value from an optionally signed decimal digit string.
    pub fn big_int(digits: &str) -> Result<Self> {
        let unsigned = digits.strip_prefix('-').or_else(|| digits.strip_prefix('+'));
        let body = unsigned.unwrap_or(digits);
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::encode(
                "BigInt",
                digits,
                "expected an optionally signed decimal digit string",
            ));
        }
        let n = BigInt::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| Error::encode("BigInt", digits, "not a decimal number"))?;
        Ok(Value::BigInt(n))
    }

    /// Short tag used in error messages.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::BigUint(_) => "BigUint",
            Value::BigInt(_) => "BigInt",
            Value::Address(_) => "Address",
            Value::Buffer(_) => "ManagedBuffer",
            Value::Option(_) => "Option",
            Value::List(_) => "List",
            Value::Struct(_) => "struct",
            Value::Enum { .. } => "enum",
            Value::Raw(_) => "raw",
        }
    }

    /// Render the value as JSON for display or export.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Value as Json};
        match self {
            Value::Bool(b) => json!(b),
            Value::U32(v) => json!(v),
            Value::U64(v) => json!(v),
            Value::I32(v) => json!(v),
            Value::I64(v) => json!(v),
            // big integers as strings so consumers never lose precision
            Value::BigUint(v) => json!(v.to_string()),
            Value::BigInt(v) => json!(v.to_string()),
            Value::Address(a) => json!(a),
            Value::Buffer(b) => match std::str::from_utf8(b) {
                Ok(s) => json!(s),
                Err(_) => json!(hex::encode(b)),
            },
            Value::Option(inner) => match inner {
                Some(v) => v.to_json(),
                None => Json::Null,
            },
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Struct(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(name, v)| (name.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Enum { name, .. } => json!(name),
            Value::Raw(hex_str) => json!(hex_str),
        }
    }
}

/// One encoded call argument: declared type, canonical hex, and the base64
/// transport form. Derived per encode call, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArg {
    pub abi_type: String,
    pub hex: String,
    pub base64: String,
}

/// A decoded endpoint return value together with the raw hex it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedValue {
    pub abi_type: String,
    pub value: Value,
    pub raw: String,
}

impl DecodedValue {
    /// Unwrap an optional decode result, failing when the endpoint declares
    /// no outputs but the caller expected a value.
    pub fn require(decoded: Option<DecodedValue>, endpoint: &str) -> Result<DecodedValue> {
        decoded.ok_or_else(|| {
            Error::Abi(format!(
                "endpoint '{endpoint}' declares no outputs but a value was expected"
            ))
        })
    }
}
