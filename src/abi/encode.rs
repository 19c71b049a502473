//! Parameter encoding into the contract wire format
//!
//! Stateless, synchronous functions: a typed [`Value`] plus a declared ABI
//! type string in, canonical hex (and its base64 transport form) out.
//! Top-level integers use minimal big-endian bytes, so zero encodes to the
//! empty string and `u64(42)` encodes to `"2a"`. Encoding never coerces: a
//! range or format violation is a hard [`Error::Encode`].

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use num_bigint::{BigInt, BigUint};

use super::value::{EncodedArg, Value};
use super::OPTION_PREFIX;
use crate::constants::{ADDRESS_BYTES, ADDRESS_HRP};
use crate::error::{Error, Result};

/// Encode a value as the declared ABI type, returning the canonical hex form.
pub fn encode_value(value: &Value, abi_type: &str) -> Result<String> {
    Ok(hex::encode(encode_bytes(value, abi_type)?))
}

/// Encode a value as the declared ABI type, returning the base64 transport
/// form (base64 over the same bytes the hex form describes).
pub fn encode_transport(value: &Value, abi_type: &str) -> Result<String> {
    Ok(BASE64.encode(encode_bytes(value, abi_type)?))
}

/// Encode a value into an [`EncodedArg`] carrying both forms.
pub fn encode_arg(value: &Value, abi_type: &str) -> Result<EncodedArg> {
    let bytes = encode_bytes(value, abi_type)?;
    Ok(EncodedArg {
        abi_type: abi_type.to_string(),
        hex: hex::encode(&bytes),
        base64: BASE64.encode(&bytes),
    })
}

fn encode_bytes(value: &Value, abi_type: &str) -> Result<Vec<u8>> {
    // Option:<T> wraps the inner encoding with a presence byte.
    if let Some(inner_type) = abi_type.strip_prefix(OPTION_PREFIX) {
        return match value {
            Value::Option(None) => Ok(vec![0x00]),
            Value::Option(Some(inner)) => {
                let mut bytes = vec![0x01];
                bytes.extend(encode_bytes(inner, inner_type)?);
                Ok(bytes)
            }
            // a bare value is treated as present
            other => {
                let mut bytes = vec![0x01];
                bytes.extend(encode_bytes(other, inner_type)?);
                Ok(bytes)
            }
        };
    }

    match abi_type {
        "bool" => match value {
            Value::Bool(b) => Ok(vec![if *b { 0x01 } else { 0x00 }]),
            other => Err(mismatch(abi_type, other)),
        },
        "u64" => match value {
            Value::U64(v) => Ok(minimal_unsigned(*v)),
            Value::U32(v) => Ok(minimal_unsigned(*v as u64)),
            other => Err(mismatch(abi_type, other)),
        },
        "u32" => match value {
            Value::U32(v) => Ok(minimal_unsigned(*v as u64)),
            Value::U64(v) => {
                let narrowed = u32::try_from(*v).map_err(|_| {
                    Error::encode(abi_type, v.to_string(), "value out of range for u32")
                })?;
                Ok(minimal_unsigned(narrowed as u64))
            }
            other => Err(mismatch(abi_type, other)),
        },
        "i64" => match value {
            Value::I64(v) => Ok(minimal_signed(*v)),
            Value::I32(v) => Ok(minimal_signed(*v as i64)),
            other => Err(mismatch(abi_type, other)),
        },
        "i32" => match value {
            Value::I32(v) => Ok(minimal_signed(*v as i64)),
            Value::I64(v) => {
                let narrowed = i32::try_from(*v).map_err(|_| {
                    Error::encode(abi_type, v.to_string(), "value out of range for i32")
                })?;
                Ok(minimal_signed(narrowed as i64))
            }
            other => Err(mismatch(abi_type, other)),
        },
        "BigUint" => match value {
            Value::BigUint(v) => Ok(big_uint_bytes(v)),
            Value::U64(v) => Ok(minimal_unsigned(*v)),
            Value::U32(v) => Ok(minimal_unsigned(*v as u64)),
            other => Err(mismatch(abi_type, other)),
        },
        "BigInt" => match value {
            Value::BigInt(v) => Ok(big_int_bytes(v)),
            Value::BigUint(v) => Ok(big_uint_bytes(v)),
            Value::I64(v) => Ok(minimal_signed(*v)),
            Value::I32(v) => Ok(minimal_signed(*v as i64)),
            Value::U64(v) => Ok(minimal_unsigned(*v)),
            Value::U32(v) => Ok(minimal_unsigned(*v as u64)),
            other => Err(mismatch(abi_type, other)),
        },
        "Address" => match value {
            Value::Address(addr) => decode_address(addr),
            other => Err(mismatch(abi_type, other)),
        },
        "ManagedBuffer" | "bytes" | "TokenIdentifier" => match value {
            Value::Buffer(bytes) => Ok(bytes.clone()),
            other => Err(mismatch(abi_type, other)),
        },
        unknown => Err(Error::encode(
            unknown,
            format!("{value:?}"),
            "unsupported ABI type for encoding",
        )),
    }
}

fn mismatch(abi_type: &str, value: &Value) -> Error {
    Error::encode(
        abi_type,
        format!("{value:?}"),
        format!("value of kind '{}' does not match the declared type", value.kind()),
    )
}

/// Bech32-decode an address string, enforcing the chain prefix and payload
/// length.
fn decode_address(addr: &str) -> Result<Vec<u8>> {
    let (hrp, bytes) = bech32::decode(addr)
        .map_err(|e| Error::encode("Address", addr, format!("invalid bech32 address: {e}")))?;
    if hrp.as_str() != ADDRESS_HRP {
        return Err(Error::encode(
            "Address",
            addr,
            format!("address prefix must be '{ADDRESS_HRP}', got '{}'", hrp.as_str()),
        ));
    }
    if bytes.len() != ADDRESS_BYTES {
        return Err(Error::encode(
            "Address",
            addr,
            format!("address payload must be {ADDRESS_BYTES} bytes, got {}", bytes.len()),
        ));
    }
    Ok(bytes)
}

/// Minimal big-endian bytes of an unsigned integer; zero is empty.
fn minimal_unsigned(v: u64) -> Vec<u8> {
    if v == 0 {
        return Vec::new();
    }
    let bytes = v.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(7);
    bytes[first..].to_vec()
}

/// Minimal two's-complement big-endian bytes of a signed integer; zero is
/// empty.
fn minimal_signed(v: i64) -> Vec<u8> {
    if v == 0 {
        return Vec::new();
    }
    BigInt::from(v).to_signed_bytes_be()
}

fn big_uint_bytes(v: &BigUint) -> Vec<u8> {
    let bytes = v.to_bytes_be();
    if bytes == [0] {
        Vec::new()
    } else {
        bytes
    }
}

fn big_int_bytes(v: &BigInt) -> Vec<u8> {
    let bytes = v.to_signed_bytes_be();
    if bytes == [0] {
        Vec::new()
    } else {
        bytes
    }
}
