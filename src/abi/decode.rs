//! Return-value decoding
//!
//! Stateless, recursive decoding of raw hex return data against an
//! [`AbiDocument`]. Dispatch order for a type string: `Option:` wrapper,
//! `variadic<…>` (transparent), `List<…>` (count-prefixed), `tuple<…>`
//! (synthesized as an anonymous struct in a scratch copy of the document),
//! then registry lookup (struct or enum), then the decoder-known primitives.
//!
//! Two byte layouts are in play. Top-level values occupy the whole slice and
//! integers are minimal big-endian. Nested values (struct fields, list items)
//! are cursor-consumed left to right: fixed-width integers, one presence or
//! discriminant byte for options/enums, and a u32 length prefix for
//! variable-size data.

use num_bigint::{BigInt, BigUint};

use super::value::{DecodedValue, Value};
use super::{
    generic_inner, split_top_level, AbiDocument, EnumVariant, StructField, TypeDefinition,
    OPTION_PREFIX,
};
use crate::constants::{ADDRESS_BYTES, ADDRESS_HRP};
use crate::error::{Error, Result};

/// Reserved registry key for synthesized tuple structs.
const TUPLE_TYPE: &str = "tuple#synthesized";

/// Decode the raw hex return value of one endpoint.
///
/// Zero declared outputs yield `Ok(None)`; exactly one output is decoded
/// recursively; more than one output is an unsupported-multi-output
/// [`Error::Decode`].
pub fn decode_return(
    doc: &AbiDocument,
    hex_value: &str,
    endpoint_name: &str,
) -> Result<Option<DecodedValue>> {
    let endpoint = doc
        .endpoint(endpoint_name)
        .ok_or_else(|| Error::Abi(format!("endpoint '{endpoint_name}' not found in ABI")))?;
    match endpoint.outputs.len() {
        0 => Ok(None),
        1 => {
            let abi_type = endpoint.outputs[0].type_name.clone();
            let value = decode_value(doc, hex_value, &abi_type)?;
            Ok(Some(DecodedValue {
                abi_type,
                value,
                raw: hex_value.to_string(),
            }))
        }
        n => Err(Error::decode(
            endpoint_name,
            format!("unsupported multi-output decode: endpoint declares {n} outputs"),
        )),
    }
}

/// Decode a top-level hex value as the given ABI type string.
pub fn decode_value(doc: &AbiDocument, hex_value: &str, type_name: &str) -> Result<Value> {
    let mut path = Vec::new();
    decode_top(doc, hex_value, type_name, &mut path)
}

/// Decode a top-level hex value as a decoder-known primitive, without a type
/// registry. Supports the `Option:` wrapper.
pub fn decode_base_value(hex_value: &str, abi_type: &str) -> Result<Value> {
    if let Some(inner) = abi_type.strip_prefix(OPTION_PREFIX) {
        if hex_value.is_empty() || hex_value == "00" {
            return Ok(Value::Option(None));
        }
        if let Some(rest) = hex_value.strip_prefix("01") {
            return Ok(Value::Option(Some(Box::new(decode_base_value(rest, inner)?))));
        }
        return Err(Error::decode(abi_type, "invalid Option presence byte"));
    }
    decode_primitive_top(hex_value, abi_type)
}

fn decode_top(
    doc: &AbiDocument,
    hex_value: &str,
    ty: &str,
    path: &mut Vec<String>,
) -> Result<Value> {
    if let Some(inner) = ty.strip_prefix(OPTION_PREFIX) {
        if hex_value.is_empty() || hex_value == "00" {
            return Ok(Value::Option(None));
        }
        if let Some(rest) = hex_value.strip_prefix("01") {
            let value = decode_top(doc, rest, inner, path)?;
            return Ok(Value::Option(Some(Box::new(value))));
        }
        return Err(Error::decode(ty, "invalid Option presence byte"));
    }

    // variadic is transparent to single-value decoding
    if let Some(inner) = generic_inner(ty, "variadic") {
        return decode_top(doc, hex_value, inner, path);
    }

    if let Some(inner) = generic_inner(ty, "List") {
        let bytes = decode_hex(hex_value, ty)?;
        let mut cur = ByteCursor::new(&bytes);
        let count = cur.take_u32(ty)?;
        let mut items = Vec::with_capacity(count as usize);
        for _ in 0..count {
            items.push(decode_nested(doc, &mut cur, inner, path)?);
        }
        cur.finish(ty)?;
        return Ok(Value::List(items));
    }

    if let Some(fields) = tuple_fields(ty) {
        let scratch = doc.with_type(TUPLE_TYPE, TypeDefinition::Struct { fields });
        return decode_top(&scratch, hex_value, TUPLE_TYPE, path);
    }

    match doc.type_def(ty) {
        Some(TypeDefinition::Struct { fields }) => {
            enter_type(ty, path)?;
            let bytes = decode_hex(hex_value, ty)?;
            let mut cur = ByteCursor::new(&bytes);
            let value = decode_struct_fields(doc, fields, &mut cur, path)?;
            cur.finish(ty)?;
            leave_type(ty, path);
            Ok(value)
        }
        Some(TypeDefinition::Enum { variants }) => {
            let bytes = decode_hex(hex_value, ty)?;
            if bytes.len() > 8 {
                return Err(Error::decode(ty, "enum discriminant exceeds 8 bytes"));
            }
            resolve_variant(ty, variants, be_u64(&bytes))
        }
        None => decode_primitive_top(hex_value, ty),
    }
}

fn decode_nested(
    doc: &AbiDocument,
    cur: &mut ByteCursor<'_>,
    ty: &str,
    path: &mut Vec<String>,
) -> Result<Value> {
    if let Some(inner) = ty.strip_prefix(OPTION_PREFIX) {
        return match cur.take(1, ty)?[0] {
            0x00 => Ok(Value::Option(None)),
            0x01 => {
                let value = decode_nested(doc, cur, inner, path)?;
                Ok(Value::Option(Some(Box::new(value))))
            }
            tag => Err(Error::decode(ty, format!("invalid Option presence byte {tag:#04x}"))),
        };
    }

    if let Some(inner) = generic_inner(ty, "variadic") {
        return decode_nested(doc, cur, inner, path);
    }

    if let Some(inner) = generic_inner(ty, "List") {
        let count = cur.take_u32(ty)?;
        let mut items = Vec::with_capacity(count as usize);
        for _ in 0..count {
            items.push(decode_nested(doc, cur, inner, path)?);
        }
        return Ok(Value::List(items));
    }

    if let Some(fields) = tuple_fields(ty) {
        let scratch = doc.with_type(TUPLE_TYPE, TypeDefinition::Struct { fields });
        return decode_nested(&scratch, cur, TUPLE_TYPE, path);
    }

    match doc.type_def(ty) {
        Some(TypeDefinition::Struct { fields }) => {
            enter_type(ty, path)?;
            let value = decode_struct_fields(doc, fields, cur, path)?;
            leave_type(ty, path);
            Ok(value)
        }
        Some(TypeDefinition::Enum { variants }) => {
            let discriminant = cur.take(1, ty)?[0] as u64;
            resolve_variant(ty, variants, discriminant)
        }
        None => decode_primitive_nested(cur, ty),
    }
}

fn decode_struct_fields(
    doc: &AbiDocument,
    fields: &[StructField],
    cur: &mut ByteCursor<'_>,
    path: &mut Vec<String>,
) -> Result<Value> {
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        let value = decode_nested(doc, cur, &field.type_name, path)?;
        out.push((field.name.clone(), value));
    }
    Ok(Value::Struct(out))
}

fn decode_primitive_top(hex_value: &str, ty: &str) -> Result<Value> {
    // Big integers never fail here: undecodable input falls back to raw hex.
    match ty {
        "BigUint" => {
            return Ok(match hex::decode(hex_value) {
                Ok(bytes) => Value::BigUint(BigUint::from_bytes_be(&bytes)),
                Err(_) => Value::Raw(hex_value.to_string()),
            });
        }
        "BigInt" => {
            return Ok(match hex::decode(hex_value) {
                Ok(bytes) => Value::BigInt(BigInt::from_signed_bytes_be(&bytes)),
                Err(_) => Value::Raw(hex_value.to_string()),
            });
        }
        _ => {}
    }

    let bytes = decode_hex(hex_value, ty)?;
    match ty {
        "u64" => {
            if bytes.len() > 8 {
                return Err(Error::decode(ty, "value exceeds 8 bytes"));
            }
            Ok(Value::U64(be_u64(&bytes)))
        }
        "u32" => {
            if bytes.len() > 4 {
                return Err(Error::decode(ty, "value exceeds 4 bytes"));
            }
            Ok(Value::U32(be_u64(&bytes) as u32))
        }
        "i64" => Ok(Value::I64(be_i64(&bytes, ty)?)),
        "i32" => {
            let wide = be_i64(&bytes, ty)?;
            let narrow = i32::try_from(wide)
                .map_err(|_| Error::decode(ty, "value out of range for i32"))?;
            Ok(Value::I32(narrow))
        }
        "bool" => Ok(Value::Bool(bytes.iter().any(|b| *b != 0))),
        "Address" => encode_address(&bytes, ty),
        "ManagedBuffer" | "bytes" | "TokenIdentifier" => Ok(Value::Buffer(bytes)),
        unknown => Err(Error::decode(unknown, "unknown type name")),
    }
}

fn decode_primitive_nested(cur: &mut ByteCursor<'_>, ty: &str) -> Result<Value> {
    match ty {
        "u64" => Ok(Value::U64(be_u64(cur.take(8, ty)?))),
        "u32" => Ok(Value::U32(be_u64(cur.take(4, ty)?) as u32)),
        "i64" => {
            let bytes = cur.take(8, ty)?;
            Ok(Value::I64(be_i64(bytes, ty)?))
        }
        "i32" => {
            let bytes = cur.take(4, ty)?;
            Ok(Value::I32(be_i64(bytes, ty)? as i32))
        }
        "bool" => Ok(Value::Bool(cur.take(1, ty)?[0] != 0)),
        "Address" => {
            let bytes = cur.take(ADDRESS_BYTES, ty)?;
            encode_address(bytes, ty)
        }
        "BigUint" => {
            let bytes = cur.take_len_prefixed(ty)?;
            Ok(Value::BigUint(BigUint::from_bytes_be(bytes)))
        }
        "BigInt" => {
            let bytes = cur.take_len_prefixed(ty)?;
            Ok(Value::BigInt(BigInt::from_signed_bytes_be(bytes)))
        }
        "ManagedBuffer" | "bytes" | "TokenIdentifier" => {
            let bytes = cur.take_len_prefixed(ty)?;
            Ok(Value::Buffer(bytes.to_vec()))
        }
        unknown => Err(Error::decode(unknown, "unknown type name")),
    }
}

/// Anonymous struct fields (`_0`, `_1`, …) for a `tuple<…>` type string.
fn tuple_fields(ty: &str) -> Option<Vec<StructField>> {
    let inner = generic_inner(ty, "tuple")?;
    Some(
        split_top_level(inner)
            .into_iter()
            .enumerate()
            .map(|(i, type_name)| StructField {
                name: format!("_{i}"),
                type_name,
            })
            .collect(),
    )
}

fn resolve_variant(ty: &str, variants: &[EnumVariant], discriminant: u64) -> Result<Value> {
    variants
        .iter()
        .find(|v| v.discriminant == discriminant)
        .map(|v| Value::Enum {
            name: v.name.clone(),
            discriminant,
        })
        .ok_or_else(|| {
            Error::decode(ty, format!("unresolvable enum discriminant {discriminant}"))
        })
}

/// Track named types on the active decode path to reject cycles. Synthesized
/// tuple structs all share the reserved name and are exempt: they can nest
/// but never reference themselves.
fn enter_type(ty: &str, path: &mut Vec<String>) -> Result<()> {
    if ty == TUPLE_TYPE {
        return Ok(());
    }
    if path.iter().any(|p| p == ty) {
        return Err(Error::decode(
            ty,
            "recursive type definition: the type references itself",
        ));
    }
    path.push(ty.to_string());
    Ok(())
}

fn leave_type(ty: &str, path: &mut Vec<String>) {
    if ty != TUPLE_TYPE {
        path.pop();
    }
}

fn decode_hex(hex_value: &str, ty: &str) -> Result<Vec<u8>> {
    hex::decode(hex_value).map_err(|e| Error::decode(ty, format!("malformed hex: {e}")))
}

fn be_u64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

/// Sign-extending big-endian read of up to 8 bytes.
fn be_i64(bytes: &[u8], ty: &str) -> Result<i64> {
    if bytes.len() > 8 {
        return Err(Error::decode(ty, "value exceeds 8 bytes"));
    }
    if bytes.is_empty() {
        return Ok(0);
    }
    let fill = if bytes[0] & 0x80 != 0 { 0xff } else { 0x00 };
    let mut buf = [fill; 8];
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    Ok(i64::from_be_bytes(buf))
}

fn encode_address(bytes: &[u8], ty: &str) -> Result<Value> {
    if bytes.len() != ADDRESS_BYTES {
        return Err(Error::decode(
            ty,
            format!("address payload must be {ADDRESS_BYTES} bytes, got {}", bytes.len()),
        ));
    }
    let hrp = bech32::Hrp::parse(ADDRESS_HRP)
        .map_err(|e| Error::decode(ty, format!("invalid address prefix: {e}")))?;
    let addr = bech32::encode::<bech32::Bech32>(hrp, bytes)
        .map_err(|e| Error::decode(ty, format!("bech32 encoding failed: {e}")))?;
    Ok(Value::Address(addr))
}

/// Cursor over decoded bytes for nested, left-to-right consumption.
struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, ty: &str) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(Error::decode(
                ty,
                format!("unexpected end of data: needed {n} bytes at offset {}", self.pos),
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u32(&mut self, ty: &str) -> Result<u32> {
        let bytes = self.take(4, ty)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take_len_prefixed(&mut self, ty: &str) -> Result<&'a [u8]> {
        let len = self.take_u32(ty)? as usize;
        self.take(len, ty)
    }

    fn finish(&self, ty: &str) -> Result<()> {
        if self.pos != self.buf.len() {
            return Err(Error::decode(
                ty,
                format!("{} trailing bytes after decoding", self.buf.len() - self.pos),
            ));
        }
        Ok(())
    }
}
