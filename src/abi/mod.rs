//! ABI document model and type registry
//!
//! An [`AbiDocument`] is the caller-supplied interface description of a
//! contract: its callable endpoints plus the named struct/enum types their
//! inputs and outputs refer to. The document is immutable once loaded and is
//! only ever borrowed by the codec for the duration of one encode/decode
//! call. Composite type strings (`tuple<…>`, `variadic<…>`, `List<…>`,
//! `Option:…`) are parsed syntactically and never looked up in the type map.

pub mod decode;
pub mod encode;
pub mod value;

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Type-name prefix marking an optional value (`Option:u64`).
pub(crate) const OPTION_PREFIX: &str = "Option:";

/// A contract interface description: endpoints plus named type definitions.
#[derive(Debug, Clone, Deserialize)]
pub struct AbiDocument {
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub types: HashMap<String, TypeDefinition>,
}

impl AbiDocument {
    /// Parse an ABI document from its JSON form.
    ///
    /// Fails with [`Error::Abi`] when the JSON is malformed or the document
    /// declares no endpoints at all.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(json)
            .map_err(|e| Error::Abi(format!("invalid ABI document: {e}")))?;
        if doc.endpoints.is_empty() {
            return Err(Error::Abi("ABI document declares no endpoints".to_string()));
        }
        Ok(doc)
    }

    /// Look up an endpoint by name.
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Look up a named type definition.
    pub fn type_def(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// Return a scratch copy of this document with one extra type entry.
    ///
    /// The decoder uses this to inject synthesized tuple structs without
    /// mutating the caller's document.
    pub(crate) fn with_type(&self, name: &str, def: TypeDefinition) -> AbiDocument {
        let mut scratch = self.clone();
        scratch.types.insert(name.to_string(), def);
        scratch
    }
}

/// One named, callable contract function.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub name: String,
    #[serde(default)]
    pub mutability: EndpointMutability,
    #[serde(default)]
    pub inputs: Vec<EndpointInput>,
    #[serde(default)]
    pub outputs: Vec<EndpointOutput>,
}

/// Whether an endpoint changes on-chain state.
///
/// `Readonly` endpoints are executed as synchronous queries (no transaction,
/// no fee); `Mutable` endpoints require a broadcast transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointMutability {
    Readonly,
    Mutable,
}

impl Default for EndpointMutability {
    fn default() -> Self {
        EndpointMutability::Mutable
    }
}

/// A declared endpoint input: name plus ABI type string.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointInput {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A declared endpoint output: ABI type string plus optional name.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointOutput {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A named type definition, tagged by kind.
///
/// Any other declared kind is rejected while parsing the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TypeDefinition {
    Struct { fields: Vec<StructField> },
    Enum { variants: Vec<EnumVariant> },
}

/// One ordered field of a struct type.
#[derive(Debug, Clone, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// One variant of an enum type.
#[derive(Debug, Clone, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub discriminant: u64,
}

/// Extract the inner type of a generic wrapper: `("List<u64>", "List")` yields
/// `Some("u64")`. Returns `None` when `s` is not that wrapper.
pub(crate) fn generic_inner<'a>(s: &'a str, head: &str) -> Option<&'a str> {
    s.strip_prefix(head)?
        .strip_prefix('<')?
        .strip_suffix('>')
}

/// Split a comma-separated type list at nesting depth zero:
/// `"u64,List<tuple<u32,bool>>"` yields `["u64", "List<tuple<u32,bool>>"]`.
pub(crate) fn split_top_level(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in args.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ABI: &str = r#"{
        "endpoints": [
            {
                "name": "getReserves",
                "mutability": "readonly",
                "inputs": [],
                "outputs": [{"type": "Reserves"}]
            },
            {
                "name": "swap",
                "mutability": "mutable",
                "inputs": [
                    {"name": "amount_in", "type": "BigUint"},
                    {"name": "min_out", "type": "BigUint"}
                ],
                "outputs": []
            }
        ],
        "types": {
            "Reserves": {
                "type": "struct",
                "fields": [
                    {"name": "first", "type": "BigUint"},
                    {"name": "second", "type": "BigUint"}
                ]
            },
            "SwapKind": {
                "type": "enum",
                "variants": [
                    {"name": "ExactIn", "discriminant": 0},
                    {"name": "ExactOut", "discriminant": 1}
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_document() {
        let doc = AbiDocument::from_json(SAMPLE_ABI).unwrap();
        assert_eq!(doc.endpoints.len(), 2);

        let ep = doc.endpoint("getReserves").unwrap();
        assert_eq!(ep.mutability, EndpointMutability::Readonly);
        assert_eq!(ep.outputs.len(), 1);

        assert!(matches!(
            doc.type_def("Reserves"),
            Some(TypeDefinition::Struct { .. })
        ));
        assert!(matches!(
            doc.type_def("SwapKind"),
            Some(TypeDefinition::Enum { .. })
        ));
        assert!(doc.type_def("Missing").is_none());
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(AbiDocument::from_json(r#"{"endpoints": [], "types": {}}"#).is_err());
        assert!(AbiDocument::from_json("not json").is_err());
    }

    #[test]
    fn test_unknown_type_kind_rejected() {
        let bad = r#"{
            "endpoints": [{"name": "f", "inputs": [], "outputs": []}],
            "types": {"T": {"type": "union", "fields": []}}
        }"#;
        assert!(AbiDocument::from_json(bad).is_err());
    }

    #[test]
    fn test_with_type_does_not_mutate_original() {
        let doc = AbiDocument::from_json(SAMPLE_ABI).unwrap();
        let scratch = doc.with_type(
            "Extra",
            TypeDefinition::Struct { fields: vec![] },
        );
        assert!(scratch.type_def("Extra").is_some());
        assert!(doc.type_def("Extra").is_none());
    }

    #[test]
    fn test_generic_inner() {
        assert_eq!(generic_inner("List<u64>", "List"), Some("u64"));
        assert_eq!(
            generic_inner("tuple<u64,BigUint>", "tuple"),
            Some("u64,BigUint")
        );
        assert_eq!(generic_inner("variadic<List<u8>>", "variadic"), Some("List<u8>"));
        assert_eq!(generic_inner("u64", "List"), None);
        assert_eq!(generic_inner("Listing", "List"), None);
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(split_top_level("u64,bool"), vec!["u64", "bool"]);
        assert_eq!(
            split_top_level("u64,List<tuple<u32,bool>>,BigUint"),
            vec!["u64", "List<tuple<u32,bool>>", "BigUint"]
        );
        assert!(split_top_level("").is_empty());
    }
}
