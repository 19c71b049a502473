//! Error types for the Klever SDK
//!
//! Encode/decode/ABI errors are programmer-input errors and carry enough
//! detail (offending type, value, endpoint) to fix the call site. Network
//! and timeout errors come out of the client and the transaction monitor.

use std::time::Duration;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors surfaced by the SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// A value cannot be encoded as the declared ABI type.
    #[error("cannot encode {value:?} as {abi_type}: {reason}")]
    Encode {
        abi_type: String,
        value: String,
        reason: String,
    },

    /// Raw return data cannot be decoded as the declared ABI type.
    #[error("cannot decode {type_name}: {reason}")]
    Decode { type_name: String, reason: String },

    /// The ABI document is missing, malformed, or does not declare what the
    /// caller asked for.
    #[error("ABI error: {0}")]
    Abi(String),

    /// The node is unreachable or answered with a non-2xx status.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The monitor exceeded its configured deadline without observing a
    /// terminal transaction status.
    #[error("transaction {hash} not finalized within {timeout:?}")]
    Timeout { hash: String, timeout: Duration },
}

impl Error {
    pub(crate) fn encode(
        abi_type: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Encode {
            abi_type: abi_type.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Decode {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}
