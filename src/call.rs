//! Call-data assembly
//!
//! A state-changing call travels as one opaque payload:
//! `base64(functionName@hex1@hex2…)`. Arguments are joined in exactly the
//! order supplied; arity and ordering against the ABI are the caller's
//! responsibility. Read-only queries do not use this payload at all — each
//! argument is submitted independently in its transport form.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::abi::value::EncodedArg;
use crate::constants::CALL_ARG_SEPARATOR;

/// Assemble the transaction data payload for a state-changing call.
pub fn build_call_data(function_name: &str, args: &[EncodedArg]) -> String {
    let mut data = String::from(function_name);
    for arg in args {
        data.push(CALL_ARG_SEPARATOR);
        data.push_str(&arg.hex);
    }
    BASE64.encode(data.as_bytes())
}

/// Collect the independent transport-form arguments for a read-only query.
pub fn build_query_args(args: &[EncodedArg]) -> Vec<String> {
    args.iter().map(|arg| arg.base64.clone()).collect()
}
