//! Klever SDK for Rust
//!
//! A Rust SDK for calling smart contracts on the Klever chain: ABI-driven
//! argument encoding, call-data assembly, transaction lifecycle monitoring,
//! and typed return-value decoding.
//!
//! Wallets and nodes are external collaborators behind two narrow seams:
//! a [`WalletProvider`] signs and broadcasts prepared envelopes, and the
//! [`KleverClient`] consumes the node's REST surface. The codec itself is
//! pure and synchronous: an [`AbiDocument`] in, hex/base64 encodings out.
//!
//! # Example
//!
//! ```rust,ignore
//! use klever_sdk::{
//!     AbiDocument, KleverClient, MonitorConfig, NetworkConfig, Value,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> klever_sdk::Result<()> {
//!     let abi = AbiDocument::from_json(include_str!("../pair.abi.json"))?;
//!     let wallet = my_extension_bridge(); // implements WalletProvider
//!     let client = KleverClient::new(wallet, NetworkConfig::mainnet())?;
//!
//!     // State-changing call: encode, broadcast, monitor
//!     let mut record = client
//!         .invoke(&abi, "klv1contract…", "swap", &[Value::U64(42), Value::Bool(true)])
//!         .await?;
//!     let outcome = client
//!         .wait_for(
//!             &mut record,
//!             MonitorConfig::new(Duration::from_secs(4), Duration::from_secs(120)),
//!         )
//!         .await?;
//!
//!     // Read-only query: decode against the ABI
//!     let rate = client
//!         .query_endpoint(&abi, "klv1contract…", "getRate", &[])
//!         .await?;
//!     println!("confirmed: {}, rate: {rate:?}", outcome.is_confirmed());
//!     Ok(())
//! }
//! ```

pub mod abi;
pub mod call;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod monitor;
pub mod wallet;

// Re-export main types for convenience
pub use abi::value::{DecodedValue, EncodedArg, Value};
pub use abi::{AbiDocument, Endpoint, EndpointMutability, TypeDefinition};
pub use client::{
    AccountInfo, KleverClient, LogEvent, QueryResponse, ScQuery, TransactionDetail, TransactionLog,
};
pub use config::NetworkConfig;
pub use error::{Error, Result};
pub use monitor::{
    MonitorConfig, MonitorHandle, TransactionFetcher, TransactionMonitor, TransactionOutcome,
    TransactionRecord, TransactionStatus, TransactionUpdate,
};
pub use wallet::{TransactionEnvelope, WalletProvider};
