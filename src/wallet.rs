//! Wallet provider abstraction
//!
//! The SDK never touches keys. A [`WalletProvider`] is the narrow interface
//! an external wallet implements: expose the signer address, and sign and
//! broadcast an already-built [`TransactionEnvelope`]. Browser-extension
//! discovery, key management, and signature schemes all live behind it.

use std::collections::BTreeMap;
use std::future::Future;

use crate::error::Result;

/// An unsigned contract-call transaction, ready for a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    /// Sender address (the wallet's signer)
    pub sender: String,
    /// Contract address the call targets
    pub receiver: String,
    /// Opaque call-data payload (base64 of `func@arg@arg…`)
    pub payload: String,
    /// Assets transferred with the call, KDA id to raw amount
    pub call_value: BTreeMap<String, i64>,
}

impl TransactionEnvelope {
    /// Create an envelope with no attached assets.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            payload: payload.into(),
            call_value: BTreeMap::new(),
        }
    }

    /// Attach an asset amount to the call (raw units).
    pub fn with_call_value(mut self, kda_id: impl Into<String>, amount: i64) -> Self {
        self.call_value.insert(kda_id.into(), amount);
        self
    }
}

/// Trait for signing and broadcasting contract-call transactions
///
/// Implementations are external collaborators (hardware wallets, extension
/// bridges, custodial APIs). The SDK only requires:
/// - `address`: the bech32 signer address used as the transaction sender
/// - `sign_and_broadcast`: submit the envelope and return the transaction
///   hash; broadcast failures surface immediately and are not retried here
pub trait WalletProvider: Send + Sync {
    /// Returns the signer's bech32 address.
    fn address(&self) -> &str;

    /// Signs and broadcasts a transaction, returning its hash.
    fn sign_and_broadcast(
        &self,
        tx: TransactionEnvelope,
    ) -> impl Future<Output = Result<String>> + Send;
}
