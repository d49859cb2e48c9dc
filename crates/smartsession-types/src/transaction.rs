//! The call shape produced for on-chain submission.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// A call the account should execute: `to.call{value}(data)`.
///
/// This is the only output type handed to callers for submission; the engine
/// never broadcasts anything itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Transaction {
    /// A zero-value call to `to` with the given calldata.
    pub fn call<D: Into<Bytes>>(to: Address, data: D) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data: data.into(),
        }
    }
}
