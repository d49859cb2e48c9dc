//! Policy parameters supplied by callers.
//!
//! A session is constrained by one of two policy kinds:
//!
//! - **spend limit** - per-token allowance the session key may spend via `transfer`
//! - **sudo** - unrestricted per-selector access, granted for token transfers
//!   and for a fixed allow-list of swap routers
//!
//! # Example
//!
//! ```
//! use smartsession_types::PolicyParams;
//!
//! let json = r#"{"policy":"spendlimit","tokenLimits":[{"token":"0x0000000000000000000000000000000000000001","amount":"0x3e8"}]}"#;
//! let params: PolicyParams = serde_json::from_str(json).unwrap();
//! assert!(matches!(params, PolicyParams::SpendLimit { .. }));
//! ```

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of [`PolicyParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyType {
    #[serde(rename = "spendlimit")]
    SpendLimit,
    #[serde(rename = "sudo")]
    Sudo,
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyType::SpendLimit => f.write_str("spendlimit"),
            PolicyType::Sudo => f.write_str("sudo"),
        }
    }
}

/// Allowance for a single token, in the token's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLimit {
    pub token: Address,
    pub amount: U256,
}

/// Sudo access flags for a single token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccess {
    pub token: Address,
    /// Grants `transfer` on the token contract.
    pub is_transfer_enabled: bool,
    /// Grants `approve` on the token contract and the swap router allow-list.
    pub is_swap_enabled: bool,
}

/// Policy configuration for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy")]
pub enum PolicyParams {
    #[serde(rename = "spendlimit", rename_all = "camelCase")]
    SpendLimit { token_limits: Vec<TokenLimit> },
    #[serde(rename = "sudo", rename_all = "camelCase")]
    Sudo { token_access: Vec<TokenAccess> },
}

impl PolicyParams {
    pub fn policy_type(&self) -> PolicyType {
        match self {
            PolicyParams::SpendLimit { .. } => PolicyType::SpendLimit,
            PolicyParams::Sudo { .. } => PolicyType::Sudo,
        }
    }
}

/// A token as seen by entitlement reads: its address and decimals for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
}
