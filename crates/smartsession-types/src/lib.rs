#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for smart-session delegation.
//!
//! This crate holds the chain-agnostic pieces shared by the session engine and
//! its callers:
//!
//! - [`version`] - protocol versions and the migration order between them
//! - [`constants`] - the version-keyed table of module, validator and policy addresses
//! - [`transaction`] - the `{to, value, data}` shape handed to callers for submission
//! - [`policy`] - policy parameters (spend limits, sudo access) and token descriptors
//! - [`reader`] - the read-only contract call facility consumed by the engine
//! - [`signer`] - the digest signer facility consumed by the engine
//! - [`chain`] - a registry of readers keyed by EIP-155 chain id
//! - [`config`] - JSON configuration (version, chain RPCs, constants overrides)
//! - [`units`] - decimal formatting at the presentation boundary

pub mod chain;
pub mod config;
pub mod constants;
pub mod policy;
pub mod reader;
pub mod signer;
pub mod transaction;
pub mod units;
pub mod version;

pub use constants::{ConstantsTable, PolicyAddresses, ProtocolConstants, ValidatorAddresses};
pub use policy::{PolicyParams, PolicyType, Token, TokenAccess, TokenLimit};
pub use transaction::Transaction;
pub use version::ProtocolVersion;
