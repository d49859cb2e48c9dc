#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Smart-session engine for ERC-7579 accounts on EVM chains.
//!
//! An account owner delegates restricted signing authority to a session
//! validator. This crate derives the identifiers the smart-sessions module
//! keys sessions by, encodes and decodes the signature blob the account's
//! validation path consumes, computes the multi-chain digest that enables a
//! session on several chains with one signature, builds the module and policy
//! transactions, and reads back what a session may still do.
//!
//! - [`session`] - session model, permission and action ids, validator resolution
//! - [`policy`] - spend-limit and sudo policy configuration
//! - [`signature`] - USE / ENABLE / UNSAFE_ENABLE signature codec
//! - [`digest`] - EIP-712 multi-chain session digest
//! - [`orchestrator`] - session request shapes and smart-sessions module calls
//! - [`enable`] - multi-chain enable flow
//! - [`module`] - ERC-7579 module install and uninstall
//! - [`entitlements`] - per-token spend allowance and sudo permissions
//! - [`delegation`] - delegated account lifecycle
//! - [`account`] - account plan per kind and protocol version
//!
//! With the `provider` feature, [`provider::ProviderReader`] reads chain state
//! through an alloy provider. With the `signer` feature,
//! [`local_signer::Eip191DigestSigner`] signs digests with a local key.

pub mod abi;
pub mod account;
pub mod delegation;
pub mod digest;
pub mod enable;
pub mod entitlements;
pub mod error;
pub mod flz;
pub mod module;
pub mod orchestrator;
pub mod policy;
pub mod read;
pub mod session;
pub mod signature;

#[cfg(feature = "signer")]
pub mod local_signer;
#[cfg(feature = "provider")]
pub mod provider;

pub use error::SessionError;
pub use orchestrator::SmartSessions;
pub use session::{Session, SessionValidator, ValidatorRef};
pub use signature::{AccountType, SmartSessionMode, SmartSessionSignature};
