//! Account plans: which Safe flavor, validator module and nonce key an account uses.
//!
//! The plan is one explicit selection over account kind, protocol version and
//! the validator kind of the signer. Building the account itself (factory
//! calls, counterfactual address) is left to the caller.

use alloy_primitives::aliases::U192;
use alloy_primitives::{Address, B256, b256};
use serde::{Deserialize, Serialize};
use smartsession_types::reader::ContractReader;
use smartsession_types::{ConstantsTable, ProtocolConstants, ProtocolVersion};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::session::ValidatorKind;

/// How the account is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// The owner's account, validated by the owner's own validator.
    Main,
    /// An account operated through a smart session.
    Delegated,
}

/// Safe deployment flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountImplementation {
    /// Safe with the 4337 module and the ERC-7579 launchpad.
    Safe7579,
    /// Safe singleton set up through the v2 7579 adapter.
    RhinestoneV2,
}

/// Everything needed to instantiate an account client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPlan {
    pub kind: AccountKind,
    pub version: ProtocolVersion,
    pub implementation: AccountImplementation,
    /// Validator module installed on the account for its signer.
    pub validator_module: Address,
    /// User-operation nonce key: the validating module's address right-padded to 24 bytes.
    pub nonce_key: U192,
    /// Safe owners. A passkey signer has no ECDSA address, so the placeholder signer is used.
    pub owners: Vec<Address>,
    pub threshold: u8,
    pub attesters: Vec<Address>,
    pub attesters_threshold: u8,
}

impl AccountPlan {
    /// Selects the plan for `kind` under `version`.
    ///
    /// Main accounts are always [`AccountImplementation::Safe7579`] and use the
    /// signer's validator for their nonce key. Delegated accounts route
    /// validation through the smart-sessions module and switch to
    /// [`AccountImplementation::RhinestoneV2`] from 1.2.0 on.
    pub fn select(
        kind: AccountKind,
        version: ProtocolVersion,
        constants: &ProtocolConstants,
        validator: ValidatorKind,
        signer: Address,
    ) -> Self {
        let validator_module = match validator {
            ValidatorKind::Ownable => constants.validators.ownable_validator,
            ValidatorKind::Passkey => constants.validators.webauthn_validator,
        };
        let owner = match validator {
            ValidatorKind::Ownable => signer,
            ValidatorKind::Passkey => constants.default_safe_signer,
        };
        let (implementation, nonce_module) = match kind {
            AccountKind::Main => (AccountImplementation::Safe7579, validator_module),
            AccountKind::Delegated if version >= ProtocolVersion::V1_2_0 => {
                (AccountImplementation::RhinestoneV2, constants.smart_sessions)
            }
            AccountKind::Delegated => (AccountImplementation::Safe7579, constants.smart_sessions),
        };
        Self {
            kind,
            version,
            implementation,
            validator_module,
            nonce_key: nonce_key(nonce_module),
            owners: vec![owner],
            threshold: 1,
            attesters: constants.attesters.clone(),
            attesters_threshold: constants.attesters_threshold,
        }
    }
}

/// `validator` right-padded with zeros to 24 bytes, read as a big-endian integer.
pub fn nonce_key(validator: Address) -> U192 {
    let mut padded = [0u8; 24];
    padded[..20].copy_from_slice(validator.as_slice());
    U192::from_be_bytes(padded)
}

/// EIP-1967 implementation slot.
pub const IMPLEMENTATION_SLOT: B256 =
    b256!("0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// Protocol version of a deployed account, from the implementation stored in
/// its EIP-1967 slot. Newer versions win when several share an implementation.
/// `None` when the slot cannot be read or matches no known version.
#[cfg_attr(feature = "telemetry", instrument(skip_all, fields(account = %account)))]
pub async fn detect_account_version<R: ContractReader + ?Sized>(
    reader: &R,
    table: &ConstantsTable,
    account: Address,
) -> Option<ProtocolVersion> {
    let word = match reader.storage_at(account, IMPLEMENTATION_SLOT).await {
        Ok(word) => word,
        Err(_e) => {
            #[cfg(feature = "telemetry")]
            tracing::debug!(error = %_e, "Implementation slot unreadable");
            return None;
        }
    };
    if word[..12].iter().any(|byte| *byte != 0) {
        return None;
    }
    let implementation = Address::from_slice(&word[12..]);
    ProtocolVersion::ALL
        .into_iter()
        .rev()
        .find(|version| table.get(*version).safe_singleton == implementation)
}
