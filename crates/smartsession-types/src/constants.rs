//! Version-keyed contract addresses.
//!
//! Every component that needs an address (the smart-sessions module, a policy
//! contract, a validator) receives a [`ProtocolConstants`] value at construction
//! time, taken from a [`ConstantsTable`] for an explicit [`ProtocolVersion`].
//! There is no process-wide mutable state: the table is built once and then
//! only read.

use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::version::ProtocolVersion;

/// Addresses of the session validators known to the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorAddresses {
    /// ECDSA threshold validator (`OwnableValidator`).
    pub ownable_validator: Address,
    /// WebAuthn validator used as the account's primary validator.
    pub webauthn_validator: Address,
    /// WebAuthn validator used as a session validator.
    pub webauthn_session_validator: Address,
}

/// Addresses of the policy contracts the engine produces configuration for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAddresses {
    pub spend_limit_policy: Address,
    pub sudo_policy: Address,
}

/// The full set of contract addresses for one protocol version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolConstants {
    pub safe4337_module: Address,
    pub erc7579_launchpad: Address,
    pub safe_singleton: Address,
    pub attesters: Vec<Address>,
    pub attesters_threshold: u8,
    pub validators: ValidatorAddresses,
    pub policies: PolicyAddresses,
    /// The smart-sessions module (policy engine) address.
    pub smart_sessions: Address,
    /// Placeholder Safe owner used when the real signer is a passkey.
    pub default_safe_signer: Address,
}

const RHINESTONE_ATTESTER: Address = address!("0x000000333034E9f539ce08819E12c1b8Cb29084d");
const BREWIT_ATTESTER: Address = address!("0xC9e29745a752B551a7FCD19Afe50EcCEf5fd7d02");

impl ProtocolConstants {
    /// Returns the addresses shipped with the given version.
    pub fn builtin(version: ProtocolVersion) -> Self {
        let policies = PolicyAddresses {
            spend_limit_policy: address!("0x6d12b354080557a9e74db3c0e2e0c26607597a08"),
            sudo_policy: address!("0x0000003111cD8e92337C100F22B7A9dbf8DEE301"),
        };
        let ownable_validator = address!("0x2483DA3A338895199E5e538530213157e931Bf06");
        let webauthn_session_validator = address!("0x4853727f59C3C161a58E153E2B0F9F683EcFB9Df");
        let default_safe_signer = address!("0x000000000000000000000000000000000000dEaD");
        let safe_singleton = address!("0x29fcB43b46531BcA003ddC8FCB67FFE91900C762");
        let attesters = vec![RHINESTONE_ATTESTER, BREWIT_ATTESTER];

        match version {
            ProtocolVersion::V1_0_0 => Self {
                safe4337_module: address!("0x7579EE8307284F293B1927136486880611F20002"),
                erc7579_launchpad: address!("0x7579011aB74c46090561ea277Ba79D510c6C00ff"),
                safe_singleton,
                attesters,
                attesters_threshold: 1,
                validators: ValidatorAddresses {
                    ownable_validator,
                    webauthn_validator: address!("0x2f167e55d42584f65e2e30a748f41ee75a311414"),
                    webauthn_session_validator,
                },
                policies,
                smart_sessions: address!("0x00000000002B0eCfbD0496EE71e01257dA0E37DE"),
                default_safe_signer,
            },
            ProtocolVersion::V1_1_0 => Self {
                safe4337_module: address!("0x7579EE8307284F293B1927136486880611F20002"),
                erc7579_launchpad: address!("0x7579011aB74c46090561ea277Ba79D510c6C00ff"),
                safe_singleton,
                attesters,
                attesters_threshold: 1,
                validators: ValidatorAddresses {
                    ownable_validator,
                    webauthn_validator: address!("0x7ab16Ff354AcB328452F1D445b3Ddee9a91e9e69"),
                    webauthn_session_validator,
                },
                policies,
                smart_sessions: address!("0x00000000002B0eCfbD0496EE71e01257dA0E37DE"),
                default_safe_signer,
            },
            ProtocolVersion::V1_2_0 => Self {
                safe4337_module: address!("0x7579f2AD53b01c3D8779Fe17928e0D48885B0003"),
                erc7579_launchpad: address!("0x75798463024Bda64D83c94A64Bc7D7eaB41300eF"),
                safe_singleton,
                attesters,
                attesters_threshold: 1,
                validators: ValidatorAddresses {
                    ownable_validator,
                    webauthn_validator: address!("0x0000000000578c4cB0e472a5462da43C495C3F33"),
                    webauthn_session_validator,
                },
                policies,
                smart_sessions: address!("0x00000000008bdaba73cd9815d79069c247eb4bda"),
                default_safe_signer,
            },
        }
    }
}

/// Lookup table from [`ProtocolVersion`] to [`ProtocolConstants`].
///
/// Always holds an entry for every known version, so lookups cannot fail.
/// Entries can be replaced (e.g. from a config file) before the table is handed
/// to the components that use it.
///
/// # Example
///
/// ```
/// use smartsession_types::{ConstantsTable, ProtocolVersion};
///
/// let table = ConstantsTable::builtin();
/// let v12 = table.get(ProtocolVersion::V1_2_0);
/// let v11 = table.get(ProtocolVersion::V1_1_0);
/// assert_ne!(v12.smart_sessions, v11.smart_sessions);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantsTable {
    entries: [ProtocolConstants; 3],
}

impl ConstantsTable {
    /// The table of addresses shipped with this crate.
    pub fn builtin() -> Self {
        Self {
            entries: ProtocolVersion::ALL.map(ProtocolConstants::builtin),
        }
    }

    /// Returns the constants for `version`.
    pub fn get(&self, version: ProtocolVersion) -> &ProtocolConstants {
        &self.entries[version.index()]
    }

    /// Replaces the constants for `version`.
    pub fn with_override(mut self, version: ProtocolVersion, constants: ProtocolConstants) -> Self {
        self.entries[version.index()] = constants;
        self
    }

    /// Applies every override in `overrides` on top of the current table.
    pub fn with_overrides(self, overrides: HashMap<ProtocolVersion, ProtocolConstants>) -> Self {
        overrides
            .into_iter()
            .fold(self, |table, (version, constants)| {
                table.with_override(version, constants)
            })
    }
}

impl Default for ConstantsTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_has_every_version() {
        let table = ConstantsTable::builtin();
        for version in ProtocolVersion::ALL {
            assert_eq!(table.get(version), &ProtocolConstants::builtin(version));
        }
    }

    #[test]
    fn test_policies_are_shared_across_versions() {
        let table = ConstantsTable::builtin();
        let v10 = table.get(ProtocolVersion::V1_0_0);
        let v12 = table.get(ProtocolVersion::V1_2_0);
        assert_eq!(v10.policies, v12.policies);
        assert_ne!(
            v10.validators.webauthn_validator,
            v12.validators.webauthn_validator
        );
    }

    #[test]
    fn test_override_replaces_single_version() {
        let mut custom = ProtocolConstants::builtin(ProtocolVersion::V1_1_0);
        custom.smart_sessions = Address::repeat_byte(0x11);
        let table = ConstantsTable::builtin().with_override(ProtocolVersion::V1_1_0, custom);
        assert_eq!(
            table.get(ProtocolVersion::V1_1_0).smart_sessions,
            Address::repeat_byte(0x11)
        );
        assert_eq!(
            table.get(ProtocolVersion::V1_0_0),
            &ProtocolConstants::builtin(ProtocolVersion::V1_0_0)
        );
    }

    #[test]
    fn test_constants_json_uses_camel_case() {
        let constants = ProtocolConstants::builtin(ProtocolVersion::V1_0_0);
        let json = serde_json::to_value(&constants).unwrap();
        assert!(json.get("smartSessions").is_some());
        assert!(json["policies"].get("spendLimitPolicy").is_some());
        let parsed: ProtocolConstants = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, constants);
    }
}
