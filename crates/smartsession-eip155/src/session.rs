//! Session model and identifier derivation.
//!
//! A [`Session`] is built on demand and never persisted. Its durable handle is
//! the [`permission_id`], which depends only on the session validator, the
//! validator's init data and the salt.

use alloy_primitives::{Address, B256, Bytes, FixedBytes, fixed_bytes, keccak256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};
use smartsession_types::ProtocolConstants;

pub use crate::abi::{ActionData, ERC7739Context, ERC7739Data, PolicyData};
use crate::abi;
use crate::policy::encode_validation_data;

/// Salt used when the caller does not provide one: the string `"1"` right-padded to 32 bytes.
///
/// Every session created with this salt for the same validator and init data
/// shares one permission id.
pub const DEFAULT_SALT: B256 =
    fixed_bytes!("0x3100000000000000000000000000000000000000000000000000000000000000");

/// `keccak256(abi.encode(sessionValidator, sessionValidatorInitData, salt))`
pub fn permission_id(session_validator: Address, init_data: &Bytes, salt: B256) -> B256 {
    keccak256((session_validator, init_data.clone(), salt).abi_encode_params())
}

/// `keccak256(abi.encodePacked(target, selector))`
pub fn action_id(target: Address, selector: FixedBytes<4>) -> B256 {
    keccak256((target, selector).abi_encode_packed())
}

/// Key the policy contracts store per-action configuration under:
/// `keccak256(abi.encodePacked(account, keccak256(abi.encodePacked(permissionId, actionId))))`.
pub fn config_id(account: Address, permission_id: B256, action_id: B256) -> B256 {
    let action_policy_id = keccak256((permission_id, action_id).abi_encode_packed());
    keccak256((account, action_policy_id).abi_encode_packed())
}

/// A session: who may sign (validator + init data), what they may do (actions and
/// their policies), and on which chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub session_validator: Address,
    pub session_validator_init_data: Bytes,
    pub salt: B256,
    pub user_op_policies: Vec<PolicyData>,
    pub erc7739_policies: ERC7739Data,
    pub actions: Vec<ActionData>,
    pub permit_erc4337_paymaster: bool,
    /// Selects the chain client and is carried in multi-chain digests.
    /// Not part of the on-chain session layout.
    pub chain_id: u64,
}

impl Session {
    /// A session for `validator` on `chain_id` with no policies and no actions.
    pub fn for_validator(validator: &ValidatorRef, chain_id: u64) -> Self {
        Self {
            session_validator: validator.address,
            session_validator_init_data: validator.init_data.clone(),
            salt: validator.salt,
            user_op_policies: Vec::new(),
            erc7739_policies: ERC7739Data::default(),
            actions: Vec::new(),
            permit_erc4337_paymaster: true,
            chain_id,
        }
    }

    pub fn with_user_op_policies(mut self, policies: Vec<PolicyData>) -> Self {
        self.user_op_policies = policies;
        self
    }

    pub fn with_actions(mut self, actions: Vec<ActionData>) -> Self {
        self.actions = actions;
        self
    }

    pub fn permission_id(&self) -> B256 {
        permission_id(
            self.session_validator,
            &self.session_validator_init_data,
            self.salt,
        )
    }

    /// On-chain layout of this session (drops `chain_id`).
    pub fn to_abi(&self) -> abi::Session {
        abi::Session {
            sessionValidator: self.session_validator,
            sessionValidatorInitData: self.session_validator_init_data.clone(),
            salt: self.salt,
            userOpPolicies: self.user_op_policies.clone(),
            erc7739Policies: self.erc7739_policies.clone(),
            actions: self.actions.clone(),
            permitERC4337Paymaster: self.permit_erc4337_paymaster,
        }
    }

    pub fn from_abi(session: abi::Session, chain_id: u64) -> Self {
        Self {
            session_validator: session.sessionValidator,
            session_validator_init_data: session.sessionValidatorInitData,
            salt: session.salt,
            user_op_policies: session.userOpPolicies,
            erc7739_policies: session.erc7739Policies,
            actions: session.actions,
            permit_erc4337_paymaster: session.permitERC4337Paymaster,
            chain_id,
        }
    }
}

/// The session validator a delegation is bound to, resolved to a concrete
/// contract, its init data and the salt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorRef {
    pub address: Address,
    pub init_data: Bytes,
    #[serde(default = "default_salt")]
    pub salt: B256,
}

fn default_salt() -> B256 {
    DEFAULT_SALT
}

impl ValidatorRef {
    pub fn new(address: Address, init_data: Bytes, salt: Option<B256>) -> Self {
        Self {
            address,
            init_data,
            salt: salt.unwrap_or(DEFAULT_SALT),
        }
    }

    pub fn permission_id(&self) -> B256 {
        permission_id(self.address, &self.init_data, self.salt)
    }
}

/// Kind of key a session validator verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorKind {
    Ownable,
    Passkey,
}

/// A session validator described by its kind and key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "validator", rename_all = "lowercase")]
pub enum SessionValidator {
    /// ECDSA owners with a signing threshold.
    Ownable { owners: Vec<Address>, threshold: u64 },
    /// WebAuthn credential; `init_data` is the validator's enable data.
    #[serde(rename_all = "camelCase")]
    Passkey { init_data: Bytes },
}

impl SessionValidator {
    /// A single-owner ECDSA validator, the usual shape of a session key.
    pub fn single_owner(owner: Address) -> Self {
        SessionValidator::Ownable {
            owners: vec![owner],
            threshold: 1,
        }
    }

    pub fn kind(&self) -> ValidatorKind {
        match self {
            SessionValidator::Ownable { .. } => ValidatorKind::Ownable,
            SessionValidator::Passkey { .. } => ValidatorKind::Passkey,
        }
    }

    pub fn init_data(&self) -> Bytes {
        match self {
            SessionValidator::Ownable { owners, threshold } => {
                encode_validation_data(*threshold, owners)
            }
            SessionValidator::Passkey { init_data } => init_data.clone(),
        }
    }

    pub fn resolve(&self, constants: &ProtocolConstants, salt: Option<B256>) -> ValidatorRef {
        ValidatorRef::new(
            validator_address(constants, self.kind()),
            self.init_data(),
            salt,
        )
    }
}

/// Persisted description of a delegated account: validator kind, its init data and salt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedAccountConfig {
    pub validator: ValidatorKind,
    pub validator_init_data: Bytes,
    pub salt: B256,
}

impl DelegatedAccountConfig {
    pub fn resolve(&self, constants: &ProtocolConstants) -> ValidatorRef {
        ValidatorRef {
            address: validator_address(constants, self.validator),
            init_data: self.validator_init_data.clone(),
            salt: self.salt,
        }
    }
}

fn validator_address(constants: &ProtocolConstants, kind: ValidatorKind) -> Address {
    match kind {
        ValidatorKind::Ownable => constants.validators.ownable_validator,
        ValidatorKind::Passkey => constants.validators.webauthn_session_validator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, address, hex};
    use smartsession_types::ProtocolVersion;

    const VALIDATOR: Address = address!("0x2483DA3A338895199E5e538530213157e931Bf06");
    const TOKEN: Address = address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

    #[test]
    fn test_default_salt_is_padded_one() {
        assert_eq!(DEFAULT_SALT[0], 0x31);
        assert!(DEFAULT_SALT[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_permission_id_matches_abi_encoding() {
        let init_data = Bytes::from(hex!("c0ffee"));
        let mut encoded = Vec::new();
        encoded.extend_from_slice(VALIDATOR.into_word().as_slice());
        encoded.extend_from_slice(&U256::from(0x60u64).to_be_bytes::<32>());
        encoded.extend_from_slice(DEFAULT_SALT.as_slice());
        encoded.extend_from_slice(&U256::from(3u64).to_be_bytes::<32>());
        let mut tail = [0u8; 32];
        tail[..3].copy_from_slice(&hex!("c0ffee"));
        encoded.extend_from_slice(&tail);
        assert_eq!(
            permission_id(VALIDATOR, &init_data, DEFAULT_SALT),
            keccak256(&encoded)
        );
    }

    #[test]
    fn test_permission_id_ignores_actions_and_policies() {
        let validator = ValidatorRef::new(VALIDATOR, Bytes::from(hex!("01")), None);
        let bare = Session::for_validator(&validator, 1);
        let busy = Session::for_validator(&validator, 8453)
            .with_user_op_policies(vec![PolicyData::default()])
            .with_actions(vec![ActionData {
                actionTargetSelector: crate::policy::TRANSFER_SELECTOR,
                actionTarget: TOKEN,
                actionPolicies: vec![],
            }]);
        assert_eq!(bare.permission_id(), busy.permission_id());
        assert_eq!(bare.permission_id(), validator.permission_id());

        let salted = ValidatorRef::new(VALIDATOR, Bytes::from(hex!("01")), Some(B256::repeat_byte(7)));
        assert_ne!(salted.permission_id(), validator.permission_id());
    }

    #[test]
    fn test_action_id_is_packed() {
        let selector = crate::policy::TRANSFER_SELECTOR;
        let mut packed = TOKEN.to_vec();
        packed.extend_from_slice(selector.as_slice());
        assert_eq!(packed.len(), 24);
        assert_eq!(action_id(TOKEN, selector), keccak256(&packed));
    }

    #[test]
    fn test_abi_conversion_keeps_fields() {
        let validator = ValidatorRef::new(VALIDATOR, Bytes::from(hex!("02")), None);
        let session = Session::for_validator(&validator, 10);
        let back = Session::from_abi(session.to_abi(), 10);
        assert_eq!(back, session);
    }

    #[test]
    fn test_resolve_validators() {
        let constants = ProtocolConstants::builtin(ProtocolVersion::V1_1_0);
        let owner = address!("0x0000000000000000000000000000000000000abc");
        let ownable = SessionValidator::single_owner(owner).resolve(&constants, None);
        assert_eq!(ownable.address, constants.validators.ownable_validator);
        assert_eq!(ownable.init_data, encode_validation_data(1, &[owner]));
        assert_eq!(ownable.salt, DEFAULT_SALT);

        let passkey = SessionValidator::Passkey {
            init_data: Bytes::from(hex!("abcd")),
        }
        .resolve(&constants, Some(B256::repeat_byte(1)));
        assert_eq!(passkey.address, constants.validators.webauthn_session_validator);
        assert_eq!(passkey.init_data, Bytes::from(hex!("abcd")));
    }

    #[test]
    fn test_delegated_config_from_json() {
        let config: DelegatedAccountConfig = serde_json::from_value(serde_json::json!({
            "validator": "passkey",
            "validatorInitData": "0x1234",
            "salt": "0x3100000000000000000000000000000000000000000000000000000000000000"
        }))
        .unwrap();
        let constants = ProtocolConstants::builtin(ProtocolVersion::V1_0_0);
        let resolved = config.resolve(&constants);
        assert_eq!(resolved.address, constants.validators.webauthn_session_validator);
        assert_eq!(resolved.salt, DEFAULT_SALT);
    }
}
