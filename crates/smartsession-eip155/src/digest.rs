//! Multi-chain session digest.
//!
//! The account owner authorizes sessions on several chains with one signature
//! over the EIP-712 hash of a `MultiChainSession`, under the `SmartSession` v1
//! domain (no chain id, no verifying contract).

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain};

use crate::abi::{ChainSession, MultiChainSession, SignedPermissions, SignedSession};
use crate::session::Session;

/// `{ name: "SmartSession", version: "1" }`
pub fn smart_session_domain() -> Eip712Domain {
    eip712_domain! {
        name: "SmartSession",
        version: "1",
    }
}

/// Permission flags signed alongside a session. All off unless the caller asks for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionFlags {
    pub permit_generic_policy: bool,
    pub permit_admin_access: bool,
    pub ignore_security_attestations: bool,
}

/// The signed view of `session` for `account` on the session's chain.
pub fn chain_session(
    session: &Session,
    account: Address,
    smart_session: Address,
    nonce: U256,
    flags: PermissionFlags,
) -> ChainSession {
    ChainSession {
        chainId: session.chain_id,
        session: SignedSession {
            account,
            permissions: SignedPermissions {
                permitGenericPolicy: flags.permit_generic_policy,
                permitAdminAccess: flags.permit_admin_access,
                ignoreSecurityAttestations: flags.ignore_security_attestations,
                permitERC4337Paymaster: session.permit_erc4337_paymaster,
                userOpPolicies: session.user_op_policies.clone(),
                erc7739Policies: session.erc7739_policies.clone(),
                actions: session.actions.clone(),
            },
            sessionValidator: session.session_validator,
            sessionValidatorInitData: session.session_validator_init_data.clone(),
            salt: session.salt,
            smartSession: smart_session,
            nonce,
        },
    }
}

/// EIP-712 hash of `MultiChainSession { sessionsAndChainIds: chain_sessions }`.
/// Order of `chain_sessions` is significant.
pub fn hash_chain_sessions(chain_sessions: &[ChainSession]) -> B256 {
    let message = MultiChainSession {
        sessionsAndChainIds: chain_sessions.to_vec(),
    };
    message.eip712_signing_hash(&smart_session_domain())
}
