//! Session request shapes and smart-sessions module calls.
//!
//! [`SmartSessions`] is bound to one [`ProtocolConstants`] set and produces:
//!
//! - the USE request shape for an already-enabled session,
//! - `enableSessions` / `removeSession` transactions,
//! - per-action policy diffs (disable list, then enable list) from [`PolicyParams`],
//! - user-op and ERC-1271 policy changes,
//! - idempotent reads of nonce, session digest and enablement through a [`ContractReader`].
//!
//! Nothing here sends transactions. Every [`Transaction`] has a value of zero.

use alloy_primitives::{Address, B256, Bytes, FixedBytes, U256};
use alloy_sol_types::SolCall;
use smartsession_types::reader::ContractReader;
use smartsession_types::{PolicyParams, ProtocolConstants, TokenAccess, TokenLimit, Transaction};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::abi::{ERC7739Context, ERC7739Data, ISmartSession, PolicyData};
use crate::error::SessionError;
use crate::policy::{
    APPROVE_SELECTOR, SWAP_ALLOW_LIST, TRANSFER_SELECTOR, spend_limit_policy_data, sudo_policy_data,
};
use crate::read::read;
use crate::session::{ActionData, Session, ValidatorRef, action_id};
use crate::signature::{SmartSessionMode, SmartSessionSignature};

/// Builder and reader for one deployment of the smart-sessions module.
#[derive(Debug, Clone)]
pub struct SmartSessions {
    constants: ProtocolConstants,
}

impl SmartSessions {
    pub fn new(constants: ProtocolConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &ProtocolConstants {
        &self.constants
    }

    /// Address of the smart-sessions module.
    pub fn address(&self) -> Address {
        self.constants.smart_sessions
    }

    fn call<C: SolCall>(&self, call: C) -> Transaction {
        Transaction::call(self.address(), call.abi_encode())
    }

    /// Session shape used by the management calls (enable, diff, remove): sudo
    /// user-op policy, no actions.
    fn managed_session(&self, chain_id: u64, validator: &ValidatorRef) -> Session {
        Session::for_validator(validator, chain_id)
            .with_user_op_policies(vec![sudo_policy_data(&self.constants)])
    }

    /// USE request for a session that is already enabled: the mode, the permission id
    /// and an empty signature for the session key to fill in.
    pub fn build_use_session(&self, chain_id: u64, validator: &ValidatorRef) -> SmartSessionSignature {
        let session = Session::for_validator(validator, chain_id);
        SmartSessionSignature::Use {
            permission_id: session.permission_id(),
            signature: Bytes::new(),
        }
    }

    /// Session that grants `params` to `validator` on `chain_id`.
    pub fn build_session(&self, chain_id: u64, params: &PolicyParams, validator: &ValidatorRef) -> Session {
        self.managed_session(chain_id, validator)
            .with_actions(self.session_actions(params))
    }

    /// Actions granted by `params`.
    ///
    /// Spend limit: one `transfer` action per token, guarded by a spend-limit policy
    /// for that token. Sudo: the swap router allow-list, then per token `approve`
    /// (swap flag) and `transfer` (transfer flag), all under the sudo policy.
    pub fn session_actions(&self, params: &PolicyParams) -> Vec<ActionData> {
        match params {
            PolicyParams::SpendLimit { token_limits } => token_limits
                .iter()
                .map(|limit| self.spend_limit_action(limit))
                .collect(),
            PolicyParams::Sudo { token_access } => {
                let mut actions: Vec<ActionData> = SWAP_ALLOW_LIST
                    .iter()
                    .flat_map(|router| {
                        router
                            .selectors
                            .iter()
                            .map(|selector| self.sudo_action(router.address, *selector))
                    })
                    .collect();
                for access in token_access {
                    if access.is_swap_enabled {
                        actions.push(self.sudo_action(access.token, APPROVE_SELECTOR));
                    }
                    if access.is_transfer_enabled {
                        actions.push(self.sudo_action(access.token, TRANSFER_SELECTOR));
                    }
                }
                actions
            }
        }
    }

    fn spend_limit_action(&self, limit: &TokenLimit) -> ActionData {
        ActionData {
            actionTargetSelector: TRANSFER_SELECTOR,
            actionTarget: limit.token,
            actionPolicies: vec![spend_limit_policy_data(
                &self.constants,
                std::slice::from_ref(limit),
            )],
        }
    }

    fn sudo_action(&self, target: Address, selector: FixedBytes<4>) -> ActionData {
        ActionData {
            actionTargetSelector: selector,
            actionTarget: target,
            actionPolicies: vec![sudo_policy_data(&self.constants)],
        }
    }

    /// `enableSessions([session])` for a session granting `params`.
    pub fn build_enable_session(
        &self,
        chain_id: u64,
        params: &PolicyParams,
        validator: &ValidatorRef,
    ) -> Transaction {
        let session = self.build_session(chain_id, params, validator);
        self.enable_sessions(std::slice::from_ref(&session))
    }

    /// `removeSession(permissionId)` for the validator's session.
    pub fn build_remove_session(&self, validator: &ValidatorRef, chain_id: u64) -> Transaction {
        let session = self.managed_session(chain_id, validator);
        self.remove_session(session.permission_id())
    }

    /// Disable half of a policy diff.
    ///
    /// Spend limit: `disableActionPolicies` on the `transfer` action of every token
    /// whose new limit is zero. Sudo: one `disableActionPolicies` per flag set to
    /// `false` (`transfer` for the transfer flag, `approve` for the swap flag).
    pub fn build_disable_action_policies(
        &self,
        chain_id: u64,
        params: &PolicyParams,
        validator: &ValidatorRef,
    ) -> Vec<Transaction> {
        let permission_id = self.managed_session(chain_id, validator).permission_id();
        match params {
            PolicyParams::SpendLimit { token_limits } => token_limits
                .iter()
                .filter(|limit| limit.amount.is_zero())
                .map(|limit| {
                    self.disable_action_policies(
                        permission_id,
                        action_id(limit.token, TRANSFER_SELECTOR),
                        vec![self.constants.policies.spend_limit_policy],
                    )
                })
                .collect(),
            PolicyParams::Sudo { token_access } => {
                let sudo = self.constants.policies.sudo_policy;
                token_access
                    .iter()
                    .flat_map(|access| {
                        disabled_selectors(access)
                            .map(|selector| {
                                self.disable_action_policies(
                                    permission_id,
                                    action_id(access.token, selector),
                                    vec![sudo],
                                )
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect()
            }
        }
    }

    /// Enable half of a policy diff.
    ///
    /// Spend limit: one `enableActionPolicies` per token with a positive limit.
    /// Sudo: a single `enableActionPolicies` carrying every flag set to `true`,
    /// omitted when there is none.
    pub fn build_enable_action_policies(
        &self,
        chain_id: u64,
        params: &PolicyParams,
        validator: &ValidatorRef,
    ) -> Vec<Transaction> {
        let permission_id = self.managed_session(chain_id, validator).permission_id();
        match params {
            PolicyParams::SpendLimit { token_limits } => token_limits
                .iter()
                .filter(|limit| limit.amount > U256::ZERO)
                .map(|limit| {
                    self.enable_action_policies(permission_id, vec![self.spend_limit_action(limit)])
                })
                .collect(),
            PolicyParams::Sudo { token_access } => {
                let actions: Vec<ActionData> = token_access
                    .iter()
                    .flat_map(|access| {
                        enabled_selectors(access)
                            .map(|selector| self.sudo_action(access.token, selector))
                            .collect::<Vec<_>>()
                    })
                    .collect();
                if actions.is_empty() {
                    Vec::new()
                } else {
                    vec![self.enable_action_policies(permission_id, actions)]
                }
            }
        }
    }

    /// Full diff: the disable list followed by the enable list.
    /// Tokens absent from `params` are left untouched.
    pub fn build_update_action_policies(
        &self,
        chain_id: u64,
        params: &PolicyParams,
        validator: &ValidatorRef,
    ) -> Vec<Transaction> {
        let mut transactions = self.build_disable_action_policies(chain_id, params, validator);
        transactions.extend(self.build_enable_action_policies(chain_id, params, validator));
        transactions
    }

    pub fn enable_sessions(&self, sessions: &[Session]) -> Transaction {
        self.call(ISmartSession::enableSessionsCall {
            sessions: sessions.iter().map(Session::to_abi).collect(),
        })
    }

    pub fn remove_session(&self, permission_id: B256) -> Transaction {
        self.call(ISmartSession::removeSessionCall {
            permissionId: permission_id,
        })
    }

    pub fn enable_action_policies(&self, permission_id: B256, actions: Vec<ActionData>) -> Transaction {
        self.call(ISmartSession::enableActionPoliciesCall {
            permissionId: permission_id,
            actionPolicies: actions,
        })
    }

    pub fn disable_action_policies(
        &self,
        permission_id: B256,
        action_id: B256,
        policies: Vec<Address>,
    ) -> Transaction {
        self.call(ISmartSession::disableActionPoliciesCall {
            permissionId: permission_id,
            actionId: action_id,
            policies,
        })
    }

    pub fn enable_user_op_policies(&self, permission_id: B256, policies: Vec<PolicyData>) -> Transaction {
        self.call(ISmartSession::enableUserOpPoliciesCall {
            permissionId: permission_id,
            userOpPolicies: policies,
        })
    }

    pub fn disable_user_op_policies(&self, permission_id: B256, policies: Vec<Address>) -> Transaction {
        self.call(ISmartSession::disableUserOpPoliciesCall {
            permissionId: permission_id,
            policies,
        })
    }

    pub fn enable_erc1271_policies(&self, permission_id: B256, policies: ERC7739Data) -> Transaction {
        self.call(ISmartSession::enableERC1271PoliciesCall {
            permissionId: permission_id,
            erc1271Policies: policies,
        })
    }

    pub fn disable_erc1271_policies(
        &self,
        permission_id: B256,
        policies: Vec<Address>,
        contexts: Vec<ERC7739Context>,
    ) -> Transaction {
        self.call(ISmartSession::disableERC1271PoliciesCall {
            permissionId: permission_id,
            policies,
            contexts,
        })
    }

    /// Current session nonce of `account` for `permission_id`.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(permission_id = %permission_id, account = %account)))]
    pub async fn get_session_nonce<R: ContractReader + ?Sized>(
        &self,
        reader: &R,
        permission_id: B256,
        account: Address,
    ) -> Result<U256, SessionError> {
        let call = ISmartSession::getNonceCall {
            permissionId: permission_id,
            account,
        };
        Ok(read(reader, self.address(), &call).await?)
    }

    /// Digest the module expects the owner to sign for enabling `session` on `account`.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(permission_id = %permission_id, account = %account)))]
    pub async fn get_session_digest<R: ContractReader + ?Sized>(
        &self,
        reader: &R,
        permission_id: B256,
        account: Address,
        session: &Session,
        mode: SmartSessionMode,
    ) -> Result<B256, SessionError> {
        let call = ISmartSession::getSessionDigestCall {
            permissionId: permission_id,
            account,
            data: session.to_abi(),
            mode: mode.as_u8(),
        };
        Ok(read(reader, self.address(), &call).await?)
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(permission_id = %permission_id, account = %account)))]
    pub async fn is_session_enabled<R: ContractReader + ?Sized>(
        &self,
        reader: &R,
        permission_id: B256,
        account: Address,
    ) -> Result<bool, SessionError> {
        let call = ISmartSession::isPermissionEnabledCall {
            permissionId: permission_id,
            account,
        };
        Ok(read(reader, self.address(), &call).await?)
    }
}

fn disabled_selectors(access: &TokenAccess) -> impl Iterator<Item = FixedBytes<4>> {
    [
        (!access.is_transfer_enabled).then_some(TRANSFER_SELECTOR),
        (!access.is_swap_enabled).then_some(APPROVE_SELECTOR),
    ]
    .into_iter()
    .flatten()
}

fn enabled_selectors(access: &TokenAccess) -> impl Iterator<Item = FixedBytes<4>> {
    [
        access.is_transfer_enabled.then_some(TRANSFER_SELECTOR),
        access.is_swap_enabled.then_some(APPROVE_SELECTOR),
    ]
    .into_iter()
    .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DEFAULT_SALT;
    use alloy_primitives::address;
    use smartsession_types::ProtocolVersion;

    const TOKEN_A: Address = address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
    const TOKEN_B: Address = address!("0x4200000000000000000000000000000000000006");

    fn engine() -> SmartSessions {
        SmartSessions::new(ProtocolConstants::builtin(ProtocolVersion::V1_1_0))
    }

    fn validator() -> ValidatorRef {
        ValidatorRef::new(
            address!("0x2483DA3A338895199E5e538530213157e931Bf06"),
            Bytes::from(vec![0xaa; 96]),
            None,
        )
    }

    #[test]
    fn test_use_session_shape() {
        let request = engine().build_use_session(8453, &validator());
        assert_eq!(request.mode(), SmartSessionMode::Use);
        assert_eq!(request.permission_id(), validator().permission_id());
        assert!(request.signature().is_empty());
    }

    #[test]
    fn test_enable_spend_limit_session() {
        let engine = engine();
        let params = PolicyParams::SpendLimit {
            token_limits: vec![
                TokenLimit { token: TOKEN_A, amount: U256::from(1000u64) },
                TokenLimit { token: TOKEN_B, amount: U256::from(5u64) },
            ],
        };
        let tx = engine.build_enable_session(8453, &params, &validator());
        assert_eq!(tx.to, engine.address());
        assert_eq!(tx.value, U256::ZERO);

        let call = ISmartSession::enableSessionsCall::abi_decode(&tx.data).unwrap();
        assert_eq!(call.sessions.len(), 1);
        let session = &call.sessions[0];
        assert_eq!(session.salt, DEFAULT_SALT);
        assert!(session.permitERC4337Paymaster);
        assert_eq!(session.userOpPolicies, vec![sudo_policy_data(engine.constants())]);
        assert_eq!(session.actions.len(), 2);
        assert_eq!(session.actions[0].actionTarget, TOKEN_A);
        assert_eq!(session.actions[0].actionTargetSelector, TRANSFER_SELECTOR);
        assert_eq!(
            session.actions[0].actionPolicies[0].policy,
            engine.constants().policies.spend_limit_policy
        );
    }

    #[test]
    fn test_enable_sudo_session_has_allow_list_then_tokens() {
        let engine = engine();
        let params = PolicyParams::Sudo {
            token_access: vec![TokenAccess {
                token: TOKEN_A,
                is_transfer_enabled: true,
                is_swap_enabled: true,
            }],
        };
        let session = engine.build_session(1, &params, &validator());
        assert_eq!(session.actions.len(), 6 + 1 + 2);
        assert_eq!(session.actions[0].actionTarget, SWAP_ALLOW_LIST[0].address);
        assert_eq!(session.actions[6].actionTarget, SWAP_ALLOW_LIST[1].address);
        assert_eq!(session.actions[7].actionTargetSelector, APPROVE_SELECTOR);
        assert_eq!(session.actions[8].actionTargetSelector, TRANSFER_SELECTOR);
        assert!(
            session
                .actions
                .iter()
                .all(|action| action.actionPolicies == vec![sudo_policy_data(engine.constants())])
        );
    }

    #[test]
    fn test_spend_limit_diff_partitions_by_amount() {
        let engine = engine();
        let params = PolicyParams::SpendLimit {
            token_limits: vec![
                TokenLimit { token: TOKEN_A, amount: U256::ZERO },
                TokenLimit { token: TOKEN_B, amount: U256::from(10u64) },
            ],
        };
        let disable = engine.build_disable_action_policies(1, &params, &validator());
        let enable = engine.build_enable_action_policies(1, &params, &validator());
        assert_eq!(disable.len(), 1);
        assert_eq!(enable.len(), 1);

        let disabled = ISmartSession::disableActionPoliciesCall::abi_decode(&disable[0].data).unwrap();
        assert_eq!(disabled.permissionId, validator().permission_id());
        assert_eq!(disabled.actionId, action_id(TOKEN_A, TRANSFER_SELECTOR));
        assert_eq!(disabled.policies, vec![engine.constants().policies.spend_limit_policy]);

        let enabled = ISmartSession::enableActionPoliciesCall::abi_decode(&enable[0].data).unwrap();
        assert_eq!(enabled.actionPolicies.len(), 1);
        assert_eq!(enabled.actionPolicies[0].actionTarget, TOKEN_B);

        let update = engine.build_update_action_policies(1, &params, &validator());
        assert_eq!(update, [disable, enable].concat());
    }

    #[test]
    fn test_sudo_diff_partitions_by_flag() {
        let engine = engine();
        let params = PolicyParams::Sudo {
            token_access: vec![
                TokenAccess { token: TOKEN_A, is_transfer_enabled: false, is_swap_enabled: true },
                TokenAccess { token: TOKEN_B, is_transfer_enabled: false, is_swap_enabled: false },
            ],
        };
        let disable = engine.build_disable_action_policies(1, &params, &validator());
        let disabled_ids: Vec<B256> = disable
            .iter()
            .map(|tx| ISmartSession::disableActionPoliciesCall::abi_decode(&tx.data).unwrap().actionId)
            .collect();
        assert_eq!(
            disabled_ids,
            vec![
                action_id(TOKEN_A, TRANSFER_SELECTOR),
                action_id(TOKEN_B, TRANSFER_SELECTOR),
                action_id(TOKEN_B, APPROVE_SELECTOR),
            ]
        );

        let enable = engine.build_enable_action_policies(1, &params, &validator());
        assert_eq!(enable.len(), 1);
        let enabled = ISmartSession::enableActionPoliciesCall::abi_decode(&enable[0].data).unwrap();
        let enabled_ids: Vec<B256> = enabled
            .actionPolicies
            .iter()
            .map(|action| action_id(action.actionTarget, action.actionTargetSelector))
            .collect();
        assert_eq!(enabled_ids, vec![action_id(TOKEN_A, APPROVE_SELECTOR)]);

        // No action is both disabled and enabled.
        assert!(enabled_ids.iter().all(|id| !disabled_ids.contains(id)));
    }

    #[test]
    fn test_sudo_enable_omitted_when_nothing_granted() {
        let params = PolicyParams::Sudo {
            token_access: vec![TokenAccess {
                token: TOKEN_A,
                is_transfer_enabled: false,
                is_swap_enabled: false,
            }],
        };
        assert!(engine().build_enable_action_policies(1, &params, &validator()).is_empty());
    }

    #[test]
    fn test_remove_session() {
        let tx = engine().build_remove_session(&validator(), 1);
        let call = ISmartSession::removeSessionCall::abi_decode(&tx.data).unwrap();
        assert_eq!(call.permissionId, validator().permission_id());
        assert_eq!(tx.value, U256::ZERO);
    }

    #[test]
    fn test_user_op_and_erc1271_policy_calls() {
        let engine = engine();
        let permission_id = validator().permission_id();
        let tx = engine.disable_user_op_policies(permission_id, vec![engine.constants().policies.sudo_policy]);
        let call = ISmartSession::disableUserOpPoliciesCall::abi_decode(&tx.data).unwrap();
        assert_eq!(call.policies, vec![engine.constants().policies.sudo_policy]);

        let tx = engine.enable_erc1271_policies(permission_id, ERC7739Data::default());
        assert_eq!(&tx.data[..4], ISmartSession::enableERC1271PoliciesCall::SELECTOR.as_slice());
    }
}
