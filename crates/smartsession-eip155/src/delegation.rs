//! Delegated account lifecycle on a single chain.
//!
//! A delegated account is a smart session on the owner's account. Creating one
//! installs the smart-sessions module when needed and enables the session;
//! updating applies a policy diff; removing drops the session.

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};
use smartsession_types::reader::ContractReader;
use smartsession_types::{PolicyParams, PolicyType, Token, Transaction};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::entitlements::{SpendLimitEntitlement, SudoEntitlement};
use crate::error::SessionError;
use crate::module::build_install_smart_session_module;
use crate::orchestrator::SmartSessions;
use crate::session::{DelegatedAccountConfig, ValidatorKind, ValidatorRef};

/// Entitlements of a delegated account, shaped by its policy type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "tokens", rename_all = "lowercase")]
pub enum DelegatedEntitlements {
    SpendLimit(Vec<SpendLimitEntitlement>),
    Sudo(Vec<SudoEntitlement>),
}

impl SmartSessions {
    /// Transactions creating a delegated account on `account`: module install
    /// (only if missing) followed by `enableSessions`.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, fields(account = %account, chain_id = reader.chain_id())))]
    pub async fn create_delegated_account<R: ContractReader + ?Sized>(
        &self,
        reader: &R,
        account: Address,
        validator: &ValidatorRef,
        params: &PolicyParams,
    ) -> Vec<Transaction> {
        let mut transactions = Vec::with_capacity(2);
        if let Some(install) = build_install_smart_session_module(self, reader, account).await {
            transactions.push(install);
        }
        transactions.push(self.build_enable_session(reader.chain_id(), params, validator));
        transactions
    }

    /// Policy diff for an existing delegated account: disables first, then enables.
    pub fn update_delegated_account(
        &self,
        chain_id: u64,
        validator: &ValidatorRef,
        params: &PolicyParams,
    ) -> Vec<Transaction> {
        self.build_update_action_policies(chain_id, params, validator)
    }

    pub fn remove_delegated_account(&self, chain_id: u64, validator: &ValidatorRef) -> Transaction {
        self.build_remove_session(validator, chain_id)
    }

    /// Reads the entitlements of a delegated account for the given policy type.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(account = %account, policy = %policy)))]
    pub async fn get_delegated_account<R: ContractReader + ?Sized>(
        &self,
        reader: &R,
        tokens: &[Token],
        account: Address,
        validator: &ValidatorRef,
        policy: PolicyType,
    ) -> Result<DelegatedEntitlements, SessionError> {
        Ok(match policy {
            PolicyType::SpendLimit => DelegatedEntitlements::SpendLimit(
                self.spend_limit_entitlements(reader, tokens, account, validator)
                    .await?,
            ),
            PolicyType::Sudo => DelegatedEntitlements::Sudo(
                self.sudo_entitlements(reader, tokens, account, validator)
                    .await?,
            ),
        })
    }
}

/// A token held by an account, with its balance in the token's smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolding {
    #[serde(flatten)]
    pub token: Token,
    pub balance: U256,
}

impl SmartSessions {
    /// Holdings of `account` that the delegated session of `validator` can move.
    ///
    /// The native token (zero address) is skipped. Under a spend limit each
    /// balance is capped at the remaining allowance; under sudo a token keeps its
    /// balance if either `transfer` or `approve` is enabled. Tokens left with a
    /// zero balance are dropped.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(account = %account, policy = %policy)))]
    pub async fn delegated_tokens<R: ContractReader + ?Sized>(
        &self,
        reader: &R,
        holdings: &[TokenHolding],
        account: Address,
        validator: &ValidatorRef,
        policy: PolicyType,
    ) -> Result<Vec<TokenHolding>, SessionError> {
        let holdings: Vec<TokenHolding> = holdings
            .iter()
            .filter(|holding| !holding.token.address.is_zero())
            .copied()
            .collect();
        let tokens: Vec<Token> = holdings.iter().map(|holding| holding.token).collect();

        let spendable: Vec<U256> = match self
            .get_delegated_account(reader, &tokens, account, validator, policy)
            .await?
        {
            DelegatedEntitlements::SpendLimit(entitlements) => holdings
                .iter()
                .zip(&entitlements)
                .map(|(holding, entitlement)| holding.balance.min(entitlement.balance))
                .collect(),
            DelegatedEntitlements::Sudo(entitlements) => holdings
                .iter()
                .zip(&entitlements)
                .map(|(holding, entitlement)| {
                    let permissions = entitlement.permissions;
                    if permissions.spend || permissions.swap {
                        holding.balance
                    } else {
                        U256::ZERO
                    }
                })
                .collect(),
        };

        Ok(holdings
            .into_iter()
            .zip(spendable)
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(holding, balance)| TokenHolding { balance, ..holding })
            .collect())
    }
}

/// A delegated account record as kept by the owner's account service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAccount {
    pub name: String,
    pub validator: ValidatorKind,
    pub policy: PolicyType,
    pub validator_init_data: Bytes,
    pub salt: B256,
    /// Account the session lives on.
    pub account_address: Address,
    #[serde(default)]
    pub tag: String,
    #[serde(rename = "chainid")]
    pub chain_id: u64,
}

impl SubAccount {
    pub fn config(&self) -> DelegatedAccountConfig {
        DelegatedAccountConfig {
            validator: self.validator,
            validator_init_data: self.validator_init_data.clone(),
            salt: self.salt,
        }
    }
}

/// Sub-accounts split by relation to one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAccounts {
    /// Sessions living on the user's account.
    pub created: Vec<SubAccount>,
    /// Sessions whose session key is the user's validator.
    pub owned: Vec<SubAccount>,
}

/// Splits `sub_accounts` into those created on `account` and those owned
/// through `init_data`. A record can land in both lists.
pub fn partition_sub_accounts(account: Address, init_data: &Bytes, sub_accounts: &[SubAccount]) -> SubAccounts {
    SubAccounts {
        created: sub_accounts
            .iter()
            .filter(|sub| sub.account_address == account)
            .cloned()
            .collect(),
        owned: sub_accounts
            .iter()
            .filter(|sub| &sub.validator_init_data == init_data)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use serde_json::json;

    fn sub_account(account: &str, init_data: &str) -> SubAccount {
        serde_json::from_value(json!({
            "name": "trading",
            "validator": "ownable",
            "policy": "sudo",
            "validatorInitData": init_data,
            "salt": "0x3100000000000000000000000000000000000000000000000000000000000000",
            "accountAddress": account,
            "tag": "bot",
            "chainid": 8453
        }))
        .unwrap()
    }

    #[test]
    fn test_partition_sub_accounts() {
        let me = address!("0x00000000000000000000000000000000000000a1");
        let mine = Bytes::from(vec![0xab, 0xcd]);
        let subs = vec![
            sub_account("0x00000000000000000000000000000000000000A1", "0x1111"),
            sub_account("0x00000000000000000000000000000000000000b2", "0xABCD"),
            sub_account("0x00000000000000000000000000000000000000c3", "0x2222"),
        ];
        let split = partition_sub_accounts(me, &mine, &subs);
        assert_eq!(split.created, vec![subs[0].clone()]);
        assert_eq!(split.owned, vec![subs[1].clone()]);

        assert_eq!(partition_sub_accounts(me, &mine, &[]), SubAccounts::default());
    }

    #[test]
    fn test_sub_account_config() {
        let sub = sub_account("0x00000000000000000000000000000000000000a1", "0x1234");
        let config = sub.config();
        assert_eq!(config.validator, ValidatorKind::Ownable);
        assert_eq!(config.validator_init_data, Bytes::from(vec![0x12, 0x34]));
        assert_eq!(sub.chain_id, 8453);
    }

    #[test]
    fn test_entitlements_serialize_with_policy_tag() {
        let value = serde_json::to_value(DelegatedEntitlements::Sudo(vec![])).unwrap();
        assert_eq!(value, json!({ "policy": "sudo", "tokens": [] }));
    }
}
