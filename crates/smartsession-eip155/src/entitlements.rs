//! Per-token view of what a delegated session may still do.
//!
//! Entitlements are reconstructed from deployed policy state through batched
//! reads. A token whose read fails reports the most restrictive value (zero
//! allowance, no permissions) instead of failing the whole query.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use smartsession_types::Token;
use smartsession_types::reader::{CallOutcome, ContractReader};
use smartsession_types::units::format_amount;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::abi::{ISmartSession, ISpendingLimitPolicy};
use crate::error::SessionError;
use crate::orchestrator::SmartSessions;
use crate::policy::{APPROVE_SELECTOR, TRANSFER_SELECTOR};
use crate::read::{decode_outcome, read_call};
use crate::session::{ValidatorRef, action_id, config_id};

/// Remaining spend allowance for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendLimitEntitlement {
    pub address: Address,
    /// Configured limit, formatted with the token's decimals.
    pub limit: String,
    /// Amount already spent, formatted with the token's decimals.
    pub spent: String,
    /// `limit - spent` in the token's smallest unit, floored at zero.
    pub balance: U256,
}

impl SpendLimitEntitlement {
    fn none(address: Address) -> Self {
        Self {
            address,
            limit: "0".to_string(),
            spent: "0".to_string(),
            balance: U256::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SudoPermissions {
    /// `approve` is enabled on the token.
    pub swap: bool,
    /// `transfer` is enabled on the token.
    pub spend: bool,
}

/// Sudo permissions for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SudoEntitlement {
    pub address: Address,
    pub permissions: SudoPermissions,
}

impl SmartSessions {
    /// Spend-limit allowance per token for the session of `validator` on `account`.
    ///
    /// Issues one batch of `getPolicyData` reads and one batch of
    /// `isActionPolicyEnabled` reads. A token reports zero unless both reads
    /// succeed and the spend-limit policy is enabled on its `transfer` action.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(account = %account, tokens = tokens.len())))]
    pub async fn spend_limit_entitlements<R: ContractReader + ?Sized>(
        &self,
        reader: &R,
        tokens: &[Token],
        account: Address,
        validator: &ValidatorRef,
    ) -> Result<Vec<SpendLimitEntitlement>, SessionError> {
        let permission_id = validator.permission_id();
        let spend_limit_policy = self.constants().policies.spend_limit_policy;

        let policy_reads = tokens
            .iter()
            .map(|token| {
                let transfer_action = action_id(token.address, TRANSFER_SELECTOR);
                read_call(
                    spend_limit_policy,
                    &ISpendingLimitPolicy::getPolicyDataCall {
                        id: config_id(account, permission_id, transfer_action),
                        multiplexer: self.address(),
                        token: token.address,
                        account,
                    },
                )
            })
            .collect();
        let enabled_reads = tokens
            .iter()
            .map(|token| {
                read_call(
                    self.address(),
                    &ISmartSession::isActionPolicyEnabledCall {
                        account,
                        permissionId: permission_id,
                        actionId: action_id(token.address, TRANSFER_SELECTOR),
                        policy: spend_limit_policy,
                    },
                )
            })
            .collect();

        let policies = reader.multicall(policy_reads).await?;
        let enabled = reader.multicall(enabled_reads).await?;

        Ok(tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| {
                spend_limit_entitlement(token, policies.get(idx), enabled.get(idx))
            })
            .collect())
    }

    /// Sudo permissions per token for the session of `validator` on `account`,
    /// from one batch of `getEnabledActions` reads.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(account = %account, tokens = tokens.len())))]
    pub async fn sudo_entitlements<R: ContractReader + ?Sized>(
        &self,
        reader: &R,
        tokens: &[Token],
        account: Address,
        validator: &ValidatorRef,
    ) -> Result<Vec<SudoEntitlement>, SessionError> {
        let permission_id = validator.permission_id();
        let reads = tokens
            .iter()
            .map(|_| {
                read_call(
                    self.address(),
                    &ISmartSession::getEnabledActionsCall {
                        account,
                        permissionId: permission_id,
                    },
                )
            })
            .collect();
        let outcomes = reader.multicall(reads).await?;

        Ok(tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| SudoEntitlement {
                address: token.address,
                permissions: outcomes
                    .get(idx)
                    .and_then(decode_outcome::<ISmartSession::getEnabledActionsCall>)
                    .map(|actions| sudo_permissions(token.address, &actions))
                    .unwrap_or_default(),
            })
            .collect())
    }
}

fn spend_limit_entitlement(
    token: &Token,
    policy: Option<&CallOutcome>,
    enabled: Option<&CallOutcome>,
) -> SpendLimitEntitlement {
    let enabled = enabled
        .and_then(decode_outcome::<ISmartSession::isActionPolicyEnabledCall>)
        .unwrap_or(false);
    let policy = policy.and_then(decode_outcome::<ISpendingLimitPolicy::getPolicyDataCall>);
    match policy {
        Some(data) if enabled => SpendLimitEntitlement {
            address: token.address,
            limit: format_amount(data.spendingLimit, token.decimals),
            spent: format_amount(data.alreadySpent, token.decimals),
            balance: data.spendingLimit.saturating_sub(data.alreadySpent),
        },
        _ => {
            #[cfg(feature = "telemetry")]
            tracing::debug!(token = %token.address, enabled, "No spend limit entitlement");
            SpendLimitEntitlement::none(token.address)
        }
    }
}

fn sudo_permissions(token: Address, enabled_actions: &[B256]) -> SudoPermissions {
    SudoPermissions {
        swap: enabled_actions.contains(&action_id(token, APPROVE_SELECTOR)),
        spend: enabled_actions.contains(&action_id(token, TRANSFER_SELECTOR)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, address};
    use alloy_sol_types::SolValue;

    const TOKEN: Address = address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

    fn usdc() -> Token {
        Token {
            address: TOKEN,
            decimals: 6,
        }
    }

    fn policy_outcome(limit: u64, spent: u64) -> CallOutcome {
        CallOutcome::Success((U256::from(limit), U256::from(spent)).abi_encode_params().into())
    }

    fn enabled_outcome(enabled: bool) -> CallOutcome {
        CallOutcome::Success(enabled.abi_encode().into())
    }

    #[test]
    fn test_spend_limit_formats_with_decimals() {
        let entitlement = spend_limit_entitlement(
            &usdc(),
            Some(&policy_outcome(25_000_000, 2_500_000)),
            Some(&enabled_outcome(true)),
        );
        assert_eq!(entitlement.limit, "25");
        assert_eq!(entitlement.spent, "2.5");
        assert_eq!(entitlement.balance, U256::from(22_500_000u64));
    }

    #[test]
    fn test_spend_limit_zero_when_disabled_or_failed() {
        let none = SpendLimitEntitlement::none(TOKEN);
        assert_eq!(
            spend_limit_entitlement(&usdc(), Some(&policy_outcome(10, 1)), Some(&enabled_outcome(false))),
            none
        );
        assert_eq!(
            spend_limit_entitlement(
                &usdc(),
                Some(&CallOutcome::Failure("reverted".into())),
                Some(&enabled_outcome(true))
            ),
            none
        );
        assert_eq!(
            spend_limit_entitlement(&usdc(), Some(&CallOutcome::Success(Bytes::new())), None),
            none
        );
    }

    #[test]
    fn test_overspent_balance_saturates() {
        let entitlement = spend_limit_entitlement(
            &usdc(),
            Some(&policy_outcome(100, 150)),
            Some(&enabled_outcome(true)),
        );
        assert_eq!(entitlement.balance, U256::ZERO);
    }

    #[test]
    fn test_sudo_permissions_by_action_membership() {
        let approve = action_id(TOKEN, APPROVE_SELECTOR);
        let transfer = action_id(TOKEN, TRANSFER_SELECTOR);
        assert_eq!(
            sudo_permissions(TOKEN, &[approve]),
            SudoPermissions { swap: true, spend: false }
        );
        assert_eq!(
            sudo_permissions(TOKEN, &[transfer, approve]),
            SudoPermissions { swap: true, spend: true }
        );
        assert_eq!(sudo_permissions(TOKEN, &[]), SudoPermissions::default());
    }
}
