//! [`ContractReader`] over an alloy [`Provider`].
//!
//! Single reads are plain `eth_call`s. Batches go through Multicall3
//! `aggregate3` with `allowFailure` set on every call, so one reverting call
//! only fails its own outcome.

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_provider::bindings::IMulticall3;
use alloy_provider::{MULTICALL3_ADDRESS, Provider};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_sol_types::SolCall;
use alloy_transport::TransportError;
use async_trait::async_trait;
use smartsession_types::reader::{CallOutcome, ContractReader, ReadCall, ReadError};

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// Reads contract state through `provider` on a known chain.
#[derive(Debug, Clone)]
pub struct ProviderReader<P> {
    provider: P,
    chain_id: u64,
    multicall: Address,
}

impl<P: Provider> ProviderReader<P> {
    pub fn new(provider: P, chain_id: u64) -> Self {
        Self {
            provider,
            chain_id,
            multicall: MULTICALL3_ADDRESS,
        }
    }

    /// Asks the node for its chain id.
    pub async fn connect(provider: P) -> Result<Self, ReadError> {
        let chain_id = provider.get_chain_id().await.map_err(read_error)?;
        Ok(Self::new(provider, chain_id))
    }

    /// Uses a Multicall3 deployment other than the canonical one.
    pub fn with_multicall(mut self, multicall: Address) -> Self {
        self.multicall = multicall;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn eth_call(&self, to: Address, input: Bytes) -> Result<Bytes, ReadError> {
        let request = TransactionRequest::default().with_to(to).with_input(input);
        self.provider.call(request).await.map_err(read_error)
    }
}

#[async_trait]
impl<P: Provider> ContractReader for ProviderReader<P> {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(chain_id = self.chain_id, target = %call.target)))]
    async fn call(&self, call: ReadCall) -> Result<Bytes, ReadError> {
        self.eth_call(call.target, call.calldata).await
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(chain_id = self.chain_id, calls = calls.len())))]
    async fn multicall(&self, calls: Vec<ReadCall>) -> Result<Vec<CallOutcome>, ReadError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        let aggregate = IMulticall3::aggregate3Call {
            calls: calls
                .into_iter()
                .map(|call| IMulticall3::Call3 {
                    target: call.target,
                    allowFailure: true,
                    callData: call.calldata,
                })
                .collect(),
        };
        let data = self
            .eth_call(self.multicall, aggregate.abi_encode().into())
            .await?;
        let results = IMulticall3::aggregate3Call::abi_decode_returns(&data)
            .map_err(|e| ReadError::Decode(e.to_string()))?;
        Ok(results.into_iter().map(outcome).collect())
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(chain_id = self.chain_id, address = %address)))]
    async fn storage_at(&self, address: Address, slot: B256) -> Result<B256, ReadError> {
        let word = self
            .provider
            .get_storage_at(address, U256::from_be_bytes(slot.0))
            .await
            .map_err(read_error)?;
        Ok(B256::from(word.to_be_bytes::<32>()))
    }
}

fn outcome(result: IMulticall3::Result) -> CallOutcome {
    if result.success {
        CallOutcome::Success(result.returnData)
    } else {
        CallOutcome::Failure(format!("call reverted: {}", result.returnData))
    }
}

fn read_error(e: TransportError) -> ReadError {
    match e.as_error_resp() {
        Some(payload) if payload.as_revert_data().is_some() => ReadError::Reverted(payload.to_string()),
        _ => ReadError::Transport(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn test_failed_call_outcome_keeps_return_data() {
        let failed = outcome(IMulticall3::Result {
            success: false,
            returnData: Bytes::from(hex!("08c379a0")),
        });
        assert!(!failed.is_success());
        assert!(matches!(failed, CallOutcome::Failure(reason) if reason.contains("08c379a0")));

        let ok = outcome(IMulticall3::Result {
            success: true,
            returnData: Bytes::from(hex!("01")),
        });
        assert_eq!(ok.data(), Some(&Bytes::from(hex!("01"))));
    }
}
