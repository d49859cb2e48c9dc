//! Readers keyed by chain.
//!
//! Multi-chain flows (hashing a session for several chains, looking up nonces)
//! need one [`ContractReader`] per chain. [`ChainRegistry`] holds them keyed by
//! the reader's EIP-155 chain id.
//!
//! # Example
//!
//! ```ignore
//! let registry = ChainRegistry::from_readers([base_reader, arbitrum_reader]);
//! let reader = registry.by_chain_id(8453).expect("base is configured");
//! ```

use std::collections::HashMap;

use crate::reader::ContractReader;

/// Registry of configured chain readers.
#[derive(Debug, Clone)]
pub struct ChainRegistry<R> {
    readers: HashMap<u64, R>,
}

impl<R> ChainRegistry<R> {
    pub fn new(readers: HashMap<u64, R>) -> Self {
        Self { readers }
    }

    /// Returns the reader for the given chain id, if configured.
    pub fn by_chain_id(&self, chain_id: u64) -> Option<&R> {
        self.readers.get(&chain_id)
    }

    /// Configured chain ids, in ascending order.
    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.readers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

impl<R: ContractReader> ChainRegistry<R> {
    /// Builds a registry keyed by each reader's own chain id.
    /// A later reader for the same chain replaces an earlier one.
    pub fn from_readers<I: IntoIterator<Item = R>>(readers: I) -> Self {
        let mut map = HashMap::new();
        for reader in readers {
            let chain_id = reader.chain_id();
            if map.insert(chain_id, reader).is_some() {
                #[cfg(feature = "telemetry")]
                tracing::warn!(chain_id, "Duplicate reader for chain, keeping the last one");
            }
        }
        Self::new(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{CallOutcome, ReadCall, ReadError};
    use alloy_primitives::Bytes;
    use async_trait::async_trait;

    struct FixedChain(u64);

    #[async_trait]
    impl ContractReader for FixedChain {
        fn chain_id(&self) -> u64 {
            self.0
        }

        async fn call(&self, _call: ReadCall) -> Result<Bytes, ReadError> {
            Ok(Bytes::new())
        }

        async fn multicall(&self, calls: Vec<ReadCall>) -> Result<Vec<CallOutcome>, ReadError> {
            Ok(calls.iter().map(|_| CallOutcome::Success(Bytes::new())).collect())
        }
    }

    #[test]
    fn test_registry_keys_by_reader_chain_id() {
        let registry = ChainRegistry::from_readers([FixedChain(8453), FixedChain(1)]);
        assert_eq!(registry.chain_ids(), vec![1, 8453]);
        assert_eq!(registry.by_chain_id(8453).map(|r| r.0), Some(8453));
        assert!(registry.by_chain_id(10).is_none());
    }

    #[tokio::test]
    async fn test_arc_reader_delegates() {
        let reader = std::sync::Arc::new(FixedChain(42));
        assert_eq!(ContractReader::chain_id(&reader), 42);
        let outcomes = reader
            .multicall(vec![ReadCall::new(Default::default(), Bytes::new())])
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_success());
    }
}
