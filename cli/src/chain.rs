//! Chain readers built from the configured RPC endpoints.

use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use smartsession_eip155::provider::ProviderReader;
use smartsession_types::chain::ChainRegistry;
use smartsession_types::config::Config;

pub type ChainReader = ProviderReader<DynProvider>;

/// Reader for `chain_id`, if the config has an RPC for it.
pub fn reader(config: &Config, chain_id: u64) -> Result<ChainReader, Box<dyn std::error::Error>> {
    let chain = config
        .chain(chain_id)
        .ok_or_else(|| format!("no rpc configured for chain {chain_id}"))?;
    let provider = ProviderBuilder::new().connect_http(chain.rpc.clone()).erased();
    Ok(ProviderReader::new(provider, chain_id))
}

/// Registry over the given chains. Every chain must have an RPC in the config.
pub fn registry(config: &Config, chain_ids: &[u64]) -> Result<ChainRegistry<ChainReader>, Box<dyn std::error::Error>> {
    let readers = chain_ids
        .iter()
        .map(|chain_id| reader(config, *chain_id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ChainRegistry::from_readers(readers))
}
