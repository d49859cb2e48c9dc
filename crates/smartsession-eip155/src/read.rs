//! Typed reads on top of [`ContractReader`].

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use smartsession_types::reader::{CallOutcome, ContractReader, ReadCall, ReadError};

/// Builds a [`ReadCall`] for a typed contract call.
pub fn read_call<C: SolCall>(target: Address, call: &C) -> ReadCall {
    ReadCall::new(target, call.abi_encode())
}

/// Executes `call` on `target` and decodes its return value.
pub async fn read<R, C>(reader: &R, target: Address, call: &C) -> Result<C::Return, ReadError>
where
    R: ContractReader + ?Sized,
    C: SolCall,
{
    let data = reader.call(read_call(target, call)).await?;
    C::abi_decode_returns(&data).map_err(|e| ReadError::Decode(e.to_string()))
}

/// Decodes one outcome of a batched read. A failed call or undecodable return data yields `None`.
pub fn decode_outcome<C: SolCall>(outcome: &CallOutcome) -> Option<C::Return> {
    outcome
        .data()
        .and_then(|data| C::abi_decode_returns(data).ok())
}
