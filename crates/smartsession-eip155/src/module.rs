//! ERC-7579 module installation on the account.

use alloy_primitives::{Address, Bytes, U256, address};
use alloy_sol_types::{SolCall, SolValue};
use serde::{Deserialize, Serialize};
use smartsession_types::Transaction;
use smartsession_types::reader::ContractReader;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::abi::IERC7579Account;
use crate::orchestrator::SmartSessions;
use crate::read::read;

/// Head of the account's linked module list.
pub const SENTINEL_ADDRESS: Address = address!("0x0000000000000000000000000000000000000001");

/// ERC-7579 module type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Validator,
    Executor,
    Fallback,
    Hook,
}

impl ModuleType {
    pub fn type_id(self) -> U256 {
        let id: u64 = match self {
            ModuleType::Validator => 1,
            ModuleType::Executor => 2,
            ModuleType::Fallback => 3,
            ModuleType::Hook => 4,
        };
        U256::from(id)
    }
}

/// Whether `module` is installed on `account`. A failed read counts as not installed.
#[cfg_attr(feature = "telemetry", instrument(skip_all, fields(account = %account, module = %module)))]
pub async fn is_installed<R: ContractReader + ?Sized>(
    reader: &R,
    account: Address,
    module: Address,
    module_type: ModuleType,
) -> bool {
    let call = IERC7579Account::isModuleInstalledCall {
        moduleTypeId: module_type.type_id(),
        module,
        additionalContext: Bytes::new(),
    };
    match read(reader, account, &call).await {
        Ok(installed) => installed,
        Err(_e) => {
            #[cfg(feature = "telemetry")]
            tracing::debug!(error = %_e, "Module install check failed, assuming not installed");
            false
        }
    }
}

/// `installModule(type, module, initData)` on `account`.
pub fn build_install_module(
    account: Address,
    module: Address,
    module_type: ModuleType,
    init_data: Bytes,
) -> Transaction {
    let call = IERC7579Account::installModuleCall {
        moduleTypeId: module_type.type_id(),
        module,
        initData: init_data,
    };
    Transaction::call(account, call.abi_encode())
}

/// `uninstallModule(type, module, abi.encode(prev, ""))` on `account`.
///
/// `prev` is `previous_module` when that module is installed as a validator,
/// otherwise [`SENTINEL_ADDRESS`].
pub async fn build_uninstall_module<R: ContractReader + ?Sized>(
    reader: &R,
    account: Address,
    module: Address,
    module_type: ModuleType,
    previous_module: Address,
) -> Transaction {
    let prev = if is_installed(reader, account, previous_module, ModuleType::Validator).await {
        previous_module
    } else {
        SENTINEL_ADDRESS
    };
    let call = IERC7579Account::uninstallModuleCall {
        moduleTypeId: module_type.type_id(),
        module,
        deInitData: (prev, Bytes::new()).abi_encode_params().into(),
    };
    Transaction::call(account, call.abi_encode())
}

/// Installs the smart-sessions validator on `account` unless it already is.
pub async fn build_install_smart_session_module<R: ContractReader + ?Sized>(
    engine: &SmartSessions,
    reader: &R,
    account: Address,
) -> Option<Transaction> {
    if is_installed(reader, account, engine.address(), ModuleType::Validator).await {
        None
    } else {
        Some(build_install_module(
            account,
            engine.address(),
            ModuleType::Validator,
            Bytes::new(),
        ))
    }
}
