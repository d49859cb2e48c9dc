//! Policy configuration in the layout the on-chain policy contracts expect.

use alloy_primitives::{Address, Bytes, FixedBytes, U256, address, fixed_bytes};
use alloy_sol_types::{SolCall, SolValue};
use smartsession_types::{ProtocolConstants, TokenLimit};

use crate::abi::{IERC20, PolicyData};

/// `transfer(address,uint256)`
pub const TRANSFER_SELECTOR: FixedBytes<4> = FixedBytes(IERC20::transferCall::SELECTOR);
/// `approve(address,uint256)`
pub const APPROVE_SELECTOR: FixedBytes<4> = FixedBytes(IERC20::approveCall::SELECTOR);

/// A swap router a sudo session may call, and the entry points it may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRouter {
    pub name: &'static str,
    pub address: Address,
    pub selectors: &'static [FixedBytes<4>],
}

/// Routers granted to every sudo session.
pub const SWAP_ALLOW_LIST: [SwapRouter; 2] = [
    SwapRouter {
        name: "lifi-diamond",
        address: address!("0x1231DEB6f5749EF6cE6943a275A1D3E7486F4EaE"),
        selectors: &[
            fixed_bytes!("0x5fd9ae2e"), // swapTokensMultipleV3ERC20ToERC20
            fixed_bytes!("0x2c57e884"), // swapTokensMultipleV3ERC20ToNative
            fixed_bytes!("0x736eac0b"), // swapTokensMultipleV3NativeToERC20
            fixed_bytes!("0x4666fc80"), // swapTokensSingleV3ERC20ToERC20
            fixed_bytes!("0x733214a3"), // swapTokensSingleV3ERC20ToNative
            fixed_bytes!("0xaf7060fd"), // swapTokensSingleV3NativeToERC20
        ],
    },
    SwapRouter {
        name: "kuru-router",
        address: address!("0xc816865f172d640d93712C68a7E1F83F3fA63235"),
        selectors: &[
            fixed_bytes!("0xffa5210a"), // anyToAnySwap
        ],
    },
];

/// Init data for the ownable (ECDSA threshold) validator: `abi.encode(uint256 threshold, address[] owners)`
/// with owners in ascending byte order, so the result does not depend on the order owners are given in.
pub fn encode_validation_data(threshold: u64, owners: &[Address]) -> Bytes {
    let mut owners = owners.to_vec();
    owners.sort();
    (U256::from(threshold), owners).abi_encode_params().into()
}

/// Spend-limit policy configured with `abi.encode(address[] tokens, uint256[] limits)`,
/// entries kept in the order given.
pub fn spend_limit_policy_data(constants: &ProtocolConstants, entries: &[TokenLimit]) -> PolicyData {
    let tokens: Vec<Address> = entries.iter().map(|entry| entry.token).collect();
    let limits: Vec<U256> = entries.iter().map(|entry| entry.amount).collect();
    PolicyData {
        policy: constants.policies.spend_limit_policy,
        initData: (tokens, limits).abi_encode_params().into(),
    }
}

/// Sudo (allow-all) policy. It takes no configuration.
pub fn sudo_policy_data(constants: &ProtocolConstants) -> PolicyData {
    PolicyData {
        policy: constants.policies.sudo_policy,
        initData: Bytes::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;
    use smartsession_types::ProtocolVersion;

    const A: Address = address!("0x00000000000000000000000000000000000000aa");
    const B: Address = address!("0x00000000000000000000000000000000000000bb");

    #[test]
    fn test_validation_data_ignores_owner_order() {
        assert_eq!(
            encode_validation_data(1, &[A, B]),
            encode_validation_data(1, &[B, A])
        );
    }

    #[test]
    fn test_validation_data_layout() {
        let encoded = encode_validation_data(1, &[B, A]);
        let expected = hex!(
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0000000000000000000000000000000000000000000000000000000000000040"
            "0000000000000000000000000000000000000000000000000000000000000002"
            "00000000000000000000000000000000000000000000000000000000000000aa"
            "00000000000000000000000000000000000000000000000000000000000000bb"
        );
        assert_eq!(encoded.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_spend_limit_policy_data() {
        let constants = ProtocolConstants::builtin(ProtocolVersion::V1_1_0);
        let data = spend_limit_policy_data(
            &constants,
            &[TokenLimit {
                token: A,
                amount: U256::from(1000u64),
            }],
        );
        assert_eq!(data.policy, constants.policies.spend_limit_policy);
        let (tokens, limits) =
            <(Vec<Address>, Vec<U256>)>::abi_decode_params(&data.initData).unwrap();
        assert_eq!(tokens, vec![A]);
        assert_eq!(limits, vec![U256::from(1000u64)]);
    }

    #[test]
    fn test_sudo_policy_has_empty_init_data() {
        let constants = ProtocolConstants::builtin(ProtocolVersion::V1_2_0);
        let data = sudo_policy_data(&constants);
        assert_eq!(data.policy, constants.policies.sudo_policy);
        assert!(data.initData.is_empty());
    }

    #[test]
    fn test_swap_allow_list_shape() {
        assert_eq!(SWAP_ALLOW_LIST[0].selectors.len(), 6);
        assert_eq!(SWAP_ALLOW_LIST[1].selectors.len(), 1);
        assert_eq!(TRANSFER_SELECTOR, fixed_bytes!("0xa9059cbb"));
        assert_eq!(APPROVE_SELECTOR, fixed_bytes!("0x095ea7b3"));
    }
}
