//! Solidity bindings for the smart-sessions module, its policies and the ERC-7579 account.
//!
//! Struct layouts and field order here are part of the wire format: they are
//! ABI-encoded into calldata and signatures, and hashed into EIP-712 digests
//! under these exact type names.

use alloy_sol_types::sol;

sol! {
    /// A policy contract together with the configuration it is initialized with.
    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct PolicyData {
        address policy;
        bytes initData;
    }

    /// A (target, selector) pair a session may call, and the policies guarding it.
    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct ActionData {
        bytes4 actionTargetSelector;
        address actionTarget;
        PolicyData[] actionPolicies;
    }

    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct ERC7739Context {
        bytes32 appDomainSeparator;
        string[] contentName;
    }

    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct ERC7739Data {
        ERC7739Context[] allowedERC7739Content;
        PolicyData[] erc1271Policies;
    }

    /// On-chain session layout, as accepted by `enableSessions` and embedded in
    /// enable-mode signatures.
    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct Session {
        address sessionValidator;
        bytes sessionValidatorInitData;
        bytes32 salt;
        PolicyData[] userOpPolicies;
        ERC7739Data erc7739Policies;
        ActionData[] actions;
        bool permitERC4337Paymaster;
    }

    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct ChainDigest {
        uint64 chainId;
        bytes32 sessionDigest;
    }

    /// Payload of an enable-mode signature.
    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct EnableSession {
        uint8 chainDigestIndex;
        ChainDigest[] hashesAndChainIds;
        Session sessionToEnable;
        bytes permissionEnableSig;
    }

    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct SignedPermissions {
        bool permitGenericPolicy;
        bool permitAdminAccess;
        bool ignoreSecurityAttestations;
        bool permitERC4337Paymaster;
        PolicyData[] userOpPolicies;
        ERC7739Data erc7739Policies;
        ActionData[] actions;
    }

    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct SignedSession {
        address account;
        SignedPermissions permissions;
        address sessionValidator;
        bytes sessionValidatorInitData;
        bytes32 salt;
        address smartSession;
        uint256 nonce;
    }

    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct ChainSession {
        uint64 chainId;
        SignedSession session;
    }

    /// EIP-712 primary type signed by the account owner to enable sessions on
    /// several chains at once.
    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    struct MultiChainSession {
        ChainSession[] sessionsAndChainIds;
    }

    #[allow(missing_docs)]
    interface ISmartSession {
        function enableSessions(Session[] calldata sessions) external returns (bytes32[] memory permissionIds);
        function removeSession(bytes32 permissionId) external;

        function enableActionPolicies(bytes32 permissionId, ActionData[] calldata actionPolicies) external;
        function disableActionPolicies(bytes32 permissionId, bytes32 actionId, address[] calldata policies) external;
        function enableUserOpPolicies(bytes32 permissionId, PolicyData[] calldata userOpPolicies) external;
        function disableUserOpPolicies(bytes32 permissionId, address[] calldata policies) external;
        function enableERC1271Policies(bytes32 permissionId, ERC7739Data calldata erc1271Policies) external;
        function disableERC1271Policies(bytes32 permissionId, address[] calldata policies, ERC7739Context[] calldata contexts) external;

        function getNonce(bytes32 permissionId, address account) external view returns (uint256);
        function getSessionDigest(bytes32 permissionId, address account, Session memory data, uint8 mode) external view returns (bytes32);
        function isPermissionEnabled(bytes32 permissionId, address account) external view returns (bool);
        function getEnabledActions(address account, bytes32 permissionId) external view returns (bytes32[] memory);
        function isActionPolicyEnabled(address account, bytes32 permissionId, bytes32 actionId, address policy) external view returns (bool);
    }

    #[allow(missing_docs)]
    interface ISpendingLimitPolicy {
        function getPolicyData(bytes32 id, address multiplexer, address token, address account) external view returns (uint256 spendingLimit, uint256 alreadySpent);
    }

    #[allow(missing_docs)]
    interface IERC7579Account {
        function installModule(uint256 moduleTypeId, address module, bytes calldata initData) external payable;
        function uninstallModule(uint256 moduleTypeId, address module, bytes calldata deInitData) external payable;
        function isModuleInstalled(uint256 moduleTypeId, address module, bytes calldata additionalContext) external view returns (bool);
    }

    #[allow(missing_docs)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
