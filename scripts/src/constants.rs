//! Constants used in the proxy scripts

use alloy::primitives::{b256, B256};

/// The storage slot containing the implementation address of an ERC-1967 proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const IMPLEMENTATION_STORAGE_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// The artifact name of the OpenZeppelin v5 transparent proxy
pub const TRANSPARENT_PROXY_ARTIFACT: &str = "TransparentUpgradeableProxy";

/// The artifact name of the OpenZeppelin v5 ERC-1967 proxy used for UUPS deployments
pub const ERC1967_PROXY_ARTIFACT: &str = "ERC1967Proxy";

/// The initializer invoked through the proxy when none is specified
pub const DEFAULT_INITIALIZER: &str = "initialize";

/// The name of the upgrade function a UUPS implementation must expose
pub const UUPS_UPGRADE_FUNCTION: &str = "upgradeToAndCall";

/// The RPC endpoint of a local hardhat / anvil node
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// The first default account of a local hardhat / anvil node
pub const DEFAULT_DEVNET_PKEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// The default hardhat artifacts directory
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The number of confirmations to wait for each transaction
pub const DEFAULT_NUM_CONFIRMATIONS: u64 = 1;

/// The number of seconds to wait for a transaction to be confirmed
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;

/// The directory hardhat writes solc build info into, which holds no artifacts
pub const BUILD_INFO_DIR: &str = "build-info";

/// The suffix of hardhat debug files living next to each artifact
pub const DEBUG_FILE_SUFFIX: &str = ".dbg.json";

/// The extension of an artifact file
pub const ARTIFACT_EXTENSION: &str = "json";

/// The marker solc leaves in bytecode for unlinked library addresses
pub const LIBRARY_PLACEHOLDER_MARKER: &str = "__";
