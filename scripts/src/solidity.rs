//! Definitions of Solidity functions called while deploying and upgrading proxies

use alloy::sol;

sol! {
    /// `ProxyAdmin.upgradeAndCall`, upgrades a transparent proxy
    function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;

    /// `UUPSUpgradeable.upgradeToAndCall`, upgrades a UUPS proxy through its implementation
    function upgradeToAndCall(address newImplementation, bytes memory data) external payable;
}
