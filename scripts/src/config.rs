//! Configuration of a single script invocation.
//!
//! These are built from the CLI arguments, so that every address and name the
//! scripts act on is an explicit input.

use std::time::Duration;

use alloy::primitives::{Address, Bytes};

use crate::types::ProxyKind;

/// How to reach and sign for the target network
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// The JSON-RPC endpoint of the network
    pub rpc_url: String,
    /// The private key of the deployer
    pub priv_key: String,
    /// The number of confirmations to wait for each transaction
    pub confirmations: u64,
    /// How long to wait for each transaction to be confirmed
    pub timeout: Duration,
}

/// The inputs of a proxy deployment
#[derive(Clone, Debug)]
pub struct DeployConfig {
    /// The artifact of the implementation contract
    pub artifact: String,
    /// The arguments passed to the initializer
    pub args: Vec<String>,
    /// The initializer to call through the proxy, `None` to deploy uninitialized
    pub initializer: Option<String>,
    /// The kind of proxy to deploy
    pub kind: ProxyKind,
    /// The artifact holding the proxy bytecode, defaults to the one for `kind`
    pub proxy_artifact: Option<String>,
}

impl DeployConfig {
    /// The artifact holding the proxy bytecode
    pub fn proxy_artifact(&self) -> &str {
        self.proxy_artifact
            .as_deref()
            .unwrap_or_else(|| self.kind.default_proxy_artifact())
    }
}

/// The inputs of a proxy upgrade
#[derive(Clone, Debug)]
pub struct UpgradeConfig {
    /// The proxy to upgrade
    pub proxy: Address,
    /// The artifact of the new implementation contract
    pub artifact: String,
    /// Calldata to call the new implementation with during the upgrade
    pub calldata: Bytes,
}
