//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::Address;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::constants::{ERC1967_PROXY_ARTIFACT, TRANSPARENT_PROXY_ARTIFACT};

/// The flavours of ERC-1967 proxy that can be deployed
#[derive(ValueEnum, Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    /// A `TransparentUpgradeableProxy`, upgraded through its `ProxyAdmin`
    #[default]
    Transparent,
    /// An `ERC1967Proxy`, upgraded through the implementation's `upgradeToAndCall`
    Uups,
}

impl ProxyKind {
    /// The name of the artifact holding the proxy bytecode for this kind
    pub fn default_proxy_artifact(&self) -> &'static str {
        match self {
            ProxyKind::Transparent => TRANSPARENT_PROXY_ARTIFACT,
            ProxyKind::Uups => ERC1967_PROXY_ARTIFACT,
        }
    }
}

impl Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyKind::Transparent => write!(f, "transparent"),
            ProxyKind::Uups => write!(f, "uups"),
        }
    }
}

/// The addresses making up a proxy deployment.
///
/// The proxy address is fixed at deployment; upgrades only ever replace
/// the implementation (and the artifact it was built from).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeploymentRecord {
    /// The proxy contract, the address callers interact with
    pub proxy: Address,
    /// The implementation contract the proxy currently delegates to
    pub implementation: Address,
    /// The `ProxyAdmin` of a transparent proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<Address>,
    /// The kind of proxy deployed
    pub kind: ProxyKind,
    /// The artifact the current implementation was built from
    pub artifact: String,
    /// The arguments passed to the initializer at deployment
    #[serde(default)]
    pub constructor_args: Vec<String>,
}

impl DeploymentRecord {
    /// Apply an upgrade to this record, keeping its deployment-time fields
    pub fn upgraded(self, upgrade: DeploymentRecord) -> Self {
        Self {
            implementation: upgrade.implementation,
            admin: upgrade.admin,
            artifact: upgrade.artifact,
            ..self
        }
    }
}

/// The state of a proxy as read from its ERC-1967 storage slots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProxyState {
    /// The proxy address
    pub proxy: Address,
    /// The implementation address
    pub implementation: Address,
    /// The admin address, if one is set
    pub admin: Option<Address>,
}

impl ProxyState {
    /// The kind of proxy, inferred from the presence of an admin
    pub fn kind(&self) -> ProxyKind {
        if self.admin.is_some() {
            ProxyKind::Transparent
        } else {
            ProxyKind::Uups
        }
    }
}
