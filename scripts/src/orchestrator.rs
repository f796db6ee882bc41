//! The proxy lifecycle: deploying a contract behind a proxy, and upgrading the
//! implementation behind an existing one.
//!
//! Every artifact and every piece of calldata is resolved before the first
//! transaction is sent, so bad input never leaves a partial deployment behind.

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes},
};
use tracing::{info, warn};

use crate::{
    artifacts::ArtifactRegistry,
    calldata::{decode_output, encode_call, find_function, initializer_calldata},
    client::ChainClient,
    config::{DeployConfig, UpgradeConfig},
    constants::UUPS_UPGRADE_FUNCTION,
    errors::ScriptError,
    proxy::{proxy_init_code, read_proxy_state, upgrade_call},
    types::{DeploymentRecord, ProxyKind, ProxyState},
};

/// Drives proxy deployments and upgrades against a network
pub struct Orchestrator<C, R> {
    /// The network to deploy to
    client: C,
    /// Where contract artifacts are resolved from
    registry: R,
}

impl<C: ChainClient, R: ArtifactRegistry> Orchestrator<C, R> {
    /// Create an orchestrator over the given network and artifacts
    pub fn new(client: C, registry: R) -> Self {
        Self { client, registry }
    }

    /// The network the orchestrator deploys to
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Deploy `config.artifact` behind a new proxy, initialized with `config.args`
    pub async fn deploy(&self, config: &DeployConfig) -> Result<DeploymentRecord, ScriptError> {
        let artifact = self.registry.resolve(&config.artifact)?;
        let proxy_artifact = self.registry.resolve(config.proxy_artifact())?;

        if config.kind == ProxyKind::Uups && !artifact.has_function(UUPS_UPGRADE_FUNCTION) {
            return Err(ScriptError::CalldataConstruction(format!(
                "{} does not implement {UUPS_UPGRADE_FUNCTION}, it cannot back a UUPS proxy",
                artifact.contract_name
            )));
        }

        let init_data =
            initializer_calldata(&artifact.abi, config.initializer.as_deref(), &config.args)?;
        if init_data.is_empty() {
            warn!("Deploying {} without initialization", artifact.contract_name);
        }

        info!("Deploying {} implementation...", artifact.contract_name);
        let implementation = self.client.deploy(artifact.bytecode.clone()).await?;
        info!("{} deployed to {implementation:#x}", artifact.contract_name);

        info!("Deploying {} proxy...", config.kind);
        let init_code = proxy_init_code(
            config.kind,
            &proxy_artifact.bytecode,
            implementation,
            self.client.sender(),
            init_data,
        );
        let proxy = self.client.deploy(init_code).await?;

        let state = read_proxy_state(&self.client, proxy).await?;
        if state.implementation != implementation {
            return Err(ScriptError::Network(format!(
                "proxy {proxy:#x} points at {:#x}, expected {implementation:#x}",
                state.implementation
            )));
        }

        info!("Proxy deployed to {proxy:#x}");
        if let Some(admin) = state.admin {
            info!("Proxy admin deployed to {admin:#x}");
        }

        Ok(DeploymentRecord {
            proxy,
            implementation,
            admin: state.admin,
            kind: config.kind,
            artifact: config.artifact.clone(),
            constructor_args: config.args.clone(),
        })
    }

    /// Upgrade the proxy at `config.proxy` to a new implementation built from `config.artifact`
    pub async fn upgrade(&self, config: &UpgradeConfig) -> Result<DeploymentRecord, ScriptError> {
        let artifact = self.registry.resolve(&config.artifact)?;
        let state = read_proxy_state(&self.client, config.proxy).await?;
        let kind = state.kind();

        if kind == ProxyKind::Uups && !artifact.has_function(UUPS_UPGRADE_FUNCTION) {
            warn!(
                "{} does not implement {UUPS_UPGRADE_FUNCTION}, the proxy will not be upgradeable again",
                artifact.contract_name
            );
        }

        info!("Upgrading {kind} proxy {:#x} to {}...", state.proxy, artifact.contract_name);
        let implementation = self.client.deploy(artifact.bytecode.clone()).await?;
        info!("{} deployed to {implementation:#x}", artifact.contract_name);

        let (to, data) = upgrade_call(&state, implementation, config.calldata.clone());
        let tx_hash = self.client.send(to, data).await?;

        let upgraded = read_proxy_state(&self.client, state.proxy).await?;
        if upgraded.implementation != implementation {
            return Err(ScriptError::Network(format!(
                "upgrade {tx_hash:#x} landed but proxy {:#x} still points at {:#x}",
                state.proxy, upgraded.implementation
            )));
        }
        info!("Proxy {:#x} upgraded to {implementation:#x}", state.proxy);

        Ok(DeploymentRecord {
            proxy: state.proxy,
            implementation,
            admin: upgraded.admin,
            kind,
            artifact: config.artifact.clone(),
            constructor_args: Vec::new(),
        })
    }

    /// Read the current implementation and admin of a proxy
    pub async fn inspect(&self, proxy: Address) -> Result<ProxyState, ScriptError> {
        read_proxy_state(&self.client, proxy).await
    }

    /// Check that `artifact` exposes a view function `function` without arguments
    pub fn check_read(&self, artifact: &str, function: &str) -> Result<(), ScriptError> {
        let artifact = self.registry.resolve(artifact)?;
        find_function(&artifact.abi, function, 0).map(|_| ())
    }

    /// Call a view function of `artifact` through the proxy and decode the result
    pub async fn read(
        &self,
        proxy: Address,
        artifact: &str,
        function: &str,
        args: &[String],
    ) -> Result<Vec<DynSolValue>, ScriptError> {
        let artifact = self.registry.resolve(artifact)?;
        let function = find_function(&artifact.abi, function, args.len())?;
        let data: Bytes = encode_call(function, args)?;

        let output = self.client.call(proxy, data).await?;
        decode_output(function, &output)
    }
}
