//! Implementations of the various proxy scripts

use std::{path::Path, str::FromStr};

use alloy::primitives::{Address, Bytes};
use tracing::{info, warn};

use crate::{
    artifacts::ArtifactRegistry,
    calldata::format_values,
    cli::{DeployProxyArgs, InspectArgs, UpgradeArgs},
    client::ChainClient,
    config::{DeployConfig, UpgradeConfig},
    deployments::Deployments,
    errors::ScriptError,
    orchestrator::Orchestrator,
};

/// Parse a hex address given on the command line
fn parse_address(address: &str) -> Result<Address, ScriptError> {
    Address::from_str(address).map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Resolve the proxy targeted by `--proxy` or `--name`, returning the name it is
/// recorded under and its address
fn resolve_target(
    deployments: &Deployments,
    proxy: Option<&str>,
    name: Option<&str>,
) -> Result<(String, Address), ScriptError> {
    match (proxy, name) {
        (_, Some(name)) => {
            let record = deployments.get(name)?;
            if let Some(proxy) = proxy.map(parse_address).transpose()? {
                if proxy != record.proxy {
                    return Err(ScriptError::ReadDeployments(format!(
                        "{name} is recorded at {:#x}, not {proxy:#x}",
                        record.proxy
                    )));
                }
            }
            Ok((name.to_string(), record.proxy))
        }
        (Some(proxy), None) => {
            let proxy = parse_address(proxy)?;
            let name = deployments
                .deployments
                .iter()
                .find(|(_, record)| record.proxy == proxy)
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| format!("{proxy:#x}"));
            Ok((name, proxy))
        }
        (None, None) => Err(ScriptError::CalldataConstruction(
            "either a proxy address or a deployment name is required".to_string(),
        )),
    }
}

/// Call a view function through the proxy and log its result
async fn log_read<C: ChainClient, R: ArtifactRegistry>(
    orchestrator: &Orchestrator<C, R>,
    proxy: Address,
    artifact: &str,
    function: &str,
) -> Result<(), ScriptError> {
    let values = orchestrator.read(proxy, artifact, function, &[]).await?;
    info!("{artifact}.{function}() returned {}", format_values(&values));
    Ok(())
}

/// Deploy a contract behind a new proxy and record the deployment
pub(crate) async fn deploy_proxy<C: ChainClient, R: ArtifactRegistry>(
    args: DeployProxyArgs,
    orchestrator: &Orchestrator<C, R>,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let mut deployments = Deployments::load(deployments_path)?;
    let name = args.name.unwrap_or_else(|| args.artifact.clone());
    if let Some(existing) = deployments.deployments.get(&name) {
        if !args.overwrite {
            return Err(ScriptError::WriteDeployments(format!(
                "{name} is already recorded at {:#x}, pass --overwrite to replace it",
                existing.proxy
            )));
        }
        warn!("Replacing the {name} deployment at {:#x}", existing.proxy);
    }

    let config = DeployConfig {
        artifact: args.artifact,
        args: args.args,
        initializer: (!args.no_initializer).then_some(args.initializer),
        kind: args.kind,
        proxy_artifact: args.proxy_artifact,
    };
    let record = orchestrator.deploy(&config).await?;

    deployments.insert(&name, record);
    deployments.save(deployments_path)?;

    info!("{name} deployment completed");
    Ok(())
}

/// Upgrade a proxy and update its deployment record
pub(crate) async fn upgrade<C: ChainClient, R: ArtifactRegistry>(
    args: UpgradeArgs,
    orchestrator: &Orchestrator<C, R>,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let mut deployments = Deployments::load(deployments_path)?;
    let (name, proxy) =
        resolve_target(&deployments, args.proxy.as_deref(), args.name.as_deref())?;

    let calldata = match args.calldata {
        Some(calldata) => Bytes::from_str(&calldata)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?,
        None => Bytes::new(),
    };

    let config = UpgradeConfig {
        proxy,
        artifact: args.artifact,
        calldata,
    };
    if let Some(function) = &args.read {
        orchestrator.check_read(&config.artifact, function)?;
    }
    let upgraded = orchestrator.upgrade(&config).await?;

    let record = match deployments.deployments.remove(&name) {
        Some(previous) => previous.upgraded(upgraded),
        None => upgraded,
    };
    deployments.insert(&name, record);
    deployments.save(deployments_path)?;
    info!("{name} upgrade completed");

    // The record must match the chain even if the read fails
    if let Some(function) = args.read {
        log_read(orchestrator, proxy, &config.artifact, &function).await?;
    }

    Ok(())
}

/// Log the state of a proxy
pub(crate) async fn inspect<C: ChainClient, R: ArtifactRegistry>(
    args: InspectArgs,
    orchestrator: &Orchestrator<C, R>,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let deployments = Deployments::load(deployments_path)?;
    let (name, proxy) =
        resolve_target(&deployments, args.proxy.as_deref(), args.name.as_deref())?;

    let state = orchestrator.inspect(proxy).await?;
    info!("{name}: {} proxy at {proxy:#x}", state.kind());
    info!("Implementation at {:#x}", state.implementation);
    if let Some(admin) = state.admin {
        info!("Proxy admin at {admin:#x}");
    }

    if let Some(function) = args.read {
        let artifact = match args.artifact {
            Some(artifact) => artifact,
            None => deployments.get(&name)?.artifact.clone(),
        };
        log_read(orchestrator, proxy, &artifact, &function).await?;
    }

    Ok(())
}
