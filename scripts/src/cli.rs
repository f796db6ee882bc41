//! Definitions of CLI arguments and commands for the proxy scripts

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::{
    artifacts::{ArtifactRegistry, HardhatArtifacts},
    client::{ChainClient, RpcClient},
    commands::{deploy_proxy, inspect, upgrade},
    config::NetworkConfig,
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_DEPLOYMENTS_PATH,
        DEFAULT_DEVNET_PKEY, DEFAULT_INITIALIZER, DEFAULT_NUM_CONFIRMATIONS, DEFAULT_RPC_URL,
    },
    errors::ScriptError,
    orchestrator::Orchestrator,
    types::ProxyKind,
};

/// Deploy contracts behind ERC-1967 upgradeable proxies, and upgrade them
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Private key of the deployer, defaults to the first local devnet account
    #[arg(
        short,
        long,
        env = "PKEY",
        default_value = DEFAULT_DEVNET_PKEY,
        hide_default_value = true,
        hide_env_values = true
    )]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Path to the hardhat artifacts directory
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Path to the file deployments are recorded in
    #[arg(short, long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: PathBuf,

    /// Number of confirmations to wait for on each transaction
    #[arg(long, default_value_t = DEFAULT_NUM_CONFIRMATIONS)]
    pub confirmations: u64,

    /// Seconds to wait for each transaction to be confirmed
    #[arg(long, default_value_t = DEFAULT_CONFIRMATION_TIMEOUT_SECS)]
    pub timeout: u64,

    /// The script to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The network configuration given on the command line
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            rpc_url: self.rpc_url.clone(),
            priv_key: self.priv_key.clone(),
            confirmations: self.confirmations,
            timeout: Duration::from_secs(self.timeout),
        }
    }

    /// Connect to the network and run the command
    pub async fn run(self) -> Result<(), ScriptError> {
        let client = RpcClient::connect(&self.network_config()).await?;
        let orchestrator = Orchestrator::new(client, HardhatArtifacts::new(&self.artifacts_dir));

        self.command.run(&orchestrator, &self.deployments_path).await
    }
}

/// The scripts that can be run
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a contract behind a new upgradeable proxy
    DeployProxy(DeployProxyArgs),
    /// Upgrade the implementation behind an existing proxy
    Upgrade(UpgradeArgs),
    /// Show the implementation and admin of an existing proxy
    Inspect(InspectArgs),
}

impl Command {
    /// Run the command, recording deployments in the file at `deployments_path`
    pub async fn run<C: ChainClient, R: ArtifactRegistry>(
        self,
        orchestrator: &Orchestrator<C, R>,
        deployments_path: &Path,
    ) -> Result<(), ScriptError> {
        match self {
            Command::DeployProxy(args) => deploy_proxy(args, orchestrator, deployments_path).await,
            Command::Upgrade(args) => upgrade(args, orchestrator, deployments_path).await,
            Command::Inspect(args) => inspect(args, orchestrator, deployments_path).await,
        }
    }
}

/// Deploy an implementation contract and a proxy delegating to it.
///
/// By default this is a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
/// which itself deploys a `ProxyAdmin` contract owned by the deployer.
/// Upgrade calls can only be made to the `TransparentUpgradeableProxy` through the `ProxyAdmin`.
#[derive(Args)]
pub struct DeployProxyArgs {
    /// Name of the implementation contract artifact
    #[arg(long)]
    pub artifact: String,

    /// Arguments to the initializer, parsed according to its ABI
    #[arg(long, num_args = 1.., allow_negative_numbers = true)]
    pub args: Vec<String>,

    /// The initializer to call through the proxy
    #[arg(long, default_value = DEFAULT_INITIALIZER)]
    pub initializer: String,

    /// Deploy the proxy without calling an initializer
    #[arg(long)]
    pub no_initializer: bool,

    /// The kind of proxy to deploy
    #[arg(long, value_enum, default_value_t = ProxyKind::Transparent)]
    pub kind: ProxyKind,

    /// Name of the proxy contract artifact, defaults to the OpenZeppelin proxy for `kind`
    #[arg(long)]
    pub proxy_artifact: Option<String>,

    /// Name to record the deployment under, defaults to the artifact name
    #[arg(long)]
    pub name: Option<String>,

    /// Replace an existing deployment recorded under the same name
    #[arg(long)]
    pub overwrite: bool,
}

/// Upgrade a proxy to a new implementation contract
#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["proxy", "name"])))]
pub struct UpgradeArgs {
    /// Address of the proxy contract
    #[arg(long)]
    pub proxy: Option<String>,

    /// Name the proxy deployment was recorded under
    #[arg(long)]
    pub name: Option<String>,

    /// Name of the new implementation contract artifact
    #[arg(long)]
    pub artifact: String,

    /// Optional calldata, in hex form, with which to
    /// call the implementation contract when upgrading
    #[arg(long)]
    pub calldata: Option<String>,

    /// A view function without arguments to call through the proxy once upgraded
    #[arg(long)]
    pub read: Option<String>,
}

/// Show the state of a proxy
#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["proxy", "name"])))]
pub struct InspectArgs {
    /// Address of the proxy contract
    #[arg(long)]
    pub proxy: Option<String>,

    /// Name the proxy deployment was recorded under
    #[arg(long)]
    pub name: Option<String>,

    /// Artifact whose ABI is used for `--read`, defaults to the recorded artifact
    #[arg(long)]
    pub artifact: Option<String>,

    /// A view function without arguments to call through the proxy
    #[arg(long)]
    pub read: Option<String>,
}
