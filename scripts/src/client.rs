//! The network boundary: submitting transactions and reading chain state

use std::{str::FromStr, time::Duration};

use alloy::{
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{config::NetworkConfig, errors::ScriptError};

/// The operations the orchestrator needs from a network.
///
/// Every state-changing method blocks until the transaction is confirmed
/// and fails if it reverted.
#[async_trait]
pub trait ChainClient {
    /// The address transactions are sent from
    fn sender(&self) -> Address;

    /// Deploy a contract from its init code, returning its address
    async fn deploy(&self, init_code: Bytes) -> Result<Address, ScriptError>;

    /// Send a transaction calling `to` with `data`
    async fn send(&self, to: Address, data: Bytes) -> Result<TxHash, ScriptError>;

    /// Execute a call against `to` without submitting a transaction
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ScriptError>;

    /// Get the runtime code at an address
    async fn code_at(&self, address: Address) -> Result<Bytes, ScriptError>;

    /// Read a storage slot of an address
    async fn storage_at(&self, address: Address, slot: B256) -> Result<B256, ScriptError>;
}

/// A [`ChainClient`] talking to a JSON-RPC endpoint with a local signer
#[derive(Clone)]
pub struct RpcClient {
    /// The provider, with the signer attached
    provider: DynProvider<Ethereum>,
    /// The address of the signer
    sender: Address,
    /// The number of confirmations to wait for
    confirmations: u64,
    /// How long to wait for a transaction to be confirmed
    timeout: Duration,
}

impl RpcClient {
    /// Sets up a client for the given network, signing with its private key
    pub async fn connect(config: &NetworkConfig) -> Result<Self, ScriptError> {
        let signer = PrivateKeySigner::from_str(&config.priv_key)
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        let sender = signer.address();
        let url = Url::parse(&config.rpc_url)
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

        let provider = ProviderBuilder::new().wallet(signer).connect_http(url);
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        info!("Connected to chain {chain_id} at {} as {sender:#x}", config.rpc_url);

        Ok(Self::new(
            DynProvider::new(provider),
            sender,
            config.confirmations,
            config.timeout,
        ))
    }

    /// Wraps a provider that signs transactions for `sender`
    pub fn new(
        provider: DynProvider<Ethereum>,
        sender: Address,
        confirmations: u64,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            sender,
            confirmations,
            timeout,
        }
    }

    /// Send a transaction and wait for it to be confirmed successfully
    async fn send_and_confirm(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionReceipt, ScriptError> {
        let pending = self
            .provider
            .send_transaction(tx.with_from(self.sender))
            .await
            .map_err(|e| ScriptError::Network(e.to_string()))?;
        debug!("Sent transaction {:#x}", pending.tx_hash());

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.timeout))
            .get_receipt()
            .await
            .map_err(|e| ScriptError::Network(e.to_string()))?;

        check_receipt(receipt)
    }
}

/// Fail if the transaction of a receipt reverted
fn check_receipt(receipt: TransactionReceipt) -> Result<TransactionReceipt, ScriptError> {
    if !receipt.status() {
        return Err(ScriptError::Network(format!(
            "transaction {:#x} reverted",
            receipt.transaction_hash
        )));
    }

    Ok(receipt)
}

/// The address of the contract created by a transaction
fn deployed_address(receipt: &TransactionReceipt) -> Result<Address, ScriptError> {
    receipt.contract_address.ok_or_else(|| {
        ScriptError::Network(format!(
            "no contract address in receipt of {:#x}",
            receipt.transaction_hash
        ))
    })
}

#[async_trait]
impl ChainClient for RpcClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn deploy(&self, init_code: Bytes) -> Result<Address, ScriptError> {
        let tx = TransactionRequest::default().with_deploy_code(init_code);
        let receipt = self.send_and_confirm(tx).await?;
        deployed_address(&receipt)
    }

    async fn send(&self, to: Address, data: Bytes) -> Result<TxHash, ScriptError> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        let receipt = self.send_and_confirm(tx).await?;
        Ok(receipt.transaction_hash)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(to)
            .with_input(data);

        self.provider
            .call(tx)
            .await
            .map_err(|e| ScriptError::Network(e.to_string()))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ScriptError> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| ScriptError::Network(e.to_string()))
    }

    async fn storage_at(&self, address: Address, slot: B256) -> Result<B256, ScriptError> {
        let value: U256 = self
            .provider
            .get_storage_at(address, U256::from_be_bytes(slot.0))
            .await
            .map_err(|e| ScriptError::Network(e.to_string()))?;

        Ok(B256::from(value.to_be_bytes::<32>()))
    }
}
