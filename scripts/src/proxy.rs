//! The ERC-1967 proxy protocol: where proxies keep their implementation and admin,
//! how they are constructed, and how they are upgraded

use alloy::{
    primitives::{Address, Bytes, B256},
    sol_types::{SolCall, SolValue},
};

use crate::{
    client::ChainClient,
    constants::{IMPLEMENTATION_STORAGE_SLOT, PROXY_ADMIN_STORAGE_SLOT},
    errors::ScriptError,
    solidity::{upgradeAndCallCall, upgradeToAndCallCall},
    types::{ProxyKind, ProxyState},
};

/// Interpret a storage word as an address, `None` if it is unset
pub fn slot_address(word: B256) -> Option<Address> {
    let address = Address::from_word(word);
    (!address.is_zero()).then_some(address)
}

/// Read the implementation and admin of the proxy at `proxy`.
///
/// Fails with [`ScriptError::ProxyNotFound`] if there is no contract at the
/// address, or if it does not store an implementation in the ERC-1967 slot.
pub async fn read_proxy_state<C: ChainClient + ?Sized>(
    client: &C,
    proxy: Address,
) -> Result<ProxyState, ScriptError> {
    if client.code_at(proxy).await?.is_empty() {
        return Err(ScriptError::ProxyNotFound(format!("no contract at {proxy:#x}")));
    }

    let implementation = client
        .storage_at(proxy, IMPLEMENTATION_STORAGE_SLOT)
        .await
        .map(slot_address)?
        .ok_or_else(|| {
            ScriptError::ProxyNotFound(format!("{proxy:#x} has no ERC-1967 implementation"))
        })?;

    // This is the recommended way to get the proxy admin address:
    // https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
    let admin = client
        .storage_at(proxy, PROXY_ADMIN_STORAGE_SLOT)
        .await
        .map(slot_address)?;

    Ok(ProxyState {
        proxy,
        implementation,
        admin,
    })
}

/// Build the init code of a proxy delegating to `implementation`.
///
/// A transparent proxy deploys its own `ProxyAdmin`, owned by `owner`. In both
/// cases the proxy calls the implementation with `data` from its constructor.
pub fn proxy_init_code(
    kind: ProxyKind,
    proxy_bytecode: &Bytes,
    implementation: Address,
    owner: Address,
    data: Bytes,
) -> Bytes {
    let constructor_args = match kind {
        ProxyKind::Transparent => (implementation, owner, data).abi_encode_params(),
        ProxyKind::Uups => (implementation, data).abi_encode_params(),
    };

    [proxy_bytecode.as_ref(), constructor_args.as_slice()]
        .concat()
        .into()
}

/// Build the transaction upgrading `state.proxy` to `implementation`,
/// returning the address to send it to and its calldata
pub fn upgrade_call(state: &ProxyState, implementation: Address, data: Bytes) -> (Address, Bytes) {
    match state.admin {
        // Transparent proxies are upgraded through their admin
        Some(admin) => {
            let call = upgradeAndCallCall {
                proxy: state.proxy,
                implementation,
                data,
            };
            (admin, call.abi_encode().into())
        }
        None => {
            let call = upgradeToAndCallCall {
                newImplementation: implementation,
                data,
            };
            (state.proxy, call.abi_encode().into())
        }
    }
}
