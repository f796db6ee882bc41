//! An in-memory chain running mock OpenZeppelin proxies, and hardhat artifacts for them
#![allow(dead_code)]

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use alloy::{
    primitives::{keccak256, Address, Bytes, TxHash, B256, U256},
    sol,
    sol_types::{SolCall, SolValue},
};
use async_trait::async_trait;
use proxy_scripts::{
    artifacts::HardhatArtifacts,
    client::ChainClient,
    constants::{IMPLEMENTATION_STORAGE_SLOT, PROXY_ADMIN_STORAGE_SLOT},
    errors::ScriptError,
    orchestrator::Orchestrator,
};
use tempfile::TempDir;

sol! {
    function initialize(uint256 value) external;
    function value() external view returns (uint256);
    function version() external pure returns (uint256);
    function increment() external;
    function upgradeToAndCall(address newImplementation, bytes memory data) external payable;
    function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;
}

/// Artifact of an upgradeable contract storing a value
pub const V1: &str = "TestContractV1";
/// Artifact of the second version of [`V1`], adding `increment`.
///
/// Its ABI also lists an `owner` getter the mock contract does not implement.
pub const V2: &str = "TestContractV2";
/// Artifact of a contract that cannot upgrade itself
pub const FIXED: &str = "TestContractFixed";

/// Slot of the stored value in the proxy's storage
const VALUE_SLOT: B256 = B256::ZERO;
/// Slot of the initialized flag in the proxy's storage
const INITIALIZED_SLOT: B256 = B256::with_last_byte(1);
/// Slot of the owner in a proxy admin's storage
const OWNER_SLOT: B256 = B256::ZERO;

/// The contracts the mock chain knows how to run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Code {
    V1,
    V2,
    Fixed,
    TransparentProxy,
    Erc1967Proxy,
    ProxyAdmin,
}

impl Code {
    /// The bytecode the contract is deployed from
    pub fn bytecode(self) -> &'static [u8] {
        match self {
            Code::V1 => &[0x60, 0x80, 0x60, 0x01],
            Code::V2 => &[0x60, 0x80, 0x60, 0x02],
            Code::Fixed => &[0x60, 0x80, 0x60, 0x03],
            Code::TransparentProxy => &[0x60, 0x80, 0x60, 0xaa],
            Code::Erc1967Proxy => &[0x60, 0x80, 0x60, 0xbb],
            Code::ProxyAdmin => &[0x60, 0x80, 0x60, 0xcc],
        }
    }

    /// Split init code into the contract it deploys and its constructor arguments
    fn from_init_code(init_code: &[u8]) -> Option<(Self, &[u8])> {
        [
            Code::V1,
            Code::V2,
            Code::Fixed,
            Code::TransparentProxy,
            Code::Erc1967Proxy,
        ]
        .into_iter()
        .find_map(|code| {
            init_code
                .strip_prefix(code.bytecode())
                .map(|args| (code, args))
        })
    }
}

fn revert(reason: &str) -> ScriptError {
    ScriptError::Network(format!("execution reverted: {reason}"))
}

fn decode_error(e: alloy::sol_types::Error) -> ScriptError {
    revert(&e.to_string())
}

fn word(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

#[derive(Clone, Debug)]
struct Account {
    code: Code,
    storage: HashMap<B256, B256>,
}

#[derive(Clone, Debug, Default)]
struct State {
    accounts: HashMap<Address, Account>,
    nonce: u64,
}

impl State {
    fn code(&self, address: Address) -> Option<Code> {
        self.accounts.get(&address).map(|account| account.code)
    }

    fn storage(&self, address: Address, slot: B256) -> B256 {
        self.accounts
            .get(&address)
            .and_then(|account| account.storage.get(&slot).copied())
            .unwrap_or_default()
    }

    fn slot_address(&self, address: Address, slot: B256) -> Address {
        Address::from_word(self.storage(address, slot))
    }

    fn store(&mut self, address: Address, slot: B256, value: B256) {
        if let Some(account) = self.accounts.get_mut(&address) {
            account.storage.insert(slot, value);
        }
    }

    fn create(&mut self, address: Address, code: Code) {
        let account = Account {
            code,
            storage: HashMap::new(),
        };
        self.accounts.insert(address, account);
    }

    /// Run a contract constructor at `address`
    fn construct(&mut self, address: Address, code: Code, args: &[u8]) -> Result<(), ScriptError> {
        self.create(address, code);
        match code {
            Code::TransparentProxy => {
                let (logic, owner, data) =
                    <(Address, Address, Bytes)>::abi_decode_params(args).map_err(decode_error)?;
                let admin = address.create(1);
                self.create(admin, Code::ProxyAdmin);
                self.store(admin, OWNER_SLOT, owner.into_word());
                self.store(address, PROXY_ADMIN_STORAGE_SLOT, admin.into_word());
                self.upgrade_to(address, logic, &data)
            }
            Code::Erc1967Proxy => {
                let (logic, data) =
                    <(Address, Bytes)>::abi_decode_params(args).map_err(decode_error)?;
                self.upgrade_to(address, logic, &data)
            }
            _ => Ok(()),
        }
    }

    /// Point `proxy` at `implementation` and call it with `data` if there is any
    fn upgrade_to(
        &mut self,
        proxy: Address,
        implementation: Address,
        data: &[u8],
    ) -> Result<(), ScriptError> {
        if self.code(implementation).is_none() {
            return Err(revert("ERC1967InvalidImplementation"));
        }

        self.store(proxy, IMPLEMENTATION_STORAGE_SLOT, implementation.into_word());
        if !data.is_empty() {
            self.delegate(proxy, implementation, data)?;
        }
        Ok(())
    }

    /// Execute a message call from `caller` to `to`
    fn call(&mut self, caller: Address, to: Address, data: &[u8]) -> Result<Bytes, ScriptError> {
        match self.code(to) {
            None => Ok(Bytes::new()),
            Some(Code::TransparentProxy) => {
                if caller == self.slot_address(to, PROXY_ADMIN_STORAGE_SLOT) {
                    return Err(revert("ProxyDeniedAdminAccess"));
                }
                let logic = self.slot_address(to, IMPLEMENTATION_STORAGE_SLOT);
                self.delegate(to, logic, data)
            }
            Some(Code::Erc1967Proxy) => {
                let logic = self.slot_address(to, IMPLEMENTATION_STORAGE_SLOT);
                self.delegate(to, logic, data)
            }
            Some(Code::ProxyAdmin) => self.admin_call(caller, to, data),
            Some(_) => self.delegate(to, to, data),
        }
    }

    /// Run the code at `logic` against the storage of `context`
    fn delegate(
        &mut self,
        context: Address,
        logic: Address,
        data: &[u8],
    ) -> Result<Bytes, ScriptError> {
        let code = self.code(logic).ok_or_else(|| revert("no code"))?;
        let version = match code {
            Code::V1 | Code::Fixed => 1u64,
            Code::V2 => 2,
            _ => return Err(revert("not an implementation")),
        };
        let selector = data.get(..4).ok_or_else(|| revert("missing selector"))?;
        let stored = U256::from_be_bytes(self.storage(context, VALUE_SLOT).0);

        if selector == initializeCall::SELECTOR {
            if !self.storage(context, INITIALIZED_SLOT).is_zero() {
                return Err(revert("InvalidInitialization"));
            }
            let call = initializeCall::abi_decode(data).map_err(decode_error)?;
            self.store(context, VALUE_SLOT, word(call.value));
            self.store(context, INITIALIZED_SLOT, B256::with_last_byte(1));
            Ok(Bytes::new())
        } else if selector == valueCall::SELECTOR {
            Ok(stored.abi_encode().into())
        } else if selector == versionCall::SELECTOR {
            Ok(U256::from(version).abi_encode().into())
        } else if selector == incrementCall::SELECTOR && code == Code::V2 {
            self.store(context, VALUE_SLOT, word(stored + U256::from(1)));
            Ok(Bytes::new())
        } else if selector == upgradeToAndCallCall::SELECTOR && code != Code::Fixed {
            let call = upgradeToAndCallCall::abi_decode(data).map_err(decode_error)?;
            self.upgrade_to(context, call.newImplementation, &call.data)?;
            Ok(Bytes::new())
        } else {
            Err(revert("unknown selector"))
        }
    }

    /// Execute a call to a `ProxyAdmin`
    fn admin_call(
        &mut self,
        caller: Address,
        admin: Address,
        data: &[u8],
    ) -> Result<Bytes, ScriptError> {
        let call = upgradeAndCallCall::abi_decode(data).map_err(decode_error)?;
        if caller != self.slot_address(admin, OWNER_SLOT) {
            return Err(revert("OwnableUnauthorizedAccount"));
        }
        if self.slot_address(call.proxy, PROXY_ADMIN_STORAGE_SLOT) != admin {
            return Err(revert("ProxyDeniedAdminAccess"));
        }

        self.upgrade_to(call.proxy, call.implementation, &call.data)?;
        Ok(Bytes::new())
    }
}

/// A [`ChainClient`] executing transactions against in-memory state.
///
/// Reverted transactions leave the state untouched, as on a real chain.
#[derive(Debug)]
pub struct MockChain {
    sender: Address,
    state: Mutex<State>,
    transactions: AtomicUsize,
    offline: AtomicBool,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new(Address::repeat_byte(0x5e))
    }
}

impl MockChain {
    /// Create an empty chain with transactions sent from `sender`
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            state: Mutex::new(State::default()),
            transactions: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// The number of transactions submitted, including reverted ones
    pub fn transactions(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }

    /// Make every request fail as if the node were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), ScriptError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ScriptError::Network("connection refused".to_string()));
        }
        Ok(())
    }

    /// Submit a transaction, committing its effects only if it succeeds
    fn transact<T>(
        &self,
        f: impl FnOnce(&mut State, Address) -> Result<T, ScriptError>,
    ) -> Result<(T, TxHash), ScriptError> {
        self.check_online()?;
        let count = self.transactions.fetch_add(1, Ordering::SeqCst);
        let tx_hash = keccak256(count.to_be_bytes());

        let mut state = self.state.lock().unwrap();
        let created = self.sender.create(state.nonce);
        state.nonce += 1;

        let mut next = state.clone();
        let result = f(&mut next, created)?;
        *state = next;
        Ok((result, tx_hash))
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn deploy(&self, init_code: Bytes) -> Result<Address, ScriptError> {
        let (address, _) = self.transact(|state, address| {
            let (code, args) =
                Code::from_init_code(&init_code).ok_or_else(|| revert("unknown init code"))?;
            state.construct(address, code, args)?;
            Ok(address)
        })?;
        Ok(address)
    }

    async fn send(&self, to: Address, data: Bytes) -> Result<TxHash, ScriptError> {
        let sender = self.sender;
        let (_, tx_hash) = self.transact(|state, _| state.call(sender, to, &data))?;
        Ok(tx_hash)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ScriptError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap().clone();
        state.call(self.sender, to, &data)
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ScriptError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .code(address)
            .map(|code| Bytes::from_static(code.bytecode()))
            .unwrap_or_default())
    }

    async fn storage_at(&self, address: Address, slot: B256) -> Result<B256, ScriptError> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().storage(address, slot))
    }
}

// -------------
// | Artifacts |
// -------------

const INITIALIZE_ABI: &str = r#"{"type":"function","name":"initialize","inputs":[{"name":"value","type":"uint256","internalType":"uint256"}],"outputs":[],"stateMutability":"nonpayable"}"#;
const VALUE_ABI: &str = r#"{"type":"function","name":"value","inputs":[],"outputs":[{"name":"","type":"uint256","internalType":"uint256"}],"stateMutability":"view"}"#;
const VERSION_ABI: &str = r#"{"type":"function","name":"version","inputs":[],"outputs":[{"name":"","type":"uint256","internalType":"uint256"}],"stateMutability":"pure"}"#;
const OWNER_ABI: &str = r#"{"type":"function","name":"owner","inputs":[],"outputs":[{"name":"","type":"address","internalType":"address"}],"stateMutability":"view"}"#;
const INCREMENT_ABI: &str = r#"{"type":"function","name":"increment","inputs":[],"outputs":[],"stateMutability":"nonpayable"}"#;
const UPGRADE_TO_AND_CALL_ABI: &str = r#"{"type":"function","name":"upgradeToAndCall","inputs":[{"name":"newImplementation","type":"address","internalType":"address"},{"name":"data","type":"bytes","internalType":"bytes"}],"outputs":[],"stateMutability":"payable"}"#;
const TRANSPARENT_CONSTRUCTOR_ABI: &str = r#"{"type":"constructor","inputs":[{"name":"_logic","type":"address","internalType":"address"},{"name":"initialOwner","type":"address","internalType":"address"},{"name":"_data","type":"bytes","internalType":"bytes"}],"stateMutability":"payable"}"#;
const ERC1967_CONSTRUCTOR_ABI: &str = r#"{"type":"constructor","inputs":[{"name":"implementation","type":"address","internalType":"address"},{"name":"_data","type":"bytes","internalType":"bytes"}],"stateMutability":"payable"}"#;

/// Write a hardhat artifact for `name`, compiled from `source`
fn write_artifact(root: &Path, source: &str, name: &str, abi: &[&str], code: Code) {
    let dir = root.join(source);
    fs::create_dir_all(&dir).unwrap();

    let bytecode = Bytes::from_static(code.bytecode());
    let artifact = format!(
        r#"{{"_format":"hh-sol-artifact-1","contractName":"{name}","sourceName":"{source}","abi":[{}],"bytecode":"{bytecode}","deployedBytecode":"{bytecode}","linkReferences":{{}},"deployedLinkReferences":{{}}}}"#,
        abi.join(",")
    );
    fs::write(dir.join(format!("{name}.json")), artifact).unwrap();
    fs::write(dir.join(format!("{name}.dbg.json")), "{}").unwrap();
}

/// Populate a hardhat artifacts directory with the mock contracts
pub fn write_artifacts(root: &Path) {
    write_artifact(
        root,
        "contracts/TestContractV1.sol",
        V1,
        &[INITIALIZE_ABI, VALUE_ABI, VERSION_ABI, UPGRADE_TO_AND_CALL_ABI],
        Code::V1,
    );
    write_artifact(
        root,
        "contracts/TestContractV2.sol",
        V2,
        &[
            INITIALIZE_ABI,
            VALUE_ABI,
            VERSION_ABI,
            INCREMENT_ABI,
            OWNER_ABI,
            UPGRADE_TO_AND_CALL_ABI,
        ],
        Code::V2,
    );
    write_artifact(
        root,
        "contracts/TestContractFixed.sol",
        FIXED,
        &[INITIALIZE_ABI, VALUE_ABI, VERSION_ABI],
        Code::Fixed,
    );
    write_artifact(
        root,
        "@openzeppelin/contracts/proxy/transparent/TransparentUpgradeableProxy.sol",
        "TransparentUpgradeableProxy",
        &[TRANSPARENT_CONSTRUCTOR_ABI],
        Code::TransparentProxy,
    );
    write_artifact(
        root,
        "@openzeppelin/contracts/proxy/ERC1967/ERC1967Proxy.sol",
        "ERC1967Proxy",
        &[ERC1967_CONSTRUCTOR_ABI],
        Code::Erc1967Proxy,
    );
    fs::create_dir_all(root.join("build-info")).unwrap();
}

/// An orchestrator over a fresh mock chain and artifacts directory.
///
/// The returned directory holds the artifacts and must outlive the orchestrator.
pub fn setup() -> (TempDir, Orchestrator<MockChain, HardhatArtifacts>) {
    let dir = tempfile::tempdir().unwrap();
    let artifacts_dir = dir.path().join("artifacts");
    write_artifacts(&artifacts_dir);

    let orchestrator = Orchestrator::new(MockChain::default(), HardhatArtifacts::new(artifacts_dir));
    (dir, orchestrator)
}
