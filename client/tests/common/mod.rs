//! Shared test fixtures: an in-memory chain and an in-memory content store.
//!
//! [`MockChain`] implements [`WalletProvider`] by decoding calldata with the
//! crate's own ABI codec and simulating the factory, jar, token, and
//! collection contracts. It enforces the contract rules the clients lean on:
//! a jar accepts exactly one donor, a deposit needs a confirmed allowance,
//! withdrawal is custodian-only, and a mint logs the ERC-721 `Transfer`
//! event carrying the assigned token id. Switches exist for the awkward
//! cases — delayed submissions, receipts without the `Transfer` log, and
//! jar reads that fail at the transport level.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sha3::{Digest, Keccak256};

use hodljar_client::abi;
use hodljar_client::config::ClientConfig;
use hodljar_client::errors::{ClientError, Result};
use hodljar_client::storage::{MetadataStore, StoredContent};
use hodljar_client::types::{Address, NftMetadata, TxHash, TxLog, TxReceipt};
use hodljar_client::wallet::{WalletProvider, WalletSession};

const CREATE_JAR: &str = "createHODLJar(string,string,string,uint256,address)";
const APPROVE: &str = "approve(address,uint256)";
const DONATE: &str = "donate(uint256)";
const WITHDRAW: &str = "withdraw(uint256)";
const MINT: &str = "mint(string)";
const TRANSFER_FROM: &str = "transferFrom(address,address,uint256)";
const TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";
const DONATION_EVENT: &str = "DonationReceived(address,uint256)";

const GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Install a subscriber so `RUST_LOG=debug cargo test` shows client logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Deterministic 20-byte address derived from a label.
pub fn test_address(label: &str) -> Address {
    let digest = Keccak256::digest(label.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::from_bytes(bytes)
}

fn test_tx_hash(n: u64) -> TxHash {
    let digest = Keccak256::digest(format!("tx-{n}").as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    TxHash::from_bytes(bytes)
}

/// A session on the mock chain for the given account.
pub fn session(chain: &Arc<MockChain>, address: Address) -> WalletSession {
    WalletSession::new(address, chain.clone())
}

// ─────────────────────────────────────────────────────────
// Mock chain
// ─────────────────────────────────────────────────────────

/// One simulated jar contract.
#[derive(Debug, Clone)]
pub struct JarState {
    pub kid_name: String,
    pub image_url: String,
    pub story: String,
    pub age: u8,
    pub foster_home: Address,
    pub donor: Option<Address>,
    pub balance: u128,
}

#[derive(Debug, Clone)]
struct TokenState {
    id: u128,
    owner: Address,
    uri: String,
}

#[derive(Default)]
struct ChainState {
    jars: Vec<(Address, JarState)>,
    allowances: HashMap<(Address, Address), u128>,
    tokens: Vec<TokenState>,
    receipts: HashMap<TxHash, TxReceipt>,
    tx_counter: u64,
    /// Labels of executed writes, in submission order.
    writes: Vec<&'static str>,
}

/// In-memory [`WalletProvider`] simulating the whole contract suite.
pub struct MockChain {
    pub factory: Address,
    pub token: Address,
    pub collection: Address,
    state: Mutex<ChainState>,
    submit_delay: Mutex<Option<Duration>>,
    omit_mint_event: AtomicBool,
    jar_reads_broken: AtomicBool,
}

impl MockChain {
    pub fn new() -> Self {
        MockChain {
            factory: test_address("factory"),
            token: test_address("usdc"),
            collection: test_address("collection"),
            state: Mutex::new(ChainState::default()),
            submit_delay: Mutex::new(None),
            omit_mint_event: AtomicBool::new(false),
            jar_reads_broken: AtomicBool::new(false),
        }
    }

    /// Config pointing every contract address at this chain.
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            rpc_url: "http://mock".to_string(),
            factory: self.factory,
            token: self.token,
            collection: self.collection,
            storage_api_url: "http://mock-store".to_string(),
            storage_token: "test-token".to_string(),
            ipfs_gateway: GATEWAY.to_string(),
            submit_timeout: Duration::from_secs(180),
            confirm_timeout: Duration::from_secs(60),
            receipt_poll_interval: Duration::from_millis(10),
        }
    }

    /// Register a jar directly, bypassing the factory write path.
    pub fn seed_jar(&self, name: &str, story: &str, age: u8, foster_home: Address) -> Address {
        let mut state = self.state.lock().unwrap();
        let address = test_address(&format!("jar-{}", state.jars.len()));
        state.jars.push((
            address,
            JarState {
                kid_name: name.to_string(),
                image_url: String::new(),
                story: story.to_string(),
                age,
                foster_home,
                donor: None,
                balance: 0,
            },
        ));
        address
    }

    /// Mint a token directly with an arbitrary URI, bypassing the client.
    pub fn seed_token(&self, owner: Address, uri: &str) -> u128 {
        let mut state = self.state.lock().unwrap();
        let id = state.tokens.len() as u128 + 1;
        state.tokens.push(TokenState {
            id,
            owner,
            uri: uri.to_string(),
        });
        id
    }

    /// Delay every subsequent submission by `delay` before it lands.
    pub fn delay_submissions(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = Some(delay);
    }

    /// Drop the `Transfer` log from subsequent mint receipts.
    pub fn omit_mint_transfer_event(&self) {
        self.omit_mint_event.store(true, Ordering::SeqCst);
    }

    /// Make every jar-level read fail at the transport level.
    pub fn break_jar_reads(&self) {
        self.jar_reads_broken.store(true, Ordering::SeqCst);
    }

    pub fn jar(&self, address: Address) -> Option<JarState> {
        self.state
            .lock()
            .unwrap()
            .jars
            .iter()
            .find(|(a, _)| *a == address)
            .map(|(_, jar)| jar.clone())
    }

    pub fn jar_count(&self) -> usize {
        self.state.lock().unwrap().jars.len()
    }

    pub fn token_owner(&self, id: u128) -> Option<Address> {
        self.state
            .lock()
            .unwrap()
            .tokens
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn writes(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Apply one write, mimicking the contracts: invariant violations mine a
    /// reverted receipt, unknown targets are refused at submission.
    fn execute(
        &self,
        state: &mut ChainState,
        from: Address,
        to: Address,
        call: &CallData,
    ) -> Result<Mined> {
        if to == self.factory {
            if call.selector == abi::selector(CREATE_JAR) {
                let address = test_address(&format!("jar-{}", state.jars.len()));
                state.jars.push((
                    address,
                    JarState {
                        kid_name: call.string_arg(0)?,
                        image_url: call.string_arg(1)?,
                        story: call.string_arg(2)?,
                        age: call.uint_arg(3)? as u8,
                        foster_home: call.address_arg(4)?,
                        donor: None,
                        balance: 0,
                    },
                ));
                return Ok(Mined::ok("createHODLJar"));
            }
            return Err(unknown_call("factory", call.selector));
        }

        if to == self.token {
            if call.selector == abi::selector(APPROVE) {
                let spender = call.address_arg(0)?;
                let amount = call.uint_arg(1)?;
                state.allowances.insert((from, spender), amount);
                return Ok(Mined::ok("approve"));
            }
            return Err(unknown_call("token", call.selector));
        }

        if to == self.collection {
            if call.selector == abi::selector(MINT) {
                let uri = call.string_arg(0)?;
                let id = state.tokens.len() as u128 + 1;
                state.tokens.push(TokenState {
                    id,
                    owner: from,
                    uri,
                });
                let mut mined = Mined::ok("mint");
                if !self.omit_mint_event.load(Ordering::SeqCst) {
                    mined.logs.push(transfer_log(to, Address::ZERO, from, id));
                }
                return Ok(mined);
            }
            if call.selector == abi::selector(TRANSFER_FROM) {
                let owner = call.address_arg(0)?;
                let recipient = call.address_arg(1)?;
                let id = call.uint_arg(2)?;
                let Some(token) = state.tokens.iter_mut().find(|t| t.id == id) else {
                    return Ok(Mined::reverted("transferFrom"));
                };
                if token.owner != owner {
                    return Ok(Mined::reverted("transferFrom"));
                }
                token.owner = recipient;
                let mut mined = Mined::ok("transferFrom");
                mined.logs.push(transfer_log(to, owner, recipient, id));
                return Ok(mined);
            }
            return Err(unknown_call("collection", call.selector));
        }

        let Some(index) = state.jars.iter().position(|(a, _)| *a == to) else {
            return Err(ClientError::Rejected(format!("mock: no contract at {to}")));
        };
        if call.selector == abi::selector(DONATE) {
            let amount = call.uint_arg(0)?;
            if state.jars[index].1.donor.is_some() {
                return Ok(Mined::reverted("donate"));
            }
            let allowance = state.allowances.get(&(from, to)).copied().unwrap_or(0);
            if allowance < amount {
                return Ok(Mined::reverted("donate"));
            }
            state.allowances.insert((from, to), allowance - amount);
            let jar = &mut state.jars[index].1;
            jar.donor = Some(from);
            jar.balance += amount;
            let mut mined = Mined::ok("donate");
            mined.logs.push(donation_log(to, from, amount));
            return Ok(mined);
        }
        if call.selector == abi::selector(WITHDRAW) {
            let amount = call.uint_arg(0)?;
            let jar = &mut state.jars[index].1;
            if from != jar.foster_home || jar.balance < amount {
                return Ok(Mined::reverted("withdraw"));
            }
            jar.balance -= amount;
            return Ok(Mined::ok("withdraw"));
        }
        Err(unknown_call("jar", call.selector))
    }
}

#[async_trait]
impl WalletProvider for MockChain {
    async fn call(&self, to: Address, data: &str) -> Result<String> {
        let call = CallData::parse(data)?;
        let state = self.state.lock().unwrap();

        if to == self.factory {
            return if call.selector == abi::selector("getTotalJars()") {
                Ok(encode_uint(state.jars.len() as u128))
            } else if call.selector == abi::selector("getAllHODLJars()") {
                let addresses: Vec<Address> = state.jars.iter().map(|(a, _)| *a).collect();
                Ok(encode_address_array(&addresses))
            } else {
                Err(unknown_call("factory", call.selector))
            };
        }

        if to == self.collection {
            return if call.selector == abi::selector("totalSupply()") {
                Ok(encode_uint(state.tokens.len() as u128))
            } else if call.selector == abi::selector("tokenByIndex(uint256)") {
                let index = call.uint_arg(0)? as usize;
                let token = state.tokens.get(index).ok_or_else(|| {
                    ClientError::Wallet(format!("mock: token index {index} out of range"))
                })?;
                Ok(encode_uint(token.id))
            } else if call.selector == abi::selector("tokenURI(uint256)") {
                let id = call.uint_arg(0)?;
                let token = state.tokens.iter().find(|t| t.id == id).ok_or_else(|| {
                    ClientError::Wallet(format!("mock: no token with id {id}"))
                })?;
                Ok(encode_string(&token.uri))
            } else {
                Err(unknown_call("collection", call.selector))
            };
        }

        if self.jar_reads_broken.load(Ordering::SeqCst) {
            return Err(ClientError::Wallet("mock: jar reads are down".to_string()));
        }
        let jar = state
            .jars
            .iter()
            .find(|(a, _)| *a == to)
            .map(|(_, jar)| jar)
            .ok_or_else(|| ClientError::Wallet(format!("mock: no contract at {to}")))?;
        if call.selector == abi::selector("kidname()") {
            Ok(encode_string(&jar.kid_name))
        } else if call.selector == abi::selector("imageurl()") {
            Ok(encode_string(&jar.image_url))
        } else if call.selector == abi::selector("story()") {
            Ok(encode_string(&jar.story))
        } else if call.selector == abi::selector("age()") {
            Ok(encode_uint(u128::from(jar.age)))
        } else if call.selector == abi::selector("fosterHome()") {
            Ok(encode_address(jar.foster_home))
        } else if call.selector == abi::selector("donor()") {
            Ok(encode_address(jar.donor.unwrap_or(Address::ZERO)))
        } else {
            Err(unknown_call("jar", call.selector))
        }
    }

    async fn send_transaction(&self, from: Address, to: Address, data: &str) -> Result<TxHash> {
        let delay = *self.submit_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let call = CallData::parse(data)?;
        let mut state = self.state.lock().unwrap();
        let mined = self.execute(&mut state, from, to, &call)?;
        state.tx_counter += 1;
        let hash = test_tx_hash(state.tx_counter);
        state.writes.push(mined.label);
        let block_number = Some(format!("0x{:x}", state.tx_counter));
        state.receipts.insert(
            hash,
            TxReceipt {
                transaction_hash: hash,
                status: Some(if mined.reverted { "0x0" } else { "0x1" }.to_string()),
                logs: mined.logs,
                block_number,
            },
        );
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>> {
        Ok(self.state.lock().unwrap().receipts.get(&hash).cloned())
    }
}

struct Mined {
    label: &'static str,
    reverted: bool,
    logs: Vec<TxLog>,
}

impl Mined {
    fn ok(label: &'static str) -> Self {
        Mined {
            label,
            reverted: false,
            logs: Vec::new(),
        }
    }

    fn reverted(label: &'static str) -> Self {
        Mined {
            label,
            reverted: true,
            logs: Vec::new(),
        }
    }
}

fn unknown_call(target: &str, selector: [u8; 4]) -> ClientError {
    ClientError::Wallet(format!(
        "mock: unknown {target} call 0x{}",
        hex::encode(selector)
    ))
}

// ─────────────────────────────────────────────────────────
// Calldata decoding and return-value encoding
// ─────────────────────────────────────────────────────────

/// Parsed calldata: the 4-byte selector plus a word-addressable body.
struct CallData {
    selector: [u8; 4],
    body: Vec<u8>,
}

impl CallData {
    fn parse(data: &str) -> Result<Self> {
        let stripped = data.strip_prefix("0x").unwrap_or(data);
        let bytes = hex::decode(stripped)
            .map_err(|_| ClientError::Codec(format!("mock: invalid calldata hex: {data}")))?;
        if bytes.len() < 4 {
            return Err(ClientError::Codec(
                "mock: calldata shorter than a selector".to_string(),
            ));
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&bytes[..4]);
        Ok(CallData {
            selector,
            body: bytes[4..].to_vec(),
        })
    }

    fn word(&self, index: usize) -> Result<&[u8]> {
        let start = index * 32;
        self.body
            .get(start..start + 32)
            .ok_or_else(|| ClientError::Codec(format!("mock: missing calldata word {index}")))
    }

    fn uint_arg(&self, index: usize) -> Result<u128> {
        let word = self.word(index)?;
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(buf))
    }

    fn address_arg(&self, index: usize) -> Result<Address> {
        let word = self.word(index)?;
        let mut buf = [0u8; 20];
        buf.copy_from_slice(&word[12..]);
        Ok(Address::from_bytes(buf))
    }

    fn string_arg(&self, index: usize) -> Result<String> {
        let offset = self.uint_arg(index)? as usize;
        let err = || ClientError::Codec("mock: string argument runs past calldata".to_string());
        let len_bytes = self.body.get(offset + 16..offset + 32).ok_or_else(err)?;
        let mut buf = [0u8; 16];
        buf.copy_from_slice(len_bytes);
        let len = u128::from_be_bytes(buf) as usize;
        let bytes = self.body.get(offset + 32..offset + 32 + len).ok_or_else(err)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| err())
    }
}

fn uint_word(n: u128) -> String {
    format!("{n:064x}")
}

fn address_word(a: Address) -> String {
    format!("{:0>64}", hex::encode(a.as_bytes()))
}

fn encode_uint(n: u128) -> String {
    format!("0x{}", uint_word(n))
}

fn encode_address(a: Address) -> String {
    format!("0x{}", address_word(a))
}

fn encode_string(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = format!("0x{}{}", uint_word(0x20), uint_word(bytes.len() as u128));
    out.push_str(&hex::encode(bytes));
    out.push_str(&"0".repeat(((32 - bytes.len() % 32) % 32) * 2));
    out
}

fn encode_address_array(addresses: &[Address]) -> String {
    let mut out = format!(
        "0x{}{}",
        uint_word(0x20),
        uint_word(addresses.len() as u128)
    );
    for address in addresses {
        out.push_str(&address_word(*address));
    }
    out
}

fn topic_address(a: Address) -> String {
    format!("0x{}", address_word(a))
}

fn topic_uint(n: u128) -> String {
    format!("0x{}", uint_word(n))
}

fn transfer_log(contract: Address, from: Address, to: Address, token_id: u128) -> TxLog {
    TxLog {
        address: contract,
        topics: vec![
            abi::event_topic(TRANSFER_EVENT),
            topic_address(from),
            topic_address(to),
            topic_uint(token_id),
        ],
        data: "0x".to_string(),
    }
}

fn donation_log(jar: Address, donor: Address, amount: u128) -> TxLog {
    TxLog {
        address: jar,
        topics: vec![abi::event_topic(DONATION_EVENT), topic_address(donor)],
        data: encode_uint(amount),
    }
}

// ─────────────────────────────────────────────────────────
// Mock content store
// ─────────────────────────────────────────────────────────

#[derive(Default)]
struct StoreState {
    counter: u64,
    images: HashMap<String, Vec<u8>>,
    documents: HashMap<String, NftMetadata>,
}

/// In-memory [`MetadataStore`] with switchable per-stage failures. Content
/// pinned by a pipeline that later fails stays pinned, like the real store.
pub struct MemoryStore {
    state: Mutex<StoreState>,
    image_uploads_fail: AtomicBool,
    metadata_uploads_fail: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            state: Mutex::new(StoreState::default()),
            image_uploads_fail: AtomicBool::new(false),
            metadata_uploads_fail: AtomicBool::new(false),
        }
    }

    pub fn break_image_uploads(&self) {
        self.image_uploads_fail.store(true, Ordering::SeqCst);
    }

    pub fn break_metadata_uploads(&self) {
        self.metadata_uploads_fail.store(true, Ordering::SeqCst);
    }

    pub fn image_count(&self) -> usize {
        self.state.lock().unwrap().images.len()
    }

    pub fn document(&self, cid: &str) -> Option<NftMetadata> {
        self.state.lock().unwrap().documents.get(cid).cloned()
    }

    /// Pin a document under an explicit identifier so a token URI minted
    /// outside the client can still resolve.
    pub fn put_document(&self, cid: &str, document: NftMetadata) {
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(cid.to_string(), document);
    }
}

fn stored(cid: String) -> StoredContent {
    let url = format!("{GATEWAY}{cid}");
    StoredContent { cid, url }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn upload_image(&self, _file_name: &str, bytes: Vec<u8>) -> Result<StoredContent> {
        if self.image_uploads_fail.load(Ordering::SeqCst) {
            return Err(ClientError::Storage(
                "Failed to upload image: storage quota exceeded".to_string(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        state.counter += 1;
        let cid = format!("bafyimage{}", state.counter);
        state.images.insert(cid.clone(), bytes);
        Ok(stored(cid))
    }

    async fn upload_metadata(&self, metadata: &NftMetadata) -> Result<StoredContent> {
        if self.metadata_uploads_fail.load(Ordering::SeqCst) {
            return Err(ClientError::Storage(
                "Failed to upload metadata: storage quota exceeded".to_string(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        state.counter += 1;
        let cid = format!("bafymeta{}", state.counter);
        state.documents.insert(cid.clone(), metadata.clone());
        Ok(stored(cid))
    }

    async fn fetch_metadata(&self, uri: &str) -> Result<NftMetadata> {
        let cid = uri
            .rsplit('/')
            .next()
            .unwrap_or(uri)
            .trim_start_matches("ipfs://");
        self.state
            .lock()
            .unwrap()
            .documents
            .get(cid)
            .cloned()
            .ok_or_else(|| ClientError::Storage(format!("mock: no document at {uri}")))
    }
}
