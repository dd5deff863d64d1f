use crate::blockchain::core::state::{history_for, BalanceState, HistoryEntry};
use crate::blockchain::core::validation::{parse_chain, validate_chain};
use crate::error::{ChainError, Result};
use crate::miner::{meets_difficulty, mine_block};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

pub type Sha256Hash = [u8; 32];

/// `previous_hash` carried by every genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// A SHA-256 hex digest has 64 characters, so no proof can satisfy more.
pub const MAX_DIFFICULTY: u32 = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        Block {
            index,
            transactions,
            proof: 0,
            previous_hash,
        }
    }

    pub fn genesis(transactions: Vec<Transaction>) -> Self {
        Self::new(0, transactions, GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Hasher primed with every field that precedes `proof` in the canonical
    /// encoding. The nonce search clones it instead of rehashing the body.
    pub(crate) fn content_hasher(&self) -> Sha256 {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_le_bytes());
        hasher.update((self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            update_str(&mut hasher, &tx.sender);
            update_str(&mut hasher, &tx.recipient);
            hasher.update(tx.amount.to_bits().to_le_bytes());
        }
        hasher
    }

    pub(crate) fn finish_hash(mut hasher: Sha256, proof: u64, previous_hash: &str) -> Sha256Hash {
        hasher.update(proof.to_le_bytes());
        update_str(&mut hasher, previous_hash);
        hasher.finalize().into()
    }

    pub fn hash(&self) -> Sha256Hash {
        Self::finish_hash(self.content_hasher(), self.proof, &self.previous_hash)
    }

    /// Lowercase hex form of [`Block::hash`], the value stored in `previous_hash`
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }
}

fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// What the genesis block carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenesisPolicy {
    /// No transactions
    #[default]
    Empty,
    /// One minted grant of `block_reward` to the ledger's own address
    Seeded,
}

/// A block ready for the nonce search, taken from a snapshot of the pending pool.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub block: Block,
    /// Number of pending transactions copied into `block`
    pub consumed: usize,
    pub difficulty: u32,
}

pub(crate) fn check_parameters(address: &str, difficulty: u32, block_reward: f64) -> Result<()> {
    if address.is_empty() {
        return Err(ChainError::InvalidConfig("address must not be empty".to_string()));
    }
    if difficulty > MAX_DIFFICULTY {
        return Err(ChainError::InvalidConfig(format!(
            "difficulty {} exceeds maximum {}",
            difficulty, MAX_DIFFICULTY
        )));
    }
    if !block_reward.is_finite() || block_reward < 0.0 {
        return Err(ChainError::InvalidConfig(format!(
            "block_reward must be a finite non-negative number, got {}",
            block_reward
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Ledger {
    address: String,
    difficulty: u32,
    block_reward: f64,
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
    participants: BTreeSet<String>,
    state: BalanceState,
}

impl Ledger {
    /// Create a ledger with an empty genesis block.
    pub fn new(address: impl Into<String>, difficulty: u32, block_reward: f64) -> Result<Self> {
        Self::with_genesis(address, difficulty, block_reward, GenesisPolicy::default())
    }

    /// Create a ledger, mining its genesis block according to `policy`.
    pub fn with_genesis(
        address: impl Into<String>,
        difficulty: u32,
        block_reward: f64,
        policy: GenesisPolicy,
    ) -> Result<Self> {
        let address = address.into();
        check_parameters(&address, difficulty, block_reward)?;

        let transactions = match policy {
            GenesisPolicy::Empty => Vec::new(),
            GenesisPolicy::Seeded => vec![Transaction::reward(&address, block_reward)],
        };
        let genesis = mine_block(Block::genesis(transactions), difficulty);
        info!(proof = genesis.proof, hash = %genesis.hash_hex(), "mined genesis block");

        let mut ledger = Ledger {
            address,
            difficulty,
            block_reward,
            blocks: Vec::new(),
            pending: Vec::new(),
            participants: BTreeSet::new(),
            state: BalanceState::new(),
        };
        ledger.push_block(genesis);
        Ok(ledger)
    }

    /// Resume from an exported chain, which must be valid at `difficulty`.
    pub fn from_chain(
        address: impl Into<String>,
        difficulty: u32,
        block_reward: f64,
        chain: Vec<Block>,
    ) -> Result<Self> {
        let address = address.into();
        check_parameters(&address, difficulty, block_reward)?;
        validate_chain(&chain, difficulty)?;

        info!(len = chain.len(), "restored chain");
        Ok(Ledger {
            address,
            difficulty,
            block_reward,
            state: BalanceState::from_chain(&chain),
            blocks: chain,
            pending: Vec::new(),
            participants: BTreeSet::new(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn block_reward(&self) -> f64 {
        self.block_reward
    }

    pub fn chain(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: the genesis block is committed at construction.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> &Block {
        self.blocks.last().expect("ledger always holds its genesis block")
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn participants(&self) -> &BTreeSet<String> {
        &self.participants
    }

    /// Queue a transfer. Balances are not checked; only non-finite amounts
    /// are refused, since JSON records cannot carry them.
    pub fn submit_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> Result<()> {
        if !amount.is_finite() {
            return Err(ChainError::InvalidTransaction(format!(
                "amount must be finite, got {}",
                amount
            )));
        }
        let tx = Transaction::new(sender, recipient, amount);
        debug!(sender = %tx.sender, recipient = %tx.recipient, amount = tx.amount, "transaction submitted");
        self.pending.push(tx);
        Ok(())
    }

    pub fn register_participant(&mut self, address: impl Into<String>) -> bool {
        self.participants.insert(address.into())
    }

    pub fn balance(&self, address: &str) -> f64 {
        self.state.get_balance(address)
    }

    pub fn history(&self, address: &str) -> Vec<HistoryEntry> {
        history_for(&self.blocks, address)
    }

    /// Seal the pending pool into a new block: reward first, then every
    /// pending transfer in submission order. Blocks until a proof is found.
    pub fn mine(&mut self) -> &Block {
        let Candidate { block, .. } = self.prepare_candidate();
        let block = mine_block(block, self.difficulty);
        self.pending.clear();
        self.push_block(block);
        self.last_block()
    }

    /// Build the next block from a copy of the pending pool without touching it.
    pub fn prepare_candidate(&self) -> Candidate {
        let last = self.last_block();
        let mut transactions = Vec::with_capacity(self.pending.len() + 1);
        transactions.push(Transaction::reward(&self.address, self.block_reward));
        transactions.extend(self.pending.iter().cloned());

        Candidate {
            block: Block::new(last.index + 1, transactions, last.hash_hex()),
            consumed: self.pending.len(),
            difficulty: self.difficulty,
        }
    }

    /// Append a block mined from [`Ledger::prepare_candidate`] and drop the
    /// `consumed` transactions it sealed. Transactions submitted after the
    /// snapshot stay pending.
    pub fn commit_candidate(&mut self, block: Block, consumed: usize) -> Result<()> {
        let last = self.last_block();
        let expected_index = last.index + 1;
        let expected_previous = last.hash_hex();

        if block.index != expected_index || block.previous_hash != expected_previous {
            warn!(
                index = block.index,
                expected_index, "discarding mined block, chain tip moved"
            );
            return Err(ChainError::StaleBlock);
        }
        if !meets_difficulty(&block.hash_hex(), self.difficulty) {
            return Err(ChainError::InvalidProofOfWork { index: block.index });
        }

        let consumed = consumed.min(self.pending.len());
        self.pending.drain(..consumed);
        self.push_block(block);
        Ok(())
    }

    /// Adopt `candidate` if it is valid at this ledger's difficulty and
    /// strictly longer than the local chain. Returns whether it was adopted.
    pub fn receive_chain(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.blocks.len() {
            debug!(
                candidate = candidate.len(),
                local = self.blocks.len(),
                "ignoring chain that is not longer"
            );
            return false;
        }
        if let Err(e) = validate_chain(&candidate, self.difficulty) {
            warn!("rejecting candidate chain: {}", e);
            return false;
        }

        info!(
            old_len = self.blocks.len(),
            new_len = candidate.len(),
            "adopting longer chain"
        );
        self.state = BalanceState::from_chain(&candidate);
        self.blocks = candidate;
        true
    }

    /// Parse a JSON array of block records, then [`Ledger::receive_chain`].
    pub fn receive_chain_json(&mut self, json: &str) -> Result<bool> {
        let candidate = parse_chain(json)?;
        Ok(self.receive_chain(candidate))
    }

    fn push_block(&mut self, block: Block) {
        self.state.apply_block(&block);
        info!(
            index = block.index,
            transactions = block.transactions.len(),
            proof = block.proof,
            "block committed"
        );
        self.blocks.push(block);
    }
}
