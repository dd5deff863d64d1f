//! Shared ledger handle for concurrent callers
//!
//! The nonce search runs on a blocking worker while the ledger lock is
//! released, so transfers can still be submitted and chains received. An
//! adopted chain cancels the search in flight.

use crate::blockchain::{parse_chain, Block, Candidate, Ledger};
use crate::config::LedgerConfig;
use crate::error::{ChainError, Result};
use crate::miner::mine_block_cancellable;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Node {
    ledger: Arc<RwLock<Ledger>>,
    mining: Arc<Mutex<Option<Arc<AtomicBool>>>>,
}

/// Raises the cancel flag and frees the mining slot when the attempt ends,
/// including when the `mine` future is dropped mid-search.
struct MiningGuard {
    slot: Arc<Mutex<Option<Arc<AtomicBool>>>>,
    cancel: Arc<AtomicBool>,
}

impl Drop for MiningGuard {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.slot.lock().take();
    }
}

impl Node {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            mining: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        Ok(Self::new(config.build()?))
    }

    pub fn ledger(&self) -> Arc<RwLock<Ledger>> {
        self.ledger.clone()
    }

    pub fn submit_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> Result<()> {
        self.ledger.write().submit_transaction(sender, recipient, amount)
    }

    pub fn register_participant(&self, address: impl Into<String>) -> bool {
        self.ledger.write().register_participant(address)
    }

    pub fn chain(&self) -> Vec<Block> {
        self.ledger.read().chain().to_vec()
    }

    pub fn chain_len(&self) -> usize {
        self.ledger.read().len()
    }

    pub fn pending_len(&self) -> usize {
        self.ledger.read().pending().len()
    }

    pub fn balance(&self, address: &str) -> f64 {
        self.ledger.read().balance(address)
    }

    pub fn is_mining(&self) -> bool {
        self.mining.lock().is_some()
    }

    /// Mine one block from a snapshot of the pending pool.
    ///
    /// Fails with [`ChainError::MiningCancelled`] if cancelled, and with
    /// [`ChainError::StaleBlock`] if the chain was replaced during the search.
    /// Either way the snapshotted transactions stay pending.
    pub async fn mine(&self) -> Result<Block> {
        let cancel = Arc::new(AtomicBool::new(false));
        let Candidate {
            block,
            consumed,
            difficulty,
        } = {
            let mut slot = self.mining.lock();
            if slot.is_some() {
                return Err(ChainError::MiningInProgress);
            }
            *slot = Some(cancel.clone());
            self.ledger.read().prepare_candidate()
        };
        let _guard = MiningGuard {
            slot: self.mining.clone(),
            cancel: cancel.clone(),
        };

        let block = tokio::task::spawn_blocking(move || mine_block_cancellable(block, difficulty, &cancel))
            .await
            .map_err(|e| ChainError::Worker(e.to_string()))??;

        self.ledger.write().commit_candidate(block.clone(), consumed)?;
        Ok(block)
    }

    /// Abort the search in flight, if any. Returns whether one was running.
    pub fn cancel_mining(&self) -> bool {
        match self.mining.lock().as_ref() {
            Some(cancel) => {
                cancel.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn receive_chain(&self, candidate: Vec<Block>) -> bool {
        let accepted = self.ledger.write().receive_chain(candidate);
        if accepted && self.cancel_mining() {
            info!("cancelled in-flight mining after adopting a longer chain");
        }
        accepted
    }

    pub fn receive_chain_json(&self, json: &str) -> Result<bool> {
        let candidate = parse_chain(json).map_err(|e| {
            warn!("dropping malformed chain: {}", e);
            e
        })?;
        Ok(self.receive_chain(candidate))
    }
}
