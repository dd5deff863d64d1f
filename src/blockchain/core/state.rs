use crate::transaction::Transaction;
use serde::Serialize;
use std::collections::HashMap;

use super::chain::Block;

/// Running balances derived from the committed chain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BalanceState {
    pub address_balances: HashMap<String, f64>,
}

impl BalanceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chain(blocks: &[Block]) -> Self {
        let mut state = Self::new();
        for block in blocks {
            state.apply_block(block);
        }
        state
    }

    pub fn get_balance(&self, address: &str) -> f64 {
        self.address_balances.get(address).copied().unwrap_or(0.0)
    }

    pub fn apply_block(&mut self, block: &Block) {
        for tx in &block.transactions {
            self.apply_transaction(tx);
        }
    }

    /// Rewards are minted, so their sender is never debited. Other senders
    /// may go negative: balances are not checked on submission.
    pub fn apply_transaction(&mut self, tx: &Transaction) {
        if !tx.is_reward() {
            *self.address_balances.entry(tx.sender.clone()).or_insert(0.0) -= tx.amount;
        }
        *self.address_balances.entry(tx.recipient.clone()).or_insert(0.0) += tx.amount;
    }
}

/// A committed transaction touching an address, with the block that sealed it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub block_index: u64,
    pub transaction: Transaction,
}

pub fn history_for(blocks: &[Block], address: &str) -> Vec<HistoryEntry> {
    blocks
        .iter()
        .flat_map(|block| {
            block
                .transactions
                .iter()
                .filter(move |tx| tx.sender == address || tx.recipient == address)
                .map(move |tx| HistoryEntry {
                    block_index: block.index,
                    transaction: tx.clone(),
                })
        })
        .collect()
}
