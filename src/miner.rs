//! Proof-of-work predicate and nonce search
//!
//! A block meets difficulty `d` when the first `d` characters of its hex
//! digest are all `'0'`. The search walks `proof` upwards from its current
//! value; expected attempts grow as `16^d`.

use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use sha2::Sha256;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

pub fn meets_difficulty(digest_hex: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    digest_hex.len() >= difficulty && digest_hex.bytes().take(difficulty).all(|b| b == b'0')
}

fn proof_meets(content: &Sha256, proof: u64, previous_hash: &str, difficulty: u32) -> bool {
    let digest = Block::finish_hash(content.clone(), proof, previous_hash);
    meets_difficulty(&hex::encode(digest), difficulty)
}

/// Search for a proof that makes `block` meet `difficulty`.
///
/// Blocks the calling thread until a proof is found. A difficulty above
/// [`crate::blockchain::MAX_DIFFICULTY`] never terminates.
pub fn mine_block(mut block: Block, difficulty: u32) -> Block {
    let content = block.content_hasher();
    let start = block.proof;
    while !proof_meets(&content, block.proof, &block.previous_hash, difficulty) {
        block.proof = block.proof.wrapping_add(1);
    }
    debug!(
        index = block.index,
        proof = block.proof,
        attempts = block.proof.wrapping_sub(start).wrapping_add(1),
        "proof found"
    );
    block
}

/// Same search as [`mine_block`], checking `cancel` between attempts.
pub fn mine_block_cancellable(mut block: Block, difficulty: u32, cancel: &AtomicBool) -> Result<Block> {
    let content = block.content_hasher();
    let start = block.proof;
    loop {
        if cancel.load(Ordering::Relaxed) {
            debug!(
                index = block.index,
                attempts = block.proof.wrapping_sub(start),
                "search cancelled"
            );
            return Err(ChainError::MiningCancelled);
        }
        if proof_meets(&content, block.proof, &block.previous_hash, difficulty) {
            return Ok(block);
        }
        block.proof = block.proof.wrapping_add(1);
    }
}
