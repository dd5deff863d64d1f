use crate::error::{ChainError, Result};
use crate::miner::meets_difficulty;
use rayon::prelude::*;

use super::chain::Block;

/// Parse a JSON array of block records. Unknown fields, missing fields and
/// wrong types are rejected here, before any chain validation.
pub fn parse_chain(json: &str) -> Result<Vec<Block>> {
    serde_json::from_str(json).map_err(|e| ChainError::MalformedRecord(e.to_string()))
}

/// Check an arbitrary chain: genesis at index 0, consecutive indices,
/// hash linkage, and proof of work of every block at `difficulty`.
/// Reports the first failure in chain order.
pub fn validate_chain(chain: &[Block], difficulty: u32) -> Result<()> {
    let genesis = chain.first().ok_or(ChainError::EmptyChain)?;
    if genesis.index != 0 {
        return Err(ChainError::InvalidBlock(format!(
            "Genesis block must have index 0, got {}.",
            genesis.index
        )));
    }

    let hashes: Vec<String> = chain.par_iter().map(Block::hash_hex).collect();

    for (i, block) in chain.iter().enumerate() {
        if i > 0 {
            let prev = &chain[i - 1];
            if prev.index.checked_add(1) != Some(block.index) {
                return Err(ChainError::InvalidBlock(format!(
                    "Invalid block index. Expected {}, but got {}.",
                    prev.index.saturating_add(1),
                    block.index
                )));
            }
            if block.previous_hash != hashes[i - 1] {
                return Err(ChainError::InvalidBlockLinkage { index: block.index });
            }
        }
        if !meets_difficulty(&hashes[i], difficulty) {
            return Err(ChainError::InvalidProofOfWork { index: block.index });
        }
    }
    Ok(())
}

pub fn is_valid_chain(chain: &[Block], difficulty: u32) -> bool {
    validate_chain(chain, difficulty).is_ok()
}
