//! Integration tests for mining and longest-valid-chain adoption

use powledger::blockchain::{is_valid_chain, validate_chain, Block, GenesisPolicy, Ledger};
use powledger::error::ChainError;
use powledger::miner::{meets_difficulty, mine_block};
use powledger::transaction::Transaction;

/// Build a ledger at difficulty 1 with `len` committed blocks
fn ledger_with_len(address: &str, len: usize) -> Result<Ledger, Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new(address, 1, 10.0)?;
    while ledger.len() < len {
        ledger.mine();
    }
    Ok(ledger)
}

/// Push `proof` forward until the block no longer meets `difficulty`
fn spoil_proof(block: &mut Block, difficulty: u32) {
    while meets_difficulty(&block.hash_hex(), difficulty) {
        block.proof += 1;
    }
}

#[test]
fn test_mine_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new("A", 1, 10.0)?;
    assert!(ledger.chain()[0].hash_hex().starts_with('0'));

    ledger.submit_transaction("B", "C", 5.0)?;
    ledger.mine();

    assert_eq!(ledger.len(), 2);
    assert_eq!(
        ledger.chain()[1].transactions,
        vec![Transaction::new("GOD", "A", 10.0), Transaction::new("B", "C", 5.0)]
    );
    assert!(ledger.pending().is_empty());

    Ok(())
}

#[test]
fn test_committed_blocks_meet_difficulty_and_link() -> Result<(), Box<dyn std::error::Error>> {
    for difficulty in 0..=2 {
        let mut ledger = Ledger::with_genesis("A", difficulty, 1.0, GenesisPolicy::Seeded)?;
        for i in 0..3 {
            ledger.submit_transaction("A", format!("peer-{}", i), 0.5)?;
            ledger.mine();
        }

        let prefix = "0".repeat(difficulty as usize);
        for block in ledger.chain() {
            assert!(block.hash_hex().starts_with(&prefix));
        }
        for pair in ledger.chain().windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].hash_hex());
            assert_eq!(pair[1].index, pair[0].index + 1);
        }
        assert!(is_valid_chain(ledger.chain(), difficulty));
    }

    Ok(())
}

#[test]
fn test_mine_always_clears_pending() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new("A", 1, 10.0)?;
    ledger.mine();
    assert!(ledger.pending().is_empty());

    for i in 0..5 {
        ledger.submit_transaction("B", "C", i as f64)?;
    }
    let block = ledger.mine().clone();
    assert_eq!(block.transactions.len(), 6);
    assert!(ledger.pending().is_empty());

    Ok(())
}

#[test]
fn test_forged_candidate_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut local = ledger_with_len("A", 3)?;

    // Correctly linked two-block chain whose block 1 carries no work
    let genesis = local.chain()[0].clone();
    let mut forged = Block::new(1, vec![Transaction::reward("M", 1_000.0)], genesis.hash_hex());
    spoil_proof(&mut forged, 1);
    let candidate = vec![genesis, forged];

    // Shorter than the local chain, so the length rule already refuses it;
    // the validator must refuse it on its own as well.
    assert!(!local.receive_chain(candidate.clone()));
    assert_eq!(local.len(), 3);

    assert_eq!(
        validate_chain(&candidate, 1),
        Err(ChainError::InvalidProofOfWork { index: 1 })
    );

    Ok(())
}

#[test]
fn test_relinked_longer_chain_without_work_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut local = ledger_with_len("A", 3)?;

    // Four blocks, each re-linked after spoiling its proof
    let mut candidate = ledger_with_len("M", 4)?.chain().to_vec();
    spoil_proof(&mut candidate[2], 1);
    candidate[3].previous_hash = candidate[2].hash_hex();
    candidate[3] = mine_block(candidate[3].clone(), 1);

    let before = local.chain().to_vec();
    assert!(!local.receive_chain(candidate.clone()));
    assert!(!local.receive_chain(candidate));
    assert_eq!(local.chain(), before.as_slice());

    Ok(())
}

#[test]
fn test_longer_valid_candidate_adopted() -> Result<(), Box<dyn std::error::Error>> {
    let mut local = ledger_with_len("A", 3)?;
    let remote = ledger_with_len("B", 4)?;

    assert!(local.receive_chain(remote.chain().to_vec()));
    assert_eq!(local.len(), 4);
    assert_eq!(local.chain(), remote.chain());
    assert_eq!(local.balance("A"), 0.0);
    assert_eq!(local.balance("B"), 30.0);

    // Mining continues from the adopted tip, still rewarding the local address
    let block = local.mine().clone();
    assert_eq!(block.index, 4);
    assert_eq!(block.previous_hash, remote.chain()[3].hash_hex());
    assert_eq!(local.balance("A"), 10.0);

    Ok(())
}

#[test]
fn test_receive_chain_is_monotonic() -> Result<(), Box<dyn std::error::Error>> {
    let mut local = ledger_with_len("A", 3)?;

    let shorter = ledger_with_len("B", 2)?;
    assert!(!local.receive_chain(shorter.chain().to_vec()));
    assert_eq!(local.len(), 3);

    let equal = ledger_with_len("B", 3)?;
    assert!(!local.receive_chain(equal.chain().to_vec()));
    assert_eq!(local.len(), 3);
    assert_eq!(local.chain()[2].transactions[0].recipient, "A");

    let longer = ledger_with_len("B", 5)?;
    assert!(local.receive_chain(longer.chain().to_vec()));
    assert_eq!(local.len(), 5);

    Ok(())
}

#[test]
fn test_candidate_checked_at_local_difficulty() -> Result<(), Box<dyn std::error::Error>> {
    let mut local = Ledger::new("A", 2, 10.0)?;
    local.mine();

    let mut easy = Ledger::new("B", 0, 10.0)?;
    for _ in 0..3 {
        easy.mine();
    }
    let candidate = easy.chain().to_vec();

    if is_valid_chain(&candidate, 2) {
        // Every proof 0 happened to meet difficulty 2; nothing to assert.
        return Ok(());
    }
    assert!(!local.receive_chain(candidate));
    assert_eq!(local.len(), 2);

    Ok(())
}

#[test]
fn test_receive_chain_json() -> Result<(), Box<dyn std::error::Error>> {
    let mut local = ledger_with_len("A", 2)?;
    let remote = ledger_with_len("B", 3)?;

    let json = serde_json::to_string(remote.chain())?;
    assert!(local.receive_chain_json(&json)?);
    assert_eq!(local.len(), 3);

    assert!(local.receive_chain_json(r#"[{"index":0}]"#).is_err());
    assert_eq!(local.len(), 3);

    Ok(())
}

#[test]
fn test_receive_chain_json_preserves_amount_bits() -> Result<(), Box<dyn std::error::Error>> {
    // Needs exact float parsing to come back with identical bits
    let amount = 1.0715660391465826e-75;

    let mut remote = Ledger::new("B", 1, 10.0)?;
    remote.submit_transaction("B", "C", amount)?;
    remote.mine();
    remote.mine();
    assert!(is_valid_chain(remote.chain(), 1));

    let json = serde_json::to_string(remote.chain())?;
    let parsed: Vec<Block> = serde_json::from_str(&json)?;
    assert_eq!(parsed[1].transactions[1].amount.to_bits(), amount.to_bits());

    let mut local = Ledger::new("A", 1, 10.0)?;
    assert!(local.receive_chain_json(&json)?);
    assert_eq!(local.chain(), remote.chain());

    Ok(())
}

#[test]
fn test_history_after_mining() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new("A", 1, 10.0)?;
    ledger.submit_transaction("A", "B", 4.0)?;
    ledger.mine();
    ledger.submit_transaction("B", "C", 1.0)?;
    ledger.mine();

    let history = ledger.history("B");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].block_index, 1);
    assert_eq!(history[1].block_index, 2);
    assert_eq!(ledger.balance("A"), 16.0);
    assert_eq!(ledger.balance("B"), 3.0);
    assert_eq!(ledger.balance("C"), 1.0);

    Ok(())
}
