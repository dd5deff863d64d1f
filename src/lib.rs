//! powledger - A single-node proof-of-work ledger
//!
//! # Architecture
//!
//! ## Ledger Engine
//! - [`blockchain`] - Blocks, content hashing, the ledger and chain validation
//! - [`transaction`] - Transfer records
//!
//! ## Consensus & Mining
//! - [`miner`] - Proof-of-work predicate and nonce search
//! - [`node`] - Shared ledger with cancellable background mining
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger Engine
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;
pub mod node;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
