//! Configuration management for powledger

use crate::blockchain::core::chain::check_parameters;
use crate::blockchain::{Block, GenesisPolicy, Ledger};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "powledger.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub mining: MiningConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_block_reward")]
    pub block_reward: f64,
    #[serde(default)]
    pub genesis: GenesisPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            difficulty: default_difficulty(),
            block_reward: default_block_reward(),
            genesis: GenesisPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Construct the ledger this section describes, mining its genesis block.
    pub fn build(&self) -> Result<Ledger> {
        Ledger::with_genesis(self.address.clone(), self.difficulty, self.block_reward, self.genesis)
    }

    /// Resume from an exported chain instead of mining a new genesis
    pub fn restore(&self, chain: Vec<Block>) -> Result<Ledger> {
        Ledger::from_chain(self.address.clone(), self.difficulty, self.block_reward, chain)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MiningConfig {
    /// Blocks mined by `powledger mine` when `--blocks` is not given
    #[serde(default = "default_blocks")]
    pub blocks: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            blocks: default_blocks(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        check_parameters(&self.ledger.address, self.ledger.difficulty, self.ledger.block_reward)
    }
}

/// Load and validate a config file. A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let config = match fs::read_to_string(path.as_ref()) {
        Ok(config_str) => toml::from_str(&config_str)?,
        Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
        Err(e) => return Err(e.into()),
    };

    config.validate()?;
    Ok(config)
}

fn default_address() -> String {
    "miner".to_string()
}

fn default_difficulty() -> u32 {
    2
}

fn default_block_reward() -> f64 {
    10.0
}

fn default_blocks() -> u64 {
    1
}
