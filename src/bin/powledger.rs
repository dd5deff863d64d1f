#![forbid(unsafe_code)]
//! Command-line front end: mine a fresh chain, verify a chain file, or
//! inspect balances recorded in one.

use clap::{Parser, Subcommand};
use colored::*;
use powledger::blockchain::{history_for, parse_chain, validate_chain, BalanceState};
use powledger::config::{load_config, DEFAULT_CONFIG_PATH};
use powledger::node::Node;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::Level;

#[derive(Parser)]
#[command(name = "powledger", version, about = "Single-node proof-of-work ledger")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log search statistics
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mine blocks and write the chain as JSON
    Mine {
        /// Continue an exported chain instead of starting a fresh ledger
        #[arg(long)]
        from: Option<PathBuf>,
        /// Number of blocks to mine after genesis
        #[arg(short, long)]
        blocks: Option<u64>,
        /// Transfer submitted before mining, as sender:recipient:amount
        #[arg(long = "tx", value_parser = parse_transfer)]
        transfers: Vec<Transfer>,
        /// Write the chain here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Check linkage and proof of work of a chain file
    Verify {
        file: PathBuf,
        #[arg(short, long)]
        difficulty: Option<u32>,
    },
    /// Print the balance and history of an address in a chain file
    Balance { file: PathBuf, address: String },
}

#[derive(Debug, Clone)]
struct Transfer {
    sender: String,
    recipient: String,
    amount: f64,
}

fn parse_transfer(s: &str) -> Result<Transfer, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(format!("expected sender:recipient:amount, got '{}'", s));
    }
    let amount = parts[2]
        .parse::<f64>()
        .map_err(|e| format!("invalid amount '{}': {}", parts[2], e))?;
    if !amount.is_finite() {
        return Err(format!("amount must be finite, got '{}'", parts[2]));
    }
    Ok(Transfer {
        sender: parts[0].to_string(),
        recipient: parts[1].to_string(),
        amount,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Mine {
            from,
            blocks,
            transfers,
            out,
        } => {
            let node = match from {
                Some(path) => {
                    let chain = parse_chain(&fs::read_to_string(&path)?)?;
                    Node::new(config.ledger.restore(chain)?)
                }
                None => Node::from_config(&config.ledger)?,
            };
            for transfer in transfers {
                node.submit_transaction(transfer.sender, transfer.recipient, transfer.amount)?;
            }

            for _ in 0..blocks.unwrap_or(config.mining.blocks) {
                let start = Instant::now();
                let block = node.mine().await?;
                eprintln!(
                    "{} #{} proof {} in {:.3}s  {}",
                    "mined".bright_green().bold(),
                    block.index,
                    block.proof,
                    start.elapsed().as_secs_f64(),
                    block.hash_hex().bright_black()
                );
            }

            let json = serde_json::to_string_pretty(&node.chain())?;
            match out {
                Some(path) => fs::write(path, json)?,
                None => println!("{}", json),
            }
        }
        Command::Verify { file, difficulty } => {
            let chain = parse_chain(&fs::read_to_string(&file)?)?;
            let difficulty = difficulty.unwrap_or(config.ledger.difficulty);
            match validate_chain(&chain, difficulty) {
                Ok(()) => println!(
                    "{} {} blocks at difficulty {}",
                    "valid".bright_green().bold(),
                    chain.len(),
                    difficulty
                ),
                Err(e) => {
                    println!("{} {}", "invalid".red().bold(), e);
                    std::process::exit(1);
                }
            }
        }
        Command::Balance { file, address } => {
            let chain = parse_chain(&fs::read_to_string(&file)?)?;
            let state = BalanceState::from_chain(&chain);
            println!(
                "{} {}",
                address.bright_white().bold(),
                format!("{:.6}", state.get_balance(&address)).bright_cyan()
            );
            for entry in history_for(&chain, &address) {
                let tx = &entry.transaction;
                println!(
                    "  #{:<6} {} -> {} {:.6}",
                    entry.block_index, tx.sender, tx.recipient, tx.amount
                );
            }
        }
    }

    Ok(())
}
