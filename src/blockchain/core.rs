// core.rs splits the ledger engine into block/ledger, balances and chain validation.
pub mod chain;
pub mod state;
pub mod validation;

pub use chain::*;
pub use state::*;
pub use validation::*;
