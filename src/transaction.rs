//! Transfer records held in the pending pool and sealed into blocks

use serde::{Deserialize, Serialize};

/// Sender used for minted rewards. It is never debited.
pub const REWARD_SENDER: &str = "GOD";

/// A transfer of `amount` from `sender` to `recipient`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Minted reward paid to `beneficiary`
    pub fn reward(beneficiary: impl Into<String>, amount: f64) -> Self {
        Self::new(REWARD_SENDER, beneficiary, amount)
    }

    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_transaction() {
        let tx = Transaction::reward("A", 10.0);
        assert_eq!(tx.sender, "GOD");
        assert_eq!(tx.recipient, "A");
        assert_eq!(tx.amount, 10.0);
        assert!(tx.is_reward());
        assert!(!Transaction::new("B", "C", 5.0).is_reward());
    }

    #[test]
    fn test_transaction_json_record() {
        let tx: Transaction =
            serde_json::from_str(r#"{"sender":"B","recipient":"C","amount":5}"#).unwrap();
        assert_eq!(tx, Transaction::new("B", "C", 5.0));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<Transaction, _> = serde_json::from_str(
            r#"{"sender":"B","recipient":"C","amount":5,"fee":1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let result: Result<Transaction, _> =
            serde_json::from_str(r#"{"sender":"B","recipient":"C","amount":"5"}"#);
        assert!(result.is_err());
    }
}
