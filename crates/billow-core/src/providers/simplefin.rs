//! SimpleFin payload adapter
//!
//! Normalizes the SimpleFin transactions payload. SimpleFin ships amounts as
//! decimal strings (negative = outflow) and dates as unix timestamps.

use chrono::DateTime;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{NewTransaction, TransactionType};

#[derive(Debug, Deserialize)]
struct SimplefinPayload {
    transactions: Vec<SimplefinTransaction>,
}

/// One transaction as SimpleFin ships it
#[derive(Debug, Deserialize)]
pub struct SimplefinTransaction {
    pub id: String,
    /// Unix timestamp of when the transaction posted
    pub posted: i64,
    /// Decimal string; negative values are outflows
    pub amount: String,
    pub description: String,
    /// Counterparty, when the institution reports one
    #[serde(default)]
    pub payee: Option<String>,
    #[serde(default)]
    pub pending: bool,
    /// Unix timestamp of when the transaction actually occurred
    #[serde(default)]
    pub transacted_at: Option<i64>,
}

/// Parse a SimpleFin transactions payload into canonical transactions
pub fn parse(data: &str) -> Result<Vec<NewTransaction>> {
    let payload: SimplefinPayload = serde_json::from_str(data)
        .map_err(|e| Error::Provider(format!("malformed SimpleFin payload: {}", e)))?;

    payload.transactions.into_iter().map(to_canonical).collect()
}

fn to_canonical(tx: SimplefinTransaction) -> Result<NewTransaction> {
    let amount: f64 = tx.amount.parse().map_err(|_| {
        Error::Provider(format!(
            "unparseable SimpleFin amount {:?} on transaction {}",
            tx.amount, tx.id
        ))
    })?;

    // Prefer the transacted timestamp; posted can lag by days
    let timestamp = tx.transacted_at.unwrap_or(tx.posted);
    let date = DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| {
            Error::Provider(format!(
                "timestamp {} out of range on transaction {}",
                timestamp, tx.id
            ))
        })?
        .date_naive();

    let transaction_type = if amount < 0.0 {
        TransactionType::Debit
    } else {
        TransactionType::Credit
    };

    Ok(NewTransaction {
        external_id: tx.id,
        name: tx.description,
        merchant_name: tx.payee.filter(|p| !p.trim().is_empty()),
        amount: amount.abs(),
        transaction_type,
        date,
        category: None,
        pending: tx.pending,
    })
}
