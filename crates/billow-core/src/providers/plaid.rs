//! Plaid payload adapter
//!
//! Normalizes the Plaid transactions payload. Plaid's sign convention is the
//! inverse of intuition: positive amounts are money leaving the account.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{NewTransaction, TransactionType};

#[derive(Debug, Deserialize)]
struct PlaidPayload {
    transactions: Vec<PlaidTransaction>,
}

/// One transaction as Plaid ships it
#[derive(Debug, Deserialize)]
pub struct PlaidTransaction {
    pub transaction_id: String,
    /// Statement descriptor
    pub name: String,
    /// Cleaned merchant name; often null for ACH and bank fees
    #[serde(default)]
    pub merchant_name: Option<String>,
    /// Positive = outflow, negative = inflow
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub personal_finance_category: Option<PlaidCategory>,
}

#[derive(Debug, Deserialize)]
pub struct PlaidCategory {
    pub primary: String,
}

/// Parse a Plaid transactions payload into canonical transactions
pub fn parse(data: &str) -> Result<Vec<NewTransaction>> {
    let payload: PlaidPayload = serde_json::from_str(data)
        .map_err(|e| Error::Provider(format!("malformed Plaid payload: {}", e)))?;

    Ok(payload.transactions.into_iter().map(to_canonical).collect())
}

fn to_canonical(tx: PlaidTransaction) -> NewTransaction {
    let category = tx
        .personal_finance_category
        .map(|c| c.primary.to_lowercase());

    let transaction_type = match category.as_deref() {
        Some(c) if c.starts_with("transfer") => TransactionType::Transfer,
        _ if tx.amount >= 0.0 => TransactionType::Debit,
        _ => TransactionType::Credit,
    };

    NewTransaction {
        external_id: tx.transaction_id,
        name: tx.name,
        merchant_name: tx.merchant_name.filter(|m| !m.trim().is_empty()),
        amount: tx.amount.abs(),
        transaction_type,
        date: tx.date,
        category,
        pending: tx.pending,
    }
}
