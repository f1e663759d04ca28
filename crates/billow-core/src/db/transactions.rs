//! Transaction ingestion and queries

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_date, parse_datetime, Database};
use crate::error::Result;
use crate::models::{NewTransaction, Transaction, TransactionType};

const TRANSACTION_COLUMNS: &str = "id, account_id, user_id, external_id, name, merchant_name, \
     amount, transaction_type, date, category, pending, bill_id, created_at";

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let type_str: String = row.get(7)?;
    let date_str: String = row.get(8)?;
    let created_at_str: String = row.get(12)?;
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        user_id: row.get(2)?,
        external_id: row.get(3)?,
        name: row.get(4)?,
        merchant_name: row.get(5)?,
        amount: row.get(6)?,
        transaction_type: type_str.parse().unwrap_or(TransactionType::Debit),
        date: parse_date(&date_str),
        category: row.get(9)?,
        pending: row.get(10)?,
        bill_id: row.get(11)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Insert a synced transaction, skipping duplicates by provider id
    ///
    /// Returns `None` when a transaction with the same `external_id` already
    /// exists, which makes repeated syncs of the same window a no-op.
    pub fn insert_transaction(
        &self,
        user_id: i64,
        account_id: i64,
        tx: &NewTransaction,
    ) -> Result<Option<i64>> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM transactions WHERE external_id = ?",
                params![tx.external_id],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Ok(None); // Duplicate, skip
        }

        conn.execute(
            r#"
            INSERT INTO transactions (account_id, user_id, external_id, name, merchant_name, amount, transaction_type, date, category, pending)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                account_id,
                user_id,
                tx.external_id,
                tx.name,
                tx.merchant_name,
                tx.amount,
                tx.transaction_type.as_str(),
                tx.date.to_string(),
                tx.category,
                tx.pending,
            ],
        )?;

        Ok(Some(conn.last_insert_rowid()))
    }

    /// List a user's debit transactions on or after `since`, oldest first
    pub fn list_debits_since(&self, user_id: i64, since: NaiveDate) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions \
             WHERE user_id = ? AND transaction_type = 'debit' AND date >= ? \
             ORDER BY date ASC, id ASC",
            TRANSACTION_COLUMNS
        ))?;

        let txs = stmt
            .query_map(params![user_id, since.to_string()], transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(txs)
    }

    /// List a user's unlinked debit transactions on or after `since`, newest first
    ///
    /// Only transactions with `bill_id IS NULL` are candidates for matching.
    pub fn list_unmatched_debits_since(
        &self,
        user_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions \
             WHERE user_id = ? AND transaction_type = 'debit' AND bill_id IS NULL AND date >= ? \
             ORDER BY date DESC, id ASC",
            TRANSACTION_COLUMNS
        ))?;

        let txs = stmt
            .query_map(params![user_id, since.to_string()], transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(txs)
    }

    /// Link a transaction to a bill
    ///
    /// The update is guarded by `bill_id IS NULL` so a link can only ever be
    /// written once per transaction. Returns whether a row was updated.
    pub fn link_transaction_to_bill(&self, transaction_id: i64, bill_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE transactions SET bill_id = ? WHERE id = ? AND bill_id IS NULL",
            params![bill_id, transaction_id],
        )?;
        Ok(updated > 0)
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions WHERE id = ?",
                    TRANSACTION_COLUMNS
                ),
                params![id],
                transaction_from_row,
            )
            .optional()?;
        Ok(tx)
    }
}
