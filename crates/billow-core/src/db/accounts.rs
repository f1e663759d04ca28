//! Linked account operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Account, Provider};

impl Database {
    /// Create a linked account for a user
    pub fn create_account(&self, user_id: i64, name: &str, provider: Provider) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO accounts (user_id, name, provider) VALUES (?, ?, ?)",
            params![user_id, name, provider.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's linked accounts
    pub fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, provider, created_at FROM accounts WHERE user_id = ? ORDER BY id",
        )?;

        let accounts = stmt
            .query_map(params![user_id], |row| {
                let provider_str: String = row.get(3)?;
                let created_at_str: String = row.get(4)?;
                Ok(Account {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    provider: provider_str.parse().unwrap_or(Provider::Plaid),
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }
}
