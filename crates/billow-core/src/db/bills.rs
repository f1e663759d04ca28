//! Bill operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_date, parse_datetime, Database};
use crate::error::Result;
use crate::models::{Bill, BillCategory, BillPriority, Frequency, NewBill, PaymentStatus};

const BILL_COLUMNS: &str = "id, user_id, account_id, name, amount, due_date, next_due_date, \
     frequency, category, payment_status, auto_detected, detection_confidence, \
     source_transaction_id, last_payment_date, last_payment_amount, reminder_enabled, \
     reminder_days_before, priority, created_at";

fn bill_from_row(row: &Row<'_>) -> rusqlite::Result<Bill> {
    let due_date_str: String = row.get(5)?;
    let next_due_str: String = row.get(6)?;
    let frequency_str: String = row.get(7)?;
    let category_str: String = row.get(8)?;
    let status_str: String = row.get(9)?;
    let last_payment_str: Option<String> = row.get(13)?;
    let priority_str: String = row.get(17)?;
    let created_at_str: String = row.get(18)?;
    Ok(Bill {
        id: row.get(0)?,
        user_id: row.get(1)?,
        account_id: row.get(2)?,
        name: row.get(3)?,
        amount: row.get(4)?,
        due_date: parse_date(&due_date_str),
        next_due_date: parse_date(&next_due_str),
        frequency: frequency_str.parse().unwrap_or(Frequency::Monthly),
        category: category_str.parse().unwrap_or(BillCategory::Other),
        payment_status: status_str.parse().unwrap_or(PaymentStatus::Upcoming),
        auto_detected: row.get(10)?,
        detection_confidence: row.get(11)?,
        source_transaction_id: row.get(12)?,
        last_payment_date: last_payment_str.map(|s| parse_date(&s)),
        last_payment_amount: row.get(14)?,
        reminder_enabled: row.get(15)?,
        reminder_days_before: row.get(16)?,
        priority: priority_str.parse().unwrap_or(BillPriority::Medium),
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Create a bill
    pub fn create_bill(&self, bill: &NewBill) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO bills (user_id, account_id, name, amount, due_date, next_due_date,
                frequency, category, payment_status, auto_detected, detection_confidence,
                source_transaction_id, reminder_enabled, reminder_days_before, priority)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                bill.user_id,
                bill.account_id,
                bill.name,
                bill.amount,
                bill.due_date.to_string(),
                bill.next_due_date.to_string(),
                bill.frequency.as_str(),
                bill.category.as_str(),
                bill.payment_status.as_str(),
                bill.auto_detected,
                bill.detection_confidence,
                bill.source_transaction_id,
                bill.reminder_enabled,
                bill.reminder_days_before,
                bill.priority.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's bills, oldest first
    pub fn list_bills(&self, user_id: i64) -> Result<Vec<Bill>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bills WHERE user_id = ? ORDER BY id",
            BILL_COLUMNS
        ))?;

        let bills = stmt
            .query_map(params![user_id], bill_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bills)
    }

    /// List a user's open (not yet paid) bills in stable id order
    ///
    /// The matcher depends on this ordering being stable: equal-scored bills
    /// tie-break by first-seen.
    pub fn list_open_bills(&self, user_id: i64) -> Result<Vec<Bill>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bills \
             WHERE user_id = ? AND payment_status IN ('upcoming', 'due', 'overdue') \
             ORDER BY id",
            BILL_COLUMNS
        ))?;

        let bills = stmt
            .query_map(params![user_id], bill_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bills)
    }

    /// Find an existing auto-detected bill by name (detection idempotency probe)
    pub fn find_auto_detected_bill(&self, user_id: i64, name: &str) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM bills WHERE user_id = ? AND name = ? AND auto_detected = TRUE",
                params![user_id, name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Settle a bill against a detected payment
    ///
    /// Records the payment, marks the bill paid, and rolls `next_due_date`
    /// forward one period from the payment date.
    pub fn settle_bill(
        &self,
        id: i64,
        paid_amount: f64,
        paid_date: NaiveDate,
        next_due_date: NaiveDate,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE bills
            SET payment_status = 'paid',
                last_payment_date = ?,
                last_payment_amount = ?,
                next_due_date = ?
            WHERE id = ?
            "#,
            params![paid_date.to_string(), paid_amount, next_due_date.to_string(), id],
        )?;
        Ok(())
    }

    /// Roll forward payment statuses for a user's bills
    ///
    /// `paid` bills reopen to `upcoming` once the next cycle's due date
    /// arrives, `upcoming` bills become `due` inside their reminder window,
    /// and any open bill past its next due date becomes `overdue`. Returns
    /// the number of status updates applied.
    pub fn refresh_bill_statuses(&self, user_id: i64, today: NaiveDate) -> Result<usize> {
        let conn = self.conn()?;

        let reopened = conn.execute(
            r#"
            UPDATE bills
            SET payment_status = 'upcoming'
            WHERE user_id = ?
              AND payment_status = 'paid'
              AND next_due_date <= ?
            "#,
            params![user_id, today.to_string()],
        )?;

        let overdue = conn.execute(
            r#"
            UPDATE bills
            SET payment_status = 'overdue'
            WHERE user_id = ?
              AND payment_status IN ('upcoming', 'due')
              AND next_due_date < ?
            "#,
            params![user_id, today.to_string()],
        )?;

        let due = conn.execute(
            r#"
            UPDATE bills
            SET payment_status = 'due'
            WHERE user_id = ?
              AND payment_status = 'upcoming'
              AND julianday(next_due_date) - julianday(?) <= reminder_days_before
            "#,
            params![user_id, today.to_string()],
        )?;

        Ok(reopened + overdue + due)
    }

    /// Get a bill by ID
    pub fn get_bill(&self, id: i64) -> Result<Option<Bill>> {
        let conn = self.conn()?;
        let bill = conn
            .query_row(
                &format!("SELECT {} FROM bills WHERE id = ?", BILL_COLUMNS),
                params![id],
                bill_from_row,
            )
            .optional()?;
        Ok(bill)
    }
}
