//! Payment matching
//!
//! Reconciles newly-synced debit transactions against a user's open bills.
//! Each transaction is scored against every open bill with a weighted blend
//! of merchant, amount, and due-date similarity; the best bill wins if it
//! clears the acceptance threshold. Most transactions match nothing, which
//! is the expected steady state, not an error.

use chrono::{Months, NaiveDate};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::Result;
use crate::models::{Bill, PaymentStatus, Transaction};
use crate::normalize::display_merchant;
use crate::similarity::{amount_score, date_score, string_score};

/// Matching configuration
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Trailing window of unmatched transactions to scan, in months
    pub lookback_months: u32,
    /// Minimum composite score before a match is accepted
    pub min_score: f64,
    /// Weight of merchant-name similarity in the composite
    pub merchant_weight: f64,
    /// Weight of amount similarity in the composite
    pub amount_weight: f64,
    /// Weight of due-date proximity in the composite
    pub date_weight: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            lookback_months: 3,
            min_score: 60.0,
            merchant_weight: 0.4,
            amount_weight: 0.3,
            date_weight: 0.3,
        }
    }
}

/// Results of running a matching pass
#[derive(Debug, Default)]
pub struct MatchSummary {
    pub transactions_scanned: usize,
    pub bills_considered: usize,
    pub matches_linked: usize,
    pub bills_settled: usize,
}

/// A scored (transaction, bill) pairing, discarded after the pass
#[derive(Debug, Clone, Copy)]
struct MatchCandidate {
    bill_index: usize,
    score: f64,
}

/// Matcher that links synced payments to open bills
pub struct PaymentMatcher<'a> {
    db: &'a Database,
    config: MatchConfig,
}

impl<'a> PaymentMatcher<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            config: MatchConfig::default(),
        }
    }

    pub fn with_config(db: &'a Database, config: MatchConfig) -> Self {
        Self { db, config }
    }

    /// Run a matching pass for one user
    ///
    /// Works over a snapshot of open bills and unlinked debits taken at the
    /// start of the pass. Bills settled during the pass are tracked on the
    /// snapshot so a second transaction can still link to them without
    /// re-firing settlement.
    pub fn match_payments(&self, user_id: i64, as_of: NaiveDate) -> Result<MatchSummary> {
        let mut bills = self.db.list_open_bills(user_id)?;

        let mut summary = MatchSummary {
            bills_considered: bills.len(),
            ..Default::default()
        };
        if bills.is_empty() {
            info!(user_id, "No open bills, skipping payment matching");
            return Ok(summary);
        }

        let since = as_of
            .checked_sub_months(Months::new(self.config.lookback_months))
            .unwrap_or(as_of);
        let transactions = self.db.list_unmatched_debits_since(user_id, since)?;
        summary.transactions_scanned = transactions.len();

        for tx in &transactions {
            let Some(best) = best_candidate(tx, &bills, &self.config) else {
                continue;
            };
            if best.score < self.config.min_score {
                debug!(
                    transaction_id = tx.id,
                    score = best.score,
                    "Best candidate below threshold, leaving unlinked"
                );
                continue;
            }

            let (bill_id, bill_status, frequency) = {
                let bill = &bills[best.bill_index];
                (bill.id, bill.payment_status, bill.frequency)
            };

            if !self.db.link_transaction_to_bill(tx.id, bill_id)? {
                // Another pass linked it since our snapshot; nothing to do
                debug!(transaction_id = tx.id, bill_id, "Transaction already linked");
                continue;
            }
            summary.matches_linked += 1;

            debug!(
                transaction_id = tx.id,
                bill_id,
                score = best.score,
                amount = tx.amount,
                "Linked payment to bill"
            );

            if bill_status.is_open() {
                let next_due = frequency.advance(tx.date);
                self.db
                    .settle_bill(bill_id, tx.amount.abs(), tx.date, next_due)?;
                bills[best.bill_index].payment_status = PaymentStatus::Paid;
                summary.bills_settled += 1;
            }
        }

        info!(
            user_id,
            scanned = summary.transactions_scanned,
            bills = summary.bills_considered,
            linked = summary.matches_linked,
            settled = summary.bills_settled,
            "Payment matching pass complete"
        );

        Ok(summary)
    }
}

/// Pick the best-scoring bill for a transaction.
///
/// Strictly-greater comparison keeps the first-seen bill on ties, and the
/// bill slice comes from a stable-ordered query, so the winner is
/// reproducible across runs on the same snapshot.
fn best_candidate(tx: &Transaction, bills: &[Bill], config: &MatchConfig) -> Option<MatchCandidate> {
    let mut best: Option<MatchCandidate> = None;
    for (bill_index, bill) in bills.iter().enumerate() {
        let score = composite_score(tx, bill, config);
        if best.map_or(true, |b| score > b.score) {
            best = Some(MatchCandidate { bill_index, score });
        }
    }
    best
}

/// Weighted composite of merchant, amount, and due-date similarity,
/// rounded to 2 decimal places
fn composite_score(tx: &Transaction, bill: &Bill, config: &MatchConfig) -> f64 {
    let score = config.merchant_weight * string_score(display_merchant(tx), &bill.name)
        + config.amount_weight * amount_score(tx.amount.abs(), bill.amount.abs())
        + config.date_weight * date_score(tx.date, bill.next_due_date);
    (score * 100.0).round() / 100.0
}
