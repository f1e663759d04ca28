//! Sync-triggered orchestration
//!
//! Thin entry points the ingestion layer calls after a transaction sync
//! completes. The engine passes themselves are pure computations over a
//! snapshot fetched at the start of each pass; retries live here at the job
//! boundary, never inside the algorithms.
//!
//! Concurrency contract: passes for different users can run in parallel with
//! no shared state. Passes for the same user must be serialized by the
//! caller (a per-user lock or single-worker queue), or the detector's
//! create-if-absent check can race and produce duplicate bills.

use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::db::Database;
use crate::detect::{DetectionSummary, RecurrenceDetector};
use crate::error::Result;
use crate::matcher::{MatchSummary, PaymentMatcher};
use crate::models::Provider;
use crate::providers;

/// Attempts per pass before giving up
const MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts; grows linearly per attempt
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Results of a full post-sync processing run
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub transactions_imported: usize,
    pub transactions_skipped: usize,
    pub bills_created: usize,
    pub payments_linked: usize,
    pub bills_settled: usize,
}

/// Run recurrence detection for one user with default configuration
pub fn detect_bills(db: &Database, user_id: i64, as_of: NaiveDate) -> Result<DetectionSummary> {
    RecurrenceDetector::new(db).detect_bills(user_id, as_of)
}

/// Run payment matching for one user with default configuration
pub fn match_payments(db: &Database, user_id: i64, as_of: NaiveDate) -> Result<MatchSummary> {
    PaymentMatcher::new(db).match_payments(user_id, as_of)
}

/// Process a completed transaction sync for one account.
///
/// Ingests the provider payload idempotently (duplicates by external id are
/// skipped), then runs detection, a bill-status refresh, and matching.
/// Matching runs after detection so freshly-detected bills are immediately
/// eligible. Safe to re-run on the same payload: every step is idempotent.
pub fn process_sync(
    db: &Database,
    user_id: i64,
    account_id: i64,
    provider: Provider,
    payload: &str,
    as_of: NaiveDate,
) -> Result<SyncOutcome> {
    let transactions = providers::parse_transactions(payload, provider)?;

    let mut outcome = SyncOutcome::default();
    for tx in &transactions {
        match db.insert_transaction(user_id, account_id, tx)? {
            Some(_) => outcome.transactions_imported += 1,
            None => outcome.transactions_skipped += 1,
        }
    }

    let detection = with_retries("bill detection", || detect_bills(db, user_id, as_of))?;
    outcome.bills_created = detection.bills_created;

    db.refresh_bill_statuses(user_id, as_of)?;

    let matching = with_retries("payment matching", || match_payments(db, user_id, as_of))?;
    outcome.payments_linked = matching.matches_linked;
    outcome.bills_settled = matching.bills_settled;

    info!(
        user_id,
        account_id,
        provider = %provider,
        imported = outcome.transactions_imported,
        skipped = outcome.transactions_skipped,
        bills_created = outcome.bills_created,
        payments_linked = outcome.payments_linked,
        "Sync processing complete"
    );

    Ok(outcome)
}

/// Run an operation with bounded retries and linear backoff.
///
/// The passes re-fetch their snapshot on every attempt, so a retry after a
/// transient storage failure sees current data.
fn with_retries<T>(label: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(attempt, error = %e, "{} failed, retrying", label);
                thread::sleep(RETRY_DELAY * attempt);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
