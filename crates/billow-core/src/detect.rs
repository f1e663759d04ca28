//! Recurring-bill detection
//!
//! Mines a user's debit history for merchants that charge on a regular
//! cadence and materializes them as auto-detected bills. Detection is
//! idempotent: a merchant that already has an auto-detected bill is skipped
//! on later passes.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::Result;
use crate::models::{BillCategory, Frequency, NewBill, PaymentStatus, Transaction};
use crate::normalize::{display_merchant, normalize_merchant};

/// Detection configuration
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Trailing window of history to mine, in months
    pub lookback_months: u32,
    /// Minimum transactions per merchant before a pattern can be inferred
    pub min_transactions: usize,
    /// Amount spread below this fraction of the mean counts as consistent
    pub tight_amount_ratio: f64,
    /// Interval spread below this many days counts as consistent
    pub tight_interval_days: f64,
    /// Consistency score awarded to tight groups
    pub consistent_score: f64,
    /// Consistency score awarded to loose groups
    pub inconsistent_score: f64,
    /// Minimum confidence before a candidate becomes a bill
    pub min_confidence: f64,
    /// Reminder default for created bills
    pub reminder_enabled: bool,
    /// Reminder lead time default for created bills
    pub reminder_days_before: i64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            lookback_months: 6,
            min_transactions: 2, // one charge is never a pattern
            tight_amount_ratio: 0.1,
            tight_interval_days: 7.0,
            consistent_score: 90.0,
            inconsistent_score: 60.0,
            min_confidence: 70.0,
            reminder_enabled: true,
            reminder_days_before: 3,
        }
    }
}

/// Results of running a detection pass
#[derive(Debug, Default)]
pub struct DetectionSummary {
    pub transactions_scanned: usize,
    pub groups_considered: usize,
    pub candidates_found: usize,
    pub bills_created: usize,
    pub bills_already_existing: usize,
}

/// A merchant group that looks like a recurring bill
#[derive(Debug, Clone)]
pub struct PatternCandidate {
    /// Display name of the first transaction in the group
    pub name: String,
    pub account_id: i64,
    pub source_transaction_id: i64,
    pub average_amount: f64,
    /// Spread of amounts around the mean (population standard deviation)
    pub amount_variance: f64,
    /// Spread of day-intervals between consecutive charges
    pub interval_variance: f64,
    pub frequency: Frequency,
    pub next_due_date: NaiveDate,
    pub confidence: f64,
    pub transaction_count: usize,
}

/// Detector that mines transaction history for recurring bills
pub struct RecurrenceDetector<'a> {
    db: &'a Database,
    config: DetectionConfig,
}

impl<'a> RecurrenceDetector<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            config: DetectionConfig::default(),
        }
    }

    pub fn with_config(db: &'a Database, config: DetectionConfig) -> Self {
        Self { db, config }
    }

    /// Run a detection pass for one user
    ///
    /// `as_of` anchors the trailing window so passes are reproducible; pass
    /// the sync time, not a wall-clock lookup. A fetch failure propagates;
    /// a single degenerate merchant group is skipped with a warning.
    pub fn detect_bills(&self, user_id: i64, as_of: NaiveDate) -> Result<DetectionSummary> {
        let window_start = as_of
            .checked_sub_months(Months::new(self.config.lookback_months))
            .unwrap_or(as_of);
        let transactions = self.db.list_debits_since(user_id, window_start)?;

        let mut summary = DetectionSummary {
            transactions_scanned: transactions.len(),
            ..Default::default()
        };
        if transactions.is_empty() {
            return Ok(summary);
        }

        // BTreeMap so a pass always walks merchants in the same order
        let mut by_merchant: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
        for tx in &transactions {
            let key = normalize_merchant(Some(display_merchant(tx)));
            by_merchant.entry(key).or_default().push(tx);
        }

        for (merchant, group) in &by_merchant {
            if group.len() < self.config.min_transactions {
                continue;
            }
            summary.groups_considered += 1;

            let candidate = match analyze_group(group, &self.config) {
                Some(c) => c,
                None => {
                    warn!(merchant = %merchant, "Skipping merchant group with no usable pattern");
                    continue;
                }
            };

            if candidate.confidence < self.config.min_confidence {
                debug!(
                    merchant = %merchant,
                    confidence = candidate.confidence,
                    "Candidate below confidence floor"
                );
                continue;
            }
            summary.candidates_found += 1;

            // Idempotency: one auto-detected bill per (user, name)
            if self
                .db
                .find_auto_detected_bill(user_id, &candidate.name)?
                .is_some()
            {
                debug!(merchant = %merchant, name = %candidate.name, "Auto-detected bill already exists");
                summary.bills_already_existing += 1;
                continue;
            }

            let bill = NewBill {
                user_id,
                account_id: Some(candidate.account_id),
                name: candidate.name.clone(),
                amount: round_cents(candidate.average_amount),
                due_date: candidate.next_due_date,
                next_due_date: candidate.next_due_date,
                frequency: candidate.frequency,
                category: infer_category(&candidate.name),
                payment_status: PaymentStatus::Upcoming,
                auto_detected: true,
                detection_confidence: candidate.confidence.round() as i64,
                source_transaction_id: Some(candidate.source_transaction_id),
                reminder_enabled: self.config.reminder_enabled,
                reminder_days_before: self.config.reminder_days_before,
                priority: Default::default(),
            };
            let bill_id = self.db.create_bill(&bill)?;
            summary.bills_created += 1;

            debug!(
                merchant = %merchant,
                bill_id,
                amount = bill.amount,
                frequency = %bill.frequency,
                confidence = bill.detection_confidence,
                "Created auto-detected bill"
            );
        }

        info!(
            user_id,
            scanned = summary.transactions_scanned,
            groups = summary.groups_considered,
            candidates = summary.candidates_found,
            created = summary.bills_created,
            "Bill detection pass complete"
        );

        Ok(summary)
    }
}

/// Analyze one merchant group for a recurring pattern
///
/// The group must be date-ascending (the transaction query guarantees it).
/// Returns `None` when no interval can be computed.
fn analyze_group(group: &[&Transaction], config: &DetectionConfig) -> Option<PatternCandidate> {
    let amounts: Vec<f64> = group.iter().map(|tx| tx.amount).collect();
    let average_amount = mean(&amounts);
    let amount_variance = std_deviation(&amounts);

    let amount_consistency = if amount_variance < average_amount * config.tight_amount_ratio {
        config.consistent_score
    } else {
        config.inconsistent_score
    };

    let mut dates: Vec<NaiveDate> = group.iter().map(|tx| tx.date).collect();
    dates.sort();

    let intervals: Vec<f64> = dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days() as f64)
        .collect();
    if intervals.is_empty() {
        return None;
    }

    let average_interval = mean(&intervals);
    let interval_variance = std_deviation(&intervals);
    let frequency = classify_frequency(average_interval);

    let frequency_consistency = if interval_variance < config.tight_interval_days {
        config.consistent_score
    } else {
        config.inconsistent_score
    };

    let confidence = (amount_consistency + frequency_consistency) / 2.0;

    let first = group.first()?;
    let last_date = *dates.last()?;

    Some(PatternCandidate {
        name: display_merchant(first).to_string(),
        account_id: first.account_id,
        source_transaction_id: first.id,
        average_amount,
        amount_variance,
        interval_variance,
        frequency,
        next_due_date: frequency.advance(last_date),
        confidence: confidence.round(),
        transaction_count: group.len(),
    })
}

/// Classify a billing frequency from the average day-interval.
///
/// Bands are checked widest-first: a 90-day average lands in the quarterly
/// band before the narrower monthly band is ever considered. Reordering the
/// checks changes the classification of edge values.
pub fn classify_frequency(average_interval: f64) -> Frequency {
    if average_interval >= 350.0 {
        Frequency::Annual
    } else if average_interval >= 85.0 {
        Frequency::Quarterly
    } else if (28.0..=31.0).contains(&average_interval) {
        Frequency::Monthly
    } else if (13.0..=15.0).contains(&average_interval) {
        Frequency::Biweekly
    } else if (6.0..=8.0).contains(&average_interval) {
        Frequency::Weekly
    } else {
        Frequency::Monthly
    }
}

/// Ordered keyword table for category inference. Order matters: a name can
/// match several rows ("rent insurance") and the first match wins.
const CATEGORY_KEYWORDS: &[(BillCategory, &[&str])] = &[
    (BillCategory::Rent, &["rent", "apartment", "housing"]),
    (
        BillCategory::Utilities,
        &["electric", "gas", "water", "utility", "power"],
    ),
    (
        BillCategory::Internet,
        &["internet", "comcast", "spectrum", "att", "verizon"],
    ),
    (BillCategory::Phone, &["phone", "mobile", "t-mobile", "sprint"]),
    (
        BillCategory::Insurance,
        &["insurance", "geico", "state farm", "allstate"],
    ),
    (
        BillCategory::Subscription,
        &["netflix", "spotify", "hulu", "amazon prime", "disney"],
    ),
    (BillCategory::Loan, &["loan", "mortgage", "credit"]),
];

/// Infer a bill category from its name
pub fn infer_category(name: &str) -> BillCategory {
    let lower = name.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return *category;
        }
    }
    BillCategory::Other
}

/// Arithmetic mean of a slice
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
///
/// Stored in the `*_variance` fields for historical reasons. The consistency
/// thresholds (`tight_amount_ratio`, `tight_interval_days`) are tuned against
/// this formula; substituting true variance shifts every confidence score.
fn std_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let mean_squared_deviation =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    mean_squared_deviation.sqrt()
}

/// Round a currency amount to cents
fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
