//! Billow Core Library
//!
//! Recurring-bill engine for the Billow personal finance app:
//! - Database access and migrations
//! - Aggregator payload adapters (Plaid, SimpleFin)
//! - Merchant normalization and similarity scoring
//! - Recurring-bill detection over transaction history
//! - Payment matching and bill settlement
//! - Sync-triggered orchestration jobs

pub mod db;
pub mod detect;
pub mod error;
pub mod jobs;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod similarity;

pub use db::Database;
pub use detect::{DetectionConfig, DetectionSummary, PatternCandidate, RecurrenceDetector};
pub use error::{Error, Result};
pub use jobs::{detect_bills, match_payments, process_sync, SyncOutcome};
pub use matcher::{MatchConfig, MatchSummary, PaymentMatcher};
pub use models::{
    Account, Bill, BillCategory, BillPriority, Frequency, NewBill, NewTransaction, PaymentStatus,
    Provider, Transaction, TransactionType,
};
pub use normalize::{comparison_key, display_merchant, normalize_merchant};
pub use similarity::{amount_score, date_score, string_score};
