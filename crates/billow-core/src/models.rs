//! Domain models for Billow

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A linked bank account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Which aggregator this account syncs through
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
}

/// Supported bank aggregators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Plaid,
    Simplefin,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plaid => "plaid",
            Self::Simplefin => "simplefin",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plaid" => Ok(Self::Plaid),
            "simplefin" | "simple_fin" => Ok(Self::Simplefin),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A synced bank transaction
///
/// `amount` is always a non-negative magnitude; direction lives in
/// `transaction_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub user_id: i64,
    /// Provider-issued id, unique per transaction. Ingestion dedupes on it.
    pub external_id: String,
    /// Display name from the provider (statement descriptor)
    pub name: String,
    /// Cleaned merchant name, when the provider supplies one
    pub merchant_name: Option<String>,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub pending: bool,
    /// Bill this payment was matched to, set at most once
    pub bill_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A new transaction to be ingested (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub external_id: String,
    pub name: String,
    pub merchant_name: Option<String>,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub pending: bool,
}

/// Bill recurrence frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }

    /// Advance a date by one period of this frequency.
    ///
    /// Weekly/biweekly are fixed day counts; the rest use calendar months so
    /// a bill due Jan 31 rolls to Feb 28/29 rather than drifting.
    pub fn advance(&self, from: NaiveDate) -> NaiveDate {
        match self {
            Self::Weekly => from + chrono::Duration::days(7),
            Self::Biweekly => from + chrono::Duration::days(14),
            Self::Monthly => from.checked_add_months(Months::new(1)).unwrap_or(from),
            Self::Quarterly => from.checked_add_months(Months::new(3)).unwrap_or(from),
            Self::Annual => from.checked_add_months(Months::new(12)).unwrap_or(from),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "annual" | "yearly" => Ok(Self::Annual),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bill payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Upcoming,
    Due,
    Overdue,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Due => "due",
            Self::Overdue => "overdue",
            Self::Paid => "paid",
        }
    }

    /// Statuses the payment matcher considers open
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Paid)
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upcoming" => Ok(Self::Upcoming),
            "due" => Ok(Self::Due),
            "overdue" => Ok(Self::Overdue),
            "paid" => Ok(Self::Paid),
            _ => Err(format!("Unknown payment status: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inferred bill category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillCategory {
    Rent,
    Utilities,
    Internet,
    Phone,
    Insurance,
    Subscription,
    Loan,
    Other,
}

impl BillCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rent => "rent",
            Self::Utilities => "utilities",
            Self::Internet => "internet",
            Self::Phone => "phone",
            Self::Insurance => "insurance",
            Self::Subscription => "subscription",
            Self::Loan => "loan",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for BillCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rent" => Ok(Self::Rent),
            "utilities" => Ok(Self::Utilities),
            "internet" => Ok(Self::Internet),
            "phone" => Ok(Self::Phone),
            "insurance" => Ok(Self::Insurance),
            "subscription" => Ok(Self::Subscription),
            "loan" => Ok(Self::Loan),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown bill category: {}", s)),
        }
    }
}

impl std::fmt::Display for BillCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bill priority for reminder ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl BillPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for BillPriority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown bill priority: {}", s)),
        }
    }
}

impl std::fmt::Display for BillPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurring bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    pub user_id: i64,
    pub account_id: Option<i64>,
    pub name: String,
    pub amount: f64,
    /// First occurrence
    pub due_date: NaiveDate,
    /// Rolling next occurrence, advanced on each detected payment
    pub next_due_date: NaiveDate,
    pub frequency: Frequency,
    pub category: BillCategory,
    pub payment_status: PaymentStatus,
    /// Created by the recurrence detector rather than the user
    pub auto_detected: bool,
    /// Detection confidence, 0-100
    pub detection_confidence: i64,
    /// Transaction that triggered detection
    pub source_transaction_id: Option<i64>,
    pub last_payment_date: Option<NaiveDate>,
    pub last_payment_amount: Option<f64>,
    pub reminder_enabled: bool,
    pub reminder_days_before: i64,
    pub priority: BillPriority,
    pub created_at: DateTime<Utc>,
}

/// A new bill to be created (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewBill {
    pub user_id: i64,
    pub account_id: Option<i64>,
    pub name: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub next_due_date: NaiveDate,
    pub frequency: Frequency,
    pub category: BillCategory,
    pub payment_status: PaymentStatus,
    pub auto_detected: bool,
    pub detection_confidence: i64,
    pub source_transaction_id: Option<i64>,
    pub reminder_enabled: bool,
    pub reminder_days_before: i64,
    pub priority: BillPriority,
}
