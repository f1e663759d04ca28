//! Aggregator payload adapters
//!
//! Each supported aggregator normalizes its own payload shape into the one
//! canonical [`NewTransaction`] model. The detection and matching engine only
//! ever sees canonical records; provider quirks (sign conventions, timestamp
//! formats, merchant field splits) stop here.

use crate::error::Result;
use crate::models::{NewTransaction, Provider};

pub mod plaid;
pub mod simplefin;

/// Parse an aggregator payload into canonical transactions
pub fn parse_transactions(data: &str, provider: Provider) -> Result<Vec<NewTransaction>> {
    match provider {
        Provider::Plaid => plaid::parse(data),
        Provider::Simplefin => simplefin::parse(data),
    }
}
