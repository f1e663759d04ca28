//! Merchant name normalization
//!
//! Both the recurrence detector and the payment matcher compare merchants by
//! canonical key rather than raw statement text. Two variants:
//!
//! - [`normalize_merchant`]: grouping key for detection. Missing names fold
//!   into an `"unknown"` bucket.
//! - [`comparison_key`]: aggressive form for similarity scoring. Also drops
//!   punctuation so `"NETFLIX.COM"` and `"Netflix"` land close together.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::Transaction;

/// Grouping key used when no merchant name is available
pub const UNKNOWN_MERCHANT: &str = "unknown";

/// Trailing legal-entity suffix, preceded by whitespace, optional period
fn legal_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s+(?:inc|llc|corp|ltd|co|company)\.?$").expect("static pattern compiles")
    })
}

/// Strip trailing legal-entity suffixes from an already-lowercased string.
///
/// Loops so stacked suffixes ("acme co inc") reduce fully; this is what keeps
/// normalization idempotent. The leading word is never stripped since the
/// pattern requires whitespace before the suffix.
fn strip_legal_suffix(s: &str) -> String {
    let mut out = s.trim().to_string();
    loop {
        let stripped = legal_suffix_re().replace(&out, "").trim().to_string();
        if stripped == out {
            return out;
        }
        out = stripped;
    }
}

/// Normalize a raw merchant/description string into a grouping key.
///
/// Missing or blank input maps to [`UNKNOWN_MERCHANT`] so the detector still
/// has a bucket for nameless transactions.
pub fn normalize_merchant(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return UNKNOWN_MERCHANT.to_string(),
    };
    strip_legal_suffix(&raw.to_lowercase())
}

/// Normalize a merchant string into a comparison key for similarity scoring.
///
/// Ordering matters: lowercase, strip the legal suffix (while punctuation is
/// still intact, so "Netflix, Inc." loses its suffix), then drop everything
/// outside `[a-z0-9\s]` and collapse whitespace. Blank input yields an empty
/// key, which the scorers treat as no-match.
pub fn comparison_key(raw: &str) -> String {
    let stripped = strip_legal_suffix(&raw.to_lowercase());
    let cleaned: String = stripped
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve the display merchant for a transaction.
///
/// Providers populate `merchant_name` inconsistently; fall back to the
/// statement descriptor. Resolved once here rather than ad hoc at call sites.
pub fn display_merchant(tx: &Transaction) -> &str {
    match tx.merchant_name.as_deref() {
        Some(m) if !m.trim().is_empty() => m,
        _ => &tx.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_legal_suffixes() {
        assert_eq!(normalize_merchant(Some("Spotify Inc.")), "spotify");
        assert_eq!(normalize_merchant(Some("spotify inc")), "spotify");
        assert_eq!(normalize_merchant(Some("SPOTIFY")), "spotify");
        assert_eq!(normalize_merchant(Some("Acme Company")), "acme");
        assert_eq!(normalize_merchant(Some("Geico Corp.")), "geico");
    }

    #[test]
    fn test_normalize_missing_input() {
        assert_eq!(normalize_merchant(None), UNKNOWN_MERCHANT);
        assert_eq!(normalize_merchant(Some("")), UNKNOWN_MERCHANT);
        assert_eq!(normalize_merchant(Some("   ")), UNKNOWN_MERCHANT);
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in [
            "Spotify Inc.",
            "acme co co",
            "NETFLIX.COM",
            "unknown",
            "Company",
            "T-Mobile  USA  Inc",
        ] {
            let once = normalize_merchant(Some(raw));
            let twice = normalize_merchant(Some(&once));
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_normalize_keeps_leading_word() {
        // A lone suffix word is a merchant name, not a suffix
        assert_eq!(normalize_merchant(Some("Company")), "company");
        assert_eq!(normalize_merchant(Some("co")), "co");
    }

    #[test]
    fn test_comparison_key_drops_punctuation() {
        assert_eq!(comparison_key("NETFLIX.COM"), "netflixcom");
        assert_eq!(comparison_key("Netflix, Inc."), "netflix");
        assert_eq!(comparison_key("AT&T  Mobility"), "att mobility");
        assert_eq!(comparison_key(""), "");
        assert_eq!(comparison_key("***"), "");
    }

    #[test]
    fn test_comparison_key_collapses_whitespace() {
        assert_eq!(comparison_key("  State   Farm  "), "state farm");
    }

    #[test]
    fn test_display_merchant_fallback() {
        let mut tx = crate::db::test_fixtures::debit("ext-1", "NETFLIX.COM", 15.99, "2024-01-01");
        assert_eq!(display_merchant(&tx), "NETFLIX.COM");

        tx.merchant_name = Some("Netflix".to_string());
        assert_eq!(display_merchant(&tx), "Netflix");

        tx.merchant_name = Some("  ".to_string());
        assert_eq!(display_merchant(&tx), "NETFLIX.COM");
    }
}
