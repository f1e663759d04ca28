//! Similarity scorers for payment matching
//!
//! Three pure scorers, each returning 0-100. The tier boundaries are the
//! product's tolerance policy; they are deliberately step functions and must
//! not be smoothed into continuous curves, or match acceptance shifts.

use chrono::NaiveDate;
use strsim::levenshtein;

use crate::normalize::comparison_key;

/// Score merchant-name similarity between two raw strings.
///
/// Both sides are reduced to comparison keys first. Exact keys score 100,
/// containment in either direction 85, anything else falls through to a
/// normalized Levenshtein distance.
pub fn string_score(a: &str, b: &str) -> f64 {
    let ka = comparison_key(a);
    let kb = comparison_key(b);

    if ka.is_empty() || kb.is_empty() {
        return 0.0;
    }
    if ka == kb {
        return 100.0;
    }
    if ka.contains(&kb) || kb.contains(&ka) {
        return 85.0;
    }

    let distance = levenshtein(&ka, &kb) as f64;
    let max_len = ka.chars().count().max(kb.chars().count()) as f64;
    if max_len == 0.0 {
        return 0.0;
    }
    ((1.0 - distance / max_len) * 100.0).clamp(0.0, 100.0)
}

/// Score how close a payment amount is to a bill amount.
///
/// Callers pass absolute magnitudes. Banded by percentage difference
/// relative to the bill amount.
pub fn amount_score(amount: f64, bill_amount: f64) -> f64 {
    if bill_amount == 0.0 {
        return 0.0;
    }
    let pct = ((amount - bill_amount).abs() / bill_amount) * 100.0;
    if pct == 0.0 {
        100.0
    } else if pct <= 1.0 {
        95.0
    } else if pct <= 5.0 {
        80.0
    } else if pct <= 10.0 {
        60.0
    } else if pct <= 20.0 {
        40.0
    } else {
        0.0
    }
}

/// Score how close two calendar dates are. Symmetric.
pub fn date_score(date1: NaiveDate, date2: NaiveDate) -> f64 {
    let days = (date1 - date2).num_days().abs();
    if days == 0 {
        100.0
    } else if days <= 3 {
        90.0
    } else if days <= 7 {
        75.0
    } else if days <= 14 {
        60.0
    } else if days <= 30 {
        40.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_string_score_exact_after_normalization() {
        assert_eq!(string_score("Spotify Inc.", "SPOTIFY"), 100.0);
        assert_eq!(string_score("Netflix", "netflix"), 100.0);
    }

    #[test]
    fn test_string_score_containment() {
        assert_eq!(string_score("NETFLIX.COM", "Netflix"), 85.0);
        assert_eq!(string_score("Netflix", "NETFLIX.COM"), 85.0);
    }

    #[test]
    fn test_string_score_edit_distance_band() {
        // "geico" vs "gecko": distance 2 over length 5 -> 60
        let score = string_score("geico", "gecko");
        assert!((score - 60.0).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn test_string_score_symmetric() {
        let pairs = [
            ("Comcast Xfinity", "COMCAST"),
            ("State Farm", "Allstate"),
            ("", "Netflix"),
            ("T-Mobile", "Sprint"),
        ];
        for (a, b) in pairs {
            assert_eq!(string_score(a, b), string_score(b, a), "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_string_score_bounds() {
        assert_eq!(string_score("", ""), 0.0);
        assert_eq!(string_score("***", "Netflix"), 0.0);
        for (a, b) in [("abc", "xyz"), ("a", "aaaaaaaaaa"), ("water co", "waterco")] {
            let s = string_score(a, b);
            assert!((0.0..=100.0).contains(&s), "{} vs {} -> {}", a, b, s);
        }
    }

    #[test]
    fn test_amount_score_bands() {
        assert_eq!(amount_score(100.0, 100.0), 100.0);
        assert_eq!(amount_score(100.5, 100.0), 95.0);
        assert_eq!(amount_score(104.0, 100.0), 80.0);
        assert_eq!(amount_score(109.0, 100.0), 60.0);
        assert_eq!(amount_score(118.0, 100.0), 40.0);
        assert_eq!(amount_score(150.0, 100.0), 0.0);
        assert_eq!(amount_score(15.99, 0.0), 0.0);
    }

    #[test]
    fn test_amount_score_monotonic() {
        let bill = 50.0;
        let mut last = f64::INFINITY;
        for delta in [0.0, 0.25, 1.0, 3.0, 7.0, 12.0, 30.0] {
            let s = amount_score(bill + delta, bill);
            assert!(s <= last, "score rose at delta {}", delta);
            last = s;
        }
    }

    #[test]
    fn test_date_score_bands() {
        let due = date(2024, 4, 1);
        assert_eq!(date_score(due, due), 100.0);
        assert_eq!(date_score(date(2024, 4, 2), due), 90.0);
        assert_eq!(date_score(date(2024, 4, 8), due), 75.0);
        assert_eq!(date_score(date(2024, 4, 15), due), 60.0);
        assert_eq!(date_score(date(2024, 4, 30), due), 40.0);
        assert_eq!(date_score(date(2024, 5, 15), due), 0.0);
    }

    #[test]
    fn test_date_score_symmetric_and_monotonic() {
        let due = date(2024, 4, 1);
        let mut last = f64::INFINITY;
        for days in 0..40i64 {
            let d = due + chrono::Duration::days(days);
            assert_eq!(date_score(d, due), date_score(due, d));
            let s = date_score(d, due);
            assert!(s <= last, "score rose at {} days", days);
            last = s;
        }
    }
}
