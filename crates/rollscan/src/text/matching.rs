//! Fuzzy string matching over normalized Bengali text.
//!
//! Two scorers are exposed. [`similarity_ratio`] is the word-level primitive
//! used when attributing OCR words to extracted fields. [`token_set_ratio`]
//! is the record-level scorer: it is order-insensitive across
//! whitespace-delimited tokens and tolerant of extra or missing middle
//! tokens, which is what a voter name recognized with a dropped honorific or
//! a reordered surname needs to still score highly against the canonical
//! form.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

use super::normalize::normalize;

/// Normalized Levenshtein similarity between two strings, in [0, 100].
///
/// Both inputs are normalized first. Used for single-token comparisons; for
/// whole names prefer [`token_set_ratio`].
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&normalize(a), &normalize(b)) * 100.0
}

fn token_set(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .map(normalize)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Token-set similarity between two strings, in [0, 100].
///
/// Tokens are normalized and deduplicated, then compared via the classic
/// token-set construction: score the shared-token string against each
/// shared-plus-remainder string and take the best. A full subset relation
/// (one name contains every token of the other) scores 100 regardless of
/// token order.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = token_set(a);
    let tokens_b = token_set(b);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a
        .intersection(&tokens_b)
        .map(String::as_str)
        .collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).map(String::as_str).collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).map(String::as_str).collect();

    if !intersection.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = intersection.join(" ");
    let combined_a = join_nonempty(&sect, &only_a.join(" "));
    let combined_b = join_nonempty(&sect, &only_b.join(" "));

    let candidates = [
        normalized_levenshtein(&sect, &combined_a),
        normalized_levenshtein(&sect, &combined_b),
        normalized_levenshtein(&combined_a, &combined_b),
    ];
    candidates.into_iter().fold(0.0, f64::max) * 100.0
}

fn join_nonempty(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{} {}", left, right),
    }
}

/// Threshold check over [`token_set_ratio`].
///
/// Empty inputs never match: missing OCR data must not produce false
/// positives. Total, never errors.
pub fn fuzzy_match(a: &str, b: &str, threshold: u32) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    token_set_ratio(a, b) >= threshold as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_match_empty_inputs() {
        assert!(!fuzzy_match("", "রহিম", 0));
        assert!(!fuzzy_match("রহিম", "", 0));
        assert!(!fuzzy_match("", "", 0));
    }

    #[test]
    fn test_fuzzy_match_identity_at_full_threshold() {
        assert!(fuzzy_match("রহিম আলী", "রহিম আলী", 100));
        assert!(fuzzy_match("abc", "abc", 100));
    }

    #[test]
    fn test_token_order_insensitive() {
        assert_eq!(token_set_ratio("রহিম আলী", "আলী রহিম"), 100.0);
    }

    #[test]
    fn test_token_subset_scores_full() {
        // Extra middle token on one side must not hurt the score.
        assert_eq!(
            token_set_ratio("রহিম আলী", "রহিম মোহাম্মদ আলী"),
            100.0
        );
    }

    #[test]
    fn test_diacritic_variation_scores_high() {
        // Visarga difference disappears under normalization.
        assert!(token_set_ratio("রহিমঃ", "রহিম") >= 99.9);
    }

    #[test]
    fn test_unrelated_names_score_low() {
        assert!(token_set_ratio("রহিম আলী", "কামাল হোসেন") < 50.0);
    }

    #[test]
    fn test_fuzzy_match_near_miss_spelling() {
        // One substituted character in a short name still clears a
        // practical threshold.
        assert!(fuzzy_match("রহিম", "রহীম", 70));
    }

    #[test]
    fn test_similarity_ratio_bounds() {
        assert_eq!(similarity_ratio("রহিম", "রহিম"), 100.0);
        assert!(similarity_ratio("রহিম", "xyz") < 30.0);
    }

    #[test]
    fn test_strip_set_only_input_never_matches() {
        // Normalization empties the string; the empty token set scores 0.
        assert!(!fuzzy_match("ঃ।্", "রহিম", 1));
    }
}
