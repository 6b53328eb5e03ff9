//! Heuristic confidence scorer.
//!
//! The score is a reproducible estimate of answer quality computed from the
//! response text and the query, not a model-calibrated probability.
//!
//! | Signal | Adjustment |
//! |--------|------------|
//! | base | `0.5` |
//! | response longer than 200 chars | `+0.2` |
//! | response longer than 500 chars | `+0.1` (on top of the above) |
//! | share of query words found in the response | up to `+0.2` |
//! | any uncertainty phrase | `−0.2` |
//! | mentions contact / phone / email | `+0.1` |
//!
//! Uncertainty phrases match case-insensitively. Contact terms match the
//! response text exactly as written, so "Email us" earns no bonus.
//!
//! The intermediate sum may leave `[0, 1]`; it is clamped once, at the end.

/// Phrases that signal the model is hedging.
pub const UNCERTAINTY_PHRASES: &[&str] = &[
    "i don't know",
    "i'm not sure",
    "might be",
    "could be",
    "possibly",
];

/// Words that signal actionable contact details. Matched case-sensitively.
pub const CONTACT_TERMS: &[&str] = &["contact", "phone", "email"];

const BASE: f64 = 0.5;
const LONG_BONUS: f64 = 0.2;
const VERY_LONG_BONUS: f64 = 0.1;
const OVERLAP_WEIGHT: f64 = 0.2;
const UNCERTAINTY_PENALTY: f64 = 0.2;
const CONTACT_BONUS: f64 = 0.1;

const LONG_CHARS: usize = 200;
const VERY_LONG_CHARS: usize = 500;

/// Score `response` against `query`. Always returns a value in `[0, 1]`.
pub fn score(response: &str, query: &str) -> f64 {
    let lowered = response.to_lowercase();
    let length = response.chars().count();

    let mut confidence = BASE;

    if length > LONG_CHARS {
        confidence += LONG_BONUS;
    }
    if length > VERY_LONG_CHARS {
        confidence += VERY_LONG_BONUS;
    }

    confidence += query_overlap(&lowered, query) * OVERLAP_WEIGHT;

    if UNCERTAINTY_PHRASES.iter().any(|p| lowered.contains(p)) {
        confidence -= UNCERTAINTY_PENALTY;
    }

    if CONTACT_TERMS.iter().any(|t| response.contains(t)) {
        confidence += CONTACT_BONUS;
    }

    confidence.clamp(0.0, 1.0)
}

/// Fraction of lower-cased, whitespace-split query words that occur as
/// substrings of `lowered_response`. A query with no words contributes 0.
fn query_overlap(lowered_response: &str, query: &str) -> f64 {
    let query = query.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let matched = words
        .iter()
        .filter(|w| lowered_response.contains(*w))
        .count();
    matched as f64 / words.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_base_for_short_unrelated_response() {
        assert!(approx(score("Okay.", "pothole"), 0.5));
    }

    #[test]
    fn test_length_bonuses_cumulative() {
        let medium = "a".repeat(201);
        let long = "a".repeat(501);
        assert!(approx(score(&medium, "zzz"), 0.7));
        assert!(approx(score(&long, "zzz"), 0.8));
        // Exactly at the thresholds: no bonus.
        assert!(approx(score(&"a".repeat(200), "zzz"), 0.5));
        assert!(approx(score(&"a".repeat(500), "zzz"), 0.7));
    }

    #[test]
    fn test_overlap_proportional() {
        // Two of four words present.
        let s = score("report the issue", "report pothole issue quickly");
        assert!(approx(s, 0.5 + 0.5 * 0.2));
    }

    #[test]
    fn test_uncertainty_penalty_case_insensitive() {
        let s = score("I'm Not Sure about that.", "zzz");
        assert!(approx(s, 0.3));
    }

    #[test]
    fn test_contact_bonus() {
        assert!(approx(score("Please email the office.", "zzz"), 0.6));
        assert!(approx(score("Call the phone line.", "zzz"), 0.6));
    }

    #[test]
    fn test_contact_terms_are_case_sensitive() {
        assert!(approx(score("Please Email the office.", "zzz"), 0.5));
        assert!(approx(score("Contact the office.", "zzz"), 0.5));
        assert!(approx(score("PHONE 311", "zzz"), 0.5));
    }

    #[test]
    fn test_full_score_clamped_to_one() {
        // 600 characters, mentions phone, every query word present.
        let mut response = String::from("To report a pothole call the phone line. ");
        while response.chars().count() < 600 {
            response.push('.');
        }
        assert_eq!(response.chars().count(), 600);
        assert!(approx(score(&response, "report pothole"), 1.0));
    }

    #[test]
    fn test_never_below_zero() {
        let s = score("", "");
        assert!(approx(s, 0.5));
        let hedged = score("possibly, might be, could be", "zzz qqq");
        assert!((0.0..=1.0).contains(&hedged));
        assert!(approx(hedged, 0.3));
    }

    #[test]
    fn test_penalty_and_bonuses_combine() {
        // 0.5 + 0.2 + 0.1 + 0.2 - 0.2 + 0.1
        let mut response = String::from("It could be the pothole team; contact them. ");
        while response.chars().count() < 600 {
            response.push('x');
        }
        assert!(approx(score(&response, "pothole team"), 0.9));
    }

    #[test]
    fn test_pathological_inputs_stay_in_range() {
        let inputs = [
            "🚧".repeat(1_000),
            "\u{0}\u{FEFF}".repeat(300),
            "I don't know. ".repeat(100),
            "phone ".repeat(500),
        ];
        for r in &inputs {
            for q in ["", "   ", "phone", "🚧 road", "ÄÖÜ straße"] {
                let s = score(r, q);
                assert!((0.0..=1.0).contains(&s), "out of range: {} for {:?}", s, q);
            }
        }
    }

    #[test]
    fn test_overlap_counts_unicode_case() {
        assert!(approx(query_overlap("straße gesperrt", "STRASSE"), 0.0));
        assert!(approx(query_overlap("ärger", "ÄRGER"), 1.0));
    }
}
