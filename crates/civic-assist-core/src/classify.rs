//! Response-type classifier.
//!
//! Picks a presentation hint for the client from keywords in the query.
//! Rules are checked in order and the first hit wins; anything else is
//! plain text.

use crate::models::ResponseType;

const MAP_TERMS: &[&str] = &["map", "location", "where"];
const CHART_TERMS: &[&str] = &["chart", "graph", "statistics"];
const TIMELINE_TERMS: &[&str] = &["timeline", "history", "progress"];

/// Classify a query. Total and deterministic.
pub fn classify(query: &str) -> ResponseType {
    let lowered = query.to_lowercase();
    let has_any = |terms: &[&str]| terms.iter().any(|t| lowered.contains(t));

    if has_any(MAP_TERMS) {
        ResponseType::Map
    } else if has_any(CHART_TERMS) {
        ResponseType::Chart
    } else if has_any(TIMELINE_TERMS) {
        ResponseType::Timeline
    } else {
        ResponseType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_question_is_text() {
        assert_eq!(classify("how do I report a pothole"), ResponseType::Text);
        assert_eq!(classify(""), ResponseType::Text);
    }

    #[test]
    fn test_where_is_map() {
        assert_eq!(classify("where is the nearest park"), ResponseType::Map);
        assert_eq!(classify("Show LOCATION of outages"), ResponseType::Map);
    }

    #[test]
    fn test_chart_and_timeline() {
        assert_eq!(classify("pothole statistics for May"), ResponseType::Chart);
        assert_eq!(classify("graph of complaints"), ResponseType::Chart);
        assert_eq!(classify("history of my report"), ResponseType::Timeline);
        assert_eq!(classify("progress on the repair"), ResponseType::Timeline);
    }

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(classify("map the statistics history"), ResponseType::Map);
        assert_eq!(classify("chart the repair timeline"), ResponseType::Chart);
    }

    #[test]
    fn test_keywords_match_inside_words() {
        // "somewhere" contains "where".
        assert_eq!(classify("is it somewhere downtown"), ResponseType::Map);
    }

    #[test]
    fn test_deterministic() {
        let q = "Where did the progress chart go?";
        assert_eq!(classify(q), classify(q));
    }
}
