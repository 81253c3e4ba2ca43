//! Query-to-text matching used for ranking and tab completion.
//!
//! Scores are tiered so that thresholds stay meaningful:
//! exact (100) > prefix (80) > substring (60) > subsequence [40, 60) > none (0).

pub const EXACT: f64 = 100.0;
pub const PREFIX: f64 = 80.0;
pub const SUBSTRING: f64 = 60.0;
pub const SUBSEQUENCE_BASE: f64 = 40.0;
pub const SUBSEQUENCE_SPAN: f64 = 20.0;

/// Score `text` against `query`, both case-folded.
pub fn fuzzy_score(query: &str, text: &str) -> f64 {
    let q = query.to_lowercase();
    let t = text.to_lowercase();

    if t == q {
        return EXACT;
    }
    if t.starts_with(&q) {
        return PREFIX;
    }
    if t.contains(&q) {
        return SUBSTRING;
    }

    let q_chars: Vec<char> = q.chars().collect();
    if q_chars.is_empty() {
        return 0.0;
    }
    match subsequence_span(&q_chars, &t) {
        Some(span) => {
            // A contiguous span would have been a substring hit, so span > |Q|
            // here and the result stays strictly below SUBSTRING.
            let tightness = q_chars.len() as f64 / span as f64;
            SUBSEQUENCE_BASE + tightness * SUBSEQUENCE_SPAN
        }
        None => 0.0,
    }
}

/// Greedy left-to-right subsequence scan. Returns the number of text
/// characters from the first matched character to the last, or `None` if
/// some query character was never consumed.
fn subsequence_span(query: &[char], text: &str) -> Option<usize> {
    let mut qi = 0;
    let mut first = None;
    let mut last = 0;
    for (ti, c) in text.chars().enumerate() {
        if qi < query.len() && c == query[qi] {
            if first.is_none() {
                first = Some(ti);
            }
            last = ti;
            qi += 1;
            if qi == query.len() {
                break;
            }
        }
    }
    if qi < query.len() {
        return None;
    }
    first.map(|f| last - f + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers() {
        assert_eq!(fuzzy_score("cat", "cat"), 100.0);
        assert_eq!(fuzzy_score("ca", "cat"), 80.0);
        assert_eq!(fuzzy_score("at", "cat"), 60.0);
        let sub = fuzzy_score("ct", "cat");
        assert!((40.0..60.0).contains(&sub), "got {sub}");
        assert_eq!(fuzzy_score("xyz", "cat"), 0.0);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(fuzzy_score("CAT", "cat"), 100.0);
        assert_eq!(fuzzy_score("Si", "SIG"), 80.0);
    }

    #[test]
    fn subsequence_prefers_tight_spans() {
        let tight = fuzzy_score("ac", "abc");
        let loose = fuzzy_score("ac", "abbbbbc");
        assert!(tight > loose);
        assert!(loose >= 40.0);
    }

    #[test]
    fn out_of_order_is_no_match() {
        assert_eq!(fuzzy_score("tc", "cat"), 0.0);
    }

    #[test]
    fn monotone_over_tiers() {
        let pairs = [
            ("sig", "sig"),
            ("sig", "signature"),
            ("sig", "my sig"),
            ("sig", "s-i-g"),
            ("sig", "nope"),
        ];
        let scores: Vec<f64> = pairs.iter().map(|(q, t)| fuzzy_score(q, t)).collect();
        for w in scores.windows(2) {
            assert!(w[0] >= w[1], "{scores:?}");
        }
    }

    #[test]
    fn empty_query_is_a_prefix_of_everything() {
        assert_eq!(fuzzy_score("", "anything"), 80.0);
        assert_eq!(fuzzy_score("", ""), 100.0);
    }
}
