//! Suggestion ranking: fuzzy query relevance + context affinity + usage.

use std::cmp::Ordering;

use serde::Serialize;

use crate::field::FieldContext;
use crate::fuzzy::fuzzy_score;
use crate::macros::Macro;
use crate::settings::Settings;
use crate::text::char_len;

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub entry: Macro,
    pub score: f64,
}

/// Declared and learned association between a macro and the active field.
pub fn context_affinity(m: &Macro, ctx: &FieldContext, settings: &Settings) -> f64 {
    let a = &settings.affinity;
    let mut score = 0.0;
    if m.field_types.contains(&ctx.kind) {
        score += a.field_type_bonus;
    }
    if !ctx.domain.is_empty()
        && m
            .domains
            .iter()
            .any(|d| !d.is_empty() && ctx.domain.contains(d.as_str()))
    {
        score += a.domain_bonus;
    }
    score + m.context_usage_for(ctx) as f64 * a.context_usage_weight
}

/// Composite score of one candidate, or `None` when it falls under the
/// threshold for this kind of query.
pub fn score_candidate(
    query: &str,
    ctx: Option<&FieldContext>,
    m: &Macro,
    settings: &Settings,
) -> Option<f64> {
    let r = &settings.ranking;
    let affinity = ctx.map_or(0.0, |c| context_affinity(m, c, settings));

    if query.is_empty() {
        // No query: only context may surface a macro. Popularity alone never does.
        if ctx.is_none() || affinity <= 0.0 {
            return None;
        }
        let score = affinity + m.usage_count as f64 * r.idle_usage_weight;
        return (score > r.idle_threshold).then_some(score);
    }

    let relevance = fuzzy_score(query, &m.name).max(fuzzy_score(query, &m.body) * r.body_weight);
    let score =
        relevance + affinity * r.affinity_weight + m.usage_count as f64 * r.typed_usage_weight;
    (score > r.typed_threshold).then_some(score)
}

/// Rank `candidates` for `query` in `ctx`. At most `max_suggestions` results,
/// best first; ties go to the most recently used, then to candidate order.
pub fn rank(
    query: &str,
    ctx: Option<&FieldContext>,
    candidates: &[Macro],
    settings: &Settings,
) -> Vec<Suggestion> {
    let mut scored: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|m| {
            score_candidate(query, ctx, m, settings).map(|score| Suggestion {
                entry: m.clone(),
                score,
            })
        })
        .collect();

    // sort_by is stable, so equal keys keep candidate order.
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.entry.last_used.cmp(&a.entry.last_used))
    });
    scored.truncate(settings.ranking.max_suggestions);
    scored
}

/// The single macro Tab would complete to: the first ranked suggestion, then
/// the first candidate, whose name matches `query` strongly enough.
pub fn tab_match<'a>(
    query: &str,
    suggestions: &'a [Suggestion],
    candidates: &'a [Macro],
    settings: &Settings,
) -> Option<&'a Macro> {
    let c = &settings.completion;
    if char_len(query) < c.min_query_chars {
        return None;
    }
    let qualifies = |m: &&Macro| fuzzy_score(query, &m.name) >= c.min_score;
    suggestions
        .iter()
        .map(|s| &s.entry)
        .find(qualifies)
        .or_else(|| candidates.iter().find(qualifies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    fn settings() -> Settings {
        Settings::default()
    }

    fn email_ctx() -> FieldContext {
        FieldContext {
            kind: FieldKind::Email,
            name: "email-address".to_string(),
            placeholder: String::new(),
            label: String::new(),
            domain: "mail.example.com".to_string(),
        }
    }

    #[test]
    fn affinity_components() {
        let s = settings();
        let ctx = email_ctx();
        let m = Macro::new("1", "work", "a@example.com");
        assert_eq!(context_affinity(&m, &ctx, &s), 0.0);

        let m = m.with_field_types([FieldKind::Email]);
        assert_eq!(context_affinity(&m, &ctx, &s), 10.0);

        let mut m = m.with_domains(["example.com"]);
        assert_eq!(context_affinity(&m, &ctx, &s), 15.0);

        m.context_usage.insert("mail.example.com:email".to_string(), 20);
        assert!((context_affinity(&m, &ctx, &s) - 17.0).abs() < 1e-9);
    }

    #[test]
    fn empty_query_without_context_is_always_empty() {
        let s = settings();
        let cands = vec![
            Macro::new("1", "popular", "x").with_usage(10_000, Some(5)),
            Macro::new("2", "also", "y").with_usage(500, None),
        ];
        assert!(rank("", None, &cands, &s).is_empty());
    }

    #[test]
    fn empty_query_needs_affinity_not_popularity() {
        let s = settings();
        let ctx = email_ctx();
        let cands = vec![
            // Popular but unrelated to email fields.
            Macro::new("1", "popular", "x").with_usage(10_000, None),
            // Declares email affinity and is used enough to clear the idle bar.
            Macro::new("2", "work email", "me@work.example")
                .with_field_types([FieldKind::Email])
                .with_usage(250, None),
            // Affinity alone (10) stays under the idle threshold (30).
            Macro::new("3", "old email", "old@example").with_field_types([FieldKind::Email]),
        ];
        let ranked = rank("", Some(&ctx), &cands, &s);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].entry.id.as_str(), "2");
        assert!((ranked[0].score - 35.0).abs() < 1e-9);
    }

    #[test]
    fn typed_query_scoring() {
        let s = settings();
        let cands = vec![
            Macro::new("1", "sig", "Best,\nA"),
            Macro::new("2", "greeting", "Hello there"),
            Macro::new("3", "unrelated", "zzz"),
        ];
        let ranked = rank("si", None, &cands, &s);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].entry.name, "sig");
        assert_eq!(ranked[0].score, 80.0);
    }

    #[test]
    fn body_matches_are_discounted() {
        let s = settings();
        let cands = vec![
            Macro::new("1", "zzz", "thanks a lot"),
            Macro::new("2", "thanks", "ty"),
        ];
        let ranked = rank("thanks", None, &cands, &s);
        assert_eq!(ranked[0].entry.id.as_str(), "2");
        assert_eq!(ranked[1].score, 40.0);
    }

    #[test]
    fn ties_prefer_recent_then_insertion_order() {
        let s = settings();
        let cands = vec![
            Macro::new("a", "sig one", "x"),
            Macro::new("b", "sig two", "x").with_usage(0, Some(100)),
            Macro::new("c", "sig three", "x"),
        ];
        let ranked = rank("sig", None, &cands, &s);
        let ids: Vec<&str> = ranked.iter().map(|s| s.entry.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn truncates_to_max_suggestions() {
        let s = settings();
        let cands: Vec<Macro> = (0..12)
            .map(|i| Macro::new(i.to_string(), format!("note {i}"), "body"))
            .collect();
        assert_eq!(rank("note", None, &cands, &s).len(), 5);
    }

    #[test]
    fn tab_match_bounds() {
        let s = settings();
        let cands = vec![Macro::new("1", "sig", "Best,\nA")];
        let ranked = rank("si", None, &cands, &s);
        assert_eq!(tab_match("si", &ranked, &cands, &s).unwrap().name, "sig");
        // Too short.
        assert!(tab_match("s", &ranked, &cands, &s).is_none());
        // Subsequence match scores below 60.
        assert!(tab_match("sg", &ranked, &cands, &s).is_none());
    }

    #[test]
    fn tab_match_falls_back_to_candidates() {
        let s = settings();
        let cands = vec![Macro::new("1", "addr", "1 Main St")];
        assert_eq!(tab_match("ad", &[], &cands, &s).unwrap().name, "addr");
    }
}
