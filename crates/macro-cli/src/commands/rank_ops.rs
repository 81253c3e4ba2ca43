use std::process;

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use macro_core::field::{classify, FieldContext, NoLabels};
use macro_core::ranking::{rank, tab_match};
use macro_core::store::MacroStore;
use macro_core::{Macro, Settings, SurfaceDescriptor};
use macro_session::preview;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Debug, Serialize)]
pub struct RankRow {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct RankReport {
    pub query: String,
    pub context: FieldContext,
    pub suggestions: Vec<RankRow>,
    /// Macro Tab would complete to, if any.
    pub tab_match: Option<String>,
}

/// Rank `macros` the way a focused field described by `desc` would.
pub fn rank_report(
    macros: &[Macro],
    query: &str,
    desc: &SurfaceDescriptor,
    domain: &str,
    settings: &Settings,
) -> RankReport {
    let ctx = classify(desc, &NoLabels, domain);
    let ranked = rank(query, Some(&ctx), macros, settings);
    let tab = tab_match(query, &ranked, macros, settings).map(|m| m.id.to_string());
    let suggestions = ranked
        .iter()
        .map(|s| RankRow {
            id: s.entry.id.to_string(),
            name: s.entry.name.clone(),
            score: s.score,
            preview: preview(&s.entry.body),
        })
        .collect();
    RankReport {
        query: query.to_string(),
        context: ctx,
        suggestions,
        tab_match: tab,
    }
}

/// Left-align `s` in a column `width` terminal cells wide.
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{s}{}", " ".repeat(width.saturating_sub(w)))
}

pub fn format_text(report: &RankReport) -> String {
    let mut out = format!(
        "query={:?} field={} context={}\n",
        report.query,
        report.context.kind.as_str(),
        report.context.context_key()
    );
    if report.suggestions.is_empty() {
        out.push_str("(no suggestions)\n");
    } else {
        let name_w = report
            .suggestions
            .iter()
            .map(|r| UnicodeWidthStr::width(r.name.as_str()))
            .max()
            .unwrap_or(0);
        for (i, row) in report.suggestions.iter().enumerate() {
            out.push_str(&format!(
                "#{:>2} {:>7.2}  {}  {}\n",
                i + 1,
                row.score,
                pad(&row.name, name_w),
                row.preview
            ));
        }
    }
    match &report.tab_match {
        Some(id) => out.push_str(&format!("tab → {id}\n")),
        None => out.push_str("tab → (none)\n"),
    }
    out
}

pub struct RankArgs<'a> {
    pub macros_file: &'a str,
    pub query: &'a str,
    pub input_type: &'a str,
    pub field_name: &'a str,
    pub domain: &'a str,
    pub settings: Option<&'a str>,
    pub json: bool,
}

pub fn rank_cmd(args: &RankArgs<'_>) {
    let settings = die!(super::load_settings(args.settings), "{}");
    let store = die!(super::load_store(args.macros_file), "Error: {}");
    let macros = die!(store.list(), "Error: {}");
    let desc = if args.input_type == "textarea" {
        SurfaceDescriptor::textarea(args.field_name)
    } else {
        SurfaceDescriptor::input(args.input_type, args.field_name)
    };
    let report = rank_report(&macros, args.query, &desc, args.domain, &settings);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("JSON serialization failed")
        );
    } else {
        print!("{}", format_text(&report));
    }
}
