use std::fs;
use std::process;

use macro_core::store::{unknown_variables, MacroStore};
use macro_core::variables::variable_names;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub fn settings_export() {
    print!("{}", macro_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        macro_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: timing.focus_delay_ms={}, ranking.max_suggestions={}, completion.min_score={}",
        s.timing.focus_delay_ms, s.ranking.max_suggestions, s.completion.min_score
    );
}

pub fn macros_validate(file: &str, json: bool) {
    let store = die!(super::load_store(file), "Error: {}");
    let macros = die!(store.list(), "Error: {}");
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&macros).expect("JSON serialization failed")
        );
        return;
    }
    let with_vars = macros
        .iter()
        .filter(|m| !variable_names(&m.body).is_empty())
        .count();
    let with_affinity = macros
        .iter()
        .filter(|m| !m.field_types.is_empty() || !m.domains.is_empty())
        .count();
    let known = super::builtin_variables();
    for m in &macros {
        for name in unknown_variables(m, &known) {
            println!(
                "warning: macro '{}' uses unknown variable ${name}, inserted as written",
                m.id
            );
        }
    }
    println!(
        "OK: {} macros ({with_vars} with variables, {with_affinity} with affinities)",
        macros.len()
    );
}
