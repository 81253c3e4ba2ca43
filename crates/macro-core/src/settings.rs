//! Engine tuning loaded from TOML.
//!
//! - `Settings::default()` parses the embedded `default_settings.toml`
//! - `parse_settings_toml(content)` parses and validates a custom file
//!
//! Settings are handed to the engine explicitly (usually as `Arc<Settings>`)
//! so that tests can run engines with different tunings side by side.

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub timing: TimingSettings,
    pub ranking: RankingSettings,
    pub affinity: AffinitySettings,
    pub completion: CompletionSettings,
    pub cache: CacheSettings,
    #[serde(default)]
    pub behavior: BehaviorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("embedded settings TOML must be valid")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimingSettings {
    pub focus_delay_ms: u64,
    pub blur_grace_ms: u64,
    pub human_gap_min_ms: u64,
    pub human_gap_max_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingSettings {
    pub max_suggestions: usize,
    pub typed_threshold: f64,
    pub idle_threshold: f64,
    pub body_weight: f64,
    pub affinity_weight: f64,
    pub typed_usage_weight: f64,
    pub idle_usage_weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AffinitySettings {
    pub field_type_bonus: f64,
    pub domain_bonus: f64,
    pub context_usage_weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionSettings {
    pub min_query_chars: usize,
    pub min_score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub ttl_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorSettings {
    /// List picks replace the typed query instead of inserting at the caret.
    #[serde(default)]
    pub replace_query_on_pick: bool,
    /// Open minimized on fields the browser is likely to autofill itself.
    #[serde(default = "default_true")]
    pub minimize_on_native_autocomplete: bool,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            replace_query_on_pick: false,
            minimize_on_native_autocomplete: true,
        }
    }
}

fn default_true() -> bool {
    true
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_non_negative {
        ($section:ident . $field:ident) => {
            if s.$section.$field < 0.0 || s.$section.$field.is_nan() {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be non-negative".to_string(),
                });
            }
        };
    }
    macro_rules! check_positive {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive!(timing.focus_delay_ms);
    check_positive!(timing.blur_grace_ms);
    check_positive!(timing.human_gap_max_ms);
    if s.timing.human_gap_min_ms >= s.timing.human_gap_max_ms {
        return Err(SettingsError::InvalidValue {
            field: "timing.human_gap_min_ms".to_string(),
            reason: "must be below timing.human_gap_max_ms".to_string(),
        });
    }

    check_positive!(ranking.max_suggestions);
    check_non_negative!(ranking.typed_threshold);
    check_non_negative!(ranking.idle_threshold);
    check_non_negative!(ranking.body_weight);
    check_non_negative!(ranking.affinity_weight);
    check_non_negative!(ranking.typed_usage_weight);
    check_non_negative!(ranking.idle_usage_weight);

    check_non_negative!(affinity.field_type_bonus);
    check_non_negative!(affinity.domain_bonus);
    check_non_negative!(affinity.context_usage_weight);

    check_positive!(completion.min_query_chars);
    check_non_negative!(completion.min_score);

    check_positive!(cache.ttl_ms);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_toml() {
        let s = parse_settings_toml(DEFAULT_SETTINGS_TOML).unwrap();
        assert_eq!(s.timing.focus_delay_ms, 250);
        assert_eq!(s.timing.blur_grace_ms, 150);
        assert_eq!(s.timing.human_gap_min_ms, 50);
        assert_eq!(s.timing.human_gap_max_ms, 2000);
        assert_eq!(s.ranking.max_suggestions, 5);
        assert!((s.ranking.typed_threshold - 20.0).abs() < f64::EPSILON);
        assert!((s.ranking.idle_threshold - 30.0).abs() < f64::EPSILON);
        assert!((s.ranking.body_weight - 0.5).abs() < f64::EPSILON);
        assert!((s.affinity.field_type_bonus - 10.0).abs() < f64::EPSILON);
        assert_eq!(s.completion.min_query_chars, 2);
        assert!((s.completion.min_score - 60.0).abs() < f64::EPSILON);
        assert_eq!(s.cache.ttl_ms, 30000);
        assert!(!s.behavior.replace_query_on_pick);
        assert!(s.behavior.minimize_on_native_autocomplete);
    }

    #[test]
    fn behavior_section_is_optional() {
        let toml = DEFAULT_SETTINGS_TOML
            .split("[behavior]")
            .next()
            .unwrap()
            .to_string();
        let s = parse_settings_toml(&toml).unwrap();
        assert!(s.behavior.minimize_on_native_autocomplete);
        assert!(!s.behavior.replace_query_on_pick);
    }

    #[test]
    fn error_negative_weight() {
        let toml = DEFAULT_SETTINGS_TOML.replace("body_weight = 0.5", "body_weight = -0.5");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
        assert!(err.to_string().contains("ranking.body_weight"));
    }

    #[test]
    fn error_inverted_cadence_window() {
        let toml = DEFAULT_SETTINGS_TOML.replace("human_gap_min_ms = 50", "human_gap_min_ms = 5000");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("timing.human_gap_min_ms"));
    }

    #[test]
    fn error_zero_max_suggestions() {
        let toml = DEFAULT_SETTINGS_TOML.replace("max_suggestions = 5", "max_suggestions = 0");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("ranking.max_suggestions"));
    }

    #[test]
    fn error_invalid_toml() {
        let err = parse_settings_toml("not valid toml {{{").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn error_missing_section() {
        let toml = r#"
[timing]
focus_delay_ms = 250
blur_grace_ms = 150
human_gap_min_ms = 50
human_gap_max_ms = 2000
"#;
        let err = parse_settings_toml(toml).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn custom_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let toml = DEFAULT_SETTINGS_TOML.replace("focus_delay_ms = 250", "focus_delay_ms = 300");
        std::fs::write(&path, toml).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let s = parse_settings_toml(&content).unwrap();
        assert_eq!(s.timing.focus_delay_ms, 300);
    }
}
