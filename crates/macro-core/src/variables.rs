//! Body post-processing: `$name` / `${name}` variable substitution run right
//! before a macro body is inserted.

use std::collections::HashMap;

use serde::Deserialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    #[error("permission denied while resolving ${0}")]
    PermissionDenied(String),
    #[error("${0} is unavailable")]
    Unavailable(String),
}

/// Turns a raw macro body into the final inserted text.
/// Fallible: the engine aborts the insertion rather than insert a partial body.
pub trait BodyExpander {
    fn expand(&self, raw: &str) -> Result<String, ExpandError>;
}

/// Bodies inserted verbatim.
pub struct Verbatim;

impl BodyExpander for Verbatim {
    fn expand(&self, raw: &str) -> Result<String, ExpandError> {
        Ok(raw.to_string())
    }
}

/// Host clipboard access; reading may be refused by the user agent.
pub trait ClipboardSource {
    fn read_text(&self) -> Result<String, ExpandError>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Variable {
    #[serde(rename = "date")]
    Date { format: String },
    #[serde(rename = "static")]
    Static { value: String },
    #[serde(rename = "clipboard")]
    Clipboard,
}

fn builtin_defaults() -> HashMap<String, Variable> {
    let date = |f: &str| Variable::Date {
        format: f.to_string(),
    };
    HashMap::from([
        ("date".to_string(), date("%Y-%m-%d")),
        ("time".to_string(), date("%H:%M")),
        ("datetime".to_string(), date("%Y-%m-%d %H:%M")),
        ("year".to_string(), date("%Y")),
        ("clipboard".to_string(), Variable::Clipboard),
    ])
}

pub struct VariableExpander {
    vars: HashMap<String, Variable>,
    clipboard: Option<Box<dyn ClipboardSource>>,
}

impl VariableExpander {
    pub fn new(user_vars: HashMap<String, Variable>) -> Self {
        let mut vars = builtin_defaults();
        // User-defined variables override builtins
        vars.extend(user_vars);
        Self {
            vars,
            clipboard: None,
        }
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardSource>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn known_names(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }

    /// Value of the reference `name`; an unknown name keeps its source text.
    fn resolve(&self, name: &str, raw: &str) -> Result<String, ExpandError> {
        match self.vars.get(name) {
            Some(Variable::Date { format }) => Ok(format_date(format)),
            Some(Variable::Static { value }) => Ok(value.clone()),
            Some(Variable::Clipboard) => match &self.clipboard {
                Some(c) => c.read_text(),
                None => Err(ExpandError::Unavailable(name.to_string())),
            },
            None => Ok(raw.to_string()),
        }
    }
}

impl BodyExpander for VariableExpander {
    fn expand(&self, raw: &str) -> Result<String, ExpandError> {
        let mut out = String::with_capacity(raw.len());
        for token in tokenize(raw) {
            match token {
                Token::Literal(s) => out.push_str(s),
                Token::Var { name, raw } => out.push_str(&self.resolve(name, raw)?),
            }
        }
        Ok(out)
    }
}

/// Variable names referenced in a body, in order of appearance.
pub fn variable_names(template: &str) -> Vec<String> {
    tokenize(template)
        .into_iter()
        .filter_map(|t| match t {
            Token::Var { name, .. } => Some(name.to_string()),
            Token::Literal(_) => None,
        })
        .collect()
}

enum Token<'a> {
    Literal(&'a str),
    /// `raw` is the whole reference as written, `$name` or `${name}`.
    Var { name: &'a str, raw: &'a str },
}

/// Split a template into literals and variable references.
/// `$$` is a literal `$`; an unclosed `${` and a `$` not followed by a
/// letter or `_` stay literal, so prices like `$5` survive.
fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        if pos > 0 {
            tokens.push(Token::Literal(&rest[..pos]));
        }
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('$') {
            tokens.push(Token::Literal("$"));
            rest = tail;
        } else if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => {
                    tokens.push(Token::Var {
                        name: &braced[..end],
                        raw: &rest[pos..pos + end + 3],
                    });
                    rest = &braced[end + 1..];
                }
                None => {
                    tokens.push(Token::Literal(&rest[pos..]));
                    rest = "";
                }
            }
        } else if after.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            tokens.push(Token::Var {
                name: &after[..len],
                raw: &rest[pos..pos + len + 1],
            });
            rest = &after[len..];
        } else {
            tokens.push(Token::Literal("$"));
            rest = after;
        }
    }
    if !rest.is_empty() {
        tokens.push(Token::Literal(rest));
    }
    tokens
}

fn format_date(fmt: &str) -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());

    let mut result = String::with_capacity(fmt.len());
    let mut chars = fmt.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('Y') => result.push_str(&format!("{:04}", now.year())),
            Some('m') => result.push_str(&format!("{:02}", now.month() as u8)),
            Some('d') => result.push_str(&format!("{:02}", now.day())),
            Some('H') => result.push_str(&format!("{:02}", now.hour())),
            Some('M') => result.push_str(&format!("{:02}", now.minute())),
            Some('S') => result.push_str(&format!("{:02}", now.second())),
            Some('%') => result.push('%'),
            // Unknown specifier: keep as-is
            Some(other) => {
                result.push('%');
                result.push(other);
            }
            None => result.push('%'),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClipboard(Result<String, ExpandError>);

    impl ClipboardSource for FixedClipboard {
        fn read_text(&self) -> Result<String, ExpandError> {
            self.0.clone()
        }
    }

    fn expander() -> VariableExpander {
        let mut user = HashMap::new();
        user.insert(
            "email".to_string(),
            Variable::Static {
                value: "test@example.com".to_string(),
            },
        );
        VariableExpander::new(user)
    }

    #[test]
    fn expands_static_variable() {
        let e = expander();
        assert_eq!(e.expand("$email").unwrap(), "test@example.com");
        assert_eq!(e.expand("${email}").unwrap(), "test@example.com");
        assert_eq!(e.expand("hi $email!").unwrap(), "hi test@example.com!");
    }

    #[test]
    fn dollar_escape_and_lone_dollar() {
        let e = expander();
        assert_eq!(e.expand("$$100").unwrap(), "$100");
        assert_eq!(e.expand("$ ").unwrap(), "$ ");
        assert_eq!(e.expand("$").unwrap(), "$");
        assert_eq!(e.expand("${unclosed").unwrap(), "${unclosed");
    }

    #[test]
    fn unknown_variable_is_preserved() {
        let e = expander();
        assert_eq!(e.expand("$nope").unwrap(), "$nope");
        assert_eq!(e.expand("${nope} and $nope!").unwrap(), "${nope} and $nope!");
        assert_eq!(
            e.expand("Only $5 off, ask $bob").unwrap(),
            "Only $5 off, ask $bob"
        );
    }

    #[test]
    fn digits_never_start_a_name() {
        let e = expander();
        assert_eq!(e.expand("$5 or $email").unwrap(), "$5 or test@example.com");
        assert_eq!(e.expand("$1.99").unwrap(), "$1.99");
        assert!(variable_names("Only $5 off").is_empty());
        assert_eq!(variable_names("$_x2"), vec!["_x2"]);
    }

    #[test]
    fn builtin_date_shape() {
        let e = expander();
        let date = e.expand("$date").unwrap();
        assert_eq!(date.len(), 10);
        assert_eq!(&date[4..5], "-");
        assert_eq!(e.expand("$year").unwrap().len(), 4);
    }

    #[test]
    fn clipboard_success_and_denial() {
        let e = expander().with_clipboard(Box::new(FixedClipboard(Ok("pasted".into()))));
        assert_eq!(e.expand("> $clipboard").unwrap(), "> pasted");

        let e = expander().with_clipboard(Box::new(FixedClipboard(Err(
            ExpandError::PermissionDenied("clipboard".into()),
        ))));
        assert_eq!(
            e.expand("> $clipboard").unwrap_err(),
            ExpandError::PermissionDenied("clipboard".into())
        );

        let e = expander();
        assert!(matches!(
            e.expand("$clipboard"),
            Err(ExpandError::Unavailable(_))
        ));
    }

    #[test]
    fn variable_name_scan() {
        assert_eq!(variable_names("$foo"), vec!["foo"]);
        assert_eq!(variable_names("$a and ${b}"), vec!["a", "b"]);
        assert!(variable_names("$$escaped").is_empty());
        assert!(variable_names("no vars").is_empty());
    }

    #[test]
    fn verbatim_passthrough() {
        assert_eq!(Verbatim.expand("$date").unwrap(), "$date");
    }
}
