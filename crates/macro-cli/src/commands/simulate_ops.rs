//! Replay a typing script through a `HostDriver` and report what the user
//! would see after every step.
//!
//! Script lines (blank lines and `#` comments are skipped):
//!
//! ```text
//! focus <text|email|search|tel|url|textarea|rich> <name> [autocomplete=<hint>]
//! type <text>        typed one character at a time, `\n` for a newline
//! key <tab|shift-tab|enter|down|up|escape|backspace>
//! fill <text>        value set by the page, no key event
//! paste <text>
//! wait <ms>
//! click <index>
//! blur [overlay]
//! ```

use std::cell::RefCell;
use std::fs;
use std::process;
use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;

use macro_core::field::ElementKind;
use macro_core::store::MemoryStore;
use macro_core::text::char_len;
use macro_core::variables::VariableExpander;
use macro_core::{Settings, SurfaceDescriptor};
use macro_engine::HostDriver;
use macro_session::surface::{CaretRange, PlainField, RichTextRegion};
use macro_session::{
    AutocompleteEngine, EditableSurface, FocusTarget, KeyEvent, OverlayContent, SurfaceHandle,
};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

/// Cadence of simulated typing.
const KEY_GAP_MS: u64 = 120;

#[derive(Debug, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Focus {
        kind: String,
        name: String,
        autocomplete: Option<String>,
    },
    Type(String),
    Key(KeyEvent),
    Fill(String),
    Paste(String),
    Wait(u64),
    Click(usize),
    Blur { into_overlay: bool },
}

fn unescape(s: &str) -> String {
    s.replace("\\n", "\n")
}

fn parse_key(name: &str) -> Option<KeyEvent> {
    Some(match name {
        "tab" => KeyEvent::Tab { shift: false },
        "shift-tab" => KeyEvent::Tab { shift: true },
        "enter" => KeyEvent::Enter,
        "down" => KeyEvent::ArrowDown,
        "up" => KeyEvent::ArrowUp,
        "escape" | "esc" => KeyEvent::Escape,
        "backspace" => KeyEvent::Backspace,
        _ => return None,
    })
}

pub fn parse_script(src: &str) -> Result<Vec<(String, Step)>, ScriptError> {
    let mut steps = Vec::new();
    for (i, raw) in src.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let err = |message: String| ScriptError {
            line: i + 1,
            message,
        };
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let step = match cmd {
            "focus" => {
                let mut parts = rest.split_whitespace();
                let kind = parts
                    .next()
                    .ok_or_else(|| err("focus needs a field kind".into()))?;
                let name = parts.next().unwrap_or("").to_string();
                let autocomplete = parts
                    .next()
                    .and_then(|p| p.strip_prefix("autocomplete="))
                    .map(str::to_string);
                Step::Focus {
                    kind: kind.to_string(),
                    name,
                    autocomplete,
                }
            }
            "type" => Step::Type(unescape(rest)),
            "fill" => Step::Fill(unescape(rest)),
            "paste" => Step::Paste(unescape(rest)),
            "key" => Step::Key(
                parse_key(rest.trim()).ok_or_else(|| err(format!("unknown key '{rest}'")))?,
            ),
            "wait" => Step::Wait(
                rest.trim()
                    .parse()
                    .map_err(|_| err(format!("bad duration '{rest}'")))?,
            ),
            "click" => Step::Click(
                rest.trim()
                    .parse()
                    .map_err(|_| err(format!("bad index '{rest}'")))?,
            ),
            "blur" => Step::Blur {
                into_overlay: rest.trim() == "overlay",
            },
            other => return Err(err(format!("unknown command '{other}'"))),
        };
        steps.push((line.to_string(), step));
    }
    Ok(steps)
}

// ---------------------------------------------------------------------------
// Simulated page
// ---------------------------------------------------------------------------

enum SimField {
    Plain(Rc<RefCell<PlainField>>),
    Rich(Rc<RefCell<RichTextRegion>>),
}

impl SimField {
    fn open(kind: &str, name: &str, autocomplete: Option<String>) -> (Self, SurfaceHandle) {
        match kind {
            "rich" => {
                let desc = SurfaceDescriptor {
                    aria_label: Some(name.to_string()),
                    ..SurfaceDescriptor::content_editable()
                };
                let r = Rc::new(RefCell::new(RichTextRegion::new(desc)));
                let handle = SurfaceHandle::from(Rc::clone(&r));
                (SimField::Rich(r), handle)
            }
            _ => {
                let base = if kind == "textarea" {
                    SurfaceDescriptor::textarea(name)
                } else {
                    SurfaceDescriptor::input(kind, name)
                };
                let desc = SurfaceDescriptor {
                    autocomplete,
                    ..base
                };
                let f = Rc::new(RefCell::new(PlainField::new(desc)));
                let handle = SurfaceHandle::from(Rc::clone(&f));
                (SimField::Plain(f), handle)
            }
        }
    }

    fn type_text(&self, s: &str) {
        match self {
            SimField::Plain(f) => f.borrow_mut().type_text(s),
            SimField::Rich(r) => r.borrow_mut().type_text(s),
        }
    }

    fn backspace(&self) {
        match self {
            SimField::Plain(f) => f.borrow_mut().backspace(),
            SimField::Rich(r) => {
                let mut r = r.borrow_mut();
                if let Some(caret) = r.caret_offsets() {
                    let range = if caret.is_collapsed() {
                        CaretRange::new(caret.start.saturating_sub(1), caret.end)
                    } else {
                        caret
                    };
                    let _ = r.splice_text(range, "");
                }
            }
        }
    }

    fn fill(&self, s: &str) {
        match self {
            SimField::Plain(f) => f.borrow_mut().set_value(s),
            SimField::Rich(r) => {
                let mut r = r.borrow_mut();
                let len = char_len(&r.text());
                let _ = r.splice_text(CaretRange::new(0, len), s);
            }
        }
    }

    fn multiline(&self) -> bool {
        match self {
            SimField::Plain(f) => f.borrow().descriptor().element == ElementKind::TextArea,
            SimField::Rich(_) => true,
        }
    }

    fn value(&self) -> String {
        match self {
            SimField::Plain(f) => f.borrow().value().to_string(),
            SimField::Rich(r) => r.borrow().text(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OverlayReport {
    List { items: Vec<String>, selected: usize },
    Compact { count: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: String,
    pub at_ms: u64,
    pub phase: String,
    pub query: String,
    pub overlay: Option<OverlayReport>,
    pub ghost: Option<String>,
    pub value: String,
    pub usage_reported: usize,
}

struct Simulation {
    driver: HostDriver<MemoryStore, VariableExpander>,
    fields: Vec<(String, SimField, SurfaceHandle)>,
    focused: Option<usize>,
}

impl Simulation {
    fn field(&self) -> Option<&(String, SimField, SurfaceHandle)> {
        self.focused.map(|i| &self.fields[i])
    }

    fn type_text(&mut self, text: &str) {
        let Some(i) = self.focused else { return };
        for ch in text.chars() {
            self.driver.advance(KEY_GAP_MS);
            let s = ch.to_string();
            let (_, field, handle) = &self.fields[i];
            let resp = self.driver.key(handle, KeyEvent::text(&s));
            if !resp.consumed {
                field.type_text(&s);
                self.driver.input(handle);
            }
        }
    }

    fn key(&mut self, key: KeyEvent) {
        let Some(i) = self.focused else { return };
        self.driver.advance(KEY_GAP_MS);
        let (_, field, handle) = &self.fields[i];
        let resp = self.driver.key(handle, key.clone());
        if resp.consumed {
            return;
        }
        match key {
            KeyEvent::Backspace => {
                field.backspace();
                self.driver.input(handle);
            }
            KeyEvent::Enter if field.multiline() => {
                field.type_text("\n");
                self.driver.input(handle);
            }
            _ => {}
        }
    }

    fn run(&mut self, step: &Step) {
        match step {
            Step::Focus {
                kind,
                name,
                autocomplete,
            } => {
                let idx = match self.fields.iter().position(|(n, _, _)| n == name) {
                    Some(idx) => idx,
                    None => {
                        let (field, handle) = SimField::open(kind, name, autocomplete.clone());
                        self.fields.push((name.clone(), field, handle));
                        self.fields.len() - 1
                    }
                };
                self.focused = Some(idx);
                let handle = self.fields[idx].2.clone();
                self.driver.focus(&handle);
            }
            Step::Type(text) => self.type_text(text),
            Step::Key(key) => self.key(key.clone()),
            Step::Fill(text) => {
                if let Some(i) = self.focused {
                    let (_, field, handle) = &self.fields[i];
                    field.fill(text);
                    self.driver.input(handle);
                }
            }
            Step::Paste(text) => {
                if let Some(i) = self.focused {
                    let (_, field, handle) = &self.fields[i];
                    self.driver.paste(handle);
                    field.type_text(text);
                    self.driver.input(handle);
                }
            }
            Step::Wait(ms) => self.driver.advance(*ms),
            Step::Click(index) => {
                self.driver.pointer_commit(*index);
            }
            Step::Blur { into_overlay } => {
                if let Some(i) = self.focused {
                    let to = if *into_overlay {
                        FocusTarget::Overlay
                    } else {
                        FocusTarget::Elsewhere
                    };
                    self.driver.blur(&self.fields[i].2, to);
                    if !into_overlay {
                        self.focused = None;
                    }
                }
            }
        }
    }

    fn report(&self, step: &str) -> StepReport {
        let engine = self.driver.engine();
        let overlay = self.driver.overlay().map(|view| match &view.content {
            OverlayContent::List { items, selected } => OverlayReport::List {
                items: items.iter().map(|it| it.name.clone()).collect(),
                selected: *selected,
            },
            OverlayContent::Compact { count } => OverlayReport::Compact { count: *count },
        });
        StepReport {
            step: step.to_string(),
            at_ms: self.driver.now(),
            phase: format!("{:?}", engine.phase()),
            query: engine.snapshot().map(|s| s.query).unwrap_or_default(),
            overlay,
            ghost: self.driver.ghost().map(|g| g.ghost.clone()),
            value: self.field().map(|(_, f, _)| f.value()).unwrap_or_default(),
            usage_reported: self.driver.reported_usage().len(),
        }
    }
}

/// Run `steps` against a fresh engine and store.
pub fn run_script(
    store: MemoryStore,
    settings: Settings,
    domain: &str,
    steps: &[(String, Step)],
) -> Vec<StepReport> {
    let engine = AutocompleteEngine::new(Arc::new(settings), domain);
    let expander = VariableExpander::new(Default::default());
    let mut sim = Simulation {
        driver: HostDriver::new(engine, store, expander),
        fields: Vec::new(),
        focused: None,
    };
    steps
        .iter()
        .map(|(line, step)| {
            sim.run(step);
            sim.report(line)
        })
        .collect()
}

fn format_report(r: &StepReport) -> String {
    let overlay = match &r.overlay {
        None => "-".to_string(),
        Some(OverlayReport::Compact { count }) => format!("[{count} macros]"),
        Some(OverlayReport::List { items, selected }) => items
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if i == *selected {
                    format!(">{name}")
                } else {
                    name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", "),
    };
    let mut out = format!(
        "{:>6}ms  {:<32} {:<10} query={:?} overlay={overlay}",
        r.at_ms, r.step, r.phase, r.query
    );
    if let Some(ghost) = &r.ghost {
        out.push_str(&format!(" ghost={ghost:?}"));
    }
    out.push_str(&format!(" value={:?}", r.value));
    out
}

pub fn simulate_cmd(
    macros_file: &str,
    script_file: &str,
    domain: &str,
    settings: Option<&str>,
    json: bool,
) {
    let settings = die!(super::load_settings(settings), "{}");
    let store = die!(super::load_store(macros_file), "Error: {}");
    let src = die!(
        fs::read_to_string(script_file),
        "Error reading {script_file}: {}"
    );
    let steps = die!(parse_script(&src), "Error in {script_file}: {}");
    let reports = run_script(store, settings, domain, &steps);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).expect("JSON serialization failed")
        );
    } else {
        for r in &reports {
            println!("{}", format_report(r));
        }
        if let Some(last) = reports.last() {
            println!("usage reported: {}", last.usage_reported);
        }
    }
}
