//! Test doubles for session operations.
//!
//! `TestEngine` is a deliberately small engine honoring the [`Engine`]
//! contract: literals, `=`-prefixed formulas over numbers and cell
//! references with `+ - * /` and parentheses, cycle rejection at set time,
//! and evaluation errors for division by zero or empty/non-numeric
//! operands. `RecordingView` and `ScriptedChrome` capture everything the
//! session pushes out. Use these to test session invariants without a GUI
//! or a production engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use gridpad_core::cell_ref::CellRef;

use crate::engine::{ContentError, Engine, Value};
use crate::surface::{Chrome, CloseChoice, GridView};

// ---------------------------------------------------------------------------
// Engine double
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum Expr {
    Num(f64),
    Ref(String),
    Neg(Box<Expr>),
    Bin(Box<Expr>, Op, Box<Expr>),
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Debug)]
struct Cell {
    raw: String,
    kind: Kind,
}

#[derive(Clone, Debug)]
enum Kind {
    Number(f64),
    Text,
    Formula { expr: Expr, refs: Vec<String> },
}

/// Minimal formula engine backing session tests.
#[derive(Debug, Default)]
pub struct TestEngine {
    cells: FxHashMap<String, Cell>,
    changed: bool,
}

/// On-disk shape of the harness engine's native format: a JSON cell map.
#[derive(Serialize, Deserialize)]
struct SheetFile {
    cells: BTreeMap<String, String>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn eval(&self, expr: &Expr) -> Result<f64, ()> {
        match expr {
            Expr::Num(n) => Ok(*n),
            Expr::Ref(name) => match self.cells.get(name).map(|c| &c.kind) {
                Some(Kind::Number(n)) => Ok(*n),
                Some(Kind::Formula { expr, .. }) => self.eval(expr),
                // Empty or text operand: evaluation error.
                Some(Kind::Text) | None => Err(()),
            },
            Expr::Neg(inner) => Ok(-self.eval(inner)?),
            Expr::Bin(lhs, op, rhs) => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                match op {
                    Op::Add => Ok(l + r),
                    Op::Sub => Ok(l - r),
                    Op::Mul => Ok(l * r),
                    Op::Div => {
                        if r == 0.0 {
                            Err(())
                        } else {
                            Ok(l / r)
                        }
                    }
                }
            }
        }
    }

    /// Would storing a formula with `new_refs` under `name` close a cycle?
    fn would_cycle(&self, name: &str, new_refs: &[String]) -> bool {
        let mut stack: Vec<&str> = new_refs.iter().map(|s| s.as_str()).collect();
        let mut seen = FxHashSet::default();
        while let Some(current) = stack.pop() {
            if current == name {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(Cell {
                kind: Kind::Formula { refs, .. },
                ..
            }) = self.cells.get(current)
            {
                stack.extend(refs.iter().map(|s| s.as_str()));
            }
        }
        false
    }
}

impl Engine for TestEngine {
    fn set_contents(&mut self, name: &str, text: &str) -> Result<(), ContentError> {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            self.cells.remove(name);
            self.changed = true;
            return Ok(());
        }

        let kind = if let Some(src) = trimmed.strip_prefix('=') {
            let expr = parse_formula(src)?;
            let mut refs = Vec::new();
            collect_refs(&expr, &mut refs);
            if self.would_cycle(name, &refs) {
                return Err(ContentError::Circular(format!(
                    "{} would depend on its own value",
                    name
                )));
            }
            Kind::Formula { expr, refs }
        } else if let Ok(n) = trimmed.parse::<f64>() {
            Kind::Number(n)
        } else {
            Kind::Text
        };

        self.cells.insert(
            name.to_string(),
            Cell {
                raw: trimmed.to_string(),
                kind,
            },
        );
        self.changed = true;
        Ok(())
    }

    fn value(&self, name: &str) -> Value {
        match self.cells.get(name) {
            None => Value::Text(String::new()),
            Some(cell) => match &cell.kind {
                Kind::Number(n) => Value::Number(*n),
                Kind::Text => Value::Text(cell.raw.clone()),
                Kind::Formula { expr, .. } => match self.eval(expr) {
                    Ok(n) => Value::Number(n),
                    Err(()) => Value::Error,
                },
            },
        }
    }

    fn contents(&self, name: &str) -> String {
        self.cells.get(name).map(|c| c.raw.clone()).unwrap_or_default()
    }

    fn non_empty_cells(&self) -> Vec<String> {
        self.cells.keys().cloned().collect()
    }

    fn changed(&self) -> bool {
        self.changed
    }

    fn save(&mut self, path: &Path) -> Result<(), String> {
        let cells: BTreeMap<String, String> = self
            .cells
            .iter()
            .map(|(name, cell)| (name.clone(), cell.raw.clone()))
            .collect();
        let json = serde_json::to_string_pretty(&SheetFile { cells }).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())?;
        self.changed = false;
        Ok(())
    }

    fn load_from(path: &Path) -> Result<Self, String> {
        let json = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let file: SheetFile = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        let mut engine = Self::new();
        for (name, content) in &file.cells {
            engine
                .set_contents(name, content)
                .map_err(|_| format!("unreadable cell {} in {}", name, path.display()))?;
        }
        engine.changed = false;
        Ok(engine)
    }
}

// ---------------------------------------------------------------------------
// Formula parsing (numbers, refs, + - * /, parentheses)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
enum Tok {
    Num(f64),
    Ref(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<Tok>, ContentError> {
    let bytes = src.as_bytes();
    let mut toks = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' => i += 1,
            b'+' => {
                toks.push(Tok::Plus);
                i += 1;
            }
            b'-' => {
                toks.push(Tok::Minus);
                i += 1;
            }
            b'*' => {
                toks.push(Tok::Star);
                i += 1;
            }
            b'/' => {
                toks.push(Tok::Slash);
                i += 1;
            }
            b'(' => {
                toks.push(Tok::LParen);
                i += 1;
            }
            b')' => {
                toks.push(Tok::RParen);
                i += 1;
            }
            b'0'..=b'9' | b'.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let n: f64 = src[start..i].parse().map_err(|_| {
                    ContentError::Syntax(format!("bad number \"{}\"", &src[start..i]))
                })?;
                toks.push(Tok::Num(n));
            }
            b'A'..=b'Z' | b'a'..=b'z' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                // Names are normalized to upper case before the grid gate,
                // matching the engine's own normalizer.
                let word = src[start..i].to_ascii_uppercase();
                let cell = CellRef::parse(&word)
                    .map_err(|_| ContentError::InvalidName(word.clone()))?;
                toks.push(Tok::Ref(cell.name()));
            }
            other => {
                return Err(ContentError::Syntax(format!(
                    "unexpected character '{}' in formula",
                    other as char
                )));
            }
        }
    }
    Ok(toks)
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expr(&mut self) -> Result<Expr, ContentError> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Tok::Plus) => Some(Op::Add),
            Some(Tok::Minus) => Some(Op::Sub),
            _ => None,
        } {
            self.next();
            let rhs = self.term()?;
            lhs = Expr::Bin(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ContentError> {
        let mut lhs = self.factor()?;
        while let Some(op) = match self.peek() {
            Some(Tok::Star) => Some(Op::Mul),
            Some(Tok::Slash) => Some(Op::Div),
            _ => None,
        } {
            self.next();
            let rhs = self.factor()?;
            lhs = Expr::Bin(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expr, ContentError> {
        match self.next() {
            Some(Tok::Num(n)) => Ok(Expr::Num(n)),
            Some(Tok::Ref(name)) => Ok(Expr::Ref(name)),
            Some(Tok::Minus) => Ok(Expr::Neg(Box::new(self.factor()?))),
            Some(Tok::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Tok::RParen) => Ok(inner),
                    _ => Err(ContentError::Syntax("missing closing parenthesis".into())),
                }
            }
            Some(tok) => Err(ContentError::Syntax(format!(
                "unexpected token {:?} in formula",
                tok
            ))),
            None => Err(ContentError::Syntax("unexpected end of formula".into())),
        }
    }
}

fn parse_formula(src: &str) -> Result<Expr, ContentError> {
    let mut parser = Parser {
        toks: tokenize(src)?,
        pos: 0,
    };
    let expr = parser.expr()?;
    if parser.pos != parser.toks.len() {
        return Err(ContentError::Syntax("trailing input after formula".into()));
    }
    Ok(expr)
}

fn collect_refs(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Num(_) => {}
        Expr::Ref(name) => out.push(name.clone()),
        Expr::Neg(inner) => collect_refs(inner, out),
        Expr::Bin(lhs, _, rhs) => {
            collect_refs(lhs, out);
            collect_refs(rhs, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Surface doubles
// ---------------------------------------------------------------------------

/// Records everything the session pushes to the display.
#[derive(Default)]
pub struct RecordingView {
    pub grid: FxHashMap<(usize, usize), String>,
    pub name_field: String,
    pub value_field: String,
    pub contents_field: String,
    pub saved_notice: bool,
    /// Count of `set_cell` pushes, to assert aborted commits draw nothing.
    pub cell_pushes: usize,
    /// Count of selection-field refreshes, to assert clamped moves are silent.
    pub selection_refreshes: usize,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell_text(&self, cell: CellRef) -> Option<&str> {
        self.grid.get(&(cell.col, cell.row)).map(|s| s.as_str())
    }
}

impl GridView for RecordingView {
    fn set_cell(&mut self, cell: CellRef, text: &str) {
        self.grid.insert((cell.col, cell.row), text.to_string());
        self.cell_pushes += 1;
    }

    fn show_selection(&mut self, name: &str, value: &str, contents: &str) {
        self.name_field = name.to_string();
        self.value_field = value.to_string();
        self.contents_field = contents.to_string();
        self.selection_refreshes += 1;
    }

    fn saved_notice(&mut self, visible: bool) {
        self.saved_notice = visible;
    }
}

/// Scripted chrome: queued dialog answers, recorded alerts and timers.
#[derive(Default)]
pub struct ScriptedChrome {
    pub alerts: Vec<String>,
    /// Answers handed out by `pick_save_path`, front to back.
    pub save_paths: Vec<PathBuf>,
    pub path_prompts: usize,
    /// Answers handed out by `ask_close_choice`, front to back.
    pub close_choices: Vec<CloseChoice>,
    pub close_prompts: usize,
    /// Every `(delay, epoch)` the session asked to schedule.
    pub scheduled: Vec<(u64, u64)>,
}

impl ScriptedChrome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_save_path(path: PathBuf) -> Self {
        Self {
            save_paths: vec![path],
            ..Self::default()
        }
    }
}

impl Chrome for ScriptedChrome {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn pick_save_path(&mut self) -> Option<PathBuf> {
        self.path_prompts += 1;
        if self.save_paths.is_empty() {
            None
        } else {
            Some(self.save_paths.remove(0))
        }
    }

    fn ask_close_choice(&mut self) -> CloseChoice {
        self.close_prompts += 1;
        if self.close_choices.is_empty() {
            CloseChoice::Cancel
        } else {
            self.close_choices.remove(0)
        }
    }

    fn schedule_notice_clear(&mut self, delay: u64, epoch: u64) {
        self.scheduled.push((delay, epoch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_and_formulas() {
        let mut engine = TestEngine::new();
        engine.set_contents("A1", "5").unwrap();
        engine.set_contents("B1", "=A1*3").unwrap();
        assert_eq!(engine.value("A1"), Value::Number(5.0));
        assert_eq!(engine.value("B1"), Value::Number(15.0));
        assert_eq!(engine.contents("B1"), "=A1*3");
    }

    #[test]
    fn test_empty_content_clears_cell() {
        let mut engine = TestEngine::new();
        engine.set_contents("A1", "5").unwrap();
        engine.set_contents("A1", "").unwrap();
        assert!(engine.non_empty_cells().is_empty());
        assert_eq!(engine.value("A1"), Value::Text(String::new()));
    }

    #[test]
    fn test_lowercase_refs_normalize() {
        let mut engine = TestEngine::new();
        engine.set_contents("A1", "2").unwrap();
        engine.set_contents("B1", "=a1+1").unwrap();
        assert_eq!(engine.value("B1"), Value::Number(3.0));
    }

    #[test]
    fn test_out_of_grid_ref_is_invalid_name() {
        let mut engine = TestEngine::new();
        let err = engine.set_contents("A1", "=A100+1").unwrap_err();
        assert_eq!(err, ContentError::InvalidName("A100".into()));
        assert!(engine.non_empty_cells().is_empty());
    }

    #[test]
    fn test_garbled_formula_is_syntax_error() {
        let mut engine = TestEngine::new();
        assert!(matches!(
            engine.set_contents("A1", "=1++"),
            Err(ContentError::Syntax(_))
        ));
        assert!(matches!(
            engine.set_contents("A1", "=(2+3"),
            Err(ContentError::Syntax(_))
        ));
    }

    #[test]
    fn test_cycle_rejected_and_state_kept() {
        let mut engine = TestEngine::new();
        engine.set_contents("A1", "5").unwrap();
        engine.set_contents("B1", "=A1+2").unwrap();
        let err = engine.set_contents("A1", "=B1+1").unwrap_err();
        assert!(matches!(err, ContentError::Circular(_)));
        assert_eq!(engine.contents("A1"), "5");
        assert_eq!(engine.value("A1"), Value::Number(5.0));
        assert_eq!(engine.value("B1"), Value::Number(7.0));
    }

    #[test]
    fn test_self_reference_rejected() {
        let mut engine = TestEngine::new();
        assert!(matches!(
            engine.set_contents("C3", "=C3"),
            Err(ContentError::Circular(_))
        ));
    }

    #[test]
    fn test_evaluation_errors() {
        let mut engine = TestEngine::new();
        engine.set_contents("A1", "=1/0").unwrap();
        assert_eq!(engine.value("A1"), Value::Error);

        // Reference to an empty cell.
        engine.set_contents("B1", "=D4+1").unwrap();
        assert_eq!(engine.value("B1"), Value::Error);

        // Reference to a text cell.
        engine.set_contents("C1", "hello").unwrap();
        engine.set_contents("C2", "=C1*2").unwrap();
        assert_eq!(engine.value("C2"), Value::Error);
    }

    #[test]
    fn test_changed_tracks_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.sprd");

        let mut engine = TestEngine::new();
        assert!(!engine.changed());
        engine.set_contents("A1", "5").unwrap();
        assert!(engine.changed());
        engine.save(&path).unwrap();
        assert!(!engine.changed());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.sprd");

        let mut engine = TestEngine::new();
        engine.set_contents("A1", "5").unwrap();
        engine.set_contents("B2", "=A1/2").unwrap();
        engine.set_contents("C3", "note").unwrap();
        engine.save(&path).unwrap();

        let loaded = TestEngine::load_from(&path).unwrap();
        assert!(!loaded.changed());
        assert_eq!(loaded.value("B2"), Value::Number(2.5));
        assert_eq!(loaded.contents("C3"), "note");
        assert_eq!(loaded.non_empty_cells().len(), 3);
    }

    #[test]
    fn test_save_into_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = TestEngine::new();
        engine.set_contents("A1", "5").unwrap();
        assert!(engine.save(dir.path()).is_err());
        assert!(engine.changed());
    }
}
