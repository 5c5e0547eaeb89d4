//! Contract required from the external formula/dependency engine.
//!
//! The session never parses formulas, tracks dependencies, or touches cell
//! storage itself; it drives the engine exclusively through this trait and
//! trusts the values the engine reports. Cells are addressed by canonical
//! name ("A1" style) on both sides of the boundary.

use std::path::Path;

/// Computed value of a cell as reported by the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    /// Evaluation could not produce a usable value (division by zero,
    /// reference to an empty or non-numeric operand). The content itself
    /// was accepted.
    Error,
}

/// Rejection reported by [`Engine::set_contents`].
///
/// The engine guarantees that no cell state changed when any of these is
/// returned. Syntax and cycle rejections are distinct kinds here even
/// though they surface to the user as one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentError {
    /// A cell name embedded in the content is malformed or outside the grid.
    InvalidName(String),
    /// Formula source could not be parsed.
    Syntax(String),
    /// Accepting the content would create a reference cycle.
    Circular(String),
}

pub trait Engine {
    /// Submit raw content (empty, literal, or `=`-prefixed formula source)
    /// for `name`. On acceptance the engine updates the cell and every cell
    /// depending on it; on rejection it leaves all state unchanged.
    fn set_contents(&mut self, name: &str, text: &str) -> Result<(), ContentError>;

    /// Computed value for `name`. Empty cells report an empty text value.
    fn value(&self, name: &str) -> Value;

    /// Previously set content formatted for display; formula contents are
    /// re-prefixed with their `=` marker.
    fn contents(&self, name: &str) -> String;

    /// Names of all non-empty cells, in no particular order.
    fn non_empty_cells(&self) -> Vec<String>;

    /// True iff an accepted edit occurred since the last successful save.
    fn changed(&self) -> bool;

    /// Persist the full cell set to `path`. The byte format is owned by the
    /// engine and opaque to the session.
    fn save(&mut self, path: &Path) -> Result<(), String>;

    /// Rebuild an engine from a previously saved file.
    fn load_from(path: &Path) -> Result<Self, String>
    where
        Self: Sized;
}
