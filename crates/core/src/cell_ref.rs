//! Cell addressing for the fixed 26x99 grid.
//!
//! A `CellRef` is the zero-based (column, row) position behind the grid
//! display; its canonical textual form is the cell name ("A1" through
//! "Z99"). Translation is lossless in both directions. Out-of-range names
//! are rejected outright, never clamped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of columns in the grid (A through Z).
pub const GRID_COLS: usize = 26;
/// Number of rows in the grid (1 through 99).
pub const GRID_ROWS: usize = 99;

/// Zero-based (column, row) position of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub col: usize,
    pub row: usize,
}

/// A cell name that does not denote a cell inside the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidNameError(pub String);

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid cell name \"{}\": valid cells are A1 through Z99",
            self.0
        )
    }
}

impl std::error::Error for InvalidNameError {}

impl CellRef {
    /// Create a cell reference. Callers guarantee the position is inside
    /// the grid; selection and fan-out iteration never leave it.
    #[inline]
    pub fn new(col: usize, row: usize) -> Self {
        debug_assert!(col < GRID_COLS && row < GRID_ROWS);
        Self { col, row }
    }

    /// Canonical cell name: column letter followed by the 1-based row.
    pub fn name(&self) -> String {
        format!("{}{}", (b'A' + self.col as u8) as char, self.row + 1)
    }

    /// Parse a canonical cell name.
    ///
    /// Accepts exactly one letter `A`-`Z` followed by an integer in 1..=99
    /// with no leading zero and no trailing characters. Everything else is
    /// rejected: this is the boundary gate that encodes the grid size
    /// before any text reaches the formula engine.
    pub fn parse(name: &str) -> Result<Self, InvalidNameError> {
        let err = || InvalidNameError(name.to_string());

        let bytes = name.as_bytes();
        if bytes.len() < 2 || bytes.len() > 3 {
            return Err(err());
        }
        let col = match bytes[0] {
            b'A'..=b'Z' => (bytes[0] - b'A') as usize,
            _ => return Err(err()),
        };

        let digits = &name[1..];
        if digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let row_1based: usize = digits.parse().map_err(|_| err())?;
        if row_1based == 0 || row_1based > GRID_ROWS {
            return Err(err());
        }

        Ok(Self {
            col,
            row: row_1based - 1,
        })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
