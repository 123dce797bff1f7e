use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

lazy_static! {
    static ref CELL_KEY_REGEX: Regex = Regex::new(r"^cell-([0-9]+)-([0-9]+)$").unwrap();
}

/// The string-keyed form of a grid used at the load/save boundary.
///
/// Keys are `cell-{row}-{col}`; values are rich-text cell contents. A
/// `BTreeMap` keeps snapshots deterministic for callers that diff or hash them.
pub type FlatMap = BTreeMap<String, String>;

/// Address of a single cell, zero-based.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: usize,
    pub col: usize,
}

impl CellKey {
    pub fn new(row: usize, col: usize) -> Self {
        CellKey { row, col }
    }

    /// Parse a `cell-{row}-{col}` key.
    ///
    /// Returns `None` for anything else, including negative indices and
    /// numbers that overflow `usize`.
    pub fn parse(key: &str) -> Option<Self> {
        let caps = CELL_KEY_REGEX.captures(key)?;
        let row = caps.get(1)?.as_str().parse::<usize>().ok()?;
        let col = caps.get(2)?.as_str().parse::<usize>().ok()?;
        Some(CellKey { row, col })
    }

    pub fn to_key(&self) -> String {
        format!("cell-{}-{}", self.row, self.col)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell-{}-{}", self.row, self.col)
    }
}

/// Row and column counts of a grid. Both are at least 1 for a live grid.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub rows: usize,
    pub cols: usize,
}

impl Dimensions {
    pub fn new(rows: usize, cols: usize) -> Self {
        Dimensions {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }
}
