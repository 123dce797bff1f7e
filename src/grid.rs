use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::cell::{CellKey, Dimensions, FlatMap};
use crate::config::{DEFAULT_MAX_COLS, DEFAULT_MAX_ROWS, GridConfig};
use crate::saving::StoreError;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("{axis} index {index} out of range (bound {bound})")]
    InvalidIndex { axis: Axis, index: usize, bound: usize },

    #[error("{axis} limit of {limit} reached")]
    LimitReached { axis: Axis, limit: usize },

    #[error("no grid is loaded")]
    NoGrid,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("grid payload is not a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A grid of rich-text cells.
///
/// Cells live in a dense row-major container: `cells[row][col]`, with every
/// row holding exactly `cols` entries. Structural edits are plain
/// `Vec::insert` / `Vec::remove` calls, so a shift can never clobber a cell
/// that has not moved yet and no cell can exist outside the bounds.
///
/// A grid also carries the row/column limits it was built with. Inserts
/// refuse to grow past them, so every snapshot loads back under the same
/// config without losing a row or column.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct GridModel {
    rows: usize,
    cols: usize,
    #[serde(skip)]
    limits: Dimensions,
    cells: Vec<Vec<String>>,
}

impl GridModel {
    /// Empty grid of the given size under the default limits. Each count is
    /// floored at 1 and capped at its limit.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::sized(rows, cols, Dimensions::new(DEFAULT_MAX_ROWS, DEFAULT_MAX_COLS))
    }

    /// Empty grid of the given size under the limits of `config`.
    pub fn with_config(dims: Dimensions, config: &GridConfig) -> Self {
        Self::sized(dims.rows, dims.cols, config.limits())
    }

    fn sized(rows: usize, cols: usize, limits: Dimensions) -> Self {
        let dims = Dimensions::new(rows.min(limits.rows), cols.min(limits.cols));
        GridModel {
            rows: dims.rows,
            cols: dims.cols,
            limits,
            cells: vec![vec![String::new(); dims.cols]; dims.rows],
        }
    }

    /// Hydrate a grid from its flat keyed form.
    ///
    /// Metadata keys named in `config` are stripped first. Keys that do not
    /// parse as `cell-{row}-{col}`, or that sit beyond the configured caps,
    /// are dropped and take no part in deriving the counts. When nothing
    /// usable remains the configured fallback size is used.
    pub fn load_from(flat: &FlatMap, config: &GridConfig) -> Self {
        let mut entries = Vec::with_capacity(flat.len());

        for (key, content) in flat {
            if config.is_metadata_key(key) {
                continue;
            }
            match CellKey::parse(key) {
                Some(cell) if cell.row < config.max_rows && cell.col < config.max_cols => {
                    entries.push((cell, content.as_str()));
                }
                Some(cell) => {
                    debug!(
                        "dropping {} beyond limits {}x{}",
                        cell, config.max_rows, config.max_cols
                    );
                }
                None => {
                    debug!("dropping malformed grid key {:?}", key);
                }
            }
        }

        if entries.is_empty() {
            return Self::with_config(config.fallback(), config);
        }

        let rows = entries.iter().map(|(k, _)| k.row).max().unwrap_or(0) + 1;
        let cols = entries.iter().map(|(k, _)| k.col).max().unwrap_or(0) + 1;

        let mut grid = Self::sized(rows, cols, config.limits());
        for (key, content) in entries {
            grid.cells[key.row][key.col] = content.to_string();
        }
        grid
    }

    /// Hydrate from a backend JSON payload.
    ///
    /// Non-string values (a numeric `formid`, nested objects) are treated like
    /// malformed keys and dropped.
    pub fn from_json(value: &serde_json::Value, config: &GridConfig) -> Result<Self, LoadError> {
        let object = value.as_object().ok_or(LoadError::NotAnObject)?;

        let mut flat = FlatMap::new();
        for (key, value) in object {
            match value.as_str() {
                Some(s) => {
                    flat.insert(key.clone(), s.to_string());
                }
                None => debug!("dropping non-text grid value at {:?}", key),
            }
        }

        Ok(Self::load_from(&flat, config))
    }

    /// Snapshot in flat keyed form. Every in-bounds cell is emitted, empty
    /// ones included, so the counts survive a reload unchanged.
    pub fn to_flat_map(&self) -> FlatMap {
        let mut flat = FlatMap::new();
        for (r, row) in self.cells.iter().enumerate() {
            for (c, content) in row.iter().enumerate() {
                flat.insert(CellKey::new(r, c).to_key(), content.clone());
            }
        }
        flat
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.cols
    }

    pub fn limits(&self) -> Dimensions {
        self.limits
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Content at `(row, col)`; empty string outside the grid.
    pub fn get(&self, row: usize, col: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Non-empty cells in row-major order.
    pub fn filled_cells(&self) -> impl Iterator<Item = (CellKey, &str)> {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, content)| !content.is_empty())
                .map(move |(c, content)| (CellKey::new(r, c), content.as_str()))
        })
    }

    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        content: impl Into<String>,
    ) -> Result<bool, GridError> {
        self.check(Axis::Row, row, self.rows)?;
        self.check(Axis::Column, col, self.cols)?;

        let content = content.into();
        let slot = &mut self.cells[row][col];
        if *slot == content {
            return Ok(false);
        }
        *slot = content;
        Ok(true)
    }

    /// Insert an empty row so that it becomes row `at`.
    ///
    /// `at == row_count()` appends, `at == 0` prepends. A grid already at
    /// its row limit is left untouched and `LimitReached` is returned.
    pub fn insert_row(&mut self, at: usize) -> Result<bool, GridError> {
        self.check(Axis::Row, at, self.rows + 1)?;
        if self.rows >= self.limits.rows {
            return Err(GridError::LimitReached {
                axis: Axis::Row,
                limit: self.limits.rows,
            });
        }

        self.cells.insert(at, vec![String::new(); self.cols]);
        self.rows += 1;
        Ok(true)
    }

    /// Remove row `at`, shifting later rows up. Removing the only row is a
    /// no-op and returns `Ok(false)`.
    pub fn delete_row(&mut self, at: usize) -> Result<bool, GridError> {
        self.check(Axis::Row, at, self.rows)?;

        if self.rows == 1 {
            debug!("refusing to delete the last row");
            return Ok(false);
        }
        self.cells.remove(at);
        self.rows -= 1;
        Ok(true)
    }

    pub fn insert_column(&mut self, at: usize) -> Result<bool, GridError> {
        self.check(Axis::Column, at, self.cols + 1)?;
        if self.cols >= self.limits.cols {
            return Err(GridError::LimitReached {
                axis: Axis::Column,
                limit: self.limits.cols,
            });
        }

        for row in self.cells.iter_mut() {
            row.insert(at, String::new());
        }
        self.cols += 1;
        Ok(true)
    }

    pub fn delete_column(&mut self, at: usize) -> Result<bool, GridError> {
        self.check(Axis::Column, at, self.cols)?;

        if self.cols == 1 {
            debug!("refusing to delete the last column");
            return Ok(false);
        }
        for row in self.cells.iter_mut() {
            row.remove(at);
        }
        self.cols -= 1;
        Ok(true)
    }

    /// Clamp a caller-generated row index into the valid insertion range.
    pub fn clamp_row(&self, index: usize) -> usize {
        index.min(self.rows)
    }

    pub fn clamp_column(&self, index: usize) -> usize {
        index.min(self.cols)
    }

    fn check(&self, axis: Axis, index: usize, bound: usize) -> Result<(), GridError> {
        if index < bound {
            Ok(())
        } else {
            Err(GridError::InvalidIndex { axis, index, bound })
        }
    }
}

impl Default for GridModel {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
