use log::{debug, info, warn};

use crate::cell::{Dimensions, FlatMap};
use crate::config::GridConfig;
use crate::grid::{GridError, GridModel, LoadError};
use crate::renderer::TableView;

/// Handle for one load started by [`GridSession::begin_load`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub table_id: String,
    generation: u64,
}

#[derive(Debug)]
pub enum LoadOutcome {
    /// The result belonged to the latest load and replaced the grid.
    Applied,
    /// A newer load started after this one; the result was discarded.
    Stale,
    /// The latest load failed. A reload of the table being edited keeps
    /// the grid as it was; otherwise the session falls back to a default grid.
    Failed(LoadError),
}

type Observer = Box<dyn FnMut(&FlatMap) + Send>;

/// Editing session for the grid of one mounted table.
///
/// The session is the single writer of its grid. Edits apply synchronously in
/// call order, and after every accepted edit (including ones that leave the
/// grid as it was) the observer receives the full flat snapshot. Rejected
/// edits do not notify. Persisting the snapshot is up to the observer.
pub struct GridSession {
    config: GridConfig,
    grid: Option<GridModel>,
    table_id: Option<String>,
    generation: u64,
    observer: Option<Observer>,
}

impl GridSession {
    pub fn new(config: GridConfig) -> Self {
        GridSession {
            config,
            grid: None,
            table_id: None,
            generation: 0,
            observer: None,
        }
    }

    pub fn on_change(&mut self, observer: impl FnMut(&FlatMap) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn grid(&self) -> Option<&GridModel> {
        self.grid.as_ref()
    }

    pub fn table_id(&self) -> Option<&str> {
        self.table_id.as_deref()
    }

    /// Start editing a fresh grid with no table id. No load is attempted and
    /// any load still in flight is invalidated.
    pub fn open_new(&mut self, rows: usize, cols: usize) {
        self.generation += 1;
        self.table_id = None;
        self.grid = Some(GridModel::with_config(
            Dimensions::new(rows, cols),
            &self.config,
        ));
    }

    /// Mark the start of a load for `table_id`. Results of earlier tickets
    /// will be discarded by [`finish_load`](Self::finish_load).
    pub fn begin_load(&mut self, table_id: impl Into<String>) -> LoadTicket {
        self.generation += 1;
        let table_id = table_id.into();
        debug!("load #{} started for table {}", self.generation, table_id);
        LoadTicket {
            table_id,
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply the result of a load, unless a newer load has started since.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<FlatMap, LoadError>,
    ) -> LoadOutcome {
        if !self.is_current(&ticket) {
            debug!(
                "discarding stale load #{} for table {}",
                ticket.generation, ticket.table_id
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(flat) => {
                let grid = GridModel::load_from(&flat, &self.config);
                info!(
                    "loaded table {} ({}x{})",
                    ticket.table_id,
                    grid.row_count(),
                    grid.column_count()
                );
                self.grid = Some(grid);
                self.table_id = Some(ticket.table_id);
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!("failed to load table {}: {}", ticket.table_id, e);
                let reloading = self.grid.is_some()
                    && self.table_id.as_deref() == Some(ticket.table_id.as_str());
                if !reloading {
                    self.grid = Some(GridModel::with_config(self.config.fallback(), &self.config));
                    self.table_id = Some(ticket.table_id);
                }
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Read-only view; empty when nothing has been loaded.
    pub fn view(&self) -> TableView {
        self.grid
            .as_ref()
            .map(TableView::from_grid)
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Option<FlatMap> {
        self.grid.as_ref().map(GridModel::to_flat_map)
    }

    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        content: impl Into<String>,
    ) -> Result<bool, GridError> {
        let content = content.into();
        self.edit(|grid| grid.set_cell(row, col, content))
    }

    pub fn insert_row(&mut self, at: usize) -> Result<bool, GridError> {
        self.edit(|grid| grid.insert_row(at))
    }

    pub fn delete_row(&mut self, at: usize) -> Result<bool, GridError> {
        self.edit(|grid| grid.delete_row(at))
    }

    pub fn insert_column(&mut self, at: usize) -> Result<bool, GridError> {
        self.edit(|grid| grid.insert_column(at))
    }

    pub fn delete_column(&mut self, at: usize) -> Result<bool, GridError> {
        self.edit(|grid| grid.delete_column(at))
    }

    fn edit<F>(&mut self, op: F) -> Result<bool, GridError>
    where
        F: FnOnce(&mut GridModel) -> Result<bool, GridError>,
    {
        let grid = self.grid.as_mut().ok_or(GridError::NoGrid)?;
        let changed = op(grid)?;
        if let Some(observer) = self.observer.as_mut() {
            observer(&grid.to_flat_map());
        }
        Ok(changed)
    }
}
