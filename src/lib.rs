/*!
# formgrid

Editable report tables for a clinic-management front-end, built in Rust.

## Overview

Lab reports and clinic forms embed free-form tables: a grid of rich-text
cells that staff can grow and shrink one row or column at a time. The backend
stores each table as a flat JSON object of `"cell-{row}-{col}"` keys (plus the
occasional `formid`). This crate owns everything between that payload and the
screen or the PDF page.

## Architecture

### Grid model
- **cell**: `CellKey` and the `cell-{row}-{col}` key codec
- **grid**: `GridModel`, a dense row-major container with insert/delete of
  rows and columns at any index

### Rendering
- **renderer**: head/body split (`TableView`) and table markup for preview and print
- **richtext**: parse tree of the restricted editor markup and the styling transform

### Editing and persistence
- **session**: single-writer editing session, change observer, stale-load guard
- **saving**: gzip-compressed bincode store keyed by table id
- **config**: fallback sizes, limits, metadata keys, print styling

### Web layer (feature `web`)
- **app**: axum routes to fetch, persist, edit and print a table

## REST API Endpoints

- `GET /api/grid/{id}` - Fetch the flat map
- `PUT /api/grid/{id}` - Replace the flat map
- `POST /api/grid/{id}/edit` - Apply one structural edit or cell update
- `GET /api/grid/{id}/report` - Print-ready table markup

## Example

```
use formgrid::grid::GridModel;
use formgrid::renderer::{render_body, render_head};

let mut grid = GridModel::new(1, 1);
grid.insert_column(1).unwrap();
grid.set_cell(0, 0, "Name").unwrap();
grid.set_cell(0, 1, "Age").unwrap();
grid.insert_row(1).unwrap();
grid.set_cell(1, 0, "Bob").unwrap();

assert_eq!(render_head(&grid), vec!["Name", "Age"]);
assert_eq!(render_body(&grid), vec![vec!["Bob".to_string(), String::new()]]);
```
*/

pub mod cell;
pub mod config;
pub mod grid;
pub mod renderer;
pub mod richtext;
pub mod saving;
pub mod session;

#[cfg(feature = "web")]
pub mod app;

/// Re-export the common types to make them easier to use
pub use cell::*;
pub use config::*;
pub use grid::*;
pub use renderer::*;
pub use richtext::{Node, Target, transform_rich_text};
pub use saving::*;
pub use session::*;
