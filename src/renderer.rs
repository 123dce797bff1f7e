use serde::{Deserialize, Serialize};

use crate::config::PrintStyle;
use crate::grid::GridModel;
use crate::richtext::{Target, transform_rich_text};

/// Read-only head/body split of a grid. Row 0 is the head.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct TableView {
    pub head: Vec<String>,
    pub body: Vec<Vec<String>>,
}

impl TableView {
    pub fn from_grid(grid: &GridModel) -> Self {
        TableView {
            head: render_head(grid),
            body: render_body(grid),
        }
    }

    /// Total rows including the head. Zero for a view with nothing loaded.
    pub fn row_count(&self) -> usize {
        if self.head.is_empty() && self.body.is_empty() {
            0
        } else {
            1 + self.body.len()
        }
    }

    pub fn column_count(&self) -> usize {
        self.head.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// Contents of row 0, one entry per column.
pub fn render_head(grid: &GridModel) -> Vec<String> {
    (0..grid.column_count())
        .map(|c| grid.get(0, c).to_string())
        .collect()
}

/// Contents of rows `1..row_count`, one inner vector per row.
pub fn render_body(grid: &GridModel) -> Vec<Vec<String>> {
    (1..grid.row_count())
        .map(|r| {
            (0..grid.column_count())
                .map(|c| grid.get(r, c).to_string())
                .collect()
        })
        .collect()
}

/// Serialize a view as a table using only `table`, `tr`, `th`, `td` plus the
/// transformed cell markup.
pub fn view_to_markup(view: &TableView, target: Target, style: &PrintStyle) -> String {
    let mut out = String::from("<table>");

    if !view.head.is_empty() {
        out.push_str("<tr>");
        for cell in &view.head {
            out.push_str("<th>");
            out.push_str(&transform_rich_text(cell, target, style));
            out.push_str("</th>");
        }
        out.push_str("</tr>");
    }

    for row in &view.body {
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            out.push_str(&transform_rich_text(cell, target, style));
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }

    out.push_str("</table>");
    out
}

/// Table markup for the print/PDF pipeline.
pub fn to_static_markup(grid: &GridModel, style: &PrintStyle) -> String {
    view_to_markup(&TableView::from_grid(grid), Target::Print, style)
}

/// Table markup for the interactive preview.
pub fn to_display_markup(view: &TableView, style: &PrintStyle) -> String {
    view_to_markup(view, Target::Display, style)
}
