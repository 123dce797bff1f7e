use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::cell::Dimensions;

pub const DEFAULT_MAX_ROWS: usize = 1000;
pub const DEFAULT_MAX_COLS: usize = 256;

/// Settings that shape how grids are hydrated and printed.
///
/// Every field has a default, so a config file only needs the values it
/// overrides:
///
/// ```
/// use formgrid::config::GridConfig;
///
/// let config: GridConfig = serde_json::from_str(r#"{ "fallback_rows": 3 }"#).unwrap();
/// assert_eq!(config.fallback_rows, 3);
/// assert_eq!(config.fallback_cols, 2);
/// ```
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Rows used when a load yields no usable cell keys.
    pub fallback_rows: usize,

    /// Columns used when a load yields no usable cell keys.
    pub fallback_cols: usize,

    /// Row limit. Keys beyond it are dropped on load and grids refuse to
    /// grow past it.
    pub max_rows: usize,

    /// Column limit, same rules as `max_rows`.
    pub max_cols: usize,

    /// Sibling identifier fields sent alongside the cells (e.g. `formid`).
    pub metadata_keys: Vec<String>,

    /// Styling applied by the rich-text transform.
    pub print: PrintStyle,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            fallback_rows: 2,
            fallback_cols: 2,
            max_rows: DEFAULT_MAX_ROWS,
            max_cols: DEFAULT_MAX_COLS,
            metadata_keys: vec!["formid".to_string(), "tableid".to_string()],
            print: PrintStyle::default(),
        }
    }
}

impl GridConfig {
    /// Fallback dimensions, floored at 1x1.
    pub fn fallback(&self) -> Dimensions {
        Dimensions::new(self.fallback_rows, self.fallback_cols)
    }

    /// Size limits, floored at 1x1.
    pub fn limits(&self) -> Dimensions {
        Dimensions::new(self.max_rows, self.max_cols)
    }

    pub fn is_metadata_key(&self, key: &str) -> bool {
        self.metadata_keys.iter().any(|k| k == key)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct PrintStyle {
    pub font_size_px: u32,
}

impl Default for PrintStyle {
    fn default() -> Self {
        PrintStyle { font_size_px: 10 }
    }
}

/// Settings for the web service binary.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub data_dir: String,
    pub grid: GridConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1:3000".to_string(),
            data_dir: "grids".to_string(),
            grid: GridConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        let config: ServerConfig = serde_json::from_str(&text)?;
        Ok(config)
    }
}
