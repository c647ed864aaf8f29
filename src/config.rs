//! Poster Configuration - Validated Once at the Boundary

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_WIDTH_MARGIN: f64 = 20.0;
pub const DEFAULT_HEIGHT_MARGIN: f64 = 30.0;
pub const DEFAULT_LEFT_FOOTER: &str = "Nicklas Sindlev Andersen \\\\ \\today";
pub const DEFAULT_RIGHT_FOOTER: &str = "\\#001";

/// Layout configuration for a single poster run.
///
/// Field names serialize under the same names the templates bind
/// (`widthMargin`, `lfooter`, ...), so the record passes straight through
/// into template bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterConfig {
    pub output: PathBuf,
    pub input: PathBuf,
    pub rows: usize,
    pub columns: usize,
    #[serde(default = "default_width_margin")]
    pub width_margin: f64,
    #[serde(default = "default_height_margin")]
    pub height_margin: f64,
    #[serde(default = "default_left_footer", rename = "lfooter")]
    pub left_footer: String,
    #[serde(default = "default_right_footer", rename = "rfooter")]
    pub right_footer: String,
}

fn default_width_margin() -> f64 { DEFAULT_WIDTH_MARGIN }
fn default_height_margin() -> f64 { DEFAULT_HEIGHT_MARGIN }
fn default_left_footer() -> String { DEFAULT_LEFT_FOOTER.to_string() }
fn default_right_footer() -> String { DEFAULT_RIGHT_FOOTER.to_string() }

impl PosterConfig {
    /// Configuration with the required fields set and every optional field
    /// at its default.
    pub fn new(
        output: impl Into<PathBuf>,
        input: impl Into<PathBuf>,
        rows: usize,
        columns: usize,
    ) -> Self {
        Self {
            output: output.into(),
            input: input.into(),
            rows,
            columns,
            width_margin: DEFAULT_WIDTH_MARGIN,
            height_margin: DEFAULT_HEIGHT_MARGIN,
            left_footer: DEFAULT_LEFT_FOOTER.to_string(),
            right_footer: DEFAULT_RIGHT_FOOTER.to_string(),
        }
    }

    pub fn with_margins(mut self, width_margin: f64, height_margin: f64) -> Self {
        self.width_margin = width_margin;
        self.height_margin = height_margin;
        self
    }

    pub fn with_footers(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_footer = left.into();
        self.right_footer = right.into();
        self
    }

    /// Number of grid cells, i.e. the number of assets the input must provide.
    /// `None` when `rows * columns` does not fit in a `usize`.
    pub fn cell_count(&self) -> Option<usize> {
        self.rows.checked_mul(self.columns)
    }

    /// Name of the directory the input is staged under inside the output.
    pub fn staged_dir_name(&self) -> String {
        base_name(&self.input)
    }
}

/// Final path component, falling back to the whole path for inputs like `.`.
pub(crate) fn base_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
