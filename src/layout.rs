//! Layout planning: asset ordering, grid partitioning, derived margins.
//!
//! Assets are ordered by the part of their file stem after the last
//! underscore. Digit-only keys compare as numbers (`_2` before `_10`) and
//! sort ahead of any non-numeric key; non-numeric keys compare as text.
//! The full file name breaks ties so the order is total.

use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{base_name, PosterConfig};
use crate::convert::has_extension;
use crate::error::{PosterError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Numeric(u128),
    Text(String),
}

impl SortKey {
    /// Key for a file name: text after the last `_` of the stem.
    pub fn from_file_name(file_name: &str) -> Self {
        let stem = match file_name.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem,
            _ => file_name,
        };
        let suffix = stem.rsplit('_').next().unwrap_or(stem);
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = suffix.parse() {
                return Self::Numeric(n);
            }
        }
        Self::Text(suffix.to_string())
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a.cmp(b),
            (Self::Numeric(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Numeric(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A staged asset destined for one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Path relative to the output directory, e.g. `figs/a_1.pdf`.
    pub path: PathBuf,
    pub key: SortKey,
}

impl AssetEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            key: SortKey::from_file_name(&file_name),
            path,
        }
    }

    fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }

    /// Path as written into templates; always `/`-separated.
    pub fn template_path(&self) -> String {
        self.path
            .iter()
            .map(|c| c.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Ord for AssetEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.file_name().cmp(&other.file_name()))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for AssetEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Row-major grid of assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPlan {
    rows: Vec<Vec<AssetEntry>>,
}

impl GridPlan {
    /// Partition already-sorted `assets` into `rows` rows of `columns` cells.
    ///
    /// The asset count must equal `rows * columns`.
    pub fn partition(assets: Vec<AssetEntry>, rows: usize, columns: usize) -> Result<Self> {
        let Some(required) = rows.checked_mul(columns) else {
            return Err(PosterError::InvalidConfig(format!(
                "grid of {rows}x{columns} cells is too large"
            )));
        };
        if assets.len() < required {
            return Err(PosterError::LayoutOutOfRange {
                required,
                available: assets.len(),
            });
        }
        if assets.len() > required {
            return Err(PosterError::LayoutMismatch {
                expected: required,
                found: assets.len(),
            });
        }

        let mut cells = assets.into_iter();
        let rows = (0..rows)
            .map(|_| cells.by_ref().take(columns).collect())
            .collect();
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Vec<AssetEntry>] {
        &self.rows
    }

    pub fn cells(&self) -> impl Iterator<Item = &AssetEntry> {
        self.rows.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The grid as template-ready relative paths.
    pub fn to_paths(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(AssetEntry::template_path).collect())
            .collect()
    }
}

/// List the `extension` files in `directory`, order them, and lay them out
/// on a `rows` x `columns` grid. Cell paths are prefixed with the
/// directory's base name so they resolve from the output root.
pub fn plan(directory: &Path, extension: &str, rows: usize, columns: usize) -> Result<GridPlan> {
    // template paths are written verbatim, so lossy names would point nowhere
    if directory.file_name().is_some_and(|n| n.to_str().is_none()) {
        return Err(PosterError::NonUtf8Path { path: directory.to_path_buf() });
    }
    let prefix = PathBuf::from(base_name(directory));
    let mut assets = vec![];
    for entry in fs::read_dir(directory).map_err(|e| PosterError::io(directory, e))? {
        let path = entry.map_err(|e| PosterError::io(directory, e))?.path();
        if !path.is_file() || !has_extension(&path, extension) {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        if name.to_str().is_none() {
            return Err(PosterError::NonUtf8Path { path });
        }
        assets.push(AssetEntry::new(prefix.join(name)));
    }
    assets.sort();
    debug!(
        directory = %directory.display(),
        assets = assets.len(),
        rows,
        columns,
        "planning grid"
    );
    GridPlan::partition(assets, rows, columns)
}

/// Derived numeric bindings plus every configuration field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutVariables {
    #[serde(flatten)]
    pub config: PosterConfig,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub text_width_scalar: f64,
}

/// Split the margins: width evenly left/right, height 1:2 top/bottom.
pub fn compute_layout_variables(config: &PosterConfig) -> Result<LayoutVariables> {
    check_margin("widthMargin", config.width_margin)?;
    check_margin("heightMargin", config.height_margin)?;
    if config.columns == 0 {
        return Err(PosterError::InvalidConfig("columns must be positive".into()));
    }

    let half_width = config.width_margin / 2.0;
    let top = config.height_margin / 3.0;
    Ok(LayoutVariables {
        config: config.clone(),
        left: half_width,
        right: half_width,
        top,
        bottom: 2.0 * config.height_margin / 3.0,
        text_width_scalar: 1.0 / config.columns as f64,
    })
}

fn check_margin(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PosterError::InvalidMargin { name, value })
    }
}
