//! PosterGrid - SVG Grid to LaTeX Poster Compiler
//!
//! # Pipeline
//! 1. Validate the configuration
//! 2. Stage input images and fonts into the output directory
//! 3. Convert SVG to PDF with an external converter
//! 4. Plan the grid and derive margins
//! 5. Expand `figures.tex` and `main.tex` from templates

pub mod config;
pub mod convert;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod pipeline;
pub mod process;
pub mod staging;
pub mod templates;
pub mod validation;

pub use config::PosterConfig;
pub use convert::{ConverterSpec, ImageConverter};
pub use error::{PosterError, Result};
pub use layout::{compute_layout_variables, plan, AssetEntry, GridPlan, LayoutVariables, SortKey};
pub use manifest::{canonical_json, compute_job_hash, RenderManifest};
pub use pipeline::{PipelineSettings, PipelineStage, PosterPipeline, RenderReport};
pub use process::{run, CommandLine, ProcessOutput, ProcessRunner, SystemRunner};
pub use staging::AssetStager;
pub use templates::TemplateRenderer;
pub use validation::{ValidationResult, ValidationRule, ValidationViolation, ViolationSeverity};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
