//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured violations.
//! The pipeline refuses to touch the output directory while any
//! error-severity violation remains.

use serde::{Deserialize, Serialize};
use std::fs;

use crate::config::PosterConfig;
use crate::convert::has_extension;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn from_violations(violations: Vec<ValidationViolation>) -> Self {
        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        Self { valid, violations }
    }

    pub fn has_errors(&self) -> bool {
        !self.valid
    }

    /// One line per error, as used in `PosterError::InvalidConfig`.
    pub fn error_summary(&self) -> String {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Error)
            .map(|v| format!("{}: {}", v.rule, v.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, config: &PosterConfig) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct GridShapeRule;

impl ValidationRule for GridShapeRule {
    fn name(&self) -> &'static str { "grid_shape" }

    fn validate(&self, config: &PosterConfig) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        for (field, value) in [("rows", config.rows), ("columns", config.columns)] {
            if value == 0 {
                violations.push(ValidationViolation {
                    rule: self.name().to_string(),
                    severity: ViolationSeverity::Error,
                    message: format!("{} must be a positive integer", field),
                    expected: Some(">= 1".to_string()),
                    actual: Some(value.to_string()),
                    remediation: vec![format!("Pass --{} 1 or more", field)],
                });
            }
        }
        if config.cell_count().is_none() {
            violations.push(ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: "rows x columns overflows".to_string(),
                expected: Some(format!("<= {}", usize::MAX)),
                actual: Some(format!("{} x {}", config.rows, config.columns)),
                remediation: vec!["Use a grid that matches the number of input images".to_string()],
            });
        }
        violations
    }
}

pub struct MarginRule;

impl ValidationRule for MarginRule {
    fn name(&self) -> &'static str { "margins" }

    fn validate(&self, config: &PosterConfig) -> Vec<ValidationViolation> {
        [("widthMargin", config.width_margin), ("heightMargin", config.height_margin)]
            .into_iter()
            .filter(|(_, value)| !(value.is_finite() && *value >= 0.0))
            .map(|(field, value)| ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: format!("{} must be a finite, non-negative number", field),
                expected: Some(">= 0".to_string()),
                actual: Some(value.to_string()),
                remediation: vec!["Use a margin of 0 or more".to_string()],
            })
            .collect()
    }
}

pub struct InputDirectoryRule;

impl ValidationRule for InputDirectoryRule {
    fn name(&self) -> &'static str { "input_directory" }

    fn validate(&self, config: &PosterConfig) -> Vec<ValidationViolation> {
        if config.input.is_dir() {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            message: format!("Input directory '{}' does not exist", config.input.display()),
            expected: Some("readable directory".to_string()),
            actual: None,
            remediation: vec!["Check the --input path".to_string()],
        }]
    }
}

/// Checks that the input holds exactly one image per grid cell.
pub struct AssetCountRule {
    pub extension: String,
}

impl ValidationRule for AssetCountRule {
    fn name(&self) -> &'static str { "asset_count" }

    fn validate(&self, config: &PosterConfig) -> Vec<ValidationViolation> {
        // reported by InputDirectoryRule
        let Ok(entries) = fs::read_dir(&config.input) else {
            return vec![];
        };
        let found = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_extension(p, &self.extension))
            .count();
        // reported by GridShapeRule
        let Some(expected) = config.cell_count() else {
            return vec![];
        };
        if found == expected {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            message: format!(
                "Grid of {}x{} needs {} .{} files",
                config.rows, config.columns, expected, self.extension
            ),
            expected: Some(expected.to_string()),
            actual: Some(found.to_string()),
            remediation: vec![
                "Adjust --rows/--columns".to_string(),
                format!("Add or remove .{} files in the input directory", self.extension),
            ],
        }]
    }
}

pub struct OutputDirectoryRule;

impl ValidationRule for OutputDirectoryRule {
    fn name(&self) -> &'static str { "output_directory" }

    fn validate(&self, config: &PosterConfig) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        if config.output.exists() && !config.output.is_dir() {
            violations.push(ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: format!("Output path '{}' is not a directory", config.output.display()),
                expected: Some("directory or missing path".to_string()),
                actual: Some("file".to_string()),
                remediation: vec!["Choose a different --output".to_string()],
            });
        } else if config.output.join("main.tex").exists() {
            violations.push(ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Warning,
                message: "Output directory already holds a rendered poster".to_string(),
                expected: None,
                actual: None,
                remediation: vec!["Existing files will be overwritten".to_string()],
            });
        }
        violations
    }
}

/// Validator orchestrates rules
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new(source_extension: &str) -> Self {
        Self {
            rules: vec![
                Box::new(GridShapeRule),
                Box::new(MarginRule),
                Box::new(InputDirectoryRule),
                Box::new(AssetCountRule { extension: source_extension.to_string() }),
                Box::new(OutputDirectoryRule),
            ],
        }
    }

    pub fn validate(&self, config: &PosterConfig) -> ValidationResult {
        let violations = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(config))
            .collect();
        ValidationResult::from_violations(violations)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new("svg")
    }
}
