//! Template System - Load, Bind, Write

use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PosterConfig;
use crate::error::{PosterError, Result};
use crate::layout::{GridPlan, LayoutVariables};

pub const FIGURES_TEMPLATE: &str = "figures.tex.jinja";
pub const MAIN_TEMPLATE: &str = "main.tex.jinja";

/// Bindings for the figure-grid template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureBindings<'a> {
    #[serde(flatten)]
    pub config: &'a PosterConfig,
    pub text_width_scalar: f64,
    pub files: Vec<Vec<String>>,
}

impl<'a> FigureBindings<'a> {
    pub fn new(vars: &'a LayoutVariables, grid: &GridPlan) -> Self {
        Self {
            config: &vars.config,
            text_width_scalar: vars.text_width_scalar,
            files: grid.to_paths(),
        }
    }
}

/// Bindings for the main document template.
#[derive(Debug, Clone, Serialize)]
pub struct MainBindings<'a> {
    #[serde(flatten)]
    pub config: &'a PosterConfig,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl<'a> MainBindings<'a> {
    pub fn new(vars: &'a LayoutVariables) -> Self {
        Self {
            config: &vars.config,
            left: vars.left,
            right: vars.right,
            top: vars.top,
            bottom: vars.bottom,
        }
    }
}

/// Expands templates found under a fixed root directory.
pub struct TemplateRenderer {
    root: PathBuf,
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(&root));
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        Self { root, env }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Expand `name` against `bindings` without writing anything.
    pub fn render_to_string<B: Serialize>(&self, name: &str, bindings: &B) -> Result<String> {
        let template = self.env.get_template(name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => PosterError::TemplateNotFound(name.to_string()),
            _ => PosterError::Template(e),
        })?;
        Ok(template.render(bindings)?)
    }

    /// Expand `name` and write the result to `destination`, creating parent
    /// directories and replacing any previous file.
    pub fn render<B: Serialize>(&self, name: &str, bindings: &B, destination: &Path) -> Result<()> {
        let rendered = self.render_to_string(name, bindings)?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PosterError::io(parent, e))?;
        }
        fs::write(destination, rendered).map_err(|e| PosterError::io(destination, e))?;

        info!(template = name, destination = %destination.display(), "rendered template");
        Ok(())
    }
}
