//! Poster Pipeline - Single Entry Point
//!
//! `render` always validates the configuration and checks for the converter
//! before anything is written. After that the stages run strictly in order;
//! the first failure aborts the run and leaves the output directory as-is.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::PosterConfig;
use crate::convert::{ConverterSpec, ImageConverter};
use crate::error::{PosterError, Result};
use crate::layout::{compute_layout_variables, plan, GridPlan, LayoutVariables};
use crate::manifest::{RenderManifest, MANIFEST_FILE};
use crate::process::{ProcessRunner, SystemRunner};
use crate::staging::AssetStager;
use crate::templates::{FigureBindings, MainBindings, TemplateRenderer, FIGURES_TEMPLATE, MAIN_TEMPLATE};
use crate::validation::{ValidationResult, Validator};

pub const DEFAULT_BASE_DIR: &str = "base";
pub const FONT_DIR: &str = "fonts";
pub const FIGURES_OUTPUT: &str = "figures.tex";
pub const MAIN_OUTPUT: &str = "main.tex";

/// Fixed locations and programs the pipeline depends on.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Holds the templates and the font directory.
    pub base_dir: PathBuf,
    pub font_dir_name: String,
    pub converter: ConverterSpec,
    pub write_manifest: bool,
}

impl PipelineSettings {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn font_root(&self) -> PathBuf {
        self.base_dir.join(&self.font_dir_name)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            font_dir_name: FONT_DIR.to_string(),
            converter: ConverterSpec::default(),
            write_manifest: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Staged,
    Converted,
    Planned,
    RenderedFigures,
    RenderedMain,
    Done,
    /// Terminal state after any failure.
    Aborted,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Staged => "staged",
            Self::Converted => "converted",
            Self::Planned => "planned",
            Self::RenderedFigures => "rendered(figures)",
            Self::RenderedMain => "rendered(main)",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub staged_dir: PathBuf,
    pub converted: Vec<PathBuf>,
    pub grid: GridPlan,
    pub variables: LayoutVariables,
    pub figures_path: PathBuf,
    pub main_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub validation: ValidationResult,
}

/// The poster pipeline - single entry point for a render
pub struct PosterPipeline {
    settings: PipelineSettings,
    validator: Validator,
    stager: AssetStager,
    converter: ImageConverter,
    renderer: TemplateRenderer,
    runner: Box<dyn ProcessRunner>,
}

impl PosterPipeline {
    pub fn new(settings: PipelineSettings, runner: Box<dyn ProcessRunner>) -> Self {
        Self {
            validator: Validator::new(&settings.converter.source_extension),
            stager: AssetStager::new(settings.font_root(), settings.font_dir_name.clone()),
            converter: ImageConverter::new(settings.converter.clone()),
            renderer: TemplateRenderer::new(&settings.base_dir),
            runner,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Validate a configuration without side effects.
    pub fn validate(&self, config: &PosterConfig) -> ValidationResult {
        self.validator.validate(config)
    }

    /// Run the whole pipeline.
    pub fn render(&self, config: &PosterConfig) -> Result<RenderReport> {
        self.run_tracked(config).1
    }

    /// Run the pipeline and report the state it finished in: `Done` on
    /// success, `Aborted` on any failure.
    fn run_tracked(&self, config: &PosterConfig) -> (PipelineStage, Result<RenderReport>) {
        let mut stage = PipelineStage::Idle;
        let result = self.run_stages(config, &mut stage);
        if let Err(e) = &result {
            error!(last_stage = %stage, error = %e, "pipeline aborted");
            advance(&mut stage, PipelineStage::Aborted);
        }
        (stage, result)
    }

    fn run_stages(&self, config: &PosterConfig, stage: &mut PipelineStage) -> Result<RenderReport> {
        // MANDATORY: nothing is written unless validation passes.
        let validation = self.validate(config);
        if !validation.valid {
            return Err(PosterError::InvalidConfig(validation.error_summary()));
        }
        for warning in &validation.violations {
            warn!(rule = %warning.rule, "{}", warning.message);
        }
        let variables = compute_layout_variables(config)?;
        self.converter.ensure_available(self.runner.as_ref())?;

        let output = config.output.as_path();

        let staged_dir = self.stager.stage(&config.input, output)?;
        advance(stage, PipelineStage::Staged);

        let converted = self.converter.convert_all(&staged_dir, self.runner.as_ref())?;
        advance(stage, PipelineStage::Converted);

        let grid = plan(
            &staged_dir,
            &self.settings.converter.target_extension,
            config.rows,
            config.columns,
        )?;
        advance(stage, PipelineStage::Planned);

        let figures_path = output.join(FIGURES_OUTPUT);
        self.renderer
            .render(FIGURES_TEMPLATE, &FigureBindings::new(&variables, &grid), &figures_path)?;
        advance(stage, PipelineStage::RenderedFigures);

        let main_path = output.join(MAIN_OUTPUT);
        self.renderer
            .render(MAIN_TEMPLATE, &MainBindings::new(&variables), &main_path)?;
        advance(stage, PipelineStage::RenderedMain);

        let manifest_path = if self.settings.write_manifest {
            Some(self.write_manifest(config, &grid, output)?)
        } else {
            None
        };
        advance(stage, PipelineStage::Done);

        Ok(RenderReport {
            staged_dir,
            converted,
            grid,
            variables,
            figures_path,
            main_path,
            manifest_path,
            validation,
        })
    }

    fn write_manifest(&self, config: &PosterConfig, grid: &GridPlan, output: &Path) -> Result<PathBuf> {
        let mut manifest = RenderManifest::new(config, grid)?;
        manifest.record_artifact(output, FIGURES_OUTPUT)?;
        manifest.record_artifact(output, MAIN_OUTPUT)?;
        let path = manifest.write(output)?;
        info!(manifest = MANIFEST_FILE, job_hash = %manifest.job_hash, "wrote manifest");
        Ok(path)
    }
}

impl Default for PosterPipeline {
    fn default() -> Self {
        Self::new(PipelineSettings::default(), Box::new(SystemRunner))
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    info!(from = %stage, to = %next, "pipeline stage");
    *stage = next;
}
