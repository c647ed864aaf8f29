//! SVG → PDF conversion through an external converter.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{PosterError, Result};
use crate::process::{run, CommandLine, ProcessRunner};

/// Which program converts what into what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterSpec {
    pub program: String,
    pub source_extension: String,
    pub target_extension: String,
}

impl Default for ConverterSpec {
    fn default() -> Self {
        Self {
            program: "inkscape".to_string(),
            source_extension: "svg".to_string(),
            target_extension: "pdf".to_string(),
        }
    }
}

pub struct ImageConverter {
    spec: ConverterSpec,
}

impl ImageConverter {
    pub fn new(spec: ConverterSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ConverterSpec {
        &self.spec
    }

    /// Fail with `MissingExecutable` unless the converter is on the search path.
    pub fn ensure_available(&self, runner: &dyn ProcessRunner) -> Result<()> {
        match runner.locate(&self.spec.program) {
            Some(path) => {
                debug!(program = %self.spec.program, path = %path.display(), "converter found");
                Ok(())
            }
            None => Err(PosterError::MissingExecutable {
                program: self.spec.program.clone(),
            }),
        }
    }

    /// The invocation that converts `source` into `target`.
    pub fn command_for(&self, source: &Path, target: &Path) -> CommandLine {
        let mut export_filename = std::ffi::OsString::from("--export-filename=");
        export_filename.push(target.as_os_str());

        CommandLine::new(&self.spec.program)
            .arg(source.as_os_str())
            .arg("--batch-process")
            .arg(format!("--export-type={}", self.spec.target_extension))
            .arg(export_filename)
    }

    /// Convert every source-format file directly inside `directory`, then
    /// delete the originals. Any failed conversion aborts before deletion.
    ///
    /// Returns the converted file paths.
    pub fn convert_all(&self, directory: &Path, runner: &dyn ProcessRunner) -> Result<Vec<PathBuf>> {
        self.ensure_available(runner)?;

        let sources = self.source_files(directory)?;
        let mut converted = Vec::with_capacity(sources.len());

        for source in &sources {
            let target = source.with_extension(&self.spec.target_extension);
            run(runner, &self.command_for(source, &target))?;
            converted.push(target);
        }

        for source in &sources {
            fs::remove_file(source).map_err(|e| PosterError::io(source, e))?;
        }

        info!(
            directory = %directory.display(),
            converted = converted.len(),
            "converted {} files to {}",
            self.spec.source_extension,
            self.spec.target_extension
        );
        Ok(converted)
    }

    fn source_files(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let mut files = vec![];
        for entry in fs::read_dir(directory).map_err(|e| PosterError::io(directory, e))? {
            let path = entry.map_err(|e| PosterError::io(directory, e))?.path();
            if path.is_file() && has_extension(&path, &self.spec.source_extension) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Default for ImageConverter {
    fn default() -> Self {
        Self::new(ConverterSpec::default())
    }
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().map_or(false, |e| e == extension)
}
