//! Pipeline Invariant Tests
//!
//! End-to-end runs against a fake converter that writes the PDFs inkscape
//! would have produced.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use postergrid::{
    manifest::RenderManifest, CommandLine, PipelineSettings, PosterConfig, PosterError,
    PosterPipeline, ProcessOutput, ProcessRunner,
};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct FakeConverter {
    calls: Arc<Mutex<Vec<CommandLine>>>,
    installed: bool,
    exit_code: i32,
}

impl FakeConverter {
    fn installed() -> Self {
        Self { installed: true, ..Default::default() }
    }

    fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeConverter {
    fn execute(&self, command: &CommandLine) -> std::io::Result<ProcessOutput> {
        self.calls.lock().unwrap().push(command.clone());
        if self.exit_code != 0 {
            return Ok(ProcessOutput {
                code: Some(self.exit_code),
                stdout: String::new(),
                stderr: "** (inkscape): CRITICAL **: cannot open display".into(),
            });
        }
        let target = command.flag_value("--export-filename").expect("export filename");
        fs::write(target, "%PDF-1.5\n")?;
        Ok(ProcessOutput { code: Some(0), stdout: "exported\n".into(), stderr: String::new() })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.installed.then(|| PathBuf::from("/usr/bin").join(program))
    }
}

struct Workspace {
    tmp: TempDir,
}

impl Workspace {
    fn new(svgs: &[&str]) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("figs");
        fs::create_dir_all(&input).unwrap();
        for name in svgs {
            fs::write(input.join(name), "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();
        }
        Self { tmp }
    }

    fn input(&self) -> PathBuf {
        self.tmp.path().join("figs")
    }

    fn output(&self) -> PathBuf {
        self.tmp.path().join("out")
    }

    fn config(&self, rows: usize, columns: usize) -> PosterConfig {
        PosterConfig::new(self.output(), self.input(), rows, columns)
    }
}

fn repo_base_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("base")
}

fn pipeline(runner: FakeConverter) -> PosterPipeline {
    PosterPipeline::new(PipelineSettings::with_base_dir(repo_base_dir()), Box::new(runner))
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn invariant_two_by_two_grid_end_to_end() {
    let ws = Workspace::new(&["b_4.svg", "a_1.svg", "b_3.svg", "a_2.svg"]);
    let runner = FakeConverter::installed();

    let report = pipeline(runner.clone()).render(&ws.config(2, 2)).unwrap();

    assert_eq!(
        report.grid.to_paths(),
        vec![
            vec!["figs/a_1.pdf".to_string(), "figs/a_2.pdf".to_string()],
            vec!["figs/b_3.pdf".to_string(), "figs/b_4.pdf".to_string()],
        ]
    );
    assert_eq!(runner.calls().len(), 4);
    assert_eq!(list(&ws.output().join("figs")), ["a_1.pdf", "a_2.pdf", "b_3.pdf", "b_4.pdf"]);

    let figures = fs::read_to_string(ws.output().join("figures.tex")).unwrap();
    assert!(figures.contains("{figs/a_1.pdf}"));
    assert!(figures.contains("{0.5\\textwidth}"));
    let first = figures.find("a_1.pdf").unwrap();
    let last = figures.find("b_4.pdf").unwrap();
    assert!(first < last);

    let main = fs::read_to_string(ws.output().join("main.tex")).unwrap();
    assert!(main.contains("left=10.0mm"));
    assert!(main.contains("top=10.0mm"));
    assert!(main.contains("bottom=20.0mm"));
    assert!(main.contains("\\rfoot{\\#001}"));
}

#[test]
fn invariant_converter_invoked_with_export_arguments() {
    let ws = Workspace::new(&["a_1.svg"]);
    let runner = FakeConverter::installed();

    pipeline(runner.clone()).render(&ws.config(1, 1)).unwrap();

    let calls = runner.calls();
    assert_eq!(calls[0].program, "inkscape");
    let args: Vec<_> = calls[0].args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
    assert!(args.contains(&"--batch-process".to_string()));
    assert!(args.contains(&"--export-type=pdf".to_string()));
    assert_eq!(
        calls[0].flag_value("--export-filename").map(PathBuf::from),
        Some(ws.output().join("figs").join("a_1.pdf"))
    );
}

#[test]
fn invariant_missing_converter_touches_nothing() {
    let ws = Workspace::new(&["a_1.svg", "a_2.svg"]);
    let runner = FakeConverter::default();

    let err = pipeline(runner.clone()).render(&ws.config(1, 2)).unwrap_err();

    assert!(matches!(err, PosterError::MissingExecutable { .. }));
    assert!(!ws.output().exists());
    assert!(runner.calls().is_empty());
}

#[test]
fn invariant_subprocess_failure_aborts_before_templates() {
    let ws = Workspace::new(&["a_1.svg", "a_2.svg"]);
    let runner = FakeConverter { exit_code: 1, ..FakeConverter::installed() };

    let err = pipeline(runner.clone()).render(&ws.config(1, 2)).unwrap_err();

    match err {
        PosterError::SubprocessFailed { code, stderr, .. } => {
            assert_eq!(code, Some(1));
            assert!(stderr.contains("cannot open display"));
        }
        other => panic!("expected SubprocessFailed, got {other:?}"),
    }
    assert_eq!(runner.calls().len(), 1);
    assert!(!ws.output().join("figures.tex").exists());
    assert!(!ws.output().join("main.tex").exists());
}

#[test]
fn invariant_count_mismatch_rejected_before_writing() {
    let ws = Workspace::new(&["a_1.svg", "a_2.svg", "a_3.svg"]);
    let runner = FakeConverter::installed();

    let err = pipeline(runner.clone()).render(&ws.config(2, 2)).unwrap_err();

    assert!(matches!(err, PosterError::InvalidConfig(ref msg) if msg.contains("asset_count")));
    assert!(!ws.output().exists());
}

#[test]
fn invariant_stale_output_fails_layout_not_truncates() {
    let ws = Workspace::new(&["a_1.svg", "a_2.svg"]);
    let staged = ws.output().join("figs");
    fs::create_dir_all(&staged).unwrap();
    fs::write(staged.join("old_9.pdf"), "%PDF").unwrap();

    let err = pipeline(FakeConverter::installed()).render(&ws.config(1, 2)).unwrap_err();

    assert!(matches!(err, PosterError::LayoutMismatch { expected: 2, found: 3 }));
    assert!(!ws.output().join("figures.tex").exists());
}

#[test]
fn invariant_rerun_is_idempotent() {
    let ws = Workspace::new(&["a_1.svg", "a_2.svg"]);
    let p = pipeline(FakeConverter::installed());

    p.render(&ws.config(1, 2)).unwrap();
    let staged_first = list(&ws.output().join("figs"));
    let fonts_first = list(&ws.output().join("fonts"));
    let figures_first = fs::read_to_string(ws.output().join("figures.tex")).unwrap();

    p.render(&ws.config(1, 2)).unwrap();

    assert_eq!(list(&ws.output().join("figs")), staged_first);
    assert_eq!(list(&ws.output().join("fonts")), fonts_first);
    assert_eq!(fs::read_to_string(ws.output().join("figures.tex")).unwrap(), figures_first);
}

#[test]
fn invariant_fonts_staged() {
    let ws = Workspace::new(&["a_1.svg"]);

    pipeline(FakeConverter::installed()).render(&ws.config(1, 1)).unwrap();

    assert!(ws.output().join("fonts").join("roboto").is_dir());
    assert!(!ws.output().join("fonts").join("README.md").exists());
}

#[test]
fn invariant_manifest_records_artifacts() {
    let ws = Workspace::new(&["a_1.svg", "a_2.svg"]);

    let report = pipeline(FakeConverter::installed()).render(&ws.config(2, 1)).unwrap();

    let path = report.manifest_path.expect("manifest written");
    let manifest: RenderManifest = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    let recorded: Vec<_> = manifest.artifacts.iter().map(|a| a.path.clone()).collect();
    assert_eq!(recorded, [PathBuf::from("figures.tex"), PathBuf::from("main.tex")]);
    assert_eq!(manifest.grid, vec![vec!["figs/a_1.pdf".to_string()], vec!["figs/a_2.pdf".to_string()]]);
    assert_eq!(manifest.engine_version, postergrid::ENGINE_VERSION);
}

#[test]
fn invariant_unresolved_template_variable_is_fatal() {
    let ws = Workspace::new(&["a_1.svg"]);
    let base = ws.tmp.path().join("base");
    fs::create_dir_all(base.join("fonts")).unwrap();
    fs::write(base.join("figures.tex.jinja"), "{{ files }}").unwrap();
    fs::write(base.join("main.tex.jinja"), "{{ no_such_binding }}").unwrap();
    let p = PosterPipeline::new(
        PipelineSettings::with_base_dir(&base),
        Box::new(FakeConverter::installed()),
    );

    let err = p.render(&ws.config(1, 1)).unwrap_err();

    assert!(matches!(err, PosterError::Template(_)));
    assert!(ws.output().join("figures.tex").exists());
    assert!(!ws.output().join("main.tex").exists());
}

#[test]
fn invariant_numeric_suffixes_order_numerically() {
    let ws = Workspace::new(&["run_10.svg", "run_2.svg", "run_1.svg"]);

    let report = pipeline(FakeConverter::installed()).render(&ws.config(1, 3)).unwrap();

    assert_eq!(
        report.grid.to_paths(),
        vec![vec![
            "figs/run_1.pdf".to_string(),
            "figs/run_2.pdf".to_string(),
            "figs/run_10.pdf".to_string(),
        ]]
    );
}
