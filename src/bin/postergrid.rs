//! PosterGrid CLI
//!
//! Commands: render, validate, layout
//! `validate` and `layout` print JSON to stdout.
//! Returns non-zero on failure, 2 when validation fails.

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use postergrid::{
    compute_layout_variables,
    config::{DEFAULT_HEIGHT_MARGIN, DEFAULT_LEFT_FOOTER, DEFAULT_RIGHT_FOOTER, DEFAULT_WIDTH_MARGIN},
    pipeline::DEFAULT_BASE_DIR,
    PipelineSettings, PosterConfig, PosterPipeline, SystemRunner,
};

#[derive(Parser)]
#[command(name = "postergrid", version)]
#[command(about = "Arrange a grid of SVG images into a printable LaTeX poster")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the templates and the fonts/ directory
    #[arg(short, long, default_value = DEFAULT_BASE_DIR, global = true)]
    base_dir: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage, convert and render the poster sources
    Render(PosterArgs),

    /// Check the configuration and input without writing anything
    Validate(PosterArgs),

    /// Print the derived layout variables
    Layout(PosterArgs),
}

#[derive(Args, Clone)]
struct PosterArgs {
    /// Path to an OUTPUT directory
    #[arg(long)]
    output: PathBuf,

    /// Path to an INPUT directory containing .svg files
    #[arg(long)]
    input: PathBuf,

    /// How many rows the .svg images are arranged in
    #[arg(long)]
    rows: usize,

    /// How many columns the .svg images are arranged in
    #[arg(long)]
    columns: usize,

    /// Total WIDTH MARGIN of the document
    #[arg(long, alias = "widthMargin", default_value_t = DEFAULT_WIDTH_MARGIN)]
    width_margin: f64,

    /// Total HEIGHT MARGIN of the document
    #[arg(long, alias = "heightMargin", default_value_t = DEFAULT_HEIGHT_MARGIN)]
    height_margin: f64,

    /// LEFT FOOTER content
    #[arg(long, default_value = DEFAULT_LEFT_FOOTER)]
    lfooter: String,

    /// RIGHT FOOTER content
    #[arg(long, default_value = DEFAULT_RIGHT_FOOTER)]
    rfooter: String,
}

impl From<PosterArgs> for PosterConfig {
    fn from(args: PosterArgs) -> Self {
        PosterConfig::new(args.output, args.input, args.rows, args.columns)
            .with_margins(args.width_margin, args.height_margin)
            .with_footers(args.lfooter, args.rfooter)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let pipeline = PosterPipeline::new(
        PipelineSettings::with_base_dir(&cli.base_dir),
        Box::new(SystemRunner),
    );

    match cli.command {
        Commands::Render(args) => match render(&pipeline, args.into()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },

        Commands::Validate(args) => {
            let result = pipeline.validate(&args.into());
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    return ExitCode::FAILURE;
                }
            }
            if result.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2) // Validation failure
            }
        }

        Commands::Layout(args) => {
            let output = compute_layout_variables(&args.into())
                .map_err(anyhow::Error::from)
                .and_then(|vars| Ok(serde_json::to_string_pretty(&vars)?));
            match output {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn render(pipeline: &PosterPipeline, config: PosterConfig) -> anyhow::Result<()> {
    let report = pipeline
        .render(&config)
        .with_context(|| format!("Failed to render poster into {}", config.output.display()))?;

    println!("  Figures:  {}", report.figures_path.display());
    println!("  Main:     {}", report.main_path.display());
    if let Some(manifest) = &report.manifest_path {
        println!("  Manifest: {}", manifest.display());
    }
    println!(
        "  Grid:     {} x {} ({} images converted)",
        config.rows,
        config.columns,
        report.converted.len()
    );
    Ok(())
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
