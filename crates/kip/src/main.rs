//! kip: run a pixel pipeline over an image file.
//!
//! Operations come either from repeated `--op` flags (a linear chain) or
//! from a full [`ChainConfig`] passed as JSON, which can also describe
//! branches and their merge strategy.
//!
//! # Usage
//!
//! ```text
//! kip photo.png -o out.png --op invert --op blur=1.5
//! kip photo.png -o out.png --config-json '{"operations":[{"op":"invert"}]}'
//! kip photo.png -o out.png --op smooth=2 --all-steps steps/ --json
//! ```
//!
//! Progress is logged through `tracing`; set `RUST_LOG=debug` to see
//! every processed step.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod chain;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use kip_pipeline::{ExecutorConfig, ImageStack, PipelineError, PipelineExecutor};
use tracing_subscriber::EnvFilter;

use crate::chain::{ChainConfig, Operation};

/// Build and run a pixel pipeline over an image.
#[derive(Parser)]
#[command(name = "kip", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Where to write the final frame; the extension picks the format.
    #[arg(short, long)]
    output: PathBuf,

    /// Retain every intermediate frame.
    #[arg(long)]
    keep_history: bool,

    /// Also write every retained frame to this directory as
    /// `<input-stem>_<idx>.png`. Implies `--keep-history`.
    #[arg(long, value_name = "DIR")]
    all_steps: Option<PathBuf>,

    /// Operation to append, `NAME` or `NAME=V1,V2`. Repeatable.
    #[arg(long = "op", value_name = "OP")]
    ops: Vec<Operation>,

    /// Full chain as a JSON string.
    ///
    /// When provided, `--op` flags are ignored. The JSON must be a valid
    /// `ChainConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Print the execution plan and exit without running.
    #[arg(long)]
    plan: bool,
}

/// Build a [`ChainConfig`] from CLI arguments.
///
/// `--config-json` wins over `--op`. The history flags are OR-ed with
/// the config's own `keep_history`.
fn chain_from_cli(cli: &Cli) -> Result<ChainConfig, String> {
    let mut chain = match cli.config_json {
        Some(ref json) => serde_json::from_str(json)
            .map_err(|e| format!("Error parsing --config-json: {e}"))?,
        None => ChainConfig {
            keep_history: false,
            operations: cli.ops.clone(),
        },
    };
    chain.keep_history |= cli.keep_history || cli.all_steps.is_some();
    Ok(chain)
}

/// Saver writing the final frame, plus every frame when `all_steps` is set.
fn file_saver(
    output: PathBuf,
    all_steps: Option<(PathBuf, String)>,
) -> impl Fn(&ImageStack) -> Result<(), PipelineError> {
    let top = kip_io::saver(output);
    let history = all_steps.map(|(dir, name)| kip_io::history_saver(dir, name));
    move |stack| {
        top(stack)?;
        if let Some(ref history) = history {
            history(stack)?;
        }
        Ok(())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("step")
        .to_owned()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let chain = match chain_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    let pipeline = chain.to_pipeline();

    if cli.plan {
        println!("{pipeline}");
        return ExitCode::SUCCESS;
    }

    let all_steps = cli
        .all_steps
        .clone()
        .map(|dir| (dir, file_stem(&cli.input)));
    let config = ExecutorConfig::default()
        .with_loader(kip_io::loader(cli.input.clone(), chain.keep_history))
        .with_saver(file_saver(cli.output.clone(), all_steps))
        .with_logger(|line| tracing::info!("{line}"));

    let run = match PipelineExecutor::new(config).execute(&pipeline) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&run.diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", run.diagnostics.report());
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kip").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn ops_build_linear_chain() {
        let cli = parse(&["in.png", "-o", "out.png", "--op", "invert", "--op", "blur=2"]);
        let chain = chain_from_cli(&cli).unwrap();
        assert!(!chain.keep_history);
        assert_eq!(
            chain.operations,
            [Operation::Invert, Operation::Blur { sigma: 2.0 }]
        );
    }

    #[test]
    fn invalid_op_is_a_parse_error() {
        let args = ["kip", "in.png", "-o", "out.png", "--op", "sharpen"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn config_json_overrides_ops() {
        let cli = parse(&[
            "in.png",
            "-o",
            "out.png",
            "--op",
            "invert",
            "--config-json",
            r#"{"operations":[{"op":"brighten","rate":0.5}]}"#,
        ]);
        let chain = chain_from_cli(&cli).unwrap();
        assert_eq!(chain.operations, [Operation::Brighten { rate: 0.5 }]);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let cli = parse(&["in.png", "-o", "out.png", "--config-json", "{"]);
        let err = chain_from_cli(&cli).unwrap_err();
        assert!(err.starts_with("Error parsing --config-json"), "{err}");
    }

    #[test]
    fn all_steps_implies_history() {
        let cli = parse(&["in.png", "-o", "out.png", "--all-steps", "steps"]);
        assert!(chain_from_cli(&cli).unwrap().keep_history);
    }

    #[test]
    fn stem_names_step_files() {
        assert_eq!(file_stem(Path::new("/photos/cat.jpeg")), "cat");
        assert_eq!(file_stem(Path::new("/")), "step");
    }

    #[test]
    fn file_saver_writes_top_and_history() {
        let dir = std::env::temp_dir().join(format!("kip-cli-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let steps = dir.join("steps");
        std::fs::create_dir_all(&dir).unwrap();

        let mut stack = ImageStack::blank(2, 2, false, true);
        stack.perform_color(&|c: kip_pipeline::PixelColor| c.transform(|_| 200));
        let save = file_saver(dir.join("out.png"), Some((steps.clone(), "cat".to_owned())));
        save(&stack).unwrap();

        assert!(dir.join("out.png").is_file());
        assert!(steps.join("cat_0.png").is_file());
        assert!(steps.join("cat_1.png").is_file());
    }
}
