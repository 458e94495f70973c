use std::collections::VecDeque;
use std::error::Error;

use onnx_diff::{compare, load_model_file};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod report;

use report::{ReportOptions, count_differences, render_report};

struct Args {
    /// Model files to compare.
    model1: String,
    model2: String,

    /// Output the diff as JSON instead of text.
    json: bool,

    /// Enable debug logging.
    verbose: bool,

    report: ReportOptions,
}

fn parse_args() -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let mut values = VecDeque::new();
    let mut json = false;
    let mut verbose = false;
    let mut report = ReportOptions::default();

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Value(val) => values.push_back(val.string()?),
            Long("json") => json = true,
            Short('a') | Long("all") => report.show_unchanged = true,
            Short('q') | Long("quiet") => report.summary_only = true,
            Short('v') | Long("verbose") => verbose = true,
            Short('h') | Long("help") => {
                println!(
                    "Compare the structure of two ONNX models.

Usage: {bin_name} [OPTIONS] <model1> <model2>

Options:
      --json     Output the diff as JSON
  -a, --all      Include entities which are unchanged
  -q, --quiet    Only print a summary of changes per category
  -v, --verbose  Enable debug logging
  -h, --help     Print help

The exit status is 0 if the models are the same and non-zero if they differ
or cannot be loaded. Set RUST_LOG to override the log level.
",
                    bin_name = parser.bin_name().unwrap_or("onnx-diff")
                );
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    let model1 = values.pop_front().ok_or("missing `<model1>` arg")?;
    let model2 = values.pop_front().ok_or("missing `<model2>` arg")?;
    if let Some(extra) = values.pop_front() {
        return Err(format!("unexpected argument `{}`", extra).into());
    }

    Ok(Args {
        model1,
        model2,
        json,
        verbose,
        report,
    })
}

/// Log to stderr. `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Tool for comparing the structure of two ONNX models.
///
/// ```text
/// onnx-diff model-v1.onnx model-v2.onnx
/// ```
fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args()?;
    init_logging(args.verbose);

    let model1 = load_model_file(&args.model1)?;
    let model2 = load_model_file(&args.model2)?;

    let comparison = compare(&model1, &model2);
    let differences = count_differences(&comparison);
    debug!(differences, "compared models");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison.diff)?);
    } else {
        print!("{}", render_report(&comparison, &args.report));
    }

    if differences > 0 {
        std::process::exit(1);
    }
    Ok(())
}
