//! Deadreckon automated tester: named logic scenarios plus solvability
//! sweeps over the sense/strategy matrix, with console, JSON, Markdown, and
//! CSV reporting.

mod harness;
mod reports;
mod scenarios;
mod seeds;
mod solvability;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::harness::{MazeTester, ScenarioResult};
use crate::scenarios::get_scenario;
use crate::seeds::{SeedInfo, resolve_seed_inputs};
use crate::solvability::{
    SolvabilityAggregate, SolvabilityRecord, aggregate_solvability, run_solvability_analysis,
    validate_solvability_targets,
};

#[derive(Parser, Debug)]
#[command(
    name = "deadreckon-tester",
    about = "Automated QA for the Deadreckon maze engine",
    version
)]
struct Args {
    /// Comma-separated scenario names, or "all"
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Comma-separated seeds: numbers, share codes, or "all"
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Iterations per scenario/seed combination
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Acceptance mode: at least 100 iterations per combination
    #[arg(long)]
    acceptance: bool,

    /// Report format
    #[arg(long, default_value = "console", value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Per-iteration output
    #[arg(short, long)]
    verbose: bool,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Override the step cap for scenario runs
    #[arg(long)]
    step_cap: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let started = Instant::now();
    let iterations = compute_iterations(&args);
    let scenario_names = expand_scenarios(&args.scenarios);
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let tester = MazeTester::new(args.verbose);

    let results = run_scenario_suite(&tester, &scenario_names, &seeds, iterations, args.step_cap);
    let (records, aggregates) = gather_solvability(&tester, &seeds, iterations)?;

    write_reports(&args, &results, &records, &aggregates, started.elapsed())?;

    validate_solvability_targets(&aggregates, &records)?;

    if results.iter().any(|result| !result.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn announce_banner() {
    println!("{}", "🧭 Deadreckon Automated Tester".bright_cyan().bold());
    println!("{}", "==============================".cyan());
}

/// Print the scenario catalog when `--list-scenarios` is set. Returns true
/// when the listing ran and the process should exit.
fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut target = OutputTarget::create(args.output.as_ref())?;
    writeln!(target, "Available scenarios:")?;
    for (key, description) in scenarios::list_scenarios() {
        writeln!(target, "  {key:25} - {description}")?;
    }
    target.flush()?;
    Ok(true)
}

fn compute_iterations(args: &Args) -> usize {
    if args.acceptance {
        let iterations = args.iterations.max(100);
        println!("🔁 Acceptance mode: {iterations} iterations per combination");
        iterations
    } else {
        args.iterations
    }
}

/// Split the `--scenarios` value, expanding `all` into the full catalog
/// while keeping explicitly named scenarios first.
fn expand_scenarios(raw: &str) -> Vec<String> {
    let mut names = split_csv(raw);
    if names.iter().any(|name| name.eq_ignore_ascii_case("all")) {
        names.retain(|name| !name.eq_ignore_ascii_case("all"));
        for key in scenarios::CATALOG {
            if !names.iter().any(|existing| existing.eq_ignore_ascii_case(key)) {
                names.push(key.to_string());
            }
        }
    }
    names
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn run_scenario_suite(
    tester: &MazeTester,
    scenario_names: &[String],
    seeds: &[SeedInfo],
    iterations: usize,
    step_cap: Option<u64>,
) -> Vec<ScenarioResult> {
    println!();
    println!("{}", "🧠 Running Logic Scenarios".bright_yellow().bold());

    let mut results = Vec::new();
    for name in scenario_names {
        let Some(mut scenario) = get_scenario(name) else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
            continue;
        };
        if let Some(cap) = step_cap {
            scenario.plan = scenario.plan.with_step_cap(cap);
        }
        results.extend(tester.run_scenario(&scenario, seeds, iterations));
    }
    results
}

fn gather_solvability(
    tester: &MazeTester,
    seeds: &[SeedInfo],
    iterations: usize,
) -> Result<(Vec<SolvabilityRecord>, Vec<SolvabilityAggregate>)> {
    println!();
    println!("{}", "🧭 Running Solvability Sweeps".bright_yellow().bold());
    let records = run_solvability_analysis(tester, seeds, iterations)?;
    let aggregates = aggregate_solvability(&records);
    Ok((records, aggregates))
}

fn write_reports(
    args: &Args,
    results: &[ScenarioResult],
    records: &[SolvabilityRecord],
    aggregates: &[SolvabilityAggregate],
    total_duration: Duration,
) -> Result<()> {
    let mut target = OutputTarget::create(args.output.as_ref())?;
    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(target, "[]")?;
            } else {
                reports::generate_json_report(&mut target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(target, "_No scenarios executed._")?;
            } else {
                reports::generate_markdown_report(&mut target, results)?;
            }
        }
        "csv" => {
            reports::generate_csv_report(&mut target, records)?;
        }
        _ => {
            if results.is_empty() && aggregates.is_empty() {
                writeln!(target, "No logic scenarios executed.")?;
            } else {
                reports::generate_console_report(&mut target, results, aggregates, total_duration)?;
            }
        }
    }
    target.flush()?;
    if let Some(path) = &args.output {
        println!("📄 Report written to {}", path.display());
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn create(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create output file {}", path.display()))?;
                Ok(Self::File(BufWriter::new(file)))
            }
            None => Ok(Self::Stdout(BufWriter::new(io::stdout()))),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(writer) => writer.write(buf),
            Self::File(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(writer) => writer.flush(),
            Self::File(writer) => writer.flush(),
        }
    }
}
