//! Report rendering: console, JSON, and Markdown for scenario results plus a
//! CSV dump of raw solvability records.

use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use crate::harness::ScenarioResult;
use crate::solvability::{SolvabilityAggregate, SolvabilityRecord};

/// Human-oriented summary: per-run verdicts, timing extremes, and the
/// solvability table.
///
/// # Errors
///
/// Returns an error when the underlying writer fails.
pub fn generate_console_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    aggregates: &[SolvabilityAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|result| result.passed).count();
    let failed = total - passed;

    writeln!(out, "Total scenario runs: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    if failed > 0 {
        writeln!(out, "Failed: {}", failed.to_string().red())?;
    } else {
        writeln!(out, "Failed: 0")?;
    }
    writeln!(out, "Success rate: {:.1}%", success_rate(passed, total))?;
    writeln!(out)?;

    for result in results {
        let marker = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} - {}/{} iterations, avg {}ms",
            marker,
            result.scenario_name.bold(),
            result.successful_iterations,
            result.iterations_run,
            result.average_duration.as_millis()
        )?;
        for failure in &result.failures {
            writeln!(out, "    - {}", failure.red())?;
        }
    }

    if let (Some(fastest), Some(slowest)) = (
        results.iter().min_by_key(|result| result.average_duration),
        results.iter().max_by_key(|result| result.average_duration),
    ) {
        writeln!(out)?;
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(
            out,
            "Fastest: {} ({}ms avg)",
            fastest.scenario_name,
            fastest.average_duration.as_millis()
        )?;
        writeln!(
            out,
            "Slowest: {} ({}ms avg)",
            slowest.scenario_name,
            slowest.average_duration.as_millis()
        )?;
    }

    if !aggregates.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "🧭 Solvability Summary".bright_yellow().bold())?;
        writeln!(
            out,
            "{:<24} {:>5} {:>7} {:>8} {:>6} {:>6} {:>11} {:>8} {:>9}",
            "Pairing", "Runs", "Solve", "Exhaust", "Cap", "Fault", "Mean steps", "σ", "Coverage"
        )?;
        for row in aggregates {
            writeln!(
                out,
                "{:<24} {:>5} {:>6.1}% {:>7.1}% {:>5.1}% {:>5.1}% {:>11.1} {:>8.1} {:>8.1}%",
                row.scenario_name,
                row.iterations,
                row.solve_rate * 100.0,
                row.exhaustion_rate * 100.0,
                row.cap_rate * 100.0,
                row.fault_rate * 100.0,
                row.mean_steps,
                row.std_steps,
                row.mean_coverage * 100.0
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "🏁 Total time: {total_duration:?}")?;
    Ok(())
}

/// Scenario results as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error when serialization or the writer fails.
pub fn generate_json_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json}")?;
    Ok(())
}

/// Scenario results as a Markdown document.
///
/// # Errors
///
/// Returns an error when the underlying writer fails.
pub fn generate_markdown_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Deadreckon Logic Test Results")?;
    writeln!(out)?;
    writeln!(out, "## Summary")?;
    writeln!(out)?;

    let total = results.len();
    let passed = results.iter().filter(|result| result.passed).count();
    writeln!(out, "- **Total scenario runs**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%", success_rate(passed, total))?;
    writeln!(out)?;
    writeln!(out, "## Detailed Results")?;

    for result in results {
        writeln!(out)?;
        let marker = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {marker} {}", result.scenario_name)?;
        writeln!(out)?;
        writeln!(
            out,
            "- Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- Average duration: {}ms", result.average_duration.as_millis())?;
        if !result.failures.is_empty() {
            writeln!(out, "- Failures:")?;
            for failure in &result.failures {
                writeln!(out, "  - `{failure}`")?;
            }
        }
    }
    Ok(())
}

/// Raw solvability records, one CSV row per run.
///
/// # Errors
///
/// Returns an error when the underlying writer fails.
pub fn generate_csv_report<W: Write>(out: &mut W, records: &[SolvabilityRecord]) -> Result<()> {
    writeln!(
        out,
        "scenario,sense,strategy,seed_code,seed,status,steps,advances,backtracks,turns,\
         rejections,faults,visited,coverage,digest,cap_hit"
    )?;
    for record in records {
        let summary = &record.summary;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{:.4},{:016x},{}",
            record.scenario_name,
            record.sense,
            record.strategy.as_str(),
            record.seed_code,
            record.seed_value,
            summary.status,
            summary.steps,
            summary.advances,
            summary.backtracks,
            summary.turns,
            summary.rejections,
            summary.faults,
            summary.visited_cells,
            record.coverage,
            summary.path_digest,
            summary.step_cap_hit
        )?;
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::MazeTester;
    use crate::scenarios::get_scenario;
    use crate::seeds::SeedInfo;
    use crate::solvability::{aggregate_solvability, run_solvability_analysis};

    fn sample_results() -> Vec<ScenarioResult> {
        let scenario = get_scenario("corridor").expect("known scenario");
        MazeTester::new(false).run_scenario(&scenario, &[SeedInfo::from_numeric(5)], 2)
    }

    #[test]
    fn console_report_covers_results_and_sweeps() {
        let results = sample_results();
        let tester = MazeTester::new(false);
        let seeds = vec![SeedInfo::from_numeric(5)];
        let records = run_solvability_analysis(&tester, &seeds, 1).expect("sweep runs");
        let aggregates = aggregate_solvability(&records);

        let mut buffer = Vec::new();
        generate_console_report(&mut buffer, &results, &aggregates, Duration::from_millis(1500))
            .expect("render succeeds");
        let text = String::from_utf8(buffer).expect("utf8 output");
        assert!(text.contains("Logic Test Results Summary"));
        assert!(text.contains("corridor"));
        assert!(text.contains("Solvability Summary"));
        assert!(text.contains("Probe - Depth First"));
        assert!(text.contains("Total time"));
    }

    #[test]
    fn json_report_parses_back() {
        let results = sample_results();
        let mut buffer = Vec::new();
        generate_json_report(&mut buffer, &results).expect("render succeeds");
        let parsed: Vec<ScenarioResult> = serde_json::from_slice(&buffer).expect("valid json");
        assert_eq!(parsed.len(), results.len());
        assert_eq!(parsed[0].scenario_name, "corridor");
    }

    #[test]
    fn markdown_report_lists_each_scenario() {
        let results = sample_results();
        let mut buffer = Vec::new();
        generate_markdown_report(&mut buffer, &results).expect("render succeeds");
        let text = String::from_utf8(buffer).expect("utf8 output");
        assert!(text.starts_with("# Deadreckon Logic Test Results"));
        assert!(text.contains("## Detailed Results"));
        assert!(text.contains("### ✅ corridor"));
    }

    #[test]
    fn csv_report_emits_one_row_per_record() {
        let tester = MazeTester::new(false);
        let seeds = vec![SeedInfo::from_numeric(9)];
        let records = run_solvability_analysis(&tester, &seeds, 1).expect("sweep runs");

        let mut buffer = Vec::new();
        generate_csv_report(&mut buffer, &records).expect("render succeeds");
        let text = String::from_utf8(buffer).expect("utf8 output");
        let mut lines = text.lines();
        let header = lines.next().expect("header row");
        assert!(header.starts_with("scenario,sense,strategy"));
        assert_eq!(lines.count(), records.len());
    }
}
