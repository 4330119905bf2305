//! Headless harness running declarative exploration plans against the engine.

use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use deadreckon_game::{
    AgentState, Direction, ExplorationSession, ExplorerStrategy, Grid, GridConfig, MazeState,
    Position, RunSummary, SenseMode, encode_friendly,
};

use crate::scenarios::Scenario;
use crate::seeds::SeedInfo;

/// Where a plan's maze comes from.
#[derive(Debug, Clone)]
pub enum GridSource {
    /// Generate a maze from this config with the per-iteration seed.
    Random(GridConfig),
    /// Fixed glyph layout with an explicit start pose.
    Fixture {
        rows: Vec<String>,
        start: Position,
        facing: Direction,
    },
}

/// Declarative description of one exploration run.
#[derive(Debug, Clone)]
pub struct SimPlan {
    pub sense: SenseMode,
    pub strategy: ExplorerStrategy,
    pub source: GridSource,
    pub step_cap: Option<u64>,
    pub expectations: Vec<SimExpectation>,
}

impl SimPlan {
    #[must_use]
    pub fn new(sense: SenseMode, strategy: ExplorerStrategy) -> Self {
        Self {
            sense,
            strategy,
            source: GridSource::Random(GridConfig::default()),
            step_cap: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, cfg: GridConfig) -> Self {
        self.source = GridSource::Random(cfg);
        self
    }

    #[must_use]
    pub fn with_fixture(mut self, rows: &[&str], start: Position, facing: Direction) -> Self {
        self.source = GridSource::Fixture {
            rows: rows.iter().map(ToString::to_string).collect(),
            start,
            facing,
        };
        self
    }

    #[must_use]
    pub const fn with_step_cap(mut self, step_cap: u64) -> Self {
        self.step_cap = Some(step_cap);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after an exploration completes.
type SimExpectationFn = Arc<dyn Fn(&RunReport) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimExpectation(SimExpectationFn);

impl std::fmt::Debug for SimExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimExpectation").finish()
    }
}

impl SimExpectation {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RunReport) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluate this expectation against a finished run.
    ///
    /// # Errors
    ///
    /// Propagates whatever the underlying assertion raised.
    pub fn evaluate(&self, report: &RunReport) -> Result<()> {
        (self.0)(report)
    }
}

impl<F> From<F> for SimExpectation
where
    F: Fn(&RunReport) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of one exploration run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub seed: u64,
    pub seed_code: String,
    pub sense: SenseMode,
    pub strategy: ExplorerStrategy,
    /// Cell count of the arena the run explored.
    pub cells: usize,
    /// Step cap the run was driven with.
    pub step_cap: u64,
    pub summary: RunSummary,
    pub snapshot: String,
}

/// Result of running one scenario over one seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

/// Headless deterministic runner for exploration plans.
#[derive(Clone)]
pub struct MazeTester {
    verbose: bool,
}

impl MazeTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Run a single plan to a terminal status or its step cap.
    ///
    /// # Errors
    ///
    /// Returns an error when the plan's grid source cannot produce a maze.
    pub fn run_plan(&self, plan: &SimPlan, seed: u64) -> Result<RunReport> {
        let mut session = Self::build_session(plan, seed)?;
        let step_cap = plan.step_cap.unwrap_or_else(|| session.default_step_cap());
        let status = session.run(step_cap);
        let summary = session.summary();
        log::debug!(
            "{} in {} mode, seed {}: {} after {} steps",
            plan.strategy.label(),
            plan.sense,
            seed,
            status,
            summary.steps
        );
        Ok(RunReport {
            seed,
            seed_code: encode_friendly(plan.sense, seed),
            sense: plan.sense,
            strategy: plan.strategy,
            cells: session.state().grid.cell_count(),
            step_cap,
            summary,
            snapshot: session.snapshot(),
        })
    }

    fn build_session(plan: &SimPlan, seed: u64) -> Result<ExplorationSession> {
        match &plan.source {
            GridSource::Random(cfg) => Ok(ExplorationSession::new(
                plan.sense,
                plan.strategy,
                seed,
                cfg,
            )?),
            GridSource::Fixture {
                rows,
                start,
                facing,
            } => {
                let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
                let grid = Grid::from_glyphs(&rows)?;
                let state = MazeState::from_grid(grid, AgentState::new(*start, *facing));
                Ok(ExplorationSession::from_state(
                    state,
                    plan.sense,
                    plan.strategy,
                    seed,
                ))
            }
        }
    }

    /// Run a scenario's plan over every seed, `iterations` times each.
    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (sense {} seed {})",
                    scenario.name.bright_white(),
                    scenario.plan.sense,
                    seed.seed
                );
            }
            results.push(self.run_single_scenario(scenario, seed.seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &Scenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_plan_iterations(&scenario.plan, seed, iterations);

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    fn run_plan_iterations(
        &self,
        plan: &SimPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let report = match self.run_plan(plan, iteration_seed) {
                Ok(report) => report,
                Err(err) => {
                    failures.push(format!(
                        "Iteration {} (seed {iteration_seed}): plan failed to run: {err:#}",
                        i + 1
                    ));
                    continue;
                }
            };

            if let Some(err) = evaluate_expectations(plan, &report) {
                let summary = &report.summary;
                failures.push(format!(
                    "Iteration {} (sense {}, strategy {}, seed {}, steps {}, status {}): {} | advances {} backtracks {} turns {} rejections {} faults {} | final {} facing {}",
                    i + 1,
                    report.sense,
                    report.strategy.label(),
                    report.seed,
                    summary.steps,
                    summary.status,
                    err,
                    summary.advances,
                    summary.backtracks,
                    summary.turns,
                    summary.rejections,
                    summary.faults,
                    summary.final_position,
                    summary.final_facing.as_str(),
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                    println!(
                        "     ↳ Seed {} | {}",
                        report.seed,
                        report.snapshot.replace('\n', " / ")
                    );
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) steps:{} status:{} visited:{}",
                        i + 1,
                        iterations,
                        report.summary.steps,
                        report.summary.status,
                        report.summary.visited_cells
                    );
                }
            }
        }

        (successes, failures, performance_data)
    }
}

fn evaluate_expectations(plan: &SimPlan, report: &RunReport) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(report) {
            return Some(err.to_string());
        }
    }
    None
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations
            .iter()
            .map(std::time::Duration::as_millis)
            .collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
