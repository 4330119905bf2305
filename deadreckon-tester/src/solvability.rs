//! Solvability sweeps: run every sense/strategy pairing across the seed set
//! and hold the results against engine-level invariants.

use anyhow::{Result, ensure};
use std::collections::{BTreeMap, HashSet};

use deadreckon_game::numbers::{count_to_f64, ratio};
use deadreckon_game::{ExplorerStrategy, RunStatus, RunSummary, SenseMode};

use crate::harness::{MazeTester, SimPlan};
use crate::seeds::SeedInfo;

/// One exploration run inside a sweep.
#[derive(Debug, Clone)]
pub struct SolvabilityRecord {
    pub scenario_name: String,
    pub sense: SenseMode,
    pub strategy: ExplorerStrategy,
    pub seed_code: String,
    pub seed_value: u64,
    /// Visited cells as a share of the arena.
    pub coverage: f64,
    pub summary: RunSummary,
}

/// Aggregated sweep statistics for one sense/strategy pairing.
#[derive(Debug, Clone)]
pub struct SolvabilityAggregate {
    pub scenario_name: String,
    pub sense: SenseMode,
    pub strategy: ExplorerStrategy,
    pub iterations: usize,
    pub solve_rate: f64,
    pub exhaustion_rate: f64,
    pub cap_rate: f64,
    pub fault_rate: f64,
    pub mean_steps: f64,
    pub std_steps: f64,
    pub mean_advances: f64,
    pub std_advances: f64,
    pub mean_backtracks: f64,
    pub mean_rejections: f64,
    pub mean_coverage: f64,
    pub min_coverage: f64,
    pub max_steps: u64,
}

/// The pairings worth sweeping. Depth-first needs probe data and the scout
/// needs a sight line, so the mismatched combinations stay out.
const SWEEP_PAIRINGS: &[(SenseMode, ExplorerStrategy)] = &[
    (SenseMode::Probe, ExplorerStrategy::DepthFirst),
    (SenseMode::Vision, ExplorerStrategy::LeftHand),
    (SenseMode::Probe, ExplorerStrategy::RandomWalk),
    (SenseMode::Vision, ExplorerStrategy::RandomWalk),
];

/// Run the full sweep matrix over `seeds`, `iterations` runs per seed.
/// Coded seeds only feed the sense they were minted for.
///
/// # Errors
///
/// Returns an error when a plan fails to build, which for generated mazes
/// means a grid construction bug rather than bad input.
pub fn run_solvability_analysis(
    tester: &MazeTester,
    seeds: &[SeedInfo],
    iterations: usize,
) -> Result<Vec<SolvabilityRecord>> {
    let iterations = iterations.max(1);
    let mut records = Vec::with_capacity(SWEEP_PAIRINGS.len() * seeds.len() * iterations);

    for &(sense, strategy) in SWEEP_PAIRINGS {
        let scenario_name = pairing_name(sense, strategy);
        for seed in seeds.iter().filter(|seed| seed.matches_sense(sense)) {
            for iteration in 0..iterations {
                let offset = u64::try_from(iteration).unwrap_or(u64::MAX);
                let iteration_seed = seed.seed.wrapping_add(offset);
                let plan = SimPlan::new(sense, strategy);
                let report = tester.run_plan(&plan, iteration_seed)?;
                records.push(SolvabilityRecord {
                    scenario_name: scenario_name.clone(),
                    sense,
                    strategy,
                    seed_code: report.seed_code,
                    seed_value: iteration_seed,
                    coverage: share_of_arena(report.summary.visited_cells, report.cells),
                    summary: report.summary,
                });
            }
        }
    }

    Ok(records)
}

/// Collapse records into one aggregate row per pairing, warning (with a
/// per-key cap) about runs that burned their step budget.
#[must_use]
pub fn aggregate_solvability(records: &[SolvabilityRecord]) -> Vec<SolvabilityAggregate> {
    let mut builders: BTreeMap<String, AggregateBuilder> = BTreeMap::new();
    let mut warn_counts: BTreeMap<String, usize> = BTreeMap::new();

    for record in records {
        builders
            .entry(record.scenario_name.clone())
            .or_insert_with(|| AggregateBuilder::new(record))
            .ingest(record);
        emit_record_warnings(record, &mut warn_counts);
    }

    builders.into_values().map(AggregateBuilder::finish).collect()
}

/// Hold sweep output against the invariants the engine promises. These are
/// exact guarantees, not tuning targets; any failure is an engine bug.
///
/// # Errors
///
/// Returns the first violated invariant, with the offending scenario and
/// seed named in the message.
pub fn validate_solvability_targets(
    aggregates: &[SolvabilityAggregate],
    records: &[SolvabilityRecord],
) -> Result<()> {
    validate_record_invariants(records)?;
    validate_digest_determinism(records)?;
    validate_replay_determinism(records)?;
    validate_aggregate_targets(aggregates)?;
    Ok(())
}

fn validate_record_invariants(records: &[SolvabilityRecord]) -> Result<()> {
    for record in records {
        let summary = &record.summary;
        let exhaustion_tick = u64::from(summary.status == RunStatus::Exhausted);
        let accounted = summary.advances
            + summary.backtracks
            + summary.turns
            + summary.rejections
            + summary.faults
            + exhaustion_tick;
        ensure!(
            summary.steps == accounted,
            "Step accounting broken for {} seed {}: {} steps vs {} actions",
            record.scenario_name,
            record.seed_code,
            summary.steps,
            accounted
        );
        ensure!(
            record.coverage > 0.0 && record.coverage <= 1.0,
            "Coverage {:.3} out of range for {} seed {}",
            record.coverage,
            record.scenario_name,
            record.seed_code
        );

        match record.strategy {
            ExplorerStrategy::DepthFirst => {
                ensure!(
                    summary.faults == 0,
                    "Depth-first faulted in {} on seed {}",
                    record.scenario_name,
                    record.seed_code
                );
                ensure!(
                    summary.rejections == 0,
                    "Depth-first bumped {} times on seed {}; probe data should prevent that",
                    summary.rejections,
                    record.seed_code
                );
                ensure!(
                    summary.backtracks <= summary.advances,
                    "Depth-first retreats outnumber advances on seed {}",
                    record.seed_code
                );
                ensure!(
                    !summary.step_cap_hit && summary.status.is_terminal(),
                    "Depth-first should sweep its component well inside the cap, seed {} capped",
                    record.seed_code
                );
            }
            ExplorerStrategy::LeftHand => {
                ensure!(
                    summary.faults == 0,
                    "Scout faulted in vision mode on seed {}",
                    record.seed_code
                );
                ensure!(
                    summary.rejections == 0,
                    "Scout advanced into an unseen cell on seed {}",
                    record.seed_code
                );
            }
            ExplorerStrategy::RandomWalk => {
                ensure!(
                    summary.faults == 0,
                    "Walker faulted in {} on seed {}",
                    record.scenario_name,
                    record.seed_code
                );
                ensure!(
                    summary.turns == 0,
                    "Walker turned in place on seed {}",
                    record.seed_code
                );
                ensure!(
                    summary.status != RunStatus::Exhausted,
                    "Walker declared exhaustion on seed {}",
                    record.seed_code
                );
            }
        }
    }
    Ok(())
}

fn validate_digest_determinism(records: &[SolvabilityRecord]) -> Result<()> {
    let mut digests: BTreeMap<(String, u64), HashSet<u64>> = BTreeMap::new();
    for record in records {
        digests
            .entry((record.scenario_name.clone(), record.seed_value))
            .or_default()
            .insert(record.summary.path_digest);
    }
    for ((scenario, seed), seen) in digests {
        ensure!(
            seen.len() <= 1,
            "Seed {seed} in {scenario} produced {} distinct path digests",
            seen.len()
        );
    }
    Ok(())
}

/// Re-run the first record of each pairing on a fresh tester and compare
/// digests, catching hidden state leaking between sessions.
fn validate_replay_determinism(records: &[SolvabilityRecord]) -> Result<()> {
    let tester = MazeTester::new(false);
    let mut checked: HashSet<String> = HashSet::new();
    for record in records {
        if !checked.insert(record.scenario_name.clone()) {
            continue;
        }
        let plan = SimPlan::new(record.sense, record.strategy);
        let replay = tester.run_plan(&plan, record.seed_value)?;
        ensure!(
            replay.summary.path_digest == record.summary.path_digest,
            "Replaying {} seed {} changed the path digest",
            record.scenario_name,
            record.seed_code
        );
    }
    Ok(())
}

fn validate_aggregate_targets(aggregates: &[SolvabilityAggregate]) -> Result<()> {
    for aggregate in aggregates {
        ensure!(
            aggregate.iterations > 0,
            "Empty aggregate for {}",
            aggregate.scenario_name
        );
        let accounted = aggregate.solve_rate + aggregate.exhaustion_rate + aggregate.cap_rate;
        ensure!(
            (accounted - 1.0).abs() < 1e-9,
            "Run outcomes for {} do not partition: {:.3} accounted",
            aggregate.scenario_name,
            accounted
        );
        ensure!(
            aggregate.mean_coverage > 0.0 && aggregate.mean_coverage <= 1.0,
            "Mean coverage {:.3} out of range for {}",
            aggregate.mean_coverage,
            aggregate.scenario_name
        );
        ensure!(
            aggregate.min_coverage > 0.0,
            "A run in {} covered nothing, not even its start cell",
            aggregate.scenario_name
        );

        match aggregate.strategy {
            ExplorerStrategy::DepthFirst => {
                ensure!(
                    aggregate.cap_rate == 0.0 && aggregate.fault_rate == 0.0,
                    "Depth-first rows must be cap-free and fault-free, {} was not",
                    aggregate.scenario_name
                );
            }
            ExplorerStrategy::LeftHand => {
                ensure!(
                    aggregate.fault_rate == 0.0,
                    "Scout rows must be fault-free, {} was not",
                    aggregate.scenario_name
                );
            }
            ExplorerStrategy::RandomWalk => {
                ensure!(
                    aggregate.exhaustion_rate == 0.0 && aggregate.fault_rate == 0.0,
                    "Walker rows must be exhaustion-free and fault-free, {} was not",
                    aggregate.scenario_name
                );
            }
        }
    }
    Ok(())
}

#[must_use]
pub fn pairing_name(sense: SenseMode, strategy: ExplorerStrategy) -> String {
    format!("{} - {}", sense_label(sense), strategy.label())
}

const fn sense_label(sense: SenseMode) -> &'static str {
    match sense {
        SenseMode::Probe => "Probe",
        SenseMode::Vision => "Vision",
    }
}

fn share_of_arena(visited: usize, cells: usize) -> f64 {
    let visited = u64::try_from(visited).unwrap_or(u64::MAX);
    let cells = u64::try_from(cells).unwrap_or(u64::MAX);
    ratio(visited, cells)
}

fn emit_record_warnings(record: &SolvabilityRecord, warn_counts: &mut BTreeMap<String, usize>) {
    if record.summary.step_cap_hit && record.strategy != ExplorerStrategy::RandomWalk {
        push_limited_warn(warn_counts, &format!("{}::cap", record.scenario_name), 2, || {
            format!(
                "WARN: {} seed {} hit the step cap after {} steps",
                record.scenario_name, record.seed_code, record.summary.steps
            )
        });
    }
    if record.summary.step_cap_hit && record.summary.advances == 0 {
        push_limited_warn(warn_counts, &format!("{}::stuck", record.scenario_name), 2, || {
            format!(
                "WARN: {} seed {} burned the whole cap without advancing once",
                record.scenario_name, record.seed_code
            )
        });
    }
}

/// Print at most `limit` warnings per key, then a single elision notice.
fn push_limited_warn(
    warn_counts: &mut BTreeMap<String, usize>,
    key: &str,
    limit: usize,
    message: impl FnOnce() -> String,
) {
    let count = warn_counts.entry(key.to_string()).or_insert(0);
    *count += 1;
    if *count <= limit {
        eprintln!("{}", message());
    } else if *count == limit + 1 {
        eprintln!("WARN: further {key} warnings suppressed");
    }
}

/// Incremental mean/variance accumulator (Welford's method).
#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / f64::from(self.count);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        self.mean
    }

    fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / f64::from(self.count - 1)
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[derive(Debug, Clone)]
struct AggregateBuilder {
    scenario_name: String,
    sense: SenseMode,
    strategy: ExplorerStrategy,
    stats_steps: RunningStats,
    stats_advances: RunningStats,
    iterations: u32,
    wins: u32,
    exhaustions: u32,
    cap_hits: u32,
    faulted_runs: u32,
    backtrack_sum: u64,
    rejection_sum: u64,
    coverage_sum: f64,
    min_coverage: f64,
    max_steps: u64,
}

impl AggregateBuilder {
    fn new(record: &SolvabilityRecord) -> Self {
        Self {
            scenario_name: record.scenario_name.clone(),
            sense: record.sense,
            strategy: record.strategy,
            stats_steps: RunningStats::default(),
            stats_advances: RunningStats::default(),
            iterations: 0,
            wins: 0,
            exhaustions: 0,
            cap_hits: 0,
            faulted_runs: 0,
            backtrack_sum: 0,
            rejection_sum: 0,
            coverage_sum: 0.0,
            min_coverage: f64::INFINITY,
            max_steps: 0,
        }
    }

    fn ingest(&mut self, record: &SolvabilityRecord) {
        let summary = &record.summary;
        self.iterations += 1;
        self.stats_steps.add(count_to_f64(summary.steps));
        self.stats_advances.add(count_to_f64(summary.advances));
        match summary.status {
            RunStatus::Won => self.wins += 1,
            RunStatus::Exhausted => self.exhaustions += 1,
            RunStatus::InProgress => self.cap_hits += 1,
        }
        if summary.faults > 0 {
            self.faulted_runs += 1;
        }
        self.backtrack_sum += summary.backtracks;
        self.rejection_sum += summary.rejections;
        self.coverage_sum += record.coverage;
        self.min_coverage = self.min_coverage.min(record.coverage);
        self.max_steps = self.max_steps.max(summary.steps);
    }

    fn finish(self) -> SolvabilityAggregate {
        let denom = f64::from(self.iterations.max(1));
        SolvabilityAggregate {
            scenario_name: self.scenario_name,
            sense: self.sense,
            strategy: self.strategy,
            iterations: usize::try_from(self.iterations).unwrap_or(usize::MAX),
            solve_rate: f64::from(self.wins) / denom,
            exhaustion_rate: f64::from(self.exhaustions) / denom,
            cap_rate: f64::from(self.cap_hits) / denom,
            fault_rate: f64::from(self.faulted_runs) / denom,
            mean_steps: self.stats_steps.mean(),
            std_steps: self.stats_steps.std_dev(),
            mean_advances: self.stats_advances.mean(),
            std_advances: self.stats_advances.std_dev(),
            mean_backtracks: count_to_f64(self.backtrack_sum) / denom,
            mean_rejections: count_to_f64(self.rejection_sum) / denom,
            mean_coverage: self.coverage_sum / denom,
            min_coverage: self.min_coverage,
            max_steps: self.max_steps,
        }
    }
}
