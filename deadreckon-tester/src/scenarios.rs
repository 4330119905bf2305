//! Named QA scenarios: small fixture mazes with hand-traced outcomes plus
//! generated-maze checks that must hold for any seed.

use anyhow::{Result, anyhow, ensure};
use regex::Regex;

use deadreckon_game::{
    Direction, ExplorerStrategy, Position, RunStatus, SenseMode, decode_to_seed, encode_friendly,
    generate_code_from_entropy,
};

use crate::harness::{MazeTester, RunReport, SimPlan};

/// A named, self-checking exploration plan.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub plan: SimPlan,
}

/// Canonical scenario names in catalog order.
pub const CATALOG: [&str; 10] = [
    "smoke",
    "open-field",
    "corridor",
    "walled-goal",
    "boxed-start",
    "serpentine",
    "scout-patrol",
    "drunkard",
    "share-codes",
    "determinism",
];

/// Look up a scenario by name or alias, case-insensitively.
#[must_use]
pub fn get_scenario(name: &str) -> Option<Scenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke_scenario()),
        "open-field" | "open" => Some(open_field_scenario()),
        "corridor" => Some(corridor_scenario()),
        "walled-goal" | "sealed" => Some(walled_goal_scenario()),
        "boxed-start" | "boxed" => Some(boxed_start_scenario()),
        "serpentine" | "comb" => Some(serpentine_scenario()),
        "scout-patrol" | "scout" => Some(scout_patrol_scenario()),
        "drunkard" | "random-walk" => Some(drunkard_scenario()),
        "share-codes" | "codes" => Some(share_codes_scenario()),
        "determinism" | "replay" => Some(determinism_scenario()),
        _ => None,
    }
}

/// Scenario names with their descriptions, in catalog order.
#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG
        .iter()
        .filter_map(|name| get_scenario(name).map(|scenario| (scenario.name, scenario.description)))
        .collect()
}

fn smoke_scenario() -> Scenario {
    Scenario {
        name: "smoke",
        description: "Depth-first probe run over a generated maze",
        plan: SimPlan::new(SenseMode::Probe, ExplorerStrategy::DepthFirst)
            .with_expectation(terminal_expectation)
            .with_expectation(clean_depth_first_expectation)
            .with_expectation(counter_identity_expectation)
            .with_expectation(coverage_expectation),
    }
}

fn open_field_scenario() -> Scenario {
    Scenario {
        name: "open-field",
        description: "Obstacle-free arena is always swept to the goal",
        plan: SimPlan::new(SenseMode::Probe, ExplorerStrategy::DepthFirst)
            .with_fixture(
                &[".....", ".....", ".....", ".....", "....X"],
                Position::new(0, 0),
                Direction::Up,
            )
            .with_expectation(open_field_expectation),
    }
}

fn corridor_scenario() -> Scenario {
    Scenario {
        name: "corridor",
        description: "Two advances straight down a corridor onto the goal",
        plan: SimPlan::new(SenseMode::Probe, ExplorerStrategy::DepthFirst)
            .with_fixture(&["..X"], Position::new(0, 0), Direction::Up)
            .with_expectation(corridor_expectation),
    }
}

fn walled_goal_scenario() -> Scenario {
    Scenario {
        name: "walled-goal",
        description: "Sealed goal chamber ends exhausted after a full sweep",
        plan: SimPlan::new(SenseMode::Probe, ExplorerStrategy::DepthFirst)
            .with_fixture(
                &[".....", ".OOO.", ".OXO.", ".OOO.", "....."],
                Position::new(0, 0),
                Direction::Up,
            )
            .with_expectation(walled_goal_expectation),
    }
}

fn boxed_start_scenario() -> Scenario {
    Scenario {
        name: "boxed-start",
        description: "Start sealed on all four sides exhausts on the first tick",
        plan: SimPlan::new(SenseMode::Probe, ExplorerStrategy::DepthFirst)
            .with_fixture(&["OOOX", "O.OO", "OOOO"], Position::new(1, 1), Direction::Up)
            .with_expectation(boxed_start_expectation),
    }
}

fn serpentine_scenario() -> Scenario {
    Scenario {
        name: "serpentine",
        description: "Comb maze forces deep backtracking before the win",
        plan: SimPlan::new(SenseMode::Probe, ExplorerStrategy::DepthFirst)
            .with_fixture(
                &[".O.O.O.", ".O.O.O.", ".O.O.O.", "......X"],
                Position::new(0, 0),
                Direction::Up,
            )
            .with_expectation(serpentine_expectation),
    }
}

fn scout_patrol_scenario() -> Scenario {
    Scenario {
        name: "scout-patrol",
        description: "Vision scout turns out of a corner and walks to the goal",
        plan: SimPlan::new(SenseMode::Vision, ExplorerStrategy::LeftHand)
            .with_fixture(&["....X"], Position::new(0, 0), Direction::Up)
            .with_expectation(scout_patrol_expectation),
    }
}

fn drunkard_scenario() -> Scenario {
    Scenario {
        name: "drunkard",
        description: "Random walker absorbs rejected moves without losing count",
        plan: SimPlan::new(SenseMode::Probe, ExplorerStrategy::RandomWalk)
            .with_fixture(&["...", ".O.", "..X"], Position::new(0, 0), Direction::Up)
            .with_expectation(drunkard_expectation)
            .with_expectation(counter_identity_expectation),
    }
}

fn share_codes_scenario() -> Scenario {
    Scenario {
        name: "share-codes",
        description: "Run seed codes parse back to themselves in both senses",
        plan: SimPlan::new(SenseMode::Probe, ExplorerStrategy::DepthFirst)
            .with_expectation(share_code_expectation),
    }
}

fn determinism_scenario() -> Scenario {
    Scenario {
        name: "determinism",
        description: "Replaying a seed reproduces the maze, path, and digest",
        plan: SimPlan::new(SenseMode::Probe, ExplorerStrategy::DepthFirst)
            .with_expectation(determinism_expectation),
    }
}

fn terminal_expectation(report: &RunReport) -> Result<()> {
    ensure!(
        report.summary.status.is_terminal(),
        "run should reach a terminal status, stopped {} after {} steps",
        report.summary.status,
        report.summary.steps
    );
    Ok(())
}

fn clean_depth_first_expectation(report: &RunReport) -> Result<()> {
    let summary = &report.summary;
    ensure!(summary.faults == 0, "probe run faulted {} times", summary.faults);
    ensure!(
        summary.rejections == 0,
        "probe-guided advances should never bump, got {} rejections",
        summary.rejections
    );
    ensure!(
        !summary.step_cap_hit,
        "depth-first sweep should finish inside the cap of {}",
        report.step_cap
    );
    ensure!(
        summary.backtracks <= summary.advances,
        "retreats ({}) cannot outnumber advances ({})",
        summary.backtracks,
        summary.advances
    );
    Ok(())
}

fn counter_identity_expectation(report: &RunReport) -> Result<()> {
    let summary = &report.summary;
    let exhaustion_tick = u64::from(summary.status == RunStatus::Exhausted);
    let accounted = summary.advances
        + summary.backtracks
        + summary.turns
        + summary.rejections
        + summary.faults
        + exhaustion_tick;
    ensure!(
        summary.steps == accounted,
        "step count {} does not match its action breakdown {}",
        summary.steps,
        accounted
    );
    Ok(())
}

fn coverage_expectation(report: &RunReport) -> Result<()> {
    let visited = report.summary.visited_cells;
    ensure!(visited >= 1, "the start cell alone should count as visited");
    ensure!(
        visited <= report.cells,
        "visited {} cells in an arena of {}",
        visited,
        report.cells
    );
    Ok(())
}

fn open_field_expectation(report: &RunReport) -> Result<()> {
    let summary = &report.summary;
    ensure!(
        summary.status == RunStatus::Won,
        "an open arena must be won, got {}",
        summary.status
    );
    ensure!(
        summary.final_position == Position::new(4, 4),
        "the goal sits at (4, 4), finished at {}",
        summary.final_position
    );
    ensure!(summary.rejections == 0, "bumped {} times in an open arena", summary.rejections);
    ensure!(summary.faults == 0, "faulted {} times", summary.faults);
    ensure!(
        summary.advances <= 25,
        "advances ({}) exceed the cell count",
        summary.advances
    );
    ensure!(
        summary.backtracks <= summary.advances,
        "retreats ({}) cannot outnumber advances ({})",
        summary.backtracks,
        summary.advances
    );
    Ok(())
}

fn corridor_expectation(report: &RunReport) -> Result<()> {
    let summary = &report.summary;
    ensure!(summary.status == RunStatus::Won, "corridor run must win, got {}", summary.status);
    ensure!(summary.steps == 2, "the walk takes exactly two steps, took {}", summary.steps);
    ensure!(
        summary.advances == 2 && summary.backtracks == 0 && summary.rejections == 0,
        "expected two clean advances, got {} advances, {} retreats, {} bumps",
        summary.advances,
        summary.backtracks,
        summary.rejections
    );
    ensure!(
        summary.final_position == Position::new(0, 2),
        "goal cell is (0, 2), finished at {}",
        summary.final_position
    );
    Ok(())
}

fn walled_goal_expectation(report: &RunReport) -> Result<()> {
    let summary = &report.summary;
    ensure!(
        summary.status == RunStatus::Exhausted,
        "a sealed goal must exhaust the search, got {}",
        summary.status
    );
    ensure!(
        summary.visited_cells == 16,
        "the outer ring has 16 reachable cells, visited {}",
        summary.visited_cells
    );
    ensure!(summary.advances == 15, "sweeping 16 cells takes 15 advances, got {}", summary.advances);
    ensure!(
        summary.backtracks == 15,
        "a full unwind retreats 15 times, got {}",
        summary.backtracks
    );
    ensure!(
        summary.final_position == Position::new(0, 0),
        "exhaustion unwinds to the start, ended at {}",
        summary.final_position
    );
    ensure!(!summary.step_cap_hit, "sweep should finish inside the cap of {}", report.step_cap);
    Ok(())
}

fn boxed_start_expectation(report: &RunReport) -> Result<()> {
    let summary = &report.summary;
    ensure!(
        summary.status == RunStatus::Exhausted,
        "nowhere to go means exhausted, got {}",
        summary.status
    );
    ensure!(summary.steps == 1, "exhaustion should land on the first tick, took {}", summary.steps);
    ensure!(
        summary.advances == 0 && summary.backtracks == 0,
        "no movement is possible, got {} advances and {} retreats",
        summary.advances,
        summary.backtracks
    );
    ensure!(summary.visited_cells == 1, "only the start is reachable, visited {}", summary.visited_cells);
    ensure!(
        summary.final_position == Position::new(1, 1),
        "the agent never leaves (1, 1), ended at {}",
        summary.final_position
    );
    Ok(())
}

fn serpentine_expectation(report: &RunReport) -> Result<()> {
    let summary = &report.summary;
    ensure!(summary.status == RunStatus::Won, "the comb opens onto the goal, got {}", summary.status);
    ensure!(summary.advances == 15, "expected 15 advances through the teeth, got {}", summary.advances);
    ensure!(
        summary.backtracks == 6,
        "unwinding the first two teeth takes 6 retreats, got {}",
        summary.backtracks
    );
    ensure!(summary.steps == 21, "expected 21 steps in total, took {}", summary.steps);
    ensure!(summary.visited_cells == 16, "the path covers 16 cells, visited {}", summary.visited_cells);
    ensure!(
        summary.final_position == Position::new(3, 6),
        "goal cell is (3, 6), finished at {}",
        summary.final_position
    );
    Ok(())
}

fn scout_patrol_expectation(report: &RunReport) -> Result<()> {
    let summary = &report.summary;
    ensure!(summary.status == RunStatus::Won, "the corridor is in plain sight, got {}", summary.status);
    ensure!(
        summary.turns == 3,
        "three quarter-turns before the sight line opens, got {}",
        summary.turns
    );
    ensure!(summary.advances == 4, "the goal is four cells out, got {} advances", summary.advances);
    ensure!(
        summary.faults == 0 && summary.rejections == 0,
        "a sighted walk is clean, got {} faults and {} bumps",
        summary.faults,
        summary.rejections
    );
    ensure!(summary.steps == 7, "three turns plus four advances, took {}", summary.steps);
    ensure!(
        summary.final_position == Position::new(0, 4),
        "goal cell is (0, 4), finished at {}",
        summary.final_position
    );
    Ok(())
}

fn drunkard_expectation(report: &RunReport) -> Result<()> {
    let summary = &report.summary;
    ensure!(summary.faults == 0, "the walker never faults, got {}", summary.faults);
    ensure!(summary.turns == 0, "the walker never turns in place, got {}", summary.turns);
    ensure!(
        summary.status != RunStatus::Exhausted,
        "the walker never gives up, got {}",
        summary.status
    );
    if summary.status == RunStatus::InProgress {
        ensure!(
            summary.step_cap_hit,
            "an unfinished walk must be explained by the step cap"
        );
    }
    Ok(())
}

fn share_code_expectation(report: &RunReport) -> Result<()> {
    let pattern = Regex::new(r"^(PB|VN)-[A-Z]+\d{2}$")?;
    ensure!(
        pattern.is_match(&report.seed_code),
        "seed code {} does not look like a share code",
        report.seed_code
    );

    let (sense, canonical) = decode_to_seed(&report.seed_code)
        .ok_or_else(|| anyhow!("seed code {} failed to parse", report.seed_code))?;
    ensure!(
        sense == report.sense,
        "code {} decoded to the wrong sense {}",
        report.seed_code,
        sense
    );
    ensure!(
        encode_friendly(sense, canonical) == report.seed_code,
        "code {} did not survive a decode/encode round trip",
        report.seed_code
    );

    let vision_code = generate_code_from_entropy(SenseMode::Vision, report.seed);
    ensure!(
        pattern.is_match(&vision_code),
        "entropy code {vision_code} does not look like a share code"
    );
    let (vision_sense, _) = decode_to_seed(&vision_code)
        .ok_or_else(|| anyhow!("entropy code {vision_code} failed to parse"))?;
    ensure!(
        vision_sense == SenseMode::Vision,
        "entropy code {vision_code} lost its sense prefix"
    );
    Ok(())
}

fn determinism_expectation(report: &RunReport) -> Result<()> {
    let plan = SimPlan::new(report.sense, report.strategy).with_step_cap(report.step_cap);
    let replay = MazeTester::new(false).run_plan(&plan, report.seed)?;
    ensure!(
        replay.summary == report.summary,
        "replay of seed {} diverged: digest {:#018x} vs {:#018x}",
        report.seed,
        replay.summary.path_digest,
        report.summary.path_digest
    );
    ensure!(
        replay.snapshot == report.snapshot,
        "replay of seed {} drew a different maze",
        report.seed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::ScenarioResult;
    use crate::seeds::SeedInfo;

    fn run_once(name: &str) -> ScenarioResult {
        let scenario = get_scenario(name).expect("known scenario");
        MazeTester::new(false)
            .run_scenario(&scenario, &[SeedInfo::from_numeric(1337)], 1)
            .into_iter()
            .next()
            .expect("one result per seed")
    }

    #[test]
    fn every_cataloged_scenario_resolves() {
        for name in CATALOG {
            assert!(get_scenario(name).is_some(), "{name} missing from the catalog");
        }
        assert_eq!(list_scenarios().len(), CATALOG.len());
        assert!(get_scenario("warp-drive").is_none());
    }

    #[test]
    fn aliases_reach_the_same_scenarios() {
        assert_eq!(get_scenario("SCOUT").map(|s| s.name), Some("scout-patrol"));
        assert_eq!(get_scenario("comb").map(|s| s.name), Some("serpentine"));
        assert_eq!(get_scenario("replay").map(|s| s.name), Some("determinism"));
        assert_eq!(get_scenario("random-walk").map(|s| s.name), Some("drunkard"));
    }

    #[test]
    fn fixture_scenarios_hold_their_traced_outcomes() {
        for name in [
            "open-field",
            "corridor",
            "walled-goal",
            "boxed-start",
            "serpentine",
            "scout-patrol",
            "drunkard",
        ] {
            let result = run_once(name);
            assert!(result.passed, "{name} failed: {:?}", result.failures);
        }
    }

    #[test]
    fn generated_scenarios_hold_for_a_spread_of_seeds() {
        let seeds: Vec<SeedInfo> = [1_u64, 42, 1337, 0xFEED]
            .iter()
            .copied()
            .map(SeedInfo::from_numeric)
            .collect();
        for name in ["smoke", "share-codes", "determinism"] {
            let scenario = get_scenario(name).expect("known scenario");
            for result in MazeTester::new(false).run_scenario(&scenario, &seeds, 2) {
                assert!(result.passed, "{name} failed: {:?}", result.failures);
            }
        }
    }

    #[test]
    fn share_codes_hold_for_coded_seeds_too() {
        let (sense, seed) = decode_to_seed("PB-LANTERN07").expect("valid code");
        assert_eq!(sense, SenseMode::Probe);
        let scenario = get_scenario("share-codes").expect("known scenario");
        let seeds = vec![SeedInfo::from_share_code(seed, sense, "PB-LANTERN07".to_string())];
        let result = MazeTester::new(false)
            .run_scenario(&scenario, &seeds, 1)
            .into_iter()
            .next()
            .expect("one result");
        assert!(result.passed, "share-codes failed: {:?}", result.failures);
    }
}
