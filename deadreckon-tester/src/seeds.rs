//! Seed input handling for scenario runs and solvability sweeps.
//!
//! Seeds arrive on the command line as bare numbers, share codes, or the
//! keyword `all`. Share codes pin the sense mode they were minted for, so a
//! `VN-` seed only feeds vision sweeps; plain numbers run everywhere.

use anyhow::{Context, Result, bail};
use std::collections::HashSet;

use deadreckon_game::seed::WORD_LIST;
use deadreckon_game::{SenseMode, decode_to_seed, encode_friendly};

/// One resolved seed plus the share-code context it arrived with.
#[derive(Debug, Clone)]
pub struct SeedInfo {
    pub seed: u64,
    /// Canonical share code when the seed came from one.
    pub code: Option<String>,
    /// Sense mode encoded in the share code, if any.
    pub source_sense: Option<SenseMode>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_sense: None,
        }
    }

    #[must_use]
    pub const fn from_share_code(seed: u64, sense: SenseMode, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            source_sense: Some(sense),
        }
    }

    /// Whether this seed should participate in runs for `sense`.
    /// Numeric seeds match every sense; coded seeds only their own.
    #[must_use]
    pub fn matches_sense(&self, sense: SenseMode) -> bool {
        self.source_sense.is_none_or(|source| source == sense)
    }

    /// Share code to print for a run in `sense` mode: the original code when
    /// it already targets that sense, otherwise a fresh encoding.
    #[must_use]
    pub fn share_code_for_sense(&self, sense: SenseMode) -> String {
        if let Some(code) = &self.code
            && self.source_sense == Some(sense)
        {
            return code.clone();
        }
        encode_friendly(sense, self.seed)
    }
}

/// Resolve raw `--seeds` tokens into concrete [`SeedInfo`] entries.
///
/// Accepts decimal numbers (negative values are folded to their magnitude),
/// share codes in either sense prefix, and `all`/`available` to enumerate the
/// entire share-code space. Duplicates collapse; an empty input falls back to
/// the house default seed 1337.
///
/// # Errors
///
/// Returns an error when a token parses as neither a number nor a share code.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token.eq_ignore_ascii_case("all") || token.eq_ignore_ascii_case("available") {
            request_all = true;
            continue;
        }
        if let Ok(signed) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(signed.unsigned_abs()));
            continue;
        }
        if let Ok(numeric) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(numeric));
            continue;
        }
        if let Some((sense, seed)) = decode_to_seed(token) {
            pending.push(SeedInfo::from_share_code(seed, sense, token.to_uppercase()));
            continue;
        }
        bail!("Unrecognized seed token: {token}");
    }

    if request_all {
        pending.extend(generate_all_share_code_seeds()?);
    }

    let mut seen: HashSet<(u64, u8)> = HashSet::new();
    let mut seeds: Vec<SeedInfo> = Vec::new();
    for info in pending {
        if seen.insert((info.seed, sense_tag(info.source_sense))) {
            seeds.push(info);
        }
    }

    if seeds.is_empty() {
        seeds.push(SeedInfo::from_numeric(1337));
    }
    Ok(seeds)
}

/// Every share code the encoder can mint: both prefixes, the full word list,
/// and all two-digit suffixes.
fn generate_all_share_code_seeds() -> Result<Vec<SeedInfo>> {
    let mut seeds = Vec::with_capacity(WORD_LIST.len() * 100 * 2);
    for word in WORD_LIST {
        for suffix in 0..100 {
            for prefix in ["PB", "VN"] {
                let code = format!("{prefix}-{word}{suffix:02}");
                let (sense, seed) = decode_to_seed(&code)
                    .with_context(|| format!("generated share code failed to parse: {code}"))?;
                seeds.push(SeedInfo::from_share_code(seed, sense, code));
            }
        }
    }
    Ok(seeds)
}

/// Dedupe key component: numeric seeds collapse together, coded seeds only
/// with codes for the same sense.
const fn sense_tag(sense: Option<SenseMode>) -> u8 {
    match sense {
        None => 0,
        Some(SenseMode::Probe) => 1,
        Some(SenseMode::Vision) => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(tokens: &[&str]) -> Result<Vec<SeedInfo>> {
        let owned: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        resolve_seed_inputs(&owned)
    }

    #[test]
    fn numeric_and_share_code_tokens_resolve() {
        let seeds = resolve(&["42", "-7", "pb-maze03"]).expect("valid tokens");
        assert_eq!(seeds.len(), 3);
        assert_eq!(seeds[0].seed, 42);
        assert!(seeds[0].code.is_none());
        assert_eq!(seeds[1].seed, 7);
        assert_eq!(seeds[2].code.as_deref(), Some("PB-MAZE03"));
        assert_eq!(seeds[2].source_sense, Some(SenseMode::Probe));
    }

    #[test]
    fn all_expands_the_entire_share_code_space() {
        let seeds = resolve(&["all"]).expect("expansion succeeds");
        assert_eq!(seeds.len(), WORD_LIST.len() * 100 * 2);
        assert!(seeds.iter().all(|info| info.code.is_some()));
    }

    #[test]
    fn duplicate_codes_collapse() {
        let seeds = resolve(&["PB-MAZE03", "pb-maze03", "PB-MAZE03"]).expect("valid tokens");
        assert_eq!(seeds.len(), 1);
    }

    #[test]
    fn numeric_duplicates_collapse_but_senses_stay_apart() {
        let (_, coded_seed) = decode_to_seed("VN-MAZE03").expect("valid code");
        let seeds = resolve(&[&coded_seed.to_string(), "VN-MAZE03", &coded_seed.to_string()])
            .expect("valid tokens");
        // Numeric and vision-coded entries share a value but not a role.
        assert_eq!(seeds.len(), 2);
        assert!(seeds[0].code.is_none());
        assert_eq!(seeds[1].source_sense, Some(SenseMode::Vision));
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        let err = resolve(&["definitely-not-a-seed"]).expect_err("should fail");
        assert!(err.to_string().contains("Unrecognized seed token"));
    }

    #[test]
    fn empty_input_falls_back_to_the_default_seed() {
        let seeds = resolve(&[]).expect("default applies");
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].seed, 1337);
        assert!(seeds[0].code.is_none());
    }

    #[test]
    fn coded_seeds_gate_on_their_sense() {
        let info = resolve(&["VN-MAZE03"]).expect("valid token").remove(0);
        assert!(info.matches_sense(SenseMode::Vision));
        assert!(!info.matches_sense(SenseMode::Probe));

        let numeric = SeedInfo::from_numeric(9);
        assert!(numeric.matches_sense(SenseMode::Probe));
        assert!(numeric.matches_sense(SenseMode::Vision));
    }

    #[test]
    fn share_code_for_sense_reuses_or_reencodes() {
        let info = resolve(&["PB-MAZE03"]).expect("valid token").remove(0);
        assert_eq!(info.share_code_for_sense(SenseMode::Probe), "PB-MAZE03");

        // Canonical seeds carry their word and digits in the low bits, so a
        // cross-sense re-encode keeps both under the other prefix.
        assert_eq!(info.share_code_for_sense(SenseMode::Vision), "VN-MAZE03");
    }
}
