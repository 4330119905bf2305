//! Reversible share-code scheme over a 64-word list.
//! Code format: <MODE>-<WORD><NN>, e.g., PB-COMPASS42, VN-LANTERN07

use crate::state::SenseMode;

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// Word list for share codes
pub const WORD_LIST: [&str; 64] = [
    "MAZE", "WALL", "CORNER", "DEADEND", "CORRIDR", "LANTERN", "COMPASS", "BEARING", "BACKTRK",
    "CRUMBS", "THREAD", "ARIADNE", "MINOTAR", "LABYRNT", "HEDGE", "CELLAR", "CATACMB", "TUNNEL",
    "WARREN", "BURROW", "GRID", "PROBE", "VISION", "SCOUT", "PILGRIM", "WANDER", "DRIFT",
    "RECKON", "CHART", "ATLAS", "SEXTANT", "LODESTR", "POLARIS", "BEACON", "SIGNAL", "MARKER",
    "WAYPNT", "ANCHOR", "HARBOR", "STRAIT", "FATHOM", "LEAGUE", "FURLONG", "PACES", "STRIDE",
    "ECHO", "SONAR", "RADAR", "PERISCP", "GLYPH", "RUNE", "CIPHER", "PORTAL", "ARCHWAY", "GATE",
    "TORCH", "EMBER", "NORTH", "SOUTH", "EAST", "WEST", "ROSE", "HORIZON", "SUMMIT",
];

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & 0x01FF | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    (packed & 0x01FF, ((packed >> 9) & 0x7F) as u8)
}

fn compose_seed(mode: SenseMode, word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    // Domain-separated FNV input
    let mut buf = [0u8; 10];
    buf[..6].copy_from_slice(b"DRECK-");
    buf[6] = match mode {
        SenseMode::Probe => b'P',
        SenseMode::Vision => b'V',
    };
    buf[7] = (packed & 0xFF) as u8;
    buf[8] = (packed >> 8) as u8;
    buf[9] = 0xA5;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

#[must_use]
pub fn encode_friendly(mode: SenseMode, seed: u64) -> String {
    let packed = (seed & 0xFFFF) as u16;
    let (wi, mut nn) = unpack(packed);
    let word = WORD_LIST.get(wi as usize).copied().unwrap_or("MAZE");
    if nn > 99 {
        nn %= 100;
    }
    format!("{}-{word}{nn:02}", mode.prefix())
}

/// Parse a share code back into its sense mode and seed. Unknown mode
/// prefixes are rejected rather than defaulted.
#[must_use]
pub fn decode_to_seed(code: &str) -> Option<(SenseMode, u64)> {
    let s = code.trim();
    let (m, rest) = s.split_once('-')?;
    let mode = match m.to_ascii_uppercase().as_str() {
        "PB" => SenseMode::Probe,
        "VN" => SenseMode::Vision,
        _ => return None,
    };
    if rest.len() < 3 {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    let seed = compose_seed(mode, wi, nn);
    Some((mode, seed))
}

#[must_use]
pub fn generate_code_from_entropy(mode: SenseMode, entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = ((entropy >> 17) % 100) as u8;
    let seed = compose_seed(mode, wi, nn);
    encode_friendly(mode, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrips_code() {
        let seed = 0xDEAD_BEEF_CAFE_BABE;
        let code = encode_friendly(SenseMode::Vision, seed);
        let (mode, new_seed) = decode_to_seed(&code).unwrap();
        assert_eq!(mode, SenseMode::Vision);
        assert_eq!(encode_friendly(SenseMode::Vision, new_seed), code);
    }

    #[test]
    fn pb_maze_42_stable() {
        let (mode, seed) = decode_to_seed("PB-MAZE42").unwrap();
        assert_eq!(mode, SenseMode::Probe);
        assert_eq!(encode_friendly(SenseMode::Probe, seed), "PB-MAZE42");
    }

    #[test]
    fn mode_prefix_selects_the_sense() {
        let (mode, _seed) = decode_to_seed("PB-COMPASS07").unwrap();
        assert_eq!(mode, SenseMode::Probe);
        let (mode, _seed) = decode_to_seed("VN-LANTERN99").unwrap();
        assert_eq!(mode, SenseMode::Vision);
        assert!(decode_to_seed("ZZ-COMPASS07").is_none());
        assert!(decode_to_seed("PBCOMPASS07").is_none());
    }

    #[test]
    fn same_word_different_modes_give_different_seeds() {
        let (_, probe) = decode_to_seed("PB-BEACON11").unwrap();
        let (_, vision) = decode_to_seed("VN-BEACON11").unwrap();
        assert_ne!(probe, vision);
    }

    #[test]
    fn entropy_codes_parse_back() {
        for entropy in [0_u64, 1, 0xFFFF, 0x1234_5678_9ABC_DEF0] {
            let code = generate_code_from_entropy(SenseMode::Probe, entropy);
            let (mode, seed) = decode_to_seed(&code).unwrap();
            assert_eq!(mode, SenseMode::Probe);
            assert_eq!(encode_friendly(mode, seed), code);
        }
    }
}
