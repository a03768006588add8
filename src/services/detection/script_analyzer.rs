// Script Analyzer
// Script composition and core-letter density over raw text

use crate::models::ScriptRatios;

/// Devanagari block, inclusive.
pub const DEVANAGARI_RANGE: (u32, u32) = (0x0900, 0x097F);

#[inline]
pub fn in_range(c: char, range: (u32, u32)) -> bool {
    let cp = c as u32;
    cp >= range.0 && cp <= range.1
}

#[inline]
pub fn is_devanagari(c: char) -> bool {
    in_range(c, DEVANAGARI_RANGE)
}

/// Classify every character as target script, ASCII Latin letter, or other.
/// Ratios are over the total character count; empty text yields all zeros.
pub fn script_ratios(text: &str, target_range: (u32, u32)) -> ScriptRatios {
    let mut total = 0usize;
    let mut target = 0usize;
    let mut latin = 0usize;

    for c in text.chars() {
        total += 1;
        if in_range(c, target_range) {
            target += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }

    if total == 0 {
        return ScriptRatios::default();
    }

    let total = total as f64;
    let target_script = target as f64 / total;
    let latin_script = latin as f64 / total;
    ScriptRatios {
        target_script,
        latin_script,
        other: (total - target as f64 - latin as f64) / total,
    }
}

/// Fraction of target-script characters that belong to `core_letters`.
/// Zero when the text has no target-script characters.
pub fn target_char_density(text: &str, core_letters: &str, target_range: (u32, u32)) -> f64 {
    let mut in_script = 0usize;
    let mut core = 0usize;

    for c in text.chars() {
        if in_range(c, target_range) {
            in_script += 1;
        }
        if core_letters.contains(c) {
            core += 1;
        }
    }

    if in_script == 0 {
        return 0.0;
    }
    core as f64 / in_script as f64
}
