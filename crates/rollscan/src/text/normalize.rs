//! Comparison-stable normalization for OCR-recognized Bengali text.
//!
//! This is deliberately a fixed removal set, not general Unicode
//! normalization: the characters stripped here are the ones tesseract
//! routinely confuses or inserts when reading scanned electoral rolls, and
//! removing them makes fuzzy scores stable across those artifacts.

/// Characters removed before any comparison.
///
/// Visarga (U+0983) and virama/hasanta (U+09CD) are the diacritics OCR most
/// often drops or duplicates; the danda (U+0964) is sentence-final
/// punctuation; literal spaces go so that spacing glitches inside a name
/// cannot affect the score.
const STRIP_SET: [char; 4] = ['\u{0983}', '\u{09CD}', '\u{0964}', ' '];

/// Canonicalize text for fuzzy comparison.
///
/// Total and pure: never fails, output depends only on the input. The output
/// is never longer than the input, and an empty input yields an empty output.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !STRIP_SET.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}
