//! Name folding for accent- and case-insensitive matching

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a place name for comparison.
///
/// Lowercases, strips diacritics, turns punctuation into spaces and collapses
/// whitespace: `"  Ñuñoa "` and `"nunoa"` fold to the same key.
pub fn fold_name(raw: &str) -> String {
    let stripped: String = raw
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
