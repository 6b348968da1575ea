use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize text for keyword and pattern matching: lowercase, trim,
/// NFD-decompose and drop combining marks so accented and unaccented
/// spellings compare equal ("amanhã" == "amanha"). Idempotent.
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}
