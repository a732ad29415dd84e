//! Edit-distance similarity between human-typed names.
//!
//! Pure functions with no I/O. Used by the reference resolver for the
//! vendor fuzzy step and by the duplicate scanner for key normalisation.

/// Normalise a name for comparison: trim surrounding whitespace and
/// lower-case. The original casing is kept by callers for display and
/// creation.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Classic Levenshtein distance over Unicode scalar values.
///
/// Substitution, insertion, and deletion each cost 1.
pub fn distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Normalised similarity in `[0.0, 1.0]`: `(max_len - distance) / max_len`.
///
/// Two empty strings carry no information and score `0.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    (max_len - distance(a, b)) as f64 / max_len as f64
}
