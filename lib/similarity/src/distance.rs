//! Distance and similarity functions for column values
//!
//! String functions return a similarity score in range [0.0, 1.0] where 1.0
//! means identical. [`numeric_distance`] returns a raw distance which the
//! measure normalizes into the same scale.

use ahash::AHashSet;
use matchdep_core::Value;

/// Absolute difference of two numeric values of the same type
///
/// Returns `None` when the difference cannot be represented: integer overflow
/// or a non-finite float result. Mixed or non-numeric arguments also give `None`.
pub fn numeric_distance(a: &Value, b: &Value) -> Option<f64> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.checked_sub(*y)?.checked_abs().map(|d| d as f64),
        (Value::Double(x), Value::Double(y)) => {
            let d = (x.0 - y.0).abs();
            d.is_finite().then_some(d)
        }
        _ => None,
    }
}

/// Levenshtein similarity: `1 - lev(a, b) / max(|a|, |b|)` over chars
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

/// Edit distance with a single rolling row
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ca != cb);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diag + cost);
            diag = above;
        }
    }
    row[b.len()]
}

/// Jaro similarity
///
/// Matching characters must lie within `max(|a|, |b|) / 2 - 1` positions of
/// each other; half the out-of-order matches count as transpositions.
pub fn jaro_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    jaro(&a, &b)
}

fn jaro(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(b.len());
        for j in start..end {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut transpositions = 0usize;
    let mut k = 0;
    for (i, ca) in a.iter().enumerate() {
        if !a_matched[i] {
            continue;
        }
        while !b_matched[k] {
            k += 1;
        }
        if *ca != b[k] {
            transpositions += 1;
        }
        k += 1;
    }

    let m = matches as f64;
    let t = (transpositions / 2) as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0
}

/// Jaro-Winkler similarity with prefix bonus (scale 0.1, prefix up to 4 chars)
pub fn jaro_winkler_similarity(a: &str, b: &str) -> f64 {
    const SCALING_FACTOR: f64 = 0.1;
    const MAX_PREFIX_LENGTH: usize = 4;

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let jaro = jaro(&a, &b);

    let prefix_len = a
        .iter()
        .zip(b.iter())
        .take(MAX_PREFIX_LENGTH)
        .take_while(|(x, y)| x == y)
        .count();

    (jaro + prefix_len as f64 * SCALING_FACTOR * (1.0 - jaro)).min(1.0)
}

/// Jaccard similarity between lowercase whitespace token sets
pub fn token_jaccard_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: AHashSet<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let tokens_b: AHashSet<String> = b.split_whitespace().map(str::to_lowercase).collect();
    jaccard(&tokens_a, &tokens_b)
}

/// Jaccard similarity between padded character trigram sets
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let trigrams_a = generate_trigrams(&a.to_lowercase());
    let trigrams_b = generate_trigrams(&b.to_lowercase());
    jaccard(&trigrams_a, &trigrams_b)
}

fn jaccard(a: &AHashSet<String>, b: &AHashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Character trigrams of `s` padded with two spaces on each side
fn generate_trigrams(s: &str) -> AHashSet<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();
    chars.windows(3).map(|w| w.iter().collect::<String>()).collect()
}
