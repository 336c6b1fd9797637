// Fuzzy name-matching service
//
// Pure scoring logic shared by the column mapper and the image enrichment
// engine, decoupled from spreadsheet and HTTP concerns.

use strsim::normalized_levenshtein;

/// Best-scoring candidate picked from a list of choices.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    /// Index of the winning choice in the input slice
    pub index: usize,
    /// The winning choice itself
    pub choice: String,
    /// Similarity score in [0, 100]
    pub score: f64,
}

/// Canonical comparison key: lowercase, alphanumeric tokens, sorted.
///
/// Sorting the tokens makes the ratio insensitive to word order, so
/// "Butter Amul 500g" and "Amul Butter 500g" compare as equal.
fn token_sort_key(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Token-order-insensitive similarity between two strings, in [0, 100].
///
/// Edit-distance based: no stemming or semantic matching, just a normalized
/// Levenshtein ratio over the sorted-token forms.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let key_a = token_sort_key(a);
    let key_b = token_sort_key(b);
    if key_a.is_empty() && key_b.is_empty() {
        return 100.0;
    }
    if key_a.is_empty() || key_b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(&key_a, &key_b) * 100.0
}

/// Find the single best-scoring choice for a query.
///
/// Returns `None` when `choices` is empty; ties resolve to the earliest
/// choice so results are deterministic across runs.
pub fn extract_one(query: &str, choices: &[String]) -> Option<BestMatch> {
    let mut best: Option<BestMatch> = None;
    for (index, choice) in choices.iter().enumerate() {
        let score = token_sort_ratio(query, choice);
        let better = match &best {
            Some(current) => score > current.score,
            None => true,
        };
        if better {
            best = Some(BestMatch {
                index,
                choice: choice.clone(),
                score,
            });
        }
    }
    best
}
