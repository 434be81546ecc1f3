//! Edit-distance based "did you mean" suggestions.

/// Maximum edit distance for a candidate to be suggested.
pub const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Maximum number of candidates returned.
pub const MAX_SUGGESTIONS: usize = 3;

/// A vocabulary candidate close to the word that was looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: &'static str,
    pub distance: usize,
}

/// Levenshtein distance between two strings, counted in characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Find up to `limit` vocabulary entries within `max_distance` of `word`,
/// closest first. Comparison is case-insensitive; ties keep vocabulary order.
pub fn find_similar(
    word: &str,
    vocabulary: &[&'static str],
    max_distance: usize,
    limit: usize,
) -> Vec<Suggestion> {
    let needle = word.to_lowercase();
    let mut found: Vec<Suggestion> = vocabulary
        .iter()
        .filter_map(|candidate| {
            let distance = levenshtein(&needle, &candidate.to_lowercase());
            (distance <= max_distance && *candidate != word).then_some(Suggestion {
                text: candidate,
                distance,
            })
        })
        .collect();

    found.sort_by_key(|s| s.distance);
    found.truncate(limit);
    found
}

/// `find_similar` with the default threshold and limit, returning just the names.
pub fn suggest(word: &str, vocabulary: &[&'static str]) -> Vec<&'static str> {
    find_similar(word, vocabulary, MAX_SUGGESTION_DISTANCE, MAX_SUGGESTIONS)
        .into_iter()
        .map(|s| s.text)
        .collect()
}
