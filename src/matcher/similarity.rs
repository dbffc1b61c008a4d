use std::collections::HashSet;

use super::normalize::normalize;

/// Score floor applied when one normalized name contains the other.
pub const CONTAINMENT_FLOOR: f64 = 0.6;

const MIN_WORD_CHARS: usize = 2;
const MIN_CONTAINMENT_CHARS: usize = 3;

fn bigrams(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Dice-Sørensen coefficient over distinct character bigrams of two already-normalized strings.
fn dice(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.chars().count() < 2 || b.chars().count() < 2 {
        return 0.0;
    }

    let left = bigrams(a);
    let right = bigrams(b);
    let intersection = left.intersection(&right).count() as f64;

    2.0 * intersection / (left.len() + right.len()) as f64
}

/// Character-level Dice-Sørensen similarity of two raw strings.
pub fn bigram_similarity(a: &str, b: &str) -> f64 {
    dice(&normalize(a), &normalize(b))
}

/// Average over the query's words of the best length-penalized Dice score against any
/// candidate word.
///
/// The mean is taken over the query's words only, so extra words in the candidate (brand,
/// package size) do not lower the score.
pub fn word_similarity(query: &str, candidate: &str) -> f64 {
    let query = normalize(query);
    let candidate = normalize(candidate);

    let query_words = significant_words(&query);
    let candidate_words = significant_words(&candidate);
    if query_words.is_empty() || candidate_words.is_empty() {
        return 0.0;
    }

    let total: f64 = query_words
        .iter()
        .map(|&(word, word_len)| {
            candidate_words
                .iter()
                .map(|&(other, other_len)| {
                    let ratio = word_len.min(other_len) as f64 / word_len.max(other_len) as f64;
                    dice(word, other) * (0.5 + 0.5 * ratio)
                })
                .fold(0.0, f64::max)
        })
        .sum();

    total / query_words.len() as f64
}

fn significant_words(normalized: &str) -> Vec<(&str, usize)> {
    normalized
        .split(' ')
        .map(|word| (word, word.chars().count()))
        .filter(|&(_, len)| len >= MIN_WORD_CHARS)
        .collect()
}

/// True when one normalized string is a substring of the other, unless both are shorter than
/// three characters.
pub fn contains_match(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    if a.chars().count() < MIN_CONTAINMENT_CHARS && b.chars().count() < MIN_CONTAINMENT_CHARS {
        return false;
    }
    b.contains(a.as_str()) || a.contains(b.as_str())
}

/// Combined score of a shopping-list item against a promotional product name.
pub fn match_score(item: &str, candidate: &str) -> f64 {
    let score = bigram_similarity(item, candidate).max(word_similarity(item, candidate));
    if contains_match(item, candidate) {
        score.max(CONTAINMENT_FLOOR)
    } else {
        score
    }
}
