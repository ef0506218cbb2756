use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Token-set overlap ratio in `0..=100`, rounded to the nearest integer.
///
/// Tokens shared by both sides are compared against each side's full token
/// set, so a string whose tokens are a subset of the other's scores 100.
/// Either side being empty scores 0.
pub fn token_set_ratio(left: &str, right: &str) -> u8 {
    let left_tokens = left.split_whitespace().collect::<BTreeSet<&str>>();
    let right_tokens = right.split_whitespace().collect::<BTreeSet<&str>>();
    if left_tokens.is_empty() || right_tokens.is_empty() {
        return 0;
    }

    let shared = left_tokens
        .intersection(&right_tokens)
        .copied()
        .collect::<Vec<&str>>();
    let left_only = left_tokens
        .difference(&right_tokens)
        .copied()
        .collect::<Vec<&str>>();
    let right_only = right_tokens
        .difference(&left_tokens)
        .copied()
        .collect::<Vec<&str>>();

    if !shared.is_empty() && (left_only.is_empty() || right_only.is_empty()) {
        return 100;
    }

    let shared_joined = shared.join(" ");
    let left_combined = join_nonempty(&shared_joined, &left_only.join(" "));
    let right_combined = join_nonempty(&shared_joined, &right_only.join(" "));

    let mut best = indel_ratio(&left_combined, &right_combined);
    if !shared_joined.is_empty() {
        best = best
            .max(indel_ratio(&shared_joined, &left_combined))
            .max(indel_ratio(&shared_joined, &right_combined));
    }

    best.round().clamp(0.0, 100.0) as u8
}

/// Character-level indel similarity in `0.0..=100.0`: `100 * 2·LCS / (|a| + |b|)`.
pub fn indel_ratio(left: &str, right: &str) -> f64 {
    if left.is_empty() && right.is_empty() {
        return 100.0;
    }
    100.0 * rapidfuzz::fuzz::ratio(left.chars(), right.chars())
}

fn join_nonempty(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{head} {tail}"),
    }
}

/// Sparse, L2-normalized TF-IDF vector: `(term index, weight)` sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

/// Tokens of two or more alphanumeric characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|character: char| !character.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Fits a TF-IDF space over `texts` and returns one vector per text, in
/// order. Returns `None` when no text contributes a single token.
///
/// Weights are raw term counts times a smoothed idf,
/// `ln((1 + n) / (1 + df)) + 1`, and every vector is scaled to unit length.
pub fn tfidf_vectors(texts: &[&str]) -> Option<Vec<SparseVector>> {
    let mut vocabulary = HashMap::<String, usize>::new();
    let mut counts = Vec::<HashMap<usize, usize>>::with_capacity(texts.len());

    for text in texts {
        let mut term_counts = HashMap::<usize, usize>::new();
        for token in tokenize(text) {
            let next_index = vocabulary.len();
            let index = *vocabulary.entry(token).or_insert(next_index);
            *term_counts.entry(index).or_insert(0) += 1;
        }
        counts.push(term_counts);
    }

    if vocabulary.is_empty() {
        return None;
    }

    let mut document_frequency = vec![0_usize; vocabulary.len()];
    for term_counts in &counts {
        for index in term_counts.keys() {
            document_frequency[*index] += 1;
        }
    }

    let n = texts.len() as f64;
    let idf = document_frequency
        .iter()
        .map(|df| ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0)
        .collect::<Vec<f64>>();

    let vectors = counts
        .into_iter()
        .map(|term_counts| {
            let mut vector = term_counts
                .into_iter()
                .map(|(index, count)| (index, count as f64 * idf[index]))
                .collect::<SparseVector>();
            vector.sort_by_key(|(index, _)| *index);
            normalize_sparse(&mut vector);
            vector
        })
        .collect();

    Some(vectors)
}

/// Dot product of two unit vectors, clamped to `0.0..=1.0`.
pub fn cosine_similarity(left: &SparseVector, right: &SparseVector) -> f64 {
    let (mut left_pos, mut right_pos) = (0, 0);
    let mut dot = 0.0_f64;

    while left_pos < left.len() && right_pos < right.len() {
        let (left_index, left_weight) = left[left_pos];
        let (right_index, right_weight) = right[right_pos];
        match left_index.cmp(&right_index) {
            Ordering::Less => left_pos += 1,
            Ordering::Greater => right_pos += 1,
            Ordering::Equal => {
                dot += left_weight * right_weight;
                left_pos += 1;
                right_pos += 1;
            }
        }
    }

    dot.clamp(0.0, 1.0)
}

fn normalize_sparse(vector: &mut SparseVector) {
    let norm = vector
        .iter()
        .map(|(_, weight)| weight * weight)
        .sum::<f64>()
        .sqrt();
    if norm <= 0.0 {
        return;
    }
    for (_, weight) in vector.iter_mut() {
        *weight /= norm;
    }
}
