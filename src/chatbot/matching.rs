//! Text normalization and fuzzy question matching.
//!
//! Stored questions and user input are normalized (lowercased, accents
//! folded, punctuation stripped) and compared with a Levenshtein similarity
//! ratio. A match counts when it clears [`MATCH_THRESHOLD`].

use unicode_normalization::UnicodeNormalization;

/// Minimum similarity ratio for a stored question to answer the user.
pub const MATCH_THRESHOLD: f64 = 0.70;

/// Normalize text for matching: lowercase, fold accents to ASCII, drop
/// punctuation, and collapse whitespace.
///
/// "¿Qué es   RMU?" -> "que es rmu"
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = true; // treat start as space to trim leading
    for c in text.nfkd() {
        // NFKD decomposition puts combining marks after the base character;
        // dropping them folds "é" to "e".
        if unicode_normalization::char::is_combining_mark(c) {
            continue;
        }
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                out.push(lower);
            }
            prev_space = false;
        } else if c.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        }
        // Everything else (punctuation, symbols) is dropped.
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Levenshtein edit distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single-row formulation: O(min) space.
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, &ca) in a.iter().enumerate() {
        let mut prev_diag = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            let next = (prev_diag + cost).min(row[j] + 1).min(row[j + 1] + 1);
            prev_diag = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b.len()]
}

/// Similarity ratio in `[0.0, 1.0]` based on edit distance over the longer
/// input. Both inputs are expected to be normalized already.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(a, b) as f64 / max_len as f64)
}

/// A candidate phrase in the match index. `question_id` points at the
/// `questions` row the phrase belongs to; synonyms carry their parent's id.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub question_id: i32,
    pub normalized: String,
}

/// Result of matching user input against the index.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionMatch {
    pub question_id: i32,
    pub score: f64,
}

/// Find the best-scoring candidate above [`MATCH_THRESHOLD`], or `None`.
///
/// `input` is normalized internally; candidates are pre-normalized when the
/// index is built.
pub fn best_match(input: &str, candidates: &[MatchCandidate]) -> Option<QuestionMatch> {
    let needle = normalize_text(input);
    if needle.is_empty() {
        return None;
    }

    let mut best: Option<QuestionMatch> = None;
    for candidate in candidates {
        let score = similarity_ratio(&needle, &candidate.normalized);
        if score > MATCH_THRESHOLD && best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(QuestionMatch {
                question_id: candidate.question_id,
                score,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(items: &[(i32, &str)]) -> Vec<MatchCandidate> {
        items
            .iter()
            .map(|&(question_id, text)| MatchCandidate {
                question_id,
                normalized: normalize_text(text),
            })
            .collect()
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize_text("What are the Admission Requirements?!"),
            "what are the admission requirements"
        );
    }

    #[test]
    fn test_normalize_folds_accents() {
        assert_eq!(normalize_text("¿Qué es   RMU?"), "que es rmu");
        assert_eq!(normalize_text("Études"), "etudes");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  hostel \t fees \n "), "hostel fees");
    }

    #[test]
    fn test_similarity_identical() {
        assert_eq!(similarity_ratio("hostel fees", "hostel fees"), 1.0);
    }

    #[test]
    fn test_similarity_disjoint_is_low() {
        assert!(similarity_ratio("hostel fees", "graduation gown") < 0.3);
    }

    #[test]
    fn test_exact_match_wins() {
        let cands = candidates(&[
            (1, "What are the admission requirements?"),
            (2, "How much is the tuition?"),
        ]);
        let m = best_match("what are the admission requirements", &cands).unwrap();
        assert_eq!(m.question_id, 1);
        assert_eq!(m.score, 1.0);
    }

    #[test]
    fn test_near_miss_above_threshold() {
        let cands = candidates(&[(7, "What are the admission requirements?")]);
        // Typo plus missing word still clears 70%.
        let m = best_match("what are the admission requirments", &cands).unwrap();
        assert_eq!(m.question_id, 7);
        assert!(m.score > MATCH_THRESHOLD);
    }

    #[test]
    fn test_unrelated_input_rejected() {
        let cands = candidates(&[(1, "What are the admission requirements?")]);
        assert_eq!(best_match("do you have a swimming pool", &cands), None);
    }

    #[test]
    fn test_synonym_candidate_matches_parent_question() {
        // Synonym rows share the parent question's id.
        let cands = candidates(&[
            (3, "What are the admission requirements?"),
            (3, "entry requirements"),
        ]);
        let m = best_match("entry requirements", &cands).unwrap();
        assert_eq!(m.question_id, 3);
    }

    #[test]
    fn test_accented_input_matches_plain_candidate() {
        let cands = candidates(&[(4, "where is the universite located")]);
        assert!(best_match("Where is the université located?", &cands).is_some());
    }

    #[test]
    fn test_empty_input_never_matches() {
        let cands = candidates(&[(1, "anything")]);
        assert_eq!(best_match("?!", &cands), None);
    }
}
