use crate::types::ArticleCandidate;
use std::collections::HashSet;

/// Two candidates are the same story when their titles overlap heavily, or
/// when both title and description overlap moderately.
pub const TITLE_THRESHOLD: f64 = 0.8;
pub const COMBINED_THRESHOLD: f64 = 0.6;

/// Check if a word is a common stop word.
pub fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "the" | "and" | "or" | "but" | "in" | "on" | "at" | "to" | "for" | "of" | "with" | "by"
            | "is" | "are" | "was" | "were" | "be" | "been" | "have" | "has" | "had" | "do"
            | "does" | "did" | "will" | "would" | "could" | "should" | "may" | "might" | "must"
            | "can" | "this" | "that" | "these" | "those" | "it" | "he" | "she" | "they" | "we"
    )
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|w| w.len() > 2 && !is_stop_word(w))
        .collect()
}

/// Word-set Jaccard similarity in [0, 1]. Cheap and explainable; favors
/// precision over recall, so a same story told in very different words may
/// score low, but unrelated stories rarely score high.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let words_a = word_set(a);
    let words_b = word_set(b);

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();

    intersection as f64 / union as f64
}

/// Duplicate-detection predicate used by the merge engine.
///
/// An exact canonical-URL match is an unconditional duplicate signal
/// regardless of how the text compares.
pub fn same_story(a: &ArticleCandidate, b: &ArticleCandidate) -> bool {
    if !a.source_url.is_empty() && a.source_url == b.source_url {
        return true;
    }

    let title_similarity = similarity(&a.title, &b.title);
    if title_similarity >= TITLE_THRESHOLD {
        return true;
    }

    if title_similarity >= COMBINED_THRESHOLD {
        let description_similarity = similarity(&a.description, &b.description);
        if description_similarity >= COMBINED_THRESHOLD {
            return true;
        }
    }

    false
}
