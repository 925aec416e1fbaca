use crate::similarity::same_story;
use crate::types::ArticleCandidate;
use std::collections::HashSet;
use tracing::{debug, info};

/// Quality heuristic used to pick a winner among near-duplicates. Longer
/// content and descriptions, a validated image, and a stronger provider all
/// count toward the score.
pub fn quality_score(candidate: &ArticleCandidate) -> f64 {
    let content_len = candidate.body.as_deref().map(str::len).unwrap_or(0);
    content_len as f64 / 100.0
        + candidate.description.len() as f64 / 50.0
        + if candidate.image_url.is_some() { 2.0 } else { 0.0 }
        + candidate.provider.weight()
}

/// True when `challenger` strictly beats `incumbent`. Equal scores keep the
/// incumbent, so first-seen wins ties. The newer of the pair gets a small
/// recency edge.
fn beats(challenger: &ArticleCandidate, incumbent: &ArticleCandidate) -> bool {
    let mut challenger_score = quality_score(challenger);
    let mut incumbent_score = quality_score(incumbent);

    if challenger.published_at > incumbent.published_at {
        challenger_score += 1.0;
    } else if incumbent.published_at > challenger.published_at {
        incumbent_score += 1.0;
    }

    challenger_score > incumbent_score
}

/// Partition the full per-cycle candidate pool into duplicate-equivalence
/// groups and keep one winner per group, sorted newest-published-first.
///
/// Comparison is O(n²) over the pool, which is fine at the low hundreds of
/// candidates a cycle produces. If pools ever grow unbounded, a pre-pass
/// bucketing candidates by their leading significant word would cut the
/// pairwise work; not needed today.
pub fn merge(pool: Vec<ArticleCandidate>) -> Vec<ArticleCandidate> {
    let total = pool.len();
    let mut canonical: Vec<ArticleCandidate> = Vec::new();
    let mut seen_titles: HashSet<String> = HashSet::new();

    for candidate in pool {
        let normalized_title = candidate.title.trim().to_lowercase();

        // Exact-title fast path: byte-identical titles never need the
        // pairwise pass, and the incumbent keeps its slot.
        if seen_titles.contains(&normalized_title) {
            debug!("Dropping exact-title duplicate: {}", candidate.title);
            continue;
        }

        let mut duplicate = false;
        for existing in canonical.iter_mut() {
            if same_story(&candidate, existing) {
                duplicate = true;
                if beats(&candidate, existing) {
                    debug!(
                        "Replacing \"{}\" ({}) with \"{}\" ({})",
                        existing.title,
                        existing.provider.label(),
                        candidate.title,
                        candidate.provider.label()
                    );
                    seen_titles.insert(normalized_title.clone());
                    *existing = candidate.clone();
                }
                break;
            }
        }

        if !duplicate {
            seen_titles.insert(normalized_title);
            canonical.push(candidate);
        }
    }

    canonical.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    info!(
        "Merged {} candidates into {} canonical stories",
        total,
        canonical.len()
    );
    canonical
}
