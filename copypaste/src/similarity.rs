//! Exact Jaccard scoring and ranking shared by every store.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::SimilarityThresholds;
use crate::document::SimilarDocument;

/// Intersection size and Jaccard index of two shingle sets.
///
/// Returns `(0, 0.0)` when both sets are empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> (usize, f64) {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|shingle| large.contains(*shingle)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return (0, 0.0);
    }
    (intersection, intersection as f64 / union as f64)
}

/// Score a stored candidate against the query and apply the thresholds.
pub fn score_candidate(
    id: &str,
    query: &BTreeSet<String>,
    candidate: &BTreeSet<String>,
    thresholds: &SimilarityThresholds,
) -> Option<SimilarDocument> {
    let (abs_similarity, rel_similarity) = jaccard(query, candidate);
    thresholds.accepts(abs_similarity, rel_similarity).then(|| SimilarDocument {
        id: id.to_string(),
        abs_similarity,
        rel_similarity,
    })
}

/// Sort accepted documents by decreasing relative similarity and keep the
/// first `limit`. Equal scores are ordered by id.
pub fn rank(mut accepted: Vec<SimilarDocument>, limit: usize) -> Vec<SimilarDocument> {
    accepted.sort_by(|a, b| {
        b.rel_similarity
            .partial_cmp(&a.rel_similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    accepted.truncate(limit);
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn similar(id: &str, rel: f64) -> SimilarDocument {
        SimilarDocument { id: id.to_string(), abs_similarity: 1, rel_similarity: rel }
    }

    #[test]
    fn jaccard_of_overlapping_sets() {
        let (abs, rel) = jaccard(&set(&["a", "b", "c"]), &set(&["b", "c", "d", "e"]));
        assert_eq!(abs, 2);
        assert!((rel - 2.0 / 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_of_identical_sets_is_one() {
        let s = set(&["x", "y"]);
        assert_eq!(jaccard(&s, &s), (2, 1.0));
    }

    #[test]
    fn jaccard_of_empty_sets_is_zero() {
        assert_eq!(jaccard(&BTreeSet::new(), &BTreeSet::new()), (0, 0.0));
    }

    #[test]
    fn equal_score_is_rejected() {
        let thresholds = SimilarityThresholds::relative(0.5).unwrap();
        let query = set(&["a", "b", "c"]);
        assert!(score_candidate("1", &query, &set(&["a", "b", "c", "d", "e", "f"]), &thresholds)
            .is_none());
        assert!(score_candidate("1", &query, &set(&["a", "b", "c", "d", "e"]), &thresholds)
            .is_some());
    }

    #[test]
    fn ranks_descending_with_id_tie_break() {
        let ranked = rank(
            vec![similar("c", 0.6), similar("b", 0.9), similar("a", 0.6), similar("d", 0.7)],
            3,
        );
        let ids: Vec<_> = ranked.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a"]);
    }
}
