//! Reciprocal Rank Fusion of two ranked candidate lists.
//!
//! Vector similarity scores and lexical relevance scores live on
//! incomparable scales, so fusion uses rank position only: the document at
//! rank `r` (0-indexed) of a list contributes `1 / (k_const + r + 1)` to its
//! accumulated score, and documents present in both lists sum both
//! contributions. The result is scale-invariant regardless of how either
//! retriever scores.

use std::collections::HashMap;

use crate::search::Candidate;

/// Rank-smoothing constant; larger values flatten the rank curve.
pub const DEFAULT_RRF_K: usize = 60;

/// Merge two ranked lists into one, deduplicated by document id and sorted
/// descending by fused score.
///
/// The first occurrence of a document supplies its representation (title,
/// description, cover image); the `score` field is always overwritten with
/// the fused value. Ties keep input encounter order (the sort is stable), so
/// the output is fully deterministic for fixed inputs.
///
/// Pure function, no I/O.
pub fn reciprocal_rank_fusion(
    list_a: &[Candidate],
    list_b: &[Candidate],
    k_const: usize,
) -> Vec<Candidate> {
    // Encounter-ordered accumulator; the map only locates slots so the
    // output never depends on hash iteration order.
    let mut fused: Vec<Candidate> = Vec::with_capacity(list_a.len() + list_b.len());
    let mut slots: HashMap<String, usize> = HashMap::new();

    for list in [list_a, list_b] {
        for (rank, candidate) in list.iter().enumerate() {
            let contribution = 1.0 / (k_const as f64 + rank as f64 + 1.0);
            match slots.get(&candidate.id) {
                Some(&slot) => fused[slot].score += contribution,
                None => {
                    slots.insert(candidate.id.clone(), fused.len());
                    let mut entry = candidate.clone();
                    entry.score = contribution;
                    fused.push(entry);
                }
            }
        }
    }

    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    fused
}
