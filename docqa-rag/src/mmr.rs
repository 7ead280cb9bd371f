//! Maximal Marginal Relevance (MMR) for diversity-aware retrieval.
//!
//! MMR picks results one at a time, each maximizing
//! `λ × sim(query, doc) − (1 − λ) × max(sim(doc, already_selected))`.
//!
//! λ = 1.0: pure relevance (plain similarity ordering)
//! λ = 0.5: balanced relevance and diversity
//! λ = 0.0: pure diversity

use crate::document::{Candidate, SearchResult};
use crate::inmemory::cosine_similarity;

/// Select `k` candidates by MMR. Candidates keep their original relevance
/// score; the returned order is the selection order.
pub fn mmr_select(query: &[f32], candidates: Vec<Candidate>, k: usize, lambda: f32) -> Vec<SearchResult> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let k = k.min(candidates.len());
    let relevance: Vec<f32> =
        candidates.iter().map(|c| cosine_similarity(query, &c.embedding)).collect();

    let mut remaining: Vec<(Candidate, f32)> = candidates.into_iter().zip(relevance).collect();
    let mut selected: Vec<Candidate> = Vec::with_capacity(k);

    while selected.len() < k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, (candidate, relevance)) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|s| cosine_similarity(&candidate.embedding, &s.embedding))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda * relevance - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }

        let (best, _) = remaining.remove(best_idx);
        selected.push(best);
    }

    selected.into_iter().map(|c| c.result).collect()
}
