//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and top-k ranking over indexed chunks.

use promptwright_core::backend::ScoredChunk;

use crate::IndexedChunk;

/// Cosine similarity between a chunk embedding and a query embedding.
///
/// `None` when the two cannot be compared: empty, or of different
/// dimensions (vectors from two different embedding models). A zero vector
/// scores `Some(0.0)`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let (dot, sq_a, sq_b) = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| (f64::from(x), f64::from(y)))
        .fold((0.0, 0.0, 0.0), |(dot, sq_a, sq_b), (x, y)| {
            (dot + x * y, sq_a + x * x, sq_b + y * y)
        });

    let norms = (sq_a * sq_b).sqrt();
    if norms < 1e-10 {
        return Some(0.0);
    }
    Some((dot / norms) as f32)
}

/// Rank chunks by cosine similarity to a query embedding.
///
/// Returns at most `limit` hits with `score >= min_score`, sorted by
/// descending similarity. Ties keep index order (the sort is stable).
/// Chunks whose dimension differs from the query are never hits.
pub fn rank_chunks(
    chunks: &[IndexedChunk],
    query_embedding: &[f32],
    limit: usize,
    min_score: f32,
) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .filter_map(|chunk| {
            let score = cosine_similarity(&chunk.embedding, query_embedding)?;
            (score >= min_score).then(|| ScoredChunk {
                content: chunk.content.clone(),
                source: chunk.source.clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}
