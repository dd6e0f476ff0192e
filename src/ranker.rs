//! Cosine-similarity ranking over stored embeddings.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, warn};

use crate::embeddings::{EmbeddingRecord, EmbeddingVector, RecordKind};
use crate::error::{RagError, Result};

/// Candidate that survived ranking, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    /// Identifier of the owning entity.
    pub id: i64,
    /// Category of the owning entity.
    pub kind: RecordKind,
    /// Cosine similarity in `[-1, 1]`, or `-inf` for zero-norm vectors.
    pub score: f64,
}

/// Cosine similarity between two equal-length vectors.
///
/// Accumulates in `f64` and clamps into `[-1, 1]`. Returns `NEG_INFINITY` when
/// either vector has zero norm so that such candidates always rank last.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Ok(f64::NEG_INFINITY);
    }
    Ok((dot / denom).clamp(-1.0, 1.0))
}

/// Scores every candidate against `query` and returns the best `n`.
///
/// Candidates whose length differs from the query are logged and dropped.
/// Equal scores keep their input order.
pub fn rank_top_n(
    query: &EmbeddingVector,
    candidates: &[EmbeddingRecord],
    n: usize,
) -> Result<Vec<RankedCandidate>> {
    if n == 0 {
        return Err(RagError::InvalidInput("top-n must be positive".into()));
    }
    let mut scored = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match cosine_similarity(query.as_slice(), candidate.vector.as_slice()) {
            Ok(score) => scored.push(RankedCandidate {
                id: candidate.id,
                kind: candidate.kind.clone(),
                score,
            }),
            Err(err) => warn!(id = candidate.id, error = %err, "excluding candidate"),
        }
    }
    // sort_by is stable, so ties fall back to input order.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(n);
    debug!(
        candidates = candidates.len(),
        kept = scored.len(),
        "ranked candidates"
    );
    Ok(scored)
}
