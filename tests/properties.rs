//! Property-based tests for the ranking, codec and sanitizing helpers.
//!
//! - cosine_similarity: bounded [-1,1], self=1, symmetric
//! - rank_top_n: deterministic, capped at min(n, |candidates|), scores non-increasing
//! - EmbeddingVector blobs: bit-exact roundtrip
//! - sanitize_field: idempotent, bounded length, no angle brackets

use proptest::prelude::*;

use taskrag::context::MAX_FIELD_CHARS;
use taskrag::{
    cosine_similarity, rank_top_n, sanitize_field, EmbeddingRecord, EmbeddingVector, RecordKind,
};

const DIM: usize = 6;

fn arb_vec(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-100.0f32..100.0, dim)
}

fn arb_nonzero_vec(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    arb_vec(dim).prop_filter("needs a nonzero norm", |v| v.iter().any(|x| x.abs() > 1e-3))
}

fn arb_finite_f32() -> impl Strategy<Value = f32> {
    any::<f32>().prop_filter("finite", |v| v.is_finite())
}

fn arb_candidates() -> impl Strategy<Value = Vec<EmbeddingRecord>> {
    proptest::collection::vec(arb_vec(DIM), 0..24).prop_map(|vectors| {
        vectors
            .into_iter()
            .enumerate()
            .filter_map(|(idx, values)| {
                EmbeddingVector::new(values).ok().map(|vector| EmbeddingRecord {
                    id: idx as i64,
                    kind: RecordKind::Task,
                    vector,
                })
            })
            .collect()
    })
}

// ────────────────────────────────────────────────────────────────────
// cosine_similarity: bounds, self, symmetry
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Cosine similarity of nonzero vectors is always in [-1, 1].
    #[test]
    fn prop_cosine_bounded(a in arb_nonzero_vec(DIM), b in arb_nonzero_vec(DIM)) {
        let sim = cosine_similarity(&a, &b).unwrap();
        prop_assert!((-1.0..=1.0).contains(&sim), "cosine sim {} out of [-1,1]", sim);
    }

    /// A nonzero vector is maximally similar to itself.
    #[test]
    fn prop_cosine_self_is_one(a in arb_nonzero_vec(DIM)) {
        let sim = cosine_similarity(&a, &a).unwrap();
        prop_assert!((sim - 1.0).abs() < 1e-9, "self similarity {}", sim);
    }

    /// Argument order does not matter.
    #[test]
    fn prop_cosine_symmetric(a in arb_vec(DIM), b in arb_vec(DIM)) {
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        prop_assert!(ab == ba || (ab - ba).abs() < 1e-12, "ab={} ba={}", ab, ba);
    }
}

// ────────────────────────────────────────────────────────────────────
// rank_top_n: determinism, cap, ordering
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Identical inputs always rank identically.
    #[test]
    fn prop_rank_deterministic(
        query in arb_vec(DIM),
        candidates in arb_candidates(),
        n in 1usize..16,
    ) {
        let query = EmbeddingVector::new(query).unwrap();
        let first = rank_top_n(&query, &candidates, n).unwrap();
        let second = rank_top_n(&query, &candidates, n).unwrap();
        prop_assert_eq!(first, second);
    }

    /// At most min(n, |candidates|) entries come back, best first.
    #[test]
    fn prop_rank_capped_and_sorted(
        query in arb_vec(DIM),
        candidates in arb_candidates(),
        n in 1usize..16,
    ) {
        let query = EmbeddingVector::new(query).unwrap();
        let ranked = rank_top_n(&query, &candidates, n).unwrap();
        prop_assert_eq!(ranked.len(), n.min(candidates.len()));
        for pair in ranked.windows(2) {
            prop_assert!(
                pair[0].score >= pair[1].score,
                "scores increase: {} then {}", pair[0].score, pair[1].score
            );
        }
    }
}

// ────────────────────────────────────────────────────────────────────
// Blob codec and field sanitizing
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Decoding an encoded vector restores every component bit for bit.
    #[test]
    fn prop_blob_roundtrip(values in proptest::collection::vec(arb_finite_f32(), 1..64)) {
        let vector = EmbeddingVector::new(values.clone()).unwrap();
        let blob = vector.to_blob();
        prop_assert_eq!(blob.len(), values.len() * 4);
        let restored = EmbeddingVector::from_blob(&blob).unwrap();
        let restored_bits: Vec<u32> = restored.as_slice().iter().map(|v| v.to_bits()).collect();
        let expected_bits: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(restored_bits, expected_bits);
    }

    /// Sanitizing twice equals sanitizing once.
    #[test]
    fn prop_sanitize_idempotent(raw in "[a-z<> \n]{0,1500}") {
        let once = sanitize_field(&raw);
        prop_assert_eq!(sanitize_field(&once), once.clone());
        prop_assert!(once.chars().count() <= MAX_FIELD_CHARS);
        prop_assert!(!once.contains('<') && !once.contains('>'));
    }

    /// Idempotence also holds for arbitrary unicode input.
    #[test]
    fn prop_sanitize_idempotent_unicode(raw in any::<String>()) {
        let once = sanitize_field(&raw);
        prop_assert_eq!(sanitize_field(&once), once);
    }
}
