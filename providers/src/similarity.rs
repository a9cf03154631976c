//! Vector similarity math used by the bundled stores.

use ordered_float::OrderedFloat;

use crate::error::{ProviderError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(ProviderError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (magnitude_a * magnitude_b))
}

/// Cosine distance, `1 - cosine_similarity`, never negative.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    Ok((1.0 - cosine_similarity(a, b)?).max(0.0))
}

/// Rank candidates by ascending cosine distance to `query`, keeping at most `k`.
///
/// Returns `(index, distance)` pairs into `candidates`. Ties keep insertion order.
pub fn nearest<'a>(
    query: &[f32],
    candidates: impl IntoIterator<Item = &'a [f32]>,
    k: usize,
) -> Result<Vec<(usize, f32)>> {
    let mut scored: Vec<(OrderedFloat<f32>, usize)> = Vec::new();

    for (i, embedding) in candidates.into_iter().enumerate() {
        let distance = cosine_distance(query, embedding)?;
        scored.push((OrderedFloat(distance), i));
    }

    scored.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    Ok(scored
        .into_iter()
        .take(k)
        .map(|(distance, i)| (i, distance.0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        let distance = cosine_distance(&a, &b).unwrap();
        assert!((distance - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_distance(&a, &b).is_err());
    }

    #[test]
    fn test_nearest_orders_ascending() {
        let query = vec![1.0, 0.0, 0.0];
        let candidates = [
            vec![0.0, 1.0, 0.0], // distance 1.0
            vec![1.0, 0.0, 0.0], // distance 0.0
            vec![0.7, 0.7, 0.0], // distance ~0.29
        ];

        let ranked = nearest(&query, candidates.iter().map(Vec::as_slice), 2).unwrap();
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![1, 2]);
        assert!(ranked[0].1 < ranked[1].1);
    }
}
