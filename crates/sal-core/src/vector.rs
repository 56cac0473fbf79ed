use std::collections::HashSet;

use crate::error::{CoreError, Result};

fn check_dimension(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(CoreError::DimensionMismatch { expected, found })
    }
}

/// Sum of element-wise products. Errors on length mismatch.
pub fn dot(a: &[f64], b: &[f64]) -> Result<f64> {
    check_dimension(a.len(), b.len())?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Euclidean norm.
pub fn magnitude(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity in [-1, 1].
/// Degenerate inputs (empty, zero-magnitude, or mismatched lengths) yield 0:
/// "no relation" rather than a numeric fault.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    let Ok(product) = dot(a, b) else {
        return 0.0;
    };
    (product / (mag_a * mag_b)).clamp(-1.0, 1.0)
}

/// Element-wise mean. `Ok(None)` for an empty list, `Err` if lengths disagree.
pub fn average<V: AsRef<[f64]>>(vectors: &[V]) -> Result<Option<Vec<f64>>> {
    let Some(first) = vectors.first() else {
        return Ok(None);
    };
    let dim = first.as_ref().len();
    let mut sum = vec![0.0f64; dim];
    for v in vectors {
        let v = v.as_ref();
        check_dimension(dim, v.len())?;
        for (acc, x) in sum.iter_mut().zip(v) {
            *acc += x;
        }
    }
    let count = vectors.len() as f64;
    for acc in &mut sum {
        *acc /= count;
    }
    Ok(Some(sum))
}

/// Jaccard overlap of two token lists treated as sets: |A ∩ B| / |A ∪ B|.
pub fn jaccard_overlap<S: AsRef<str>>(tokens_a: &[S], tokens_b: &[S]) -> f64 {
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let set_a: HashSet<&str> = tokens_a.iter().map(AsRef::as_ref).collect();
    let set_b: HashSet<&str> = tokens_b.iter().map(AsRef::as_ref).collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}
