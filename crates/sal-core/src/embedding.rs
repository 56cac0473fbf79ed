use std::collections::HashMap;

use crate::error::{CoreError, Result};
use crate::vector::average;

/// Token → vector mapping with a single shared dimensionality.
///
/// Vectors are stored at reduced precision (`f32`) and widened to `f64`
/// whenever they take part in arithmetic. The first inserted vector fixes
/// the dimension; later inserts of a different length are rejected.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingTable {
    vectors: HashMap<String, Vec<f32>>,
    dimension: Option<usize>,
}

impl EmbeddingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`. Returns true if an existing entry was replaced.
    pub fn insert(&mut self, key: impl Into<String>, vector: Vec<f32>) -> Result<bool> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(CoreError::InvalidKey(key));
        }
        match self.dimension {
            Some(expected) if expected != vector.len() => {
                return Err(CoreError::DimensionMismatch {
                    expected,
                    found: vector.len(),
                });
            }
            Some(_) => {}
            None => self.dimension = Some(vector.len()),
        }
        Ok(self.vectors.insert(key, vector).is_some())
    }

    /// Exact-key lookup, no case folding.
    pub fn get(&self, key: &str) -> Option<&[f32]> {
        self.vectors.get(key).map(Vec::as_slice)
    }

    /// Case-fold `word` and look it up, widened to full precision.
    pub fn resolve(&self, word: &str) -> Option<Vec<f64>> {
        self.get(&word.to_lowercase())
            .map(|v| v.iter().map(|&x| f64::from(x)).collect())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Shared vector length, `None` until the first insert.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

impl TryFrom<Vec<(&str, Vec<f32>)>> for EmbeddingTable {
    type Error = CoreError;

    fn try_from(entries: Vec<(&str, Vec<f32>)>) -> Result<Self> {
        let mut table = Self::new();
        for (key, vector) in entries {
            table.insert(key, vector)?;
        }
        Ok(table)
    }
}

/// Average vector of every word that resolves; `Ok(None)` if none do.
pub fn average_of_words<S: AsRef<str>>(
    words: &[S],
    table: &EmbeddingTable,
) -> Result<Option<Vec<f64>>> {
    let resolved: Vec<Vec<f64>> = words
        .iter()
        .filter_map(|w| table.resolve(w.as_ref()))
        .collect();
    average(&resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EmbeddingTable {
        EmbeddingTable::try_from(vec![
            ("cat", vec![1.0, 0.0]),
            ("dog", vec![0.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_case_folds() {
        let t = table();
        assert_eq!(t.resolve("CAT"), Some(vec![1.0, 0.0]));
        assert_eq!(t.resolve("Dog"), Some(vec![0.0, 1.0]));
        assert_eq!(t.resolve("bird"), None);
    }

    #[test]
    fn test_get_is_exact() {
        let t = table();
        assert!(t.get("cat").is_some());
        assert!(t.get("Cat").is_none());
    }

    #[test]
    fn test_insert_overwrites() {
        let mut t = table();
        assert!(t.insert("cat", vec![0.5, 0.5]).unwrap());
        assert_eq!(t.resolve("cat"), Some(vec![0.5, 0.5]));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_insert_rejects_dimension_mismatch() {
        let mut t = table();
        let err = t.insert("bird", vec![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            CoreError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
        assert!(!t.contains("bird"));
    }

    #[test]
    fn test_insert_rejects_blank_key() {
        let mut t = EmbeddingTable::new();
        assert!(matches!(t.insert("  ", vec![1.0]), Err(CoreError::InvalidKey(_))));
        assert_eq!(t.dimension(), None);
    }

    #[test]
    fn test_average_of_words_skips_unknown() {
        let t = table();
        let avg = average_of_words(&["cat", "unknown", "DOG"], &t).unwrap().unwrap();
        assert_eq!(avg, vec![0.5, 0.5]);
    }

    #[test]
    fn test_average_of_words_none_resolve() {
        let t = table();
        assert_eq!(average_of_words(&["x", "y"], &t).unwrap(), None);
        let empty: [&str; 0] = [];
        assert_eq!(average_of_words(&empty, &t).unwrap(), None);
    }
}
