//! Physical-to-logical qubit permutations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::qubit::QubitId;

/// Partial injective map from physical qubits to logical qubits.
///
/// Used both for a circuit's initial layout and for its output
/// permutation. Iteration is in ascending physical order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<(QubitId, QubitId)>", into = "Vec<(QubitId, QubitId)>")]
pub struct Permutation {
    mapping: BTreeMap<QubitId, QubitId>,
}

impl Permutation {
    /// Create an empty permutation.
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity on qubits `0..num_qubits`.
    pub fn identity(num_qubits: u32) -> Self {
        (0..num_qubits).map(|i| (QubitId(i), QubitId(i))).collect()
    }

    /// Logical qubit held by `physical`.
    pub fn get(&self, physical: QubitId) -> Option<QubitId> {
        self.mapping.get(&physical).copied()
    }

    /// Map `physical` to `logical`, returning the previous logical qubit.
    pub fn insert(&mut self, physical: QubitId, logical: QubitId) -> Option<QubitId> {
        self.mapping.insert(physical, logical)
    }

    /// Remove the entry for `physical`.
    pub fn remove(&mut self, physical: QubitId) -> Option<QubitId> {
        self.mapping.remove(&physical)
    }

    /// Whether `physical` has an entry.
    pub fn contains(&self, physical: QubitId) -> bool {
        self.mapping.contains_key(&physical)
    }

    /// Exchange the logical qubits held by two physical qubits.
    pub fn swap(&mut self, a: QubitId, b: QubitId) {
        let la = self.mapping.remove(&a);
        let lb = self.mapping.remove(&b);
        if let Some(l) = lb {
            self.mapping.insert(a, l);
        }
        if let Some(l) = la {
            self.mapping.insert(b, l);
        }
    }

    /// Number of mapped physical qubits.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Whether nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.mapping.clear();
    }

    /// Highest mapped physical qubit.
    pub fn max_physical(&self) -> Option<QubitId> {
        self.mapping.keys().next_back().copied()
    }

    /// Iterate over `(physical, logical)` pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, QubitId, QubitId> {
        self.mapping.iter()
    }

    /// Iterate over the logical qubits in the image.
    pub fn logical_qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.mapping.values().copied()
    }
}

impl FromIterator<(QubitId, QubitId)> for Permutation {
    fn from_iter<I: IntoIterator<Item = (QubitId, QubitId)>>(iter: I) -> Self {
        Self {
            mapping: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<(QubitId, QubitId)>> for Permutation {
    fn from(pairs: Vec<(QubitId, QubitId)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<Permutation> for Vec<(QubitId, QubitId)> {
    fn from(perm: Permutation) -> Self {
        perm.mapping.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Permutation {
    type Item = (&'a QubitId, &'a QubitId);
    type IntoIter = btree_map::Iter<'a, QubitId, QubitId>;

    fn into_iter(self) -> Self::IntoIter {
        self.mapping.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let perm = Permutation::identity(3);
        assert_eq!(perm.len(), 3);
        assert_eq!(perm.get(QubitId(2)), Some(QubitId(2)));
        assert_eq!(perm.max_physical(), Some(QubitId(2)));
    }

    #[test]
    fn test_swap_partial() {
        let mut perm: Permutation = [(QubitId(0), QubitId(1))].into_iter().collect();
        perm.swap(QubitId(0), QubitId(3));
        assert_eq!(perm.get(QubitId(0)), None);
        assert_eq!(perm.get(QubitId(3)), Some(QubitId(1)));
    }

    #[test]
    fn test_empty_max() {
        assert_eq!(Permutation::new().max_physical(), None);
    }
}
