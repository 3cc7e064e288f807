//! This module holds utilities for working with share indices.
//!
//! Every share is the evaluation of a polynomial at some x-coordinate, and
//! those coordinates are what identify shares when combining them.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::ShareError,
    field::{Field, FieldElement},
};

/// The x-coordinate at which a share was evaluated.
///
/// Index 0 is never valid, since evaluating there would hand out the secret itself.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ShareIndex(u32);

impl ShareIndex {
    pub fn new(index: u32) -> Result<Self, ShareError> {
        if index == 0 {
            return Err(ShareError::InvalidIndex);
        }
        Ok(Self(index))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// This index as an element of some field.
    pub fn to_element(self, field: &Field) -> FieldElement {
        field.from_u64(self.0.into())
    }
}

impl TryFrom<u32> for ShareIndex {
    type Error = ShareError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShareIndex> for u32 {
    fn from(value: ShareIndex) -> Self {
        value.0
    }
}

impl fmt::Debug for ShareIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareIndex({})", self.0)
    }
}

impl fmt::Display for ShareIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Represents a sorted list of distinct share indices.
///
/// Everybody agrees on the order, so iterating over the list is deterministic
/// regardless of the order shares were handed to us in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexList {
    indices: Vec<ShareIndex>,
}

impl IndexList {
    /// Create a list from a slice of indices.
    ///
    /// This fails if any index appears twice.
    pub fn new(indices: &[ShareIndex]) -> Result<Self, ShareError> {
        let mut out = indices.to_owned();
        out.sort();
        if let Some(w) = out.windows(2).find(|w| w[0] == w[1]) {
            return Err(ShareError::DuplicateShareIndex(w[0].get()));
        }
        Ok(Self { indices: out })
    }

    /// The list `1, 2, ..., total`.
    pub fn first(total: u32) -> Self {
        Self {
            indices: (1..=total).map(ShareIndex).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: ShareIndex) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = ShareIndex> + '_ {
        self.indices.iter().copied()
    }

    /// Get the lagrange coefficient for an index, relative to this list, evaluated at `x`.
    ///
    /// That is `Π_{j != i} (x - x_j) * (x_i - x_j)^-1`, with one inversion per pair.
    /// A zero denominator means two indices collide in this field, and fails
    /// instead of producing a wrong coefficient.
    pub fn lagrange_at(
        &self,
        field: &Field,
        index: ShareIndex,
        x: &FieldElement,
    ) -> Result<FieldElement, ShareError> {
        let x_i = index.to_element(field);
        let mut acc = field.one();
        for j in self.iter().filter(|j| *j != index) {
            let x_j = j.to_element(field);
            let num = field.sub(x, &x_j)?;
            let den = field.sub(&x_i, &x_j)?;
            if den.is_zero() {
                return Err(ShareError::DuplicateShareIndex(index.get()));
            }
            let term = field.mul(&num, &field.inverse(&den)?)?;
            acc = field.mul(&acc, &term)?;
        }
        Ok(acc)
    }

    /// Get the lagrange coefficient for an index, evaluated at zero.
    pub fn lagrange(&self, field: &Field, index: ShareIndex) -> Result<FieldElement, ShareError> {
        self.lagrange_at(field, index, &field.zero())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bigint::BigUint;

    fn indices(xs: &[u32]) -> Vec<ShareIndex> {
        xs.iter().map(|x| ShareIndex::new(*x).unwrap()).collect()
    }

    #[test]
    fn test_zero_index_is_invalid() {
        assert_eq!(ShareIndex::new(0), Err(ShareError::InvalidIndex));
        assert!(ShareIndex::try_from(0u32).is_err());
        assert_eq!(ShareIndex::new(3).unwrap().get(), 3);
    }

    #[test]
    fn test_list_is_sorted_and_rejects_duplicates() {
        let list = IndexList::new(&indices(&[3, 1, 2])).unwrap();
        assert_eq!(list.iter().map(ShareIndex::get).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(list.contains(ShareIndex::new(2).unwrap()));
        assert!(!list.contains(ShareIndex::new(4).unwrap()));
        assert_eq!(
            IndexList::new(&indices(&[1, 5, 5])),
            Err(ShareError::DuplicateShareIndex(5))
        );
        assert_eq!(list, IndexList::first(3));
    }

    #[test]
    fn test_lagrange_coefficients_sum_to_one() {
        // Interpolating the constant polynomial 1 must give 1 anywhere.
        let field = Field::new(BigUint::from_u64(101)).unwrap();
        let list = IndexList::new(&indices(&[1, 4, 9, 16])).unwrap();
        for x in [0, 2, 77] {
            let x = field.from_u64(x);
            let mut sum = field.zero();
            for i in list.iter() {
                sum = field.add(&sum, &list.lagrange_at(&field, i, &x).unwrap()).unwrap();
            }
            assert!(sum.is_one());
        }
    }

    #[test]
    fn test_lagrange_at_zero_small() {
        // For {1, 2}: L_1(0) = 2, L_2(0) = -1.
        let field = Field::new(BigUint::from_u64(7)).unwrap();
        let list = IndexList::first(2);
        let one = ShareIndex::new(1).unwrap();
        let two = ShareIndex::new(2).unwrap();
        assert_eq!(list.lagrange(&field, one).unwrap(), field.from_u64(2));
        assert_eq!(list.lagrange(&field, two).unwrap(), field.from_u64(6));
    }

    #[test]
    fn test_colliding_indices_fail() {
        // 1 and 8 are the same point modulo 7.
        let field = Field::new(BigUint::from_u64(7)).unwrap();
        let list = IndexList::new(&indices(&[1, 8])).unwrap();
        assert!(matches!(
            list.lagrange(&field, ShareIndex::new(1).unwrap()),
            Err(ShareError::DuplicateShareIndex(1))
        ));
    }
}
