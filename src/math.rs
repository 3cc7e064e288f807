use std::ops::Index;

use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    bigint::BigUint,
    error::{FieldError, ShareError},
    field::{Field, FieldElement},
    participants::{IndexList, ShareIndex},
};

/// Represents a polynomial with coefficients in some field.
///
/// The coefficients are wiped when the polynomial is dropped.
#[derive(Debug, Clone)]
pub struct Polynomial {
    /// The coefficients of our polynomial, from 0..size-1.
    coefficients: Vec<FieldElement>,
}

impl Polynomial {
    /// Extend a constant to a random polynomial of a certain size.
    ///
    /// This is useful if you want the polynomial to have a certain value, but
    /// otherwise be random.
    pub fn extend_random(
        rng: &mut impl CryptoRngCore,
        field: &Field,
        size: usize,
        constant: &FieldElement,
    ) -> Self {
        let mut coefficients = Vec::with_capacity(size);
        coefficients.push(constant.clone());
        for _ in 1..size {
            coefficients.push(field.random(&mut *rng));
        }
        Self { coefficients }
    }

    /// The number of coefficients, one more than the degree.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Evaluate this polynomial at 0.
    pub fn evaluate_zero(&self, field: &Field) -> FieldElement {
        self.coefficients
            .first()
            .cloned()
            .unwrap_or_else(|| field.zero())
    }

    /// Evaluate this polynomial at a point, using Horner's method.
    pub fn evaluate(&self, field: &Field, x: &FieldElement) -> Result<FieldElement, FieldError> {
        let mut out = field.zero();
        for c in self.coefficients.iter().rev() {
            out = field.add(&field.mul(&out, x)?, c)?;
        }
        Ok(out)
    }
}

impl Index<usize> for Polynomial {
    type Output = FieldElement;

    fn index(&self, i: usize) -> &Self::Output {
        &self.coefficients[i]
    }
}

impl Zeroize for Polynomial {
    fn zeroize(&mut self) {
        self.coefficients.iter_mut().for_each(Zeroize::zeroize);
    }
}

impl ZeroizeOnDrop for Polynomial {}

/// Check that `threshold` out of `total` shares makes sense in this field.
///
/// The indices `1..=total` must also stay distinct and nonzero modulo the field,
/// otherwise some share would be the secret itself.
pub fn check_threshold(field: &Field, threshold: usize, total: usize) -> Result<(), ShareError> {
    let invalid = ShareError::InvalidThreshold { threshold, total };
    if threshold < 1 || total < 1 || threshold > total || u32::try_from(total).is_err() {
        return Err(invalid);
    }
    if &BigUint::from_u64(total as u64) >= field.modulus() {
        return Err(invalid);
    }
    Ok(())
}

/// Split a secret into `total` shares, any `threshold` of which recover it.
///
/// The shares are the evaluations of a random polynomial of degree `threshold - 1`,
/// with the secret as its constant term, at `x = 1, 2, ..., total`.
pub fn generate_shares(
    rng: &mut impl CryptoRngCore,
    field: &Field,
    secret: &FieldElement,
    threshold: usize,
    total: usize,
) -> Result<Vec<(ShareIndex, FieldElement)>, ShareError> {
    check_threshold(field, threshold, total)?;
    let f = Polynomial::extend_random(rng, field, threshold, secret);
    let mut shares = Vec::with_capacity(total);
    for i in IndexList::first(total as u32).iter() {
        shares.push((i, f.evaluate(field, &i.to_element(field))?));
    }
    Ok(shares)
}

/// Evaluate the unique polynomial passing through some points at `x`.
pub fn interpolate_at(
    field: &Field,
    points: &[(ShareIndex, FieldElement)],
    x: &FieldElement,
) -> Result<FieldElement, ShareError> {
    let list = IndexList::new(&points.iter().map(|(i, _)| *i).collect::<Vec<_>>())?;
    let mut out = field.zero();
    for (i, y) in points {
        let term = field.mul(y, &list.lagrange_at(field, *i, x)?)?;
        out = field.add(&out, &term)?;
    }
    Ok(out)
}

/// Recover the constant term of a polynomial from at least `threshold` of its evaluations.
///
/// Fewer points than the threshold is an error rather than a wrong answer.
pub fn interpolate_at_zero(
    field: &Field,
    points: &[(ShareIndex, FieldElement)],
    threshold: usize,
) -> Result<FieldElement, ShareError> {
    if threshold < 1 {
        return Err(ShareError::InvalidThreshold {
            threshold,
            total: points.len(),
        });
    }
    if points.is_empty() {
        return Err(ShareError::InsufficientShares {
            needed: 1,
            found: 0,
        });
    }
    if points.len() < threshold {
        return Err(ShareError::InsufficientShares {
            needed: threshold,
            found: points.len(),
        });
    }
    interpolate_at(field, points, &field.zero())
}

#[cfg(test)]
mod test {
    use rand_core::OsRng;

    use super::*;
    use crate::constants::secp256k1_order;

    fn order() -> Field {
        Field::new(secp256k1_order()).unwrap()
    }

    #[test]
    fn test_horner_matches_direct_evaluation() {
        let field = Field::new(BigUint::from_u64(1009)).unwrap();
        // 3 + 5x + 7x^2
        let f = Polynomial {
            coefficients: vec![field.from_u64(3), field.from_u64(5), field.from_u64(7)],
        };
        let x = field.from_u64(10);
        assert_eq!(f.evaluate(&field, &x).unwrap(), field.from_u64(753));
        assert_eq!(f.evaluate_zero(&field), field.from_u64(3));
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn test_extend_random_keeps_constant() {
        let field = order();
        let secret = field.random(&mut OsRng);
        let f = Polynomial::extend_random(&mut OsRng, &field, 4, &secret);
        assert_eq!(f[0], secret);
        assert_eq!(f.len(), 4);
        assert_eq!(f.evaluate(&field, &field.zero()).unwrap(), secret);
    }

    #[test]
    fn test_invalid_thresholds() {
        let field = order();
        let secret = field.from_u64(1);
        for (t, n) in [(0, 3), (4, 3), (0, 0), (1, 0)] {
            assert_eq!(
                generate_shares(&mut OsRng, &field, &secret, t, n),
                Err(ShareError::InvalidThreshold {
                    threshold: t,
                    total: n
                })
            );
        }
        // index 7 would be the secret itself modulo 7
        let tiny = Field::new(BigUint::from_u64(7)).unwrap();
        assert!(generate_shares(&mut OsRng, &tiny, &tiny.one(), 2, 7).is_err());
        assert!(generate_shares(&mut OsRng, &tiny, &tiny.one(), 2, 6).is_ok());
    }

    #[test]
    fn test_share_and_interpolate() {
        let field = order();
        for (t, n) in [(1, 1), (1, 4), (2, 3), (3, 5), (5, 5)] {
            let secret = field.random(&mut OsRng);
            let shares = generate_shares(&mut OsRng, &field, &secret, t, n).unwrap();
            assert_eq!(shares.len(), n);
            for window in shares.windows(t) {
                assert_eq!(interpolate_at_zero(&field, window, t).unwrap(), secret);
            }
        }
    }

    #[test]
    fn test_interpolate_recovers_other_shares() {
        let field = order();
        let secret = field.random(&mut OsRng);
        let shares = generate_shares(&mut OsRng, &field, &secret, 3, 6).unwrap();
        for (i, y) in &shares[3..] {
            let x = i.to_element(&field);
            assert_eq!(&interpolate_at(&field, &shares[..3], &x).unwrap(), y);
        }
    }

    #[test]
    fn test_interpolate_at_zero_failures() {
        let field = order();
        let secret = field.from_u64(0x1234);
        let shares = generate_shares(&mut OsRng, &field, &secret, 3, 5).unwrap();
        assert_eq!(
            interpolate_at_zero(&field, &shares[..2], 3),
            Err(ShareError::InsufficientShares {
                needed: 3,
                found: 2
            })
        );
        let dup = vec![shares[0].clone(), shares[1].clone(), shares[1].clone()];
        assert_eq!(
            interpolate_at_zero(&field, &dup, 3),
            Err(ShareError::DuplicateShareIndex(2))
        );
    }

    #[test]
    fn test_interpolate_at_zero_rejects_empty_input() {
        let field = order();
        let shares = generate_shares(&mut OsRng, &field, &field.from_u64(9), 2, 3).unwrap();
        assert_eq!(
            interpolate_at_zero(&field, &shares, 0),
            Err(ShareError::InvalidThreshold {
                threshold: 0,
                total: 3
            })
        );
        assert_eq!(
            interpolate_at_zero(&field, &[], 0),
            Err(ShareError::InvalidThreshold {
                threshold: 0,
                total: 0
            })
        );
        assert_eq!(
            interpolate_at_zero(&field, &[], 1),
            Err(ShareError::InsufficientShares {
                needed: 1,
                found: 0
            })
        );
    }
}
