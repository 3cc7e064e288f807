//! Modular arithmetic over a runtime modulus.
//!
//! A [`Field`] is just a modulus, and a [`FieldElement`] carries the modulus it
//! was created under. Every operation goes through the field, which checks
//! that its operands belong to it, so elements of different fields can never
//! be silently mixed.
//!
//! This arithmetic is not constant time. It is used for splitting and
//! reconstructing secrets; signing goes through the curve crates instead.
use std::fmt;

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{bigint::BigUint, error::FieldError};

/// The integers modulo some `m >= 2`.
#[derive(Clone, PartialEq, Eq)]
pub struct Field {
    modulus: BigUint,
}

impl Field {
    pub fn new(modulus: BigUint) -> Result<Self, FieldError> {
        if modulus < BigUint::from_u64(2) {
            return Err(FieldError::InvalidModulus);
        }
        Ok(Self { modulus })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// The number of bytes needed to encode any element.
    pub fn byte_len(&self) -> usize {
        (self.modulus.bits() + 7) / 8
    }

    pub fn zero(&self) -> FieldElement {
        self.wrap(BigUint::zero())
    }

    pub fn one(&self) -> FieldElement {
        self.wrap(BigUint::one())
    }

    pub fn from_u64(&self, x: u64) -> FieldElement {
        self.reduce(&BigUint::from_u64(x))
    }

    /// Reduce an arbitrary integer into this field.
    pub fn reduce(&self, x: &BigUint) -> FieldElement {
        self.wrap(x.rem_nonzero(&self.modulus))
    }

    /// Interpret an integer as an element, requiring that it already be reduced.
    pub fn element(&self, x: BigUint) -> Result<FieldElement, FieldError> {
        self.finish(x)
    }

    /// Sample a uniformly random element.
    ///
    /// Candidates with the bit length of the modulus are drawn until one falls below it,
    /// so no value is more likely than another.
    pub fn random(&self, rng: &mut impl CryptoRngCore) -> FieldElement {
        let len = self.byte_len();
        let excess = len * 8 - self.modulus.bits();
        let mut buf = Zeroizing::new(vec![0u8; len]);
        loop {
            rng.fill_bytes(&mut buf);
            buf[0] &= 0xFF >> excess;
            let candidate = BigUint::from_bytes_be(&buf);
            if candidate < self.modulus {
                return self.wrap(candidate);
            }
        }
    }

    /// Sample a uniformly random element in `[1, m - 1]`.
    pub fn random_nonzero(&self, rng: &mut impl CryptoRngCore) -> FieldElement {
        loop {
            let x = self.random(rng);
            if !x.is_zero() {
                return x;
            }
        }
    }

    pub fn add(&self, a: &FieldElement, b: &FieldElement) -> Result<FieldElement, FieldError> {
        self.check(a)?;
        self.check(b)?;
        let sum = a.value.add(&b.value);
        if sum >= self.modulus {
            self.finish(sum.sub(&self.modulus)?)
        } else {
            self.finish(sum)
        }
    }

    /// Compute `(a - b + m) mod m`, never going through a negative intermediate.
    pub fn sub(&self, a: &FieldElement, b: &FieldElement) -> Result<FieldElement, FieldError> {
        self.check(a)?;
        self.check(b)?;
        let diff = a.value.add(&self.modulus).sub(&b.value)?;
        if diff >= self.modulus {
            self.finish(diff.sub(&self.modulus)?)
        } else {
            self.finish(diff)
        }
    }

    pub fn mul(&self, a: &FieldElement, b: &FieldElement) -> Result<FieldElement, FieldError> {
        self.check(a)?;
        self.check(b)?;
        self.finish(a.value.mul(&b.value).rem_nonzero(&self.modulus))
    }

    /// Compute `base^exponent mod m` by square and multiply.
    pub fn pow(&self, base: &FieldElement, exponent: &BigUint) -> Result<FieldElement, FieldError> {
        self.check(base)?;
        let mut acc = BigUint::one();
        for i in (0..exponent.bits()).rev() {
            acc = acc.mul(&acc).rem_nonzero(&self.modulus);
            if exponent.bit(i) {
                acc = acc.mul(&base.value).rem_nonzero(&self.modulus);
            }
        }
        self.finish(acc)
    }

    /// Compute `a^-1 mod m` with the extended Euclidean algorithm.
    ///
    /// The Bezout coefficient is tracked modulo `m`, so no signed integers are needed.
    /// This fails with [`FieldError::NoInverse`] whenever `gcd(a, m) != 1`.
    pub fn inverse(&self, a: &FieldElement) -> Result<FieldElement, FieldError> {
        self.check(a)?;
        if a.value.is_zero() {
            return Err(FieldError::NoInverse);
        }
        // Invariant: r_i = t_i * a mod m
        let mut r0 = self.modulus.clone();
        let mut r1 = a.value.clone();
        let mut t0 = BigUint::zero();
        let mut t1 = BigUint::one();
        while !r1.is_zero() {
            let (q, r2) = r0.divmod(&r1)?;
            let qt = q.mul(&t1).rem_nonzero(&self.modulus);
            let t2 = if t0 >= qt {
                t0.sub(&qt)?
            } else {
                t0.add(&self.modulus).sub(&qt)?
            };
            r0 = r1;
            r1 = r2;
            t0 = t1;
            t1 = t2;
        }
        if !r0.is_one() {
            return Err(FieldError::NoInverse);
        }
        self.finish(t0)
    }

    /// Compute `(m - a) mod m`, so that `negate(0) = 0`.
    pub fn negate(&self, a: &FieldElement) -> Result<FieldElement, FieldError> {
        self.check(a)?;
        if a.value.is_zero() {
            return self.finish(BigUint::zero());
        }
        self.finish(self.modulus.sub(&a.value)?)
    }

    fn check(&self, a: &FieldElement) -> Result<(), FieldError> {
        if a.modulus != self.modulus {
            return Err(FieldError::ModulusMismatch);
        }
        Ok(())
    }

    fn finish(&self, value: BigUint) -> Result<FieldElement, FieldError> {
        if value >= self.modulus {
            return Err(FieldError::NotReduced);
        }
        Ok(self.wrap(value))
    }

    fn wrap(&self, value: BigUint) -> FieldElement {
        FieldElement {
            value,
            modulus: self.modulus.clone(),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("modulus", &self.modulus)
            .finish()
    }
}

/// An integer in `[0, m)`, tagged with its modulus `m`.
///
/// The value is wiped on drop. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldElement", into = "RawFieldElement")]
pub struct FieldElement {
    value: BigUint,
    modulus: BigUint,
}

impl FieldElement {
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.value.is_one()
    }

    /// The big endian encoding of the value, padded to the byte length of the modulus.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let len = (self.modulus.bits() + 7) / 8;
        let mut out = Zeroizing::new(vec![0u8; len]);
        let bytes = Zeroizing::new(self.value.to_bytes_be());
        out[len - bytes.len()..].copy_from_slice(&bytes);
        out
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        if self.modulus != other.modulus {
            return Choice::from(0);
        }
        self.to_bytes().as_slice().ct_eq(other.to_bytes().as_slice())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldElement")
            .field("modulus_bits", &self.modulus.bits())
            .finish_non_exhaustive()
    }
}

impl Zeroize for FieldElement {
    fn zeroize(&mut self) {
        self.value.zeroize();
    }
}

// Both fields are `BigUint`, which wipes itself on drop.
impl ZeroizeOnDrop for FieldElement {}

/// The serialized form of an element, checked on the way back in.
#[derive(Serialize, Deserialize)]
struct RawFieldElement {
    value: BigUint,
    modulus: BigUint,
}

impl From<FieldElement> for RawFieldElement {
    fn from(x: FieldElement) -> Self {
        let FieldElement { value, modulus } = x;
        Self { value, modulus }
    }
}

impl TryFrom<RawFieldElement> for FieldElement {
    type Error = FieldError;

    fn try_from(raw: RawFieldElement) -> Result<Self, Self::Error> {
        let field = Field::new(raw.modulus)?;
        field.element(raw.value)
    }
}

#[cfg(test)]
mod test {
    use rand_core::OsRng;

    use super::*;
    use crate::constants::{secp256k1_order, secp256k1_prime};

    fn small(m: u64) -> Field {
        Field::new(BigUint::from_u64(m)).unwrap()
    }

    #[test]
    fn test_field_closure() {
        for field in [
            Field::new(secp256k1_order()).unwrap(),
            Field::new(secp256k1_prime()).unwrap(),
            small(97),
        ] {
            for _ in 0..32 {
                let a = field.random(&mut OsRng);
                let b = field.random(&mut OsRng);
                for x in [
                    field.add(&a, &b).unwrap(),
                    field.sub(&a, &b).unwrap(),
                    field.mul(&a, &b).unwrap(),
                    field.negate(&a).unwrap(),
                ] {
                    assert!(x.value() < field.modulus());
                }
            }
        }
    }

    #[test]
    fn test_add_sub_wrap_around() {
        let field = small(7);
        let three = field.from_u64(3);
        let five = field.from_u64(5);
        assert_eq!(field.sub(&three, &five).unwrap(), field.from_u64(5));
        assert_eq!(field.add(&three, &five).unwrap(), field.from_u64(1));
        assert_eq!(field.mul(&three, &five).unwrap(), field.from_u64(1));
        assert_eq!(field.from_u64(100), field.from_u64(2));
    }

    #[test]
    fn test_inverse_correctness() {
        let field = Field::new(secp256k1_order()).unwrap();
        for _ in 0..32 {
            let a = field.random_nonzero(&mut OsRng);
            let a_inv = field.inverse(&a).unwrap();
            assert!(field.mul(&a, &a_inv).unwrap().is_one());
        }
    }

    #[test]
    fn test_no_inverse() {
        let field = small(12);
        assert_eq!(field.inverse(&field.zero()), Err(FieldError::NoInverse));
        assert_eq!(field.inverse(&field.from_u64(4)), Err(FieldError::NoInverse));
        assert_eq!(field.inverse(&field.from_u64(5)).unwrap(), field.from_u64(5));
        assert_eq!(field.inverse(&field.from_u64(7)).unwrap(), field.from_u64(7));
    }

    #[test]
    fn test_negate() {
        let field = Field::new(secp256k1_order()).unwrap();
        assert!(field.negate(&field.zero()).unwrap().is_zero());
        let a = field.random(&mut OsRng);
        let neg = field.negate(&a).unwrap();
        assert!(field.add(&a, &neg).unwrap().is_zero());
    }

    #[test]
    fn test_pow_fermat() {
        let field = Field::new(secp256k1_prime()).unwrap();
        let p_minus_1 = secp256k1_prime().sub(&BigUint::one()).unwrap();
        let p_minus_2 = secp256k1_prime().sub(&BigUint::from_u64(2)).unwrap();
        for _ in 0..4 {
            let a = field.random_nonzero(&mut OsRng);
            assert!(field.pow(&a, &p_minus_1).unwrap().is_one());
            assert_eq!(field.pow(&a, &p_minus_2).unwrap(), field.inverse(&a).unwrap());
        }
        let two = field.from_u64(2);
        assert_eq!(field.pow(&two, &BigUint::from_u64(10)).unwrap(), field.from_u64(1024));
        assert!(field.pow(&two, &BigUint::zero()).unwrap().is_one());
    }

    #[test]
    fn test_mixing_moduli_is_rejected() {
        let f7 = small(7);
        let f11 = small(11);
        let a = f7.from_u64(3);
        let b = f11.from_u64(3);
        assert_eq!(f7.add(&a, &b), Err(FieldError::ModulusMismatch));
        assert_eq!(f11.inverse(&a), Err(FieldError::ModulusMismatch));
        assert!(!bool::from(a.ct_eq(&b)));
    }

    #[test]
    fn test_invalid_modulus() {
        assert_eq!(Field::new(BigUint::one()), Err(FieldError::InvalidModulus));
        assert_eq!(Field::new(BigUint::zero()), Err(FieldError::InvalidModulus));
    }

    #[test]
    fn test_element_requires_reduced_value() {
        let field = small(7);
        assert_eq!(field.element(BigUint::from_u64(7)), Err(FieldError::NotReduced));
        assert_eq!(field.element(BigUint::from_u64(6)).unwrap(), field.from_u64(6));
    }

    #[test]
    fn test_random_stays_in_range() {
        // 2^8 + 1 forces most candidates to be rejected.
        let field = small(257);
        for _ in 0..256 {
            assert!(field.random(&mut OsRng).value() < field.modulus());
            assert!(!field.random_nonzero(&mut OsRng).is_zero());
        }
    }

    #[test]
    fn test_debug_hides_value() {
        let field = small(1_000_003);
        let x = field.from_u64(424_242);
        let printed = format!("{x:?}");
        assert!(!printed.contains("424242"));
        assert!(!printed.contains("67932"));
    }

    #[test]
    fn test_zeroize_clears_value() {
        let field = Field::new(secp256k1_order()).unwrap();
        let mut x = field.random_nonzero(&mut OsRng);
        x.zeroize();
        assert!(x.is_zero());
        assert_eq!(x.modulus(), field.modulus());
    }
}
