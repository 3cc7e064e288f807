//! Arbitrary precision unsigned integers.
//!
//! A [`BigUint`] is a vector of 64 bit limbs, least significant first.
//! Values are always normalized: the most significant limb is never zero,
//! and zero itself is the empty vector. Every public operation returns a fresh
//! value; the in-place helpers used by division never escape this module.
//!
//! At the boundary, bytes are big endian, as in every cryptographic standard
//! we interact with.
use std::{cmp::Ordering, fmt};

use auto_ops::impl_op_ex;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::ArithmeticError;

const LIMB_BITS: usize = 64;
const LIMB_BYTES: usize = 8;

/// An unsigned integer of arbitrary size.
///
/// The limbs are wiped when the value is dropped, since these integers
/// routinely hold secrets and share values.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BigUint {
    limbs: Vec<u64>,
}

impl BigUint {
    pub fn zero() -> Self {
        Self { limbs: Vec::new() }
    }

    pub fn one() -> Self {
        Self::from_u64(1)
    }

    pub fn from_u64(x: u64) -> Self {
        Self::from_vec(vec![x])
    }

    /// Create an integer from little endian limbs.
    pub fn from_limbs(limbs: &[u64]) -> Self {
        Self::from_vec(limbs.to_vec())
    }

    fn from_vec(limbs: Vec<u64>) -> Self {
        let mut out = Self { limbs };
        out.normalize();
        out
    }

    fn normalize(&mut self) {
        while let Some(&0) = self.limbs.last() {
            self.limbs.pop();
        }
    }

    /// The little endian limbs of this integer, without any trailing zeros.
    pub fn limbs(&self) -> &[u64] {
        &self.limbs
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.limbs == [1]
    }

    pub fn is_odd(&self) -> bool {
        self.limbs.first().map_or(false, |x| x & 1 == 1)
    }

    /// The number of significant bits.
    pub fn bits(&self) -> usize {
        match self.limbs.last() {
            None => 0,
            Some(top) => {
                (self.limbs.len() - 1) * LIMB_BITS + (LIMB_BITS - top.leading_zeros() as usize)
            }
        }
    }

    /// Read bit `i`, counting from the least significant bit.
    pub fn bit(&self, i: usize) -> bool {
        self.limbs
            .get(i / LIMB_BITS)
            .map_or(false, |limb| (limb >> (i % LIMB_BITS)) & 1 == 1)
    }

    /// Return this value as a u64, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        match self.limbs.len() {
            0 => Some(0),
            1 => Some(self.limbs[0]),
            _ => None,
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        let (long, short) = if self.limbs.len() >= other.limbs.len() {
            (&self.limbs, &other.limbs)
        } else {
            (&other.limbs, &self.limbs)
        };
        let mut limbs = Vec::with_capacity(long.len() + 1);
        let mut carry = 0u64;
        for (i, &a) in long.iter().enumerate() {
            let b = short.get(i).copied().unwrap_or(0);
            let (s0, c0) = a.overflowing_add(b);
            let (s1, c1) = s0.overflowing_add(carry);
            limbs.push(s1);
            carry = u64::from(c0) + u64::from(c1);
        }
        if carry != 0 {
            limbs.push(carry);
        }
        Self::from_vec(limbs)
    }

    /// Subtract `other` from this value.
    ///
    /// This fails with [`ArithmeticError::Underflow`] if `other > self`.
    pub fn sub(&self, other: &Self) -> Result<Self, ArithmeticError> {
        if *self < *other {
            return Err(ArithmeticError::Underflow);
        }
        let mut out = self.clone();
        out.sub_assign_unchecked(other);
        Ok(out)
    }

    /// Requires `self >= other`.
    fn sub_assign_unchecked(&mut self, other: &Self) {
        let mut borrow = 0u64;
        for (i, a) in self.limbs.iter_mut().enumerate() {
            if i >= other.limbs.len() && borrow == 0 {
                break;
            }
            let b = other.limbs.get(i).copied().unwrap_or(0);
            let (d0, b0) = a.overflowing_sub(b);
            let (d1, b1) = d0.overflowing_sub(borrow);
            *a = d1;
            borrow = u64::from(b0 | b1);
        }
        debug_assert_eq!(borrow, 0);
        self.normalize();
    }

    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let mut limbs = vec![0u64; self.limbs.len() + other.limbs.len()];
        for (i, &a) in self.limbs.iter().enumerate() {
            let mut carry = 0u128;
            for (j, &b) in other.limbs.iter().enumerate() {
                let t = u128::from(a) * u128::from(b) + u128::from(limbs[i + j]) + carry;
                limbs[i + j] = t as u64;
                carry = t >> LIMB_BITS;
            }
            limbs[i + other.limbs.len()] = carry as u64;
        }
        Self::from_vec(limbs)
    }

    /// Divide by `divisor`, returning the quotient and the remainder.
    ///
    /// This is plain binary long division, one bit of the dividend at a time.
    pub fn divmod(&self, divisor: &Self) -> Result<(Self, Self), ArithmeticError> {
        if divisor.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(self.divmod_nonzero(divisor))
    }

    /// The remainder of division by a divisor the caller knows to be non-zero.
    pub(crate) fn rem_nonzero(&self, divisor: &Self) -> Self {
        self.divmod_nonzero(divisor).1
    }

    fn divmod_nonzero(&self, divisor: &Self) -> (Self, Self) {
        debug_assert!(!divisor.is_zero());
        if *self < *divisor {
            return (Self::zero(), self.clone());
        }
        let mut quotient = vec![0u64; self.limbs.len()];
        let mut rem = Self {
            limbs: Vec::with_capacity(divisor.limbs.len() + 1),
        };
        for i in (0..self.bits()).rev() {
            rem.shl1_assign();
            if self.bit(i) {
                match rem.limbs.first_mut() {
                    Some(low) => *low |= 1,
                    None => rem.limbs.push(1),
                }
            }
            if rem >= *divisor {
                rem.sub_assign_unchecked(divisor);
                quotient[i / LIMB_BITS] |= 1 << (i % LIMB_BITS);
            }
        }
        (Self::from_vec(quotient), rem)
    }

    fn shl1_assign(&mut self) {
        let mut carry = 0u64;
        for limb in self.limbs.iter_mut() {
            let next = *limb >> (LIMB_BITS - 1);
            *limb = (*limb << 1) | carry;
            carry = next;
        }
        if carry != 0 {
            self.limbs.push(carry);
        }
    }

    pub fn shl(&self, bits: usize) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let limb_shift = bits / LIMB_BITS;
        let bit_shift = bits % LIMB_BITS;
        let mut limbs = Vec::with_capacity(self.limbs.len() + limb_shift + 1);
        limbs.resize(limb_shift, 0);
        if bit_shift == 0 {
            limbs.extend_from_slice(&self.limbs);
        } else {
            let mut carry = 0u64;
            for &limb in &self.limbs {
                limbs.push((limb << bit_shift) | carry);
                carry = limb >> (LIMB_BITS - bit_shift);
            }
            limbs.push(carry);
        }
        Self::from_vec(limbs)
    }

    pub fn shr(&self, bits: usize) -> Self {
        let limb_shift = bits / LIMB_BITS;
        let bit_shift = bits % LIMB_BITS;
        if limb_shift >= self.limbs.len() {
            return Self::zero();
        }
        let src = &self.limbs[limb_shift..];
        let mut limbs = Vec::with_capacity(src.len());
        for (i, &limb) in src.iter().enumerate() {
            let mut x = limb >> bit_shift;
            if bit_shift != 0 {
                if let Some(&next) = src.get(i + 1) {
                    x |= next << (LIMB_BITS - bit_shift);
                }
            }
            limbs.push(x);
        }
        Self::from_vec(limbs)
    }

    /// Parse big endian bytes. Leading zero bytes are allowed.
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        let mut limbs = Vec::with_capacity((bytes.len() + LIMB_BYTES - 1) / LIMB_BYTES);
        for chunk in bytes.rchunks(LIMB_BYTES) {
            let mut buf = Zeroizing::new([0u8; LIMB_BYTES]);
            buf[LIMB_BYTES - chunk.len()..].copy_from_slice(chunk);
            limbs.push(u64::from_be_bytes(*buf));
        }
        Self::from_vec(limbs)
    }

    /// The minimal big endian encoding of this value.
    ///
    /// Zero encodes as the empty string.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.limbs.len() * LIMB_BYTES);
        for limb in self.limbs.iter().rev() {
            out.extend_from_slice(&limb.to_be_bytes());
        }
        let leading = out.iter().take_while(|b| **b == 0).count();
        out.drain(..leading);
        out
    }

    /// The big endian encoding of this value, left padded with zeros to `len` bytes.
    pub fn to_bytes_be_padded(&self, len: usize) -> Result<Vec<u8>, ArithmeticError> {
        let bytes = Zeroizing::new(self.to_bytes_be());
        if bytes.len() > len {
            return Err(ArithmeticError::Overflow {
                needed: bytes.len(),
                available: len,
            });
        }
        let mut out = vec![0u8; len];
        out[len - bytes.len()..].copy_from_slice(&bytes);
        Ok(out)
    }

    /// Parse a hex string, with or without a `0x` prefix.
    ///
    /// Odd lengths are accepted, as if a leading zero were present.
    pub fn from_hex(s: &str) -> Result<Self, ArithmeticError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() {
            return Err(ArithmeticError::InvalidHex(0));
        }
        let pad = digits.len() % 2;
        let padded = Zeroizing::new(if pad == 1 {
            format!("0{digits}")
        } else {
            digits.to_owned()
        });
        let bytes = Zeroizing::new(hex::decode(padded.as_bytes()).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { index, .. } => {
                ArithmeticError::InvalidHex(index - pad)
            }
            _ => ArithmeticError::InvalidHex(digits.len()),
        })?);
        Ok(Self::from_bytes_be(&bytes))
    }

    /// Lowercase hex, without prefix or leading zeros. Zero is `"0"`.
    pub fn to_hex(&self) -> String {
        format!("{self:x}")
    }
}

impl From<u64> for BigUint {
    fn from(x: u64) -> Self {
        Self::from_u64(x)
    }
}

impl Ord for BigUint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.limbs
            .len()
            .cmp(&other.limbs.len())
            .then_with(|| self.limbs.iter().rev().cmp(other.limbs.iter().rev()))
    }
}

impl PartialOrd for BigUint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::LowerHex for BigUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limbs.split_last() {
            None => f.write_str("0"),
            Some((top, rest)) => {
                write!(f, "{top:x}")?;
                for limb in rest.iter().rev() {
                    write!(f, "{limb:016x}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for BigUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigUint(0x{self:x})")
    }
}

impl Zeroize for BigUint {
    fn zeroize(&mut self) {
        self.limbs.zeroize();
    }
}

impl Drop for BigUint {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for BigUint {}

impl_op_ex!(+ |a: &BigUint, b: &BigUint| -> BigUint { BigUint::add(a, b) });
impl_op_ex!(*|a: &BigUint, b: &BigUint| -> BigUint { BigUint::mul(a, b) });
impl_op_ex!(+= |a: &mut BigUint, b: &BigUint| { *a = BigUint::add(a, b) });

#[cfg(test)]
mod test {
    use rand_core::{OsRng, RngCore};

    use super::*;

    fn random_bytes(len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        OsRng.fill_bytes(&mut out);
        out
    }

    #[test]
    fn test_bytes_round_trip() {
        for len in [1, 7, 8, 9, 31, 32, 33, 64, 100] {
            for _ in 0..16 {
                let mut bytes = random_bytes(len);
                if bytes[0] == 0 {
                    bytes[0] = 1;
                }
                let x = BigUint::from_bytes_be(&bytes);
                assert_eq!(x.to_bytes_be(), bytes);
            }
        }
    }

    #[test]
    fn test_leading_zeros_are_normalized() {
        let x = BigUint::from_bytes_be(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0x12, 0x34]);
        assert_eq!(x.limbs(), &[0x1234]);
        assert_eq!(x.to_bytes_be(), vec![0x12, 0x34]);
        assert!(BigUint::from_bytes_be(&[0; 40]).is_zero());
        assert!(BigUint::from_bytes_be(&[]).is_zero());
        assert!(BigUint::zero().to_bytes_be().is_empty());
    }

    #[test]
    fn test_padded_bytes() {
        let x = BigUint::from_u64(0xabcd);
        let padded = x.to_bytes_be_padded(4).unwrap();
        assert_eq!(padded, vec![0, 0, 0xab, 0xcd]);
        assert_eq!(
            x.to_bytes_be_padded(1),
            Err(ArithmeticError::Overflow {
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_add_carries_across_limbs() {
        let x = BigUint::from_limbs(&[u64::MAX, u64::MAX]);
        let y = x.add(&BigUint::one());
        assert_eq!(y.limbs(), &[0, 0, 1]);
        assert_eq!(&x + &BigUint::one(), y);
    }

    #[test]
    fn test_sub() {
        let x = BigUint::from_limbs(&[0, 0, 1]);
        let y = x.sub(&BigUint::one()).unwrap();
        assert_eq!(y.limbs(), &[u64::MAX, u64::MAX]);
        assert!(x.sub(&x).unwrap().is_zero());
        assert_eq!(BigUint::one().sub(&x), Err(ArithmeticError::Underflow));
    }

    #[test]
    fn test_mul() {
        let x = BigUint::from_u64(u64::MAX);
        let y = x.mul(&x);
        // (2^64 - 1)^2 = 2^128 - 2^65 + 1
        assert_eq!(y.limbs(), &[1, u64::MAX - 1]);
        assert!(x.mul(&BigUint::zero()).is_zero());
        assert_eq!(&x * &BigUint::one(), x);
    }

    #[test]
    fn test_divmod_reconstructs_dividend() {
        for _ in 0..32 {
            let a = BigUint::from_bytes_be(&random_bytes(64));
            let b = BigUint::from_bytes_be(&random_bytes(1 + (OsRng.next_u32() % 40) as usize));
            if b.is_zero() {
                continue;
            }
            let (q, r) = a.divmod(&b).unwrap();
            assert!(r < b);
            assert_eq!(q.mul(&b).add(&r), a);
        }
    }

    #[test]
    fn test_divmod_small_cases() {
        let (q, r) = BigUint::from_u64(100).divmod(&BigUint::from_u64(7)).unwrap();
        assert_eq!(q, BigUint::from_u64(14));
        assert_eq!(r, BigUint::from_u64(2));

        let (q, r) = BigUint::from_u64(3).divmod(&BigUint::from_u64(7)).unwrap();
        assert!(q.is_zero());
        assert_eq!(r, BigUint::from_u64(3));

        assert_eq!(
            BigUint::one().divmod(&BigUint::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn test_shifts() {
        let x = BigUint::from_u64(0b1011);
        assert_eq!(x.shl(64).limbs(), &[0, 0b1011]);
        assert_eq!(x.shl(63).limbs(), &[1 << 63, 0b101]);
        assert_eq!(x.shl(130).shr(130), x);
        assert_eq!(x.shr(1), BigUint::from_u64(0b101));
        assert!(x.shr(4).is_zero());
        assert!(x.shr(1000).is_zero());
        assert_eq!(x.shl(0), x);
    }

    #[test]
    fn test_compare() {
        let small = BigUint::from_u64(u64::MAX);
        let big = BigUint::from_limbs(&[0, 1]);
        assert!(small < big);
        assert!(big > small);
        assert_eq!(big.cmp(&big.clone()), Ordering::Equal);
        assert!(BigUint::zero() < BigUint::one());
    }

    #[test]
    fn test_hex() {
        let x = BigUint::from_hex("0x1234567890abcdef1122").unwrap();
        assert_eq!(x.limbs(), &[0x567890abcdef1122, 0x1234]);
        assert_eq!(x.to_hex(), "1234567890abcdef1122");
        assert_eq!(BigUint::from_hex("abc").unwrap(), BigUint::from_u64(0xabc));
        assert_eq!(BigUint::zero().to_hex(), "0");
        assert_eq!(BigUint::from_hex("12g4"), Err(ArithmeticError::InvalidHex(2)));
        assert_eq!(BigUint::from_hex("0x"), Err(ArithmeticError::InvalidHex(0)));
    }

    #[test]
    fn test_bits() {
        assert_eq!(BigUint::zero().bits(), 0);
        assert_eq!(BigUint::one().bits(), 1);
        assert_eq!(BigUint::from_limbs(&[0, 1]).bits(), 65);
        let x = BigUint::from_u64(0b100);
        assert!(x.bit(2));
        assert!(!x.bit(1));
        assert!(!x.bit(500));
    }

    #[test]
    fn test_zeroize_clears_value() {
        let mut x = BigUint::from_bytes_be(&random_bytes(32));
        x.zeroize();
        assert!(x.is_zero());
    }
}
