//! The seam between our arithmetic and an elliptic curve implementation.
//!
//! We never implement point arithmetic ourselves. Instead, curves from the
//! RustCrypto [elliptic-curves](https://github.com/RustCrypto/elliptic-curves)
//! suite are adapted through the [`CSCurve`] trait, and a [`CurveContext`]
//! bundles the fields we need for one curve.
use std::{fmt, marker::PhantomData};

use elliptic_curve::{CurveArithmetic, PrimeCurve};
use zeroize::Zeroizing;

use crate::{
    bigint::BigUint,
    constants,
    error::{FieldError, KeyError},
    field::{Field, FieldElement},
};

/// Represents a curve suitable for splitting keys and deriving public keys.
///
/// The bulk of the trait are the bounds requiring a curve according
/// to RustCrypto's traits.
///
/// Beyond that, we also require that curves have a name, for domain separation,
/// their group order and field prime as integers, and SEC1 handling of points.
pub trait CSCurve: PrimeCurve + CurveArithmetic {
    const NAME: &'static [u8];

    /// The byte length of a scalar.
    const SCALAR_BYTES: usize;

    /// The order of the generator.
    fn order() -> BigUint;

    /// The prime of the field the coordinates live in.
    fn prime() -> BigUint;

    /// Compute `scalar * G`, encoded in SEC1 form.
    ///
    /// This fails if the scalar is zero, or not an element of the scalar field.
    fn mul_base(scalar: &FieldElement, compress: bool) -> Result<Vec<u8>, KeyError>;

    /// Check that some bytes are a SEC1 encoding of a point on this curve.
    fn validate_public_key(bytes: &[u8]) -> Result<(), KeyError>;
}

/// Check the shape of a SEC1 encoding, before looking at the point itself.
pub(crate) fn check_sec1_shape(bytes: &[u8], coordinate_len: usize) -> Result<(), KeyError> {
    let ok = match bytes.first() {
        Some(0x02 | 0x03) => bytes.len() == 1 + coordinate_len,
        Some(0x04) => bytes.len() == 1 + 2 * coordinate_len,
        _ => false,
    };
    if !ok {
        return Err(KeyError::MalformedPublicKey(bytes.len()));
    }
    Ok(())
}

fn scalar_bytes<C: CSCurve>(scalar: &FieldElement) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    if scalar.modulus() != &C::order() {
        return Err(KeyError::InvalidPrivateKey);
    }
    scalar
        .value()
        .to_bytes_be_padded(C::SCALAR_BYTES)
        .map(Zeroizing::new)
        .map_err(|_| KeyError::InvalidPrivateKey)
}

mod k256_impl {
    use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey, Secp256k1, SecretKey};

    use super::*;

    impl CSCurve for Secp256k1 {
        const NAME: &'static [u8] = b"Secp256k1";
        const SCALAR_BYTES: usize = 32;

        fn order() -> BigUint {
            constants::secp256k1_order()
        }

        fn prime() -> BigUint {
            constants::secp256k1_prime()
        }

        fn mul_base(scalar: &FieldElement, compress: bool) -> Result<Vec<u8>, KeyError> {
            let bytes = scalar_bytes::<Self>(scalar)?;
            let secret =
                SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
            Ok(secret
                .public_key()
                .to_encoded_point(compress)
                .as_bytes()
                .to_vec())
        }

        fn validate_public_key(bytes: &[u8]) -> Result<(), KeyError> {
            check_sec1_shape(bytes, 32)?;
            PublicKey::from_sec1_bytes(bytes).map_err(|_| KeyError::PointNotOnCurve)?;
            Ok(())
        }
    }
}

#[cfg(any(feature = "p256", test))]
mod p256_impl {
    use p256::{elliptic_curve::sec1::ToEncodedPoint, NistP256, PublicKey, SecretKey};

    use super::*;

    impl CSCurve for NistP256 {
        const NAME: &'static [u8] = b"P-256";
        const SCALAR_BYTES: usize = 32;

        fn order() -> BigUint {
            constants::p256_order()
        }

        fn prime() -> BigUint {
            constants::p256_prime()
        }

        fn mul_base(scalar: &FieldElement, compress: bool) -> Result<Vec<u8>, KeyError> {
            let bytes = scalar_bytes::<Self>(scalar)?;
            let secret =
                SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
            Ok(secret
                .public_key()
                .to_encoded_point(compress)
                .as_bytes()
                .to_vec())
        }

        fn validate_public_key(bytes: &[u8]) -> Result<(), KeyError> {
            check_sec1_shape(bytes, 32)?;
            PublicKey::from_sec1_bytes(bytes).map_err(|_| KeyError::PointNotOnCurve)?;
            Ok(())
        }
    }
}

/// Everything we need to work with keys on one curve.
///
/// A context is built once by the caller and then only read, so it can be
/// shared freely between threads. Nothing in this crate keeps one around globally.
pub struct CurveContext<C: CSCurve> {
    scalar_field: Field,
    base_field: Field,
    _curve: PhantomData<fn() -> C>,
}

impl<C: CSCurve> CurveContext<C> {
    pub fn new() -> Result<Self, FieldError> {
        Ok(Self {
            scalar_field: Field::new(C::order())?,
            base_field: Field::new(C::prime())?,
            _curve: PhantomData,
        })
    }

    pub fn name(&self) -> &'static [u8] {
        C::NAME
    }

    /// The integers modulo the group order, where secrets and shares live.
    pub fn scalar_field(&self) -> &Field {
        &self.scalar_field
    }

    /// The integers modulo the curve prime.
    pub fn base_field(&self) -> &Field {
        &self.base_field
    }

    /// Derive the public key `secret * G`.
    pub fn public_key(&self, secret: &FieldElement, compress: bool) -> Result<Vec<u8>, KeyError> {
        C::mul_base(secret, compress)
    }

    pub fn validate_public_key(&self, bytes: &[u8]) -> Result<(), KeyError> {
        C::validate_public_key(bytes)
    }
}

impl<C: CSCurve> Clone for CurveContext<C> {
    fn clone(&self) -> Self {
        Self {
            scalar_field: self.scalar_field.clone(),
            base_field: self.base_field.clone(),
            _curve: PhantomData,
        }
    }
}

impl<C: CSCurve> fmt::Debug for CurveContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveContext")
            .field("curve", &String::from_utf8_lossy(C::NAME))
            .finish()
    }
}
