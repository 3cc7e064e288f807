//! Single-party secp256k1 keys.
//!
//! These are what the signing engine consumes: a [`PrivateKey`] is either
//! handed to us by secure storage, or recovered from shares, and only lives
//! for the duration of a signing call.
use std::fmt;

use k256::{
    ecdsa::{SigningKey, VerifyingKey},
    elliptic_curve::{sec1::ToEncodedPoint, PrimeField},
    FieldBytes, NonZeroScalar, Scalar, Secp256k1, SecretKey,
};
use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use crate::{
    compat::{check_sec1_shape, CSCurve},
    error::KeyError,
    field::FieldElement,
};

pub const PRIVATE_KEY_LEN: usize = 32;
pub const COMPRESSED_LEN: usize = 33;
pub const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 private key, a scalar in `[1, n - 1]`.
///
/// The scalar is wiped when the key is dropped.
#[derive(Clone)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    /// Parse a 32 byte big endian scalar.
    ///
    /// This fails if the value is zero or not below the group order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(KeyError::InvalidPrivateKey);
        }
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidPrivateKey)
    }

    /// Use a secret recovered from shares as a signing key.
    pub fn from_field_element(secret: &FieldElement) -> Result<Self, KeyError> {
        if secret.modulus() != &Secp256k1::order() {
            return Err(KeyError::InvalidPrivateKey);
        }
        let bytes = secret
            .value()
            .to_bytes_be_padded(PRIVATE_KEY_LEN)
            .map(Zeroizing::new)
            .map_err(|_| KeyError::InvalidPrivateKey)?;
        Self::from_bytes(&bytes)
    }

    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        Self(SecretKey::random(rng))
    }

    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_LEN]> {
        Zeroizing::new(self.0.to_bytes().into())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    /// Compute `(key + tweak) mod n`.
    ///
    /// The tweak must be below the group order, and the result must not be zero.
    pub fn tweak_add(&self, tweak: &[u8; 32]) -> Result<Self, KeyError> {
        let t = parse_tweak(tweak)?;
        let sum = *self.0.to_nonzero_scalar() + t;
        Self::from_scalar(sum)
    }

    /// Compute `(key * tweak) mod n`.
    ///
    /// The tweak must be in `[1, n - 1]`.
    pub fn tweak_mul(&self, tweak: &[u8; 32]) -> Result<Self, KeyError> {
        let t = parse_tweak(tweak)?;
        if bool::from(t.is_zero()) {
            return Err(KeyError::InvalidPrivateKey);
        }
        let product = *self.0.to_nonzero_scalar() * t;
        Self::from_scalar(product)
    }

    /// Compute `n - key`.
    pub fn negate(&self) -> Self {
        Self(SecretKey::from(-self.0.to_nonzero_scalar()))
    }

    fn from_scalar(x: Scalar) -> Result<Self, KeyError> {
        Option::<NonZeroScalar>::from(NonZeroScalar::new(x))
            .map(|x| Self(SecretKey::from(x)))
            .ok_or(KeyError::InvalidPrivateKey)
    }

    pub(crate) fn signing_key(&self) -> SigningKey {
        SigningKey::from(&self.0)
    }
}

fn parse_tweak(tweak: &[u8; 32]) -> Result<Scalar, KeyError> {
    Option::from(Scalar::from_repr(FieldBytes::from(*tweak))).ok_or(KeyError::InvalidPrivateKey)
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        // SecretKey compares in constant time.
        self.0 == other.0
    }
}

impl Eq for PrivateKey {}

/// A secp256k1 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl PublicKey {
    /// Parse a 33 byte compressed or 65 byte uncompressed SEC1 encoding.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        check_sec1_shape(bytes, 32)?;
        k256::PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| KeyError::PointNotOnCurve)
    }

    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(self.0.to_encoded_point(true).as_bytes());
        out
    }

    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out.copy_from_slice(self.0.to_encoded_point(false).as_bytes());
        out
    }

    pub(crate) fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey::from(&self.0)
    }

    pub(crate) fn from_verifying_key(key: &VerifyingKey) -> Self {
        Self(k256::PublicKey::from(key))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_compressed()))
    }
}
