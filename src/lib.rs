//! Tessera is the cryptographic core of a multi-chain wallet.
//!
//! It splits private keys into threshold shares, puts them back together,
//! and turns unsigned Bitcoin and Ethereum transactions into signed ones.
//!
//! # Warning
//!
//! This is cryptographic software that handles private keys, so treat it with care.
//!
//! - Share arithmetic runs on a general purpose big integer type, and is not constant time.
//! Comparisons involving secrets are, and all secrets are wiped when dropped.
//! - This library has not undergone any form of audit.
//!
//! # Design
//!
//! The crate is built in layers, each only using the ones below it:
//!
//! 1. [`BigUint`], an unsigned integer of arbitrary size, along with the
//! well known curve orders in [`constants`].
//! 2. [`Field`], arithmetic modulo some prime, with inverses and uniform sampling.
//! 3. [`Polynomial`], along with share generation and Lagrange interpolation.
//! 4. Key shares: [`generate_key_shares`], [`reconstruct_secret`],
//! [`verify_share_consistency`], and their refreshing and resharing.
//! 5. The [`SigningEngine`], which signs message hashes with deterministic
//! nonces, and the [`chains`], which turn transactions into those hashes and back.
//!
//! Splitting a key produces shares like this:
//! ```ignore
//! (i, f(i)) for i in 1..=n, with f(0) = private key, deg(f) = t - 1
//! ```
//! Any `t` of these determine `f`, and thus the key, while fewer than `t`
//! say nothing about it at all.
//!
//! Each split gets a fresh session id, which every share carries along with the
//! threshold, so shares from different splits can never be mixed up.
//!
//! ## Signing
//!
//! The flow of signing a transaction is:
//!
//! - Recover a [`PrivateKey`] from shares, or take one from storage.
//! - Pick a [`SigningContext`] for the chain, which picks the signing strategy.
//! - Call [`sign_transaction`], which builds the preimage, hashes it, signs it,
//! checks the signature, and serializes the result.
//!
//! Signatures use RFC 6979 nonces, and are always normalized to low-S.
//!
//! # Generic Curves
//!
//! Key splitting works over any curve implementing the `CSCurve` trait,
//! which can be easily implemented for any curve from the
//! RustCrypto [elliptic-curves](https://github.com/RustCrypto/elliptic-curves)
//! suite of libraries.
//!
//! This crate provides implementations of some existing curves behind features,
//! as per the following table:
//!
//! | Curve | Feature |
//! |-------|---------|
//! |Secp256k1|`k256`, always on|
//! |P-256|`p256`|
//!
//! Signing itself is specific to secp256k1, since that's what both chains use.
mod bigint;
pub mod chains;
mod compat;
pub mod constants;
mod crypto;
mod der;
mod error;
mod field;
mod keys;
mod keyshare;
mod math;
mod participants;
mod serde;
mod sign;

pub use bigint::BigUint;
pub use chains::{
    sign_transaction, Chain, SignedTransaction, SigningContext, SigningStrategy,
    UnsignedTransaction,
};
pub use compat::{CSCurve, CurveContext};
pub use crypto::SessionId;
pub use error::{
    ArithmeticError, Error, FieldError, KeyError, Result, SerializationError, ShareError,
    SignatureError,
};
pub use field::{Field, FieldElement};
pub use keys::{PrivateKey, PublicKey};
pub use keyshare::{
    generate_key_shares, refresh_shares, reconstruct_secret, reshare, split_secret,
    verify_share_consistency, KeyShare, TssKeyPair,
};
pub use math::{generate_shares, interpolate_at, interpolate_at_zero, Polynomial};
pub use participants::{IndexList, ShareIndex};
pub use sign::{RecoverableSignature, Signature, SigningEngine};
