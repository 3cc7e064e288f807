//! The error taxonomy for every layer of the crate.
//!
//! Each layer has its own error type, and [`Error`] gathers them for callers
//! that drive several layers at once, like the transaction signing engine.
//!
//! None of these errors ever carry key material: they describe *what* was wrong
//! with an input (an index, a length, a count), never the secret values involved.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("field error: {0}")]
    Field(#[from] FieldError),

    #[error("share error: {0}")]
    Share(#[from] ShareError),

    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

/// Errors from the big integer engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("unsigned subtraction underflowed")]
    Underflow,

    #[error("value needs {needed} bytes, but only {available} are available")]
    Overflow { needed: usize, available: usize },

    #[error("invalid hex digit at position {0}")]
    InvalidHex(usize),
}

/// Errors from modular arithmetic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("element has no inverse modulo the field modulus")]
    NoInverse,

    #[error("cannot combine elements of different fields")]
    ModulusMismatch,

    #[error("field modulus must be at least 2")]
    InvalidModulus,

    #[error("result escaped the range [0, modulus)")]
    NotReduced,

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Errors from secret sharing and threshold key management.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("invalid threshold {threshold} for {total} shares")]
    InvalidThreshold { threshold: usize, total: usize },

    #[error("need at least {needed} shares, found {found}")]
    InsufficientShares { needed: usize, found: usize },

    #[error("share index {0} appears more than once")]
    DuplicateShareIndex(u32),

    #[error("share index must be at least 1")]
    InvalidIndex,

    #[error("shares come from different key generation sessions")]
    SessionMismatch,

    #[error("shares do not match the expected public key")]
    InconsistentShares,

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Errors about private and public keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("private key is outside of [1, order - 1]")]
    InvalidPrivateKey,

    #[error("malformed public key encoding of length {0}")]
    MalformedPublicKey(usize),

    #[error("public key is not a point on the curve")]
    PointNotOnCurve,

    #[error("key does not control the output being spent by input {0}")]
    KeyMismatch(usize),

    #[error("expected {expected} keys, found {found}")]
    KeyCountMismatch { expected: usize, found: usize },
}

/// Errors about signatures and their encodings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed DER signature: {0}")]
    MalformedDer(&'static str),

    #[error("malformed signature")]
    Malformed,

    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),

    #[error("signature failed to verify")]
    VerificationFailed,
}

/// Errors about transaction structure and wire formats.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("unexpected end of data while reading {0}")]
    Truncated(&'static str),

    #[error("varint value {0} exceeds the maximum allowed size")]
    VarIntOverflow(u64),

    #[error("varint is not minimally encoded")]
    NonCanonicalVarInt,

    #[error("truncated witness data for input {0}")]
    TruncatedWitness(usize),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(&'static str),

    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    #[error("unsupported script for input {0}")]
    UnsupportedScript(usize),

    #[error("input index {index} out of range for {count} inputs")]
    InputIndexOutOfRange { index: usize, count: usize },

    #[error("malformed share encoding")]
    MalformedShare,

    #[error("failed to encode value")]
    Encoding,

    #[error("signing context requires a chain id")]
    MissingChainId,

    #[error("transaction does not belong to the chain selected by the signing context")]
    ChainMismatch,

    #[error("invalid address: {0}")]
    InvalidAddress(&'static str),
}
