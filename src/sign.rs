use k256::{
    ecdsa::{self, RecoveryId, VerifyingKey},
    Secp256k1,
};
use tracing::trace;

use crate::{
    bigint::BigUint,
    compat::CurveContext,
    der,
    error::{FieldError, KeyError, Result, SignatureError},
    keys::{PrivateKey, PublicKey},
};

/// The length of a compact `r || s` encoding.
pub const COMPACT_LEN: usize = 64;

/// An ECDSA signature over secp256k1, as two big endian scalars.
///
/// Both scalars are always in `[1, n - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    pub fn from_scalars(r: [u8; 32], s: [u8; 32]) -> std::result::Result<Self, SignatureError> {
        // This checks that both scalars are nonzero and reduced.
        ecdsa::Signature::from_scalars(r, s).map_err(|_| SignatureError::Malformed)?;
        Ok(Self { r, s })
    }

    /// Parse the 64 byte `r || s` encoding.
    pub fn from_compact(bytes: &[u8]) -> std::result::Result<Self, SignatureError> {
        if bytes.len() != COMPACT_LEN {
            return Err(SignatureError::Malformed);
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self::from_scalars(r, s)
    }

    pub fn to_compact(&self) -> [u8; COMPACT_LEN] {
        let mut out = [0u8; COMPACT_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }

    /// Parse a strict DER encoding.
    pub fn from_der(bytes: &[u8]) -> std::result::Result<Self, SignatureError> {
        let (r, s) = der::decode(bytes)?;
        Self::from_scalars(r, s)
    }

    pub fn to_der(&self) -> Vec<u8> {
        der::encode(&self.r, &self.s)
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    fn to_ecdsa(self) -> std::result::Result<ecdsa::Signature, SignatureError> {
        ecdsa::Signature::from_scalars(self.r, self.s).map_err(|_| SignatureError::Malformed)
    }

    fn from_ecdsa(sig: &ecdsa::Signature) -> Self {
        let (r, s) = sig.split_bytes();
        Self {
            r: r.into(),
            s: s.into(),
        }
    }
}

/// A signature, along with which of the candidate public keys produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub signature: Signature,
    /// This is in `{0, 1, 2, 3}`: bit 0 is the parity of `R.y`, bit 1 is set if `R.x >= n`.
    pub recovery_id: u8,
}

impl RecoverableSignature {
    /// The 65 byte `r || s || recovery_id` encoding.
    pub fn to_bytes(&self) -> [u8; COMPACT_LEN + 1] {
        let mut out = [0u8; COMPACT_LEN + 1];
        out[..COMPACT_LEN].copy_from_slice(&self.signature.to_compact());
        out[COMPACT_LEN] = self.recovery_id;
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, SignatureError> {
        if bytes.len() != COMPACT_LEN + 1 {
            return Err(SignatureError::Malformed);
        }
        let recovery_id = bytes[COMPACT_LEN];
        if recovery_id > 3 {
            return Err(SignatureError::InvalidRecoveryId(recovery_id));
        }
        Ok(Self {
            signature: Signature::from_compact(&bytes[..COMPACT_LEN])?,
            recovery_id,
        })
    }
}

/// Deterministic ECDSA over secp256k1.
///
/// The engine only holds an immutable [`CurveContext`], so one engine can be
/// shared between any number of threads, and independent engines never interact.
#[derive(Debug, Clone)]
pub struct SigningEngine {
    ctx: CurveContext<Secp256k1>,
    half_order: BigUint,
}

impl SigningEngine {
    pub fn new() -> std::result::Result<Self, FieldError> {
        Ok(Self::with_context(CurveContext::new()?))
    }

    pub fn with_context(ctx: CurveContext<Secp256k1>) -> Self {
        let half_order = ctx.scalar_field().modulus().shr(1);
        Self { ctx, half_order }
    }

    pub fn context(&self) -> &CurveContext<Secp256k1> {
        &self.ctx
    }

    /// Check whether `s <= n / 2`.
    pub fn is_low_s(&self, signature: &Signature) -> bool {
        BigUint::from_bytes_be(&signature.s) <= self.half_order
    }

    /// Replace `s` by `n - s` if needed to make it low, flipping the parity of the recovery id.
    fn normalize_s(&self, sig: Signature, recovery_id: u8) -> Result<(Signature, u8)> {
        if self.is_low_s(&sig) {
            return Ok((sig, recovery_id));
        }
        let field = self.ctx.scalar_field();
        let s = field.element(BigUint::from_bytes_be(&sig.s))?;
        let s = field
            .negate(&s)?
            .value()
            .to_bytes_be_padded(32)?;
        let mut out = sig;
        out.s.copy_from_slice(&s);
        Ok((out, recovery_id ^ 1))
    }

    /// Sign a 32 byte message hash, with a nonce derived as in RFC 6979.
    ///
    /// The result is always in low-S form.
    pub fn sign(&self, hash: &[u8; 32], key: &PrivateKey) -> Result<Signature> {
        Ok(self.sign_recoverable(hash, key)?.signature)
    }

    /// Sign a message hash, also returning the recovery id of the result.
    pub fn sign_recoverable(
        &self,
        hash: &[u8; 32],
        key: &PrivateKey,
    ) -> Result<RecoverableSignature> {
        let (sig, recid) = key
            .signing_key()
            .sign_prehash_recoverable(hash)
            .map_err(|_| SignatureError::Malformed)?;
        let (signature, recovery_id) =
            self.normalize_s(Signature::from_ecdsa(&sig), recid.to_byte())?;
        trace!(recovery_id, "signed message hash");
        Ok(RecoverableSignature {
            signature,
            recovery_id,
        })
    }

    /// Verify a signature against a SEC1 encoded public key.
    ///
    /// A signature that merely fails to verify gives `Ok(false)`; only a
    /// malformed public key is an error. High-S signatures never verify.
    pub fn verify(
        &self,
        signature: &Signature,
        hash: &[u8; 32],
        public_key: &[u8],
    ) -> std::result::Result<bool, KeyError> {
        let key = PublicKey::from_sec1_bytes(public_key)?;
        Ok(self.verify_key(signature, hash, &key))
    }

    pub fn verify_key(&self, signature: &Signature, hash: &[u8; 32], key: &PublicKey) -> bool {
        use k256::ecdsa::signature::hazmat::PrehashVerifier;

        let Ok(sig) = signature.to_ecdsa() else {
            return false;
        };
        key.verifying_key().verify_prehash(hash, &sig).is_ok()
    }

    /// Recover the public key that produced a signature.
    pub fn recover_public_key(
        &self,
        signature: &Signature,
        recovery_id: u8,
        hash: &[u8; 32],
    ) -> std::result::Result<PublicKey, SignatureError> {
        let recid = RecoveryId::from_byte(recovery_id)
            .ok_or(SignatureError::InvalidRecoveryId(recovery_id))?;
        let sig = signature.to_ecdsa()?;
        let key = VerifyingKey::recover_from_prehash(hash, &sig, recid)
            .map_err(|_| SignatureError::VerificationFailed)?;
        Ok(PublicKey::from_verifying_key(&key))
    }
}
