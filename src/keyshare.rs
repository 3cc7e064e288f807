use std::fmt;

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::{
    compat::{CSCurve, CurveContext},
    crypto::{session_id, SessionId},
    error::{KeyError, Result, SerializationError, ShareError},
    field::FieldElement,
    math::{check_threshold, generate_shares, interpolate_at, interpolate_at_zero},
    participants::{IndexList, ShareIndex},
    serde::{decode, encode_writer},
};

/// Room for everything in an exported share besides the two field integers.
const EXPORT_OVERHEAD: usize = 160;

/// One custodian's piece of a split key.
///
/// This is the evaluation of the generating polynomial at `index`, tagged with
/// the session that produced it and the parameters of that session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawKeyShare")]
pub struct KeyShare {
    session: SessionId,
    index: ShareIndex,
    threshold: u32,
    total: u32,
    value: FieldElement,
}

impl KeyShare {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn index(&self) -> ShareIndex {
        self.index
    }

    /// How many shares are needed to recover the key.
    pub fn threshold(&self) -> usize {
        self.threshold as usize
    }

    /// How many shares were handed out in this session.
    pub fn total(&self) -> usize {
        self.total as usize
    }

    pub fn value(&self) -> &FieldElement {
        &self.value
    }

    /// Export this share as MessagePack.
    ///
    /// The buffer holds the share value, and is wiped when dropped.
    pub fn to_bytes(&self) -> std::result::Result<Zeroizing<Vec<u8>>, SerializationError> {
        // Sized up front, so the encoder never leaves a stale copy behind when growing.
        let mut buf = Zeroizing::new(Vec::with_capacity(self.export_len_bound()));
        encode_writer(&mut *buf, self)?;
        Ok(buf)
    }

    /// Import a share exported with [`KeyShare::to_bytes`], checking every invariant.
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, SerializationError> {
        decode(bytes)
    }

    fn export_len_bound(&self) -> usize {
        let int_len = (self.value.modulus().bits() + 7) / 8;
        EXPORT_OVERHEAD + 2 * int_len
    }

    fn point(&self) -> (ShareIndex, FieldElement) {
        (self.index, self.value.clone())
    }
}

impl fmt::Debug for KeyShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyShare")
            .field("session", &self.session)
            .field("index", &self.index)
            .field("threshold", &self.threshold)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

impl Zeroize for KeyShare {
    fn zeroize(&mut self) {
        self.value.zeroize();
    }
}

#[derive(Deserialize)]
struct RawKeyShare {
    session: SessionId,
    index: ShareIndex,
    threshold: u32,
    total: u32,
    value: FieldElement,
}

impl TryFrom<RawKeyShare> for KeyShare {
    type Error = ShareError;

    fn try_from(raw: RawKeyShare) -> std::result::Result<Self, Self::Error> {
        if raw.threshold < 1 || raw.threshold > raw.total {
            return Err(ShareError::InvalidThreshold {
                threshold: raw.threshold as usize,
                total: raw.total as usize,
            });
        }
        if raw.index.get() > raw.total {
            return Err(ShareError::InvalidIndex);
        }
        Ok(Self {
            session: raw.session,
            index: raw.index,
            threshold: raw.threshold,
            total: raw.total,
            value: raw.value,
        })
    }
}

/// The result of splitting a key.
///
/// The private key itself is not part of this: it only ever exists while
/// the shares are being generated or while they're being combined.
#[derive(Debug, Clone)]
pub struct TssKeyPair {
    /// The compressed SEC1 encoding of the public key.
    pub public_key: Vec<u8>,
    pub shares: Vec<KeyShare>,
    pub threshold: usize,
    pub total_shares: usize,
    pub session: SessionId,
}

/// Generate a fresh key, and split it into `total` shares, any `threshold` of
/// which can recover it.
pub fn generate_key_shares<C: CSCurve>(
    rng: &mut impl CryptoRngCore,
    ctx: &CurveContext<C>,
    threshold: usize,
    total: usize,
) -> Result<TssKeyPair> {
    check_threshold(ctx.scalar_field(), threshold, total)?;
    let mut secret = ctx.scalar_field().random_nonzero(&mut *rng);
    let out = split_secret(rng, ctx, &secret, threshold, total);
    secret.zeroize();
    out
}

/// Split an existing private key into shares.
///
/// The key must be in `[1, order - 1]`.
pub fn split_secret<C: CSCurve>(
    rng: &mut impl CryptoRngCore,
    ctx: &CurveContext<C>,
    secret: &FieldElement,
    threshold: usize,
    total: usize,
) -> Result<TssKeyPair> {
    let public_key = ctx.public_key(secret, true)?;
    let points = generate_shares(&mut *rng, ctx.scalar_field(), secret, threshold, total)?;
    let session = session_id(rng, ctx.name(), &public_key, threshold, total)?;
    let shares = points
        .into_iter()
        .map(|(index, value)| KeyShare {
            session,
            index,
            threshold: threshold as u32,
            total: total as u32,
            value,
        })
        .collect();

    debug!(%session, threshold, total, "split key into shares");

    Ok(TssKeyPair {
        public_key,
        shares,
        threshold,
        total_shares: total,
        session,
    })
}

/// Check that a set of shares all come from a single session, returning its threshold.
fn common_threshold(shares: &[KeyShare]) -> std::result::Result<usize, ShareError> {
    let first = shares.first().ok_or(ShareError::InsufficientShares {
        needed: 1,
        found: 0,
    })?;
    for share in &shares[1..] {
        if share.session != first.session
            || share.threshold != first.threshold
            || share.total != first.total
        {
            return Err(ShareError::SessionMismatch);
        }
    }
    Ok(first.threshold())
}

/// Recover the private key from at least `threshold` shares.
///
/// The result is wiped when dropped, but callers should drop it as soon as possible.
pub fn reconstruct_secret<C: CSCurve>(
    shares: &[KeyShare],
    ctx: &CurveContext<C>,
) -> std::result::Result<FieldElement, ShareError> {
    let threshold = common_threshold(shares)?;
    let points: Vec<_> = shares.iter().map(KeyShare::point).collect();
    debug!(count = shares.len(), threshold, "reconstructing secret");
    interpolate_at_zero(ctx.scalar_field(), &points, threshold)
}

/// Check that a set of shares all lie on a polynomial whose secret matches a public key.
///
/// The secret is recovered from the `threshold` shares with the lowest indices;
/// every further share must then agree with the polynomial those shares define.
pub fn verify_share_consistency<C: CSCurve>(
    shares: &[KeyShare],
    expected_public_key: &[u8],
    ctx: &CurveContext<C>,
) -> Result<()> {
    ctx.validate_public_key(expected_public_key)?;
    let threshold = common_threshold(shares)?;

    let indices: Vec<_> = shares.iter().map(KeyShare::index).collect();
    IndexList::new(&indices)?;

    let mut sorted: Vec<&KeyShare> = shares.iter().collect();
    sorted.sort_by_key(|s| s.index);
    if sorted.len() < threshold {
        return Err(ShareError::InsufficientShares {
            needed: threshold,
            found: sorted.len(),
        }
        .into());
    }
    let (base, extra) = sorted.split_at(threshold);
    let points: Vec<_> = base.iter().map(|s| s.point()).collect();

    let secret = interpolate_at_zero(ctx.scalar_field(), &points, threshold)?;
    let compress = expected_public_key.len() == 33;
    let derived = match ctx.public_key(&secret, compress) {
        Ok(derived) => derived,
        Err(KeyError::InvalidPrivateKey) => return Err(ShareError::InconsistentShares.into()),
        Err(e) => return Err(e.into()),
    };
    drop(secret);
    if !bool::from(derived.as_slice().ct_eq(expected_public_key)) {
        return Err(ShareError::InconsistentShares.into());
    }

    for share in extra {
        let x = share.index.to_element(ctx.scalar_field());
        let y = interpolate_at(ctx.scalar_field(), &points, &x)?;
        if !bool::from(y.ct_eq(&share.value)) {
            return Err(ShareError::InconsistentShares.into());
        }
    }
    Ok(())
}

/// Create new shares of a key, with a new threshold and number of shares.
///
/// The key, and thus the public key, stays the same. The new shares belong to a
/// new session, so they can never be combined with the old ones.
pub fn reshare<C: CSCurve>(
    rng: &mut impl CryptoRngCore,
    ctx: &CurveContext<C>,
    shares: &[KeyShare],
    new_threshold: usize,
    new_total: usize,
) -> Result<TssKeyPair> {
    check_threshold(ctx.scalar_field(), new_threshold, new_total)?;
    let old_session = shares.first().map(KeyShare::session);
    let secret = reconstruct_secret(shares, ctx)?;
    let out = split_secret(rng, ctx, &secret, new_threshold, new_total)?;
    drop(secret);
    verify_share_consistency(&out.shares, &out.public_key, ctx)?;
    debug!(
        old_session = ?old_session,
        new_session = %out.session,
        new_threshold,
        new_total,
        "reshared key"
    );
    Ok(out)
}

/// Create new shares of a key, keeping the threshold and number of shares.
///
/// This is useful when some shares may have leaked: on their own, the old shares
/// say nothing about the new ones.
pub fn refresh_shares<C: CSCurve>(
    rng: &mut impl CryptoRngCore,
    ctx: &CurveContext<C>,
    shares: &[KeyShare],
) -> Result<TssKeyPair> {
    let first = shares.first().ok_or(ShareError::InsufficientShares {
        needed: 1,
        found: 0,
    })?;
    let (threshold, total) = (first.threshold(), first.total());
    reshare(rng, ctx, shares, threshold, total)
}

#[cfg(test)]
mod test {
    use k256::Secp256k1;
    use rand_core::OsRng;

    use super::*;
    use crate::{bigint::BigUint, error::Error};

    fn ctx() -> CurveContext<Secp256k1> {
        CurveContext::new().unwrap()
    }

    fn fixed_secret(ctx: &CurveContext<Secp256k1>) -> FieldElement {
        let x = BigUint::from_hex(
            "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
        )
        .unwrap();
        ctx.scalar_field().element(x).unwrap()
    }

    fn pick(key: &TssKeyPair, indices: &[u32]) -> Vec<KeyShare> {
        key.shares
            .iter()
            .filter(|s| indices.contains(&s.index().get()))
            .cloned()
            .collect()
    }

    #[test]
    fn test_two_of_three() {
        let ctx = ctx();
        let secret = fixed_secret(&ctx);
        let key = split_secret(&mut OsRng, &ctx, &secret, 2, 3).unwrap();
        assert_eq!(key.shares.len(), 3);
        assert_eq!(key.public_key, ctx.public_key(&secret, true).unwrap());

        for subset in [&[1, 3], &[2, 3]] {
            let shares = pick(&key, subset);
            let recovered = reconstruct_secret(&shares, &ctx).unwrap();
            assert_eq!(recovered, secret);
            assert_eq!(ctx.public_key(&recovered, true).unwrap(), key.public_key);
        }
    }

    #[test]
    fn test_generated_keys_verify() {
        let ctx = ctx();
        let key = generate_key_shares(&mut OsRng, &ctx, 3, 5).unwrap();
        assert_eq!(key.threshold, 3);
        assert_eq!(key.total_shares, 5);
        assert_eq!(key.public_key.len(), 33);
        assert!(verify_share_consistency(&key.shares, &key.public_key, &ctx).is_ok());
        assert!(verify_share_consistency(&key.shares[2..], &key.public_key, &ctx).is_ok());
    }

    #[test]
    fn test_insufficient_shares() {
        let ctx = ctx();
        let secret = fixed_secret(&ctx);
        let key = split_secret(&mut OsRng, &ctx, &secret, 3, 5).unwrap();
        assert_eq!(
            reconstruct_secret(&key.shares[..2], &ctx),
            Err(ShareError::InsufficientShares {
                needed: 3,
                found: 2
            })
        );
        assert!(reconstruct_secret(&[], &ctx).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        let ctx = ctx();
        assert_eq!(
            generate_key_shares(&mut OsRng, &ctx, 4, 3).unwrap_err(),
            Error::Share(ShareError::InvalidThreshold {
                threshold: 4,
                total: 3
            })
        );
        assert!(generate_key_shares(&mut OsRng, &ctx, 0, 3).is_err());
        let zero = ctx.scalar_field().zero();
        assert_eq!(
            split_secret(&mut OsRng, &ctx, &zero, 2, 3).unwrap_err(),
            Error::Key(KeyError::InvalidPrivateKey)
        );
    }

    #[test]
    fn test_sessions_do_not_mix() {
        let ctx = ctx();
        let secret = fixed_secret(&ctx);
        let a = split_secret(&mut OsRng, &ctx, &secret, 2, 3).unwrap();
        let b = split_secret(&mut OsRng, &ctx, &secret, 2, 3).unwrap();
        assert_ne!(a.session, b.session);
        let mixed = vec![a.shares[0].clone(), b.shares[1].clone()];
        assert_eq!(
            reconstruct_secret(&mixed, &ctx),
            Err(ShareError::SessionMismatch)
        );
    }

    #[test]
    fn test_inconsistent_shares() {
        let ctx = ctx();
        let key = generate_key_shares(&mut OsRng, &ctx, 2, 4).unwrap();
        let other = generate_key_shares(&mut OsRng, &ctx, 2, 4).unwrap();
        assert_eq!(
            verify_share_consistency(&key.shares, &other.public_key, &ctx).unwrap_err(),
            Error::Share(ShareError::InconsistentShares)
        );

        // Corrupt a share beyond the first two.
        let mut shares = key.shares.clone();
        shares[3].value = ctx.scalar_field().random(&mut OsRng);
        assert_eq!(
            verify_share_consistency(&shares, &key.public_key, &ctx).unwrap_err(),
            Error::Share(ShareError::InconsistentShares)
        );

        assert!(matches!(
            verify_share_consistency(&key.shares, &[0x02; 5], &ctx),
            Err(Error::Key(KeyError::MalformedPublicKey(5)))
        ));
    }

    #[test]
    fn test_refresh_and_reshare() {
        let ctx = ctx();
        let secret = fixed_secret(&ctx);
        let key = split_secret(&mut OsRng, &ctx, &secret, 2, 3).unwrap();

        let refreshed = refresh_shares(&mut OsRng, &ctx, &key.shares[1..]).unwrap();
        assert_eq!(refreshed.public_key, key.public_key);
        assert_eq!(refreshed.threshold, 2);
        assert_eq!(refreshed.total_shares, 3);
        assert_ne!(refreshed.session, key.session);
        assert_ne!(refreshed.shares[0].value(), key.shares[0].value());
        assert_eq!(reconstruct_secret(&refreshed.shares[..2], &ctx).unwrap(), secret);

        let mixed = vec![key.shares[0].clone(), refreshed.shares[1].clone()];
        assert!(reconstruct_secret(&mixed, &ctx).is_err());

        let reshared = reshare(&mut OsRng, &ctx, &refreshed.shares, 3, 5).unwrap();
        assert_eq!(reshared.public_key, key.public_key);
        assert_eq!(reshared.shares.len(), 5);
        assert_eq!(reconstruct_secret(&reshared.shares[2..], &ctx).unwrap(), secret);
    }

    #[test]
    fn test_share_export() {
        let ctx = ctx();
        let key = generate_key_shares(&mut OsRng, &ctx, 2, 3).unwrap();
        let share = &key.shares[1];
        let bytes = share.to_bytes().unwrap();
        let back = KeyShare::from_bytes(&bytes).unwrap();
        assert_eq!(&back, share);
        assert!(KeyShare::from_bytes(&bytes[..bytes.len() - 1]).is_err());

        let raw = |threshold, total| RawKeyShare {
            session: share.session,
            index: share.index,
            threshold,
            total,
            value: share.value.clone(),
        };
        assert!(KeyShare::try_from(raw(2, 3)).is_ok());
        assert_eq!(
            KeyShare::try_from(raw(4, 3)),
            Err(ShareError::InvalidThreshold {
                threshold: 4,
                total: 3
            })
        );
        assert_eq!(KeyShare::try_from(raw(1, 1)), Err(ShareError::InvalidIndex));
    }

    #[test]
    fn test_export_buffer_never_grows() {
        let ctx = ctx();
        let key = generate_key_shares(&mut OsRng, &ctx, 3, 5).unwrap();
        for share in &key.shares {
            let bytes = share.to_bytes().unwrap();
            assert_eq!(bytes.capacity(), share.export_len_bound());
            assert!(bytes.len() <= bytes.capacity());
        }

        let ctx = CurveContext::<p256::NistP256>::new().unwrap();
        let key = generate_key_shares(&mut OsRng, &ctx, 2, 3).unwrap();
        let bytes = key.shares[0].to_bytes().unwrap();
        assert_eq!(bytes.capacity(), key.shares[0].export_len_bound());
        assert_eq!(KeyShare::from_bytes(&bytes).unwrap(), key.shares[0]);
    }

    #[test]
    fn test_duplicate_extra_share() {
        let ctx = ctx();
        let key = generate_key_shares(&mut OsRng, &ctx, 2, 3).unwrap();
        let shares = vec![
            key.shares[0].clone(),
            key.shares[1].clone(),
            key.shares[1].clone(),
        ];
        assert_eq!(
            verify_share_consistency(&shares, &key.public_key, &ctx).unwrap_err(),
            Error::Share(ShareError::DuplicateShareIndex(2))
        );
    }

    #[test]
    fn test_zeroize_clears_value() {
        let ctx = ctx();
        let key = generate_key_shares(&mut OsRng, &ctx, 2, 3).unwrap();
        let mut share = key.shares[0].clone();
        assert!(!share.value().is_zero());
        share.zeroize();
        assert!(share.value().is_zero());
        assert_eq!(share.index(), key.shares[0].index());
    }

    #[test]
    fn test_debug_hides_value() {
        let ctx = ctx();
        let secret = fixed_secret(&ctx);
        let key = split_secret(&mut OsRng, &ctx, &secret, 2, 3).unwrap();
        let printed = format!("{:?}", key);
        for share in &key.shares {
            assert!(!printed.contains(&share.value().value().to_hex()));
        }
        assert!(!printed.contains(&secret.value().to_hex()));
    }

    #[test]
    fn test_single_share_looks_uniform() {
        const SAMPLES: usize = 512;
        let ctx = ctx();
        let secret = fixed_secret(&ctx);

        let samples: Vec<Zeroizing<Vec<u8>>> = (0..SAMPLES)
            .map(|_| {
                let key = split_secret(&mut OsRng, &ctx, &secret, 2, 3).unwrap();
                key.shares[0].value().to_bytes()
            })
            .collect();

        for bit in 0..256 {
            let ones = samples
                .iter()
                .filter(|s| (s[bit / 8] >> (7 - bit % 8)) & 1 == 1)
                .count();
            let freq = ones as f64 / SAMPLES as f64;
            assert!((freq - 0.5).abs() < 0.15, "bit {bit} has frequency {freq}");
        }

        let total: u32 = samples
            .windows(2)
            .map(|w| {
                w[0].iter()
                    .zip(w[1].iter())
                    .map(|(a, b)| (a ^ b).count_ones())
                    .sum::<u32>()
            })
            .sum();
        let mean = total as f64 / (SAMPLES - 1) as f64;
        assert!((mean - 128.0).abs() < 6.0, "mean hamming distance {mean}");
    }
}
