use std::{fmt, io::Write};

use ck_meow::Meow;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use crate::{error::SerializationError, serde::encode_writer};

const SESSION_LABEL: &[u8] = b"tessera v0.1.0 key session";
const SESSION_LEN: usize = 32;
const NONCE_LEN: usize = 32;

struct MeowWriter<'a>(&'a mut Meow);

impl<'a> Write for MeowWriter<'a> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.ad(buf, true);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Identifies the key generation session a share came from.
///
/// Shares from different sessions describe different polynomials, so they must
/// never be combined, even if they happen to carry the same public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId([u8; SESSION_LEN]);

impl SessionId {
    pub fn from_bytes(bytes: [u8; SESSION_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for SessionId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Serialize)]
struct SessionInput<'a> {
    curve: &'a [u8],
    #[serde(with = "serde_bytes_ref")]
    public_key: &'a [u8],
    threshold: u64,
    total: u64,
    nonce: [u8; NONCE_LEN],
}

mod serde_bytes_ref {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(data: &&[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(data)
    }
}

/// Derive a fresh session id, binding the parameters of a key generation.
///
/// A random nonce is mixed in, so that two sessions over the same public key,
/// like a refresh, still get different ids.
pub fn session_id(
    rng: &mut impl CryptoRngCore,
    curve: &[u8],
    public_key: &[u8],
    threshold: usize,
    total: usize,
) -> Result<SessionId, SerializationError> {
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let mut meow = Meow::new(SESSION_LABEL);
    meow.ad(&[], false);
    encode_writer(
        &mut MeowWriter(&mut meow),
        &SessionInput {
            curve,
            public_key,
            threshold: threshold as u64,
            total: total as u64,
            nonce,
        },
    )?;

    let mut out = [0u8; SESSION_LEN];
    meow.prf(&mut out, false);

    Ok(SessionId(out))
}
