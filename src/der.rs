//! Strict DER encoding of ECDSA signatures.
//!
//! The accepted encodings are exactly the ones BIP 66 allows:
//! `0x30 len 0x02 rlen r 0x02 slen s`, with minimal positive integers.
use crate::error::SignatureError;

const SEQUENCE: u8 = 0x30;
const INTEGER: u8 = 0x02;

/// The longest possible encoding, with both integers needing a padding byte.
pub const MAX_DER_LEN: usize = 72;
const MIN_DER_LEN: usize = 8;

/// Encode a positive big endian integer minimally, adding a zero byte if the high bit is set.
fn encode_integer(out: &mut Vec<u8>, x: &[u8; 32]) {
    let start = x.iter().position(|b| *b != 0).unwrap_or(31);
    let body = &x[start..];
    let pad = body[0] & 0x80 != 0;
    out.push(INTEGER);
    out.push((body.len() + usize::from(pad)) as u8);
    if pad {
        out.push(0);
    }
    out.extend_from_slice(body);
}

/// Encode `(r, s)` as a DER sequence.
pub fn encode(r: &[u8; 32], s: &[u8; 32]) -> Vec<u8> {
    let mut body = Vec::with_capacity(MAX_DER_LEN - 2);
    encode_integer(&mut body, r);
    encode_integer(&mut body, s);
    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(SEQUENCE);
    out.push(body.len() as u8);
    out.extend_from_slice(&body);
    out
}

fn decode_integer(x: &[u8]) -> Result<[u8; 32], SignatureError> {
    if x.is_empty() {
        return Err(SignatureError::MalformedDer("empty integer"));
    }
    if x[0] & 0x80 != 0 {
        return Err(SignatureError::MalformedDer("negative integer"));
    }
    if x.len() > 1 && x[0] == 0 && x[1] & 0x80 == 0 {
        return Err(SignatureError::MalformedDer("integer has excess padding"));
    }
    let x = if x[0] == 0 && x.len() > 1 { &x[1..] } else { x };
    if x.len() > 32 {
        return Err(SignatureError::MalformedDer("integer too large"));
    }
    let mut out = [0u8; 32];
    out[32 - x.len()..].copy_from_slice(x);
    Ok(out)
}

/// Decode a strict DER signature into `(r, s)`.
///
/// This checks the encoding only; whether the integers are valid scalars is up to the caller.
pub fn decode(der: &[u8]) -> Result<([u8; 32], [u8; 32]), SignatureError> {
    if der.len() < MIN_DER_LEN || der.len() > MAX_DER_LEN {
        return Err(SignatureError::MalformedDer("bad length"));
    }
    if der[0] != SEQUENCE {
        return Err(SignatureError::MalformedDer("not a sequence"));
    }
    if der[1] as usize != der.len() - 2 {
        return Err(SignatureError::MalformedDer("sequence length mismatch"));
    }
    if der[2] != INTEGER {
        return Err(SignatureError::MalformedDer("r is not an integer"));
    }
    let r_len = der[3] as usize;
    // room for r, and at least the header of s
    if 4 + r_len + 2 > der.len() {
        return Err(SignatureError::MalformedDer("r overruns the sequence"));
    }
    let r = &der[4..4 + r_len];
    let rest = &der[4 + r_len..];
    if rest[0] != INTEGER {
        return Err(SignatureError::MalformedDer("s is not an integer"));
    }
    let s_len = rest[1] as usize;
    if 2 + s_len != rest.len() {
        return Err(SignatureError::MalformedDer("s length mismatch"));
    }
    let s = &rest[2..];
    Ok((decode_integer(r)?, decode_integer(s)?))
}

#[cfg(test)]
mod test {
    use k256::ecdsa::{signature::hazmat::PrehashSigner, Signature, SigningKey};
    use rand_core::{OsRng, RngCore};

    use super::*;

    fn fixed(x: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[32 - x.len()..].copy_from_slice(x);
        out
    }

    #[test]
    fn test_matches_ecdsa_crate() {
        for _ in 0..64 {
            let key = SigningKey::random(&mut OsRng);
            let mut hash = [0u8; 32];
            OsRng.fill_bytes(&mut hash);
            let sig: Signature = key.sign_prehash(&hash).unwrap();
            let (r, s) = sig.split_bytes();
            let r: [u8; 32] = r.into();
            let s: [u8; 32] = s.into();
            let der = encode(&r, &s);
            assert_eq!(der.as_slice(), sig.to_der().as_bytes());
            assert!(der.len() <= MAX_DER_LEN);
            assert_eq!(decode(&der).unwrap(), (r, s));
        }
    }

    #[test]
    fn test_padding_rules() {
        let high = [0x80; 32];
        let low = fixed(&[0x01]);
        let der = encode(&high, &low);
        assert_eq!(der[..5], [0x30, 0x26, 0x02, 0x21, 0x00]);
        assert_eq!(der[der.len() - 3..], [0x02, 0x01, 0x01]);
        assert_eq!(encode(&high, &high).len(), MAX_DER_LEN);
        assert_eq!(decode(&der).unwrap(), (high, low));
    }

    #[test]
    fn test_rejects_non_strict_encodings() {
        // 0x30 06 02 01 01 02 01 01 is the smallest valid signature
        let ok = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01];
        assert_eq!(decode(&ok).unwrap(), (fixed(&[1]), fixed(&[1])));

        let cases: &[&[u8]] = &[
            // wrong tag
            &[0x31, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01],
            // wrong total length
            &[0x30, 0x07, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01],
            // negative r
            &[0x30, 0x06, 0x02, 0x01, 0x81, 0x02, 0x01, 0x01],
            // excess padding on s
            &[0x30, 0x07, 0x02, 0x01, 0x01, 0x02, 0x02, 0x00, 0x01],
            // zero length r
            &[0x30, 0x06, 0x02, 0x00, 0x02, 0x02, 0x01, 0x01],
            // s overruns
            &[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x02, 0x01],
            // too short
            &[0x30, 0x00],
        ];
        for case in cases {
            assert!(decode(case).is_err(), "accepted {}", hex::encode(case));
        }
        assert!(decode(&[0u8; 73]).is_err());
    }
}
