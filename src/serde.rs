//! MessagePack encoding, and serde support for our integer type.
use std::{fmt, io::Write};

use serde::{
    de::{self, DeserializeOwned, SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use zeroize::Zeroizing;

use crate::{bigint::BigUint, error::SerializationError};

/// Encode an arbitrary serializable value into a writer.
pub fn encode_writer<T: Serialize, W: Write>(
    w: &mut W,
    val: &T,
) -> Result<(), SerializationError> {
    rmp_serde::encode::write(w, val).map_err(|_| SerializationError::Encoding)
}

/// Decode a value produced by [`encode_writer`].
///
/// The decoder's own error is discarded, as it may quote the input.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    rmp_serde::from_slice(bytes).map_err(|_| SerializationError::MalformedShare)
}

impl Serialize for BigUint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes = Zeroizing::new(self.to_bytes_be());
        serializer.serialize_bytes(&bytes)
    }
}

struct BigUintVisitor;

impl<'de> Visitor<'de> for BigUintVisitor {
    type Value = BigUint;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("big endian bytes")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(BigUint::from_bytes_be(v))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        let v = Zeroizing::new(v);
        Ok(BigUint::from_bytes_be(&v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(seq.size_hint().unwrap_or(0)));
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        Ok(BigUint::from_bytes_be(&bytes))
    }
}

impl<'de> Deserialize<'de> for BigUint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(BigUintVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode(x: &BigUint) -> Vec<u8> {
        let mut out = Vec::new();
        encode_writer(&mut out, x).unwrap();
        out
    }

    #[test]
    fn test_biguint_survives_messagepack() {
        for x in [
            BigUint::zero(),
            BigUint::from_u64(0xFF),
            BigUint::from_hex("0102030405060708090a0b0c0d0e0f101112").unwrap(),
        ] {
            let bytes = encode(&x);
            let y: BigUint = decode(&bytes).unwrap();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_biguint_is_encoded_as_binary() {
        // bin8 marker, length, then the minimal big endian bytes
        let bytes = encode(&BigUint::from_u64(0x0102));
        assert_eq!(bytes, vec![0xc4, 0x02, 0x01, 0x02]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(
            decode::<BigUint>(&[0xc1]),
            Err(SerializationError::MalformedShare)
        );
    }
}
