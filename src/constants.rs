//! Named group orders and field primes.
//!
//! These are stored as little endian limbs so that building them never
//! involves parsing.
use crate::bigint::BigUint;

/// n = FFFFFFFF FFFFFFFF FFFFFFFF FFFFFFFE BAAEDCE6 AF48A03B BFD25E8C D0364141
const SECP256K1_ORDER: [u64; 4] = [
    0xBFD25E8CD0364141,
    0xBAAEDCE6AF48A03B,
    0xFFFFFFFFFFFFFFFE,
    0xFFFFFFFFFFFFFFFF,
];

/// p = 2^256 - 2^32 - 977
const SECP256K1_PRIME: [u64; 4] = [
    0xFFFFFFFEFFFFFC2F,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
];

/// l = 2^252 + 27742317777372353535851937790883648493
const ED25519_ORDER: [u64; 4] = [
    0x5812631A5CF5D3ED,
    0x14DEF9DEA2F79CD6,
    0x0000000000000000,
    0x1000000000000000,
];

/// n = FFFFFFFF 00000000 FFFFFFFF FFFFFFFF BCE6FAAD A7179E84 F3B9CAC2 FC632551
const P256_ORDER: [u64; 4] = [
    0xF3B9CAC2FC632551,
    0xBCE6FAADA7179E84,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFF00000000,
];

/// p = 2^256 - 2^224 + 2^192 + 2^96 - 1
const P256_PRIME: [u64; 4] = [
    0xFFFFFFFFFFFFFFFF,
    0x00000000FFFFFFFF,
    0x0000000000000000,
    0xFFFFFFFF00000001,
];

pub fn secp256k1_order() -> BigUint {
    BigUint::from_limbs(&SECP256K1_ORDER)
}

pub fn secp256k1_prime() -> BigUint {
    BigUint::from_limbs(&SECP256K1_PRIME)
}

pub fn ed25519_order() -> BigUint {
    BigUint::from_limbs(&ED25519_ORDER)
}

pub fn p256_order() -> BigUint {
    BigUint::from_limbs(&P256_ORDER)
}

pub fn p256_prime() -> BigUint {
    BigUint::from_limbs(&P256_PRIME)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_constants_match_their_hex() {
        assert_eq!(
            secp256k1_order(),
            BigUint::from_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141")
                .unwrap()
        );
        assert_eq!(
            secp256k1_prime(),
            BigUint::from_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F")
                .unwrap()
        );
        assert_eq!(
            ed25519_order(),
            BigUint::from_hex("1000000000000000000000000000000014DEF9DEA2F79CD65812631A5CF5D3ED")
                .unwrap()
        );
        assert_eq!(
            p256_order(),
            BigUint::from_hex("FFFFFFFF00000000FFFFFFFFFFFFFFFFBCE6FAADA7179E84F3B9CAC2FC632551")
                .unwrap()
        );
        assert_eq!(
            p256_prime(),
            BigUint::from_hex("FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFF")
                .unwrap()
        );
    }

    #[test]
    fn test_secp256k1_prime_shape() {
        // p = 2^256 - 2^32 - 977
        let two_256 = BigUint::one().shl(256);
        let c = BigUint::one().shl(32).add(&BigUint::from_u64(977));
        assert_eq!(two_256.sub(&c).unwrap(), secp256k1_prime());
    }

    #[test]
    fn test_orders_agree_with_curve_crates() {
        use elliptic_curve::Curve;

        let k256_order = BigUint::from_hex(&format!("{:x}", k256::Secp256k1::ORDER)).unwrap();
        assert_eq!(k256_order, secp256k1_order());
        let p256_order_ = BigUint::from_hex(&format!("{:x}", p256::NistP256::ORDER)).unwrap();
        assert_eq!(p256_order_, p256_order());
    }
}
