//! Ethereum transactions and addresses.
//!
//! Legacy transactions are signed with EIP-155 replay protection when a chain id
//! is known, and without it otherwise. EIP-1559 transactions always carry their
//! chain id, and are serialized with the `0x02` type prefix.
use std::{fmt, str::FromStr};

use rlp::RlpStream;
use sha3::{Digest, Keccak256};
use tracing::debug;

use super::{Chain, Pipeline, SignedTransaction, Stage};
use crate::{
    bigint::BigUint,
    error::{KeyError, Result, SerializationError, SignatureError},
    keys::{PrivateKey, PublicKey},
    sign::{RecoverableSignature, SigningEngine},
};

const EIP1559_TX_TYPE: u8 = 0x02;
const PRE_EIP155_V_OFFSET: u64 = 27;
const EIP155_V_OFFSET: u64 = 35;

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// The EIP-191 hash of a message, as signed by `personal_sign`.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// A 20 byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The last 20 bytes of the Keccak-256 hash of the uncompressed key, without its prefix.
    pub fn from_public_key(key: &PublicKey) -> Self {
        let hash = keccak256(&key.to_uncompressed()[1..]);
        let mut out = [0u8; 20];
        out.copy_from_slice(&hash[12..]);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The EIP-55 mixed case encoding, with a `0x` prefix.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(2 + lower.len());
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (4 * (1 - i % 2))) & 0xf;
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = SerializationError;

    /// Parse a `0x` prefixed address.
    ///
    /// All lowercase and all uppercase strings are accepted as is; mixed case
    /// strings must carry a valid EIP-55 checksum.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or(SerializationError::InvalidAddress("missing 0x prefix"))?;
        if digits.len() != 2 * Self::LEN {
            return Err(SerializationError::InvalidAddress("wrong length"));
        }
        let mut out = [0u8; 20];
        hex::decode_to_slice(digits, &mut out)
            .map_err(|_| SerializationError::InvalidAddress("not hex"))?;
        let address = Self(out);
        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum() != s {
            return Err(SerializationError::InvalidAddress("bad checksum"));
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

/// Append an unsigned integer, given as big endian bytes, in its minimal form.
fn append_uint(s: &mut RlpStream, be: &[u8]) {
    let start = be.iter().position(|b| *b != 0).unwrap_or(be.len());
    s.append(&be[start..].to_vec());
}

fn append_to(s: &mut RlpStream, to: &Option<Address>) {
    match to {
        Some(to) => {
            s.append(&to.0.to_vec());
        }
        None => {
            s.append_empty_data();
        }
    }
}

/// A transaction from before typed envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    /// `None` creates a contract.
    pub to: Option<Address>,
    /// The amount, in wei.
    pub value: BigUint,
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    const FIELDS: usize = 6;

    fn append_fields(&self, s: &mut RlpStream) {
        append_uint(s, &self.nonce.to_be_bytes());
        append_uint(s, &self.gas_price.to_be_bytes());
        append_uint(s, &self.gas_limit.to_be_bytes());
        append_to(s, &self.to);
        append_uint(s, &self.value.to_bytes_be());
        s.append(&self.data);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<[u8; 32]>,
}

/// An EIP-1559 fee market transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip1559Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: BigUint,
    pub data: Vec<u8>,
    pub access_list: Vec<AccessListItem>,
}

impl Eip1559Transaction {
    const FIELDS: usize = 9;

    fn append_fields(&self, s: &mut RlpStream) {
        append_uint(s, &self.chain_id.to_be_bytes());
        append_uint(s, &self.nonce.to_be_bytes());
        append_uint(s, &self.max_priority_fee_per_gas.to_be_bytes());
        append_uint(s, &self.max_fee_per_gas.to_be_bytes());
        append_uint(s, &self.gas_limit.to_be_bytes());
        append_to(s, &self.to);
        append_uint(s, &self.value.to_bytes_be());
        s.append(&self.data);
        s.begin_list(self.access_list.len());
        for item in &self.access_list {
            s.begin_list(2);
            s.append(&item.address.0.to_vec());
            s.begin_list(item.storage_keys.len());
            for key in &item.storage_keys {
                s.append(&key.to_vec());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EthereumTransaction {
    Legacy(LegacyTransaction),
    Eip1559(Eip1559Transaction),
}

impl EthereumTransaction {
    /// Resolve the chain id to sign with, given the one from the signing context.
    fn chain_id(
        &self,
        context: Option<u64>,
    ) -> std::result::Result<Option<u64>, SerializationError> {
        match self {
            EthereumTransaction::Legacy(_) => Ok(context),
            EthereumTransaction::Eip1559(tx) => match context {
                None => Err(SerializationError::MissingChainId),
                Some(id) if id != tx.chain_id => Err(SerializationError::ChainMismatch),
                Some(id) => Ok(Some(id)),
            },
        }
    }

    /// The bytes whose Keccak-256 hash gets signed.
    pub fn signing_payload(
        &self,
        chain_id: Option<u64>,
    ) -> std::result::Result<Vec<u8>, SerializationError> {
        let chain_id = self.chain_id(chain_id)?;
        Ok(match self {
            EthereumTransaction::Legacy(tx) => match chain_id {
                Some(id) => {
                    let mut s = RlpStream::new_list(LegacyTransaction::FIELDS + 3);
                    tx.append_fields(&mut s);
                    append_uint(&mut s, &id.to_be_bytes());
                    s.append_empty_data();
                    s.append_empty_data();
                    s.out().to_vec()
                }
                None => {
                    let mut s = RlpStream::new_list(LegacyTransaction::FIELDS);
                    tx.append_fields(&mut s);
                    s.out().to_vec()
                }
            },
            EthereumTransaction::Eip1559(tx) => {
                let mut s = RlpStream::new_list(Eip1559Transaction::FIELDS);
                tx.append_fields(&mut s);
                let mut out = vec![EIP1559_TX_TYPE];
                out.extend_from_slice(&s.out());
                out
            }
        })
    }

    pub fn signing_hash(
        &self,
        chain_id: Option<u64>,
    ) -> std::result::Result<[u8; 32], SerializationError> {
        Ok(keccak256(&self.signing_payload(chain_id)?))
    }

    /// The `v` value, or y parity for typed transactions, encoding a recovery id.
    ///
    /// Only recovery ids 0 and 1 can be expressed.
    pub fn v(&self, recovery_id: u8, chain_id: Option<u64>) -> Result<u64> {
        if recovery_id > 1 {
            return Err(SignatureError::InvalidRecoveryId(recovery_id).into());
        }
        let recid = u64::from(recovery_id);
        let v = match (self, self.chain_id(chain_id)?) {
            (EthereumTransaction::Eip1559(_), _) => Some(recid),
            (EthereumTransaction::Legacy(_), None) => Some(PRE_EIP155_V_OFFSET + recid),
            (EthereumTransaction::Legacy(_), Some(id)) => id
                .checked_mul(2)
                .and_then(|x| x.checked_add(EIP155_V_OFFSET + recid)),
        };
        v.ok_or_else(|| SerializationError::MalformedTransaction("chain id too large").into())
    }

    /// The broadcastable encoding of this transaction with a signature attached.
    pub fn encode_signed(
        &self,
        signature: &RecoverableSignature,
        chain_id: Option<u64>,
    ) -> Result<Vec<u8>> {
        let v = self.v(signature.recovery_id, chain_id)?;
        let r = signature.signature.r();
        let s_bytes = signature.signature.s();
        Ok(match self {
            EthereumTransaction::Legacy(tx) => {
                let mut s = RlpStream::new_list(LegacyTransaction::FIELDS + 3);
                tx.append_fields(&mut s);
                append_uint(&mut s, &v.to_be_bytes());
                append_uint(&mut s, r);
                append_uint(&mut s, s_bytes);
                s.out().to_vec()
            }
            EthereumTransaction::Eip1559(tx) => {
                let mut s = RlpStream::new_list(Eip1559Transaction::FIELDS + 3);
                tx.append_fields(&mut s);
                append_uint(&mut s, &v.to_be_bytes());
                append_uint(&mut s, r);
                append_uint(&mut s, s_bytes);
                let mut out = vec![EIP1559_TX_TYPE];
                out.extend_from_slice(&s.out());
                out
            }
        })
    }
}

/// Recover the address that signed a message hash.
pub fn recover_address(
    engine: &SigningEngine,
    hash: &[u8; 32],
    signature: &RecoverableSignature,
) -> std::result::Result<Address, SignatureError> {
    let key = engine.recover_public_key(&signature.signature, signature.recovery_id, hash)?;
    Ok(Address::from_public_key(&key))
}

/// Sign a message as `personal_sign` does, returning `r || s || v` with `v` in `{27, 28}`.
pub fn sign_message(engine: &SigningEngine, message: &[u8], key: &PrivateKey) -> Result<[u8; 65]> {
    let hash = personal_message_hash(message);
    let sig = engine.sign_recoverable(&hash, key)?;
    if sig.recovery_id > 1 {
        return Err(SignatureError::InvalidRecoveryId(sig.recovery_id).into());
    }
    let mut out = sig.to_bytes();
    out[64] += PRE_EIP155_V_OFFSET as u8;
    Ok(out)
}

/// Sign a transaction with a single key.
pub(crate) fn sign_transaction(
    engine: &SigningEngine,
    tx: &EthereumTransaction,
    keys: &[PrivateKey],
    chain_id: Option<u64>,
) -> Result<SignedTransaction> {
    let [key] = keys else {
        return Err(KeyError::KeyCountMismatch {
            expected: 1,
            found: keys.len(),
        }
        .into());
    };

    let mut pipeline = Pipeline::default();
    pipeline.enter(Stage::BuildPreimage);
    let payload = tx.signing_payload(chain_id)?;

    pipeline.enter(Stage::ComputeDigest);
    let hash = keccak256(&payload);

    pipeline.enter(Stage::Sign);
    let signature = engine.sign_recoverable(&hash, key)?;

    pipeline.enter(Stage::RecoverAndVerify);
    let sender = Address::from_public_key(&key.public_key());
    if recover_address(engine, &hash, &signature)? != sender {
        return Err(SignatureError::VerificationFailed.into());
    }

    pipeline.enter(Stage::Serialize);
    let bytes = tx.encode_signed(&signature, chain_id)?;
    let id = keccak256(&bytes);
    debug!(
        hash = %hex::encode(id),
        chain_id = ?chain_id,
        sender = %sender,
        "signed ethereum transaction"
    );
    Ok(SignedTransaction {
        chain: Chain::Ethereum,
        bytes,
        id,
        witness_id: None,
    })
}
