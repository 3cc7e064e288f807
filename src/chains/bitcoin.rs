//! Bitcoin transactions: the wire format, signature hashes, and input signing.
//!
//! Hashes and txids are kept in internal byte order, which is the reverse of
//! how they're usually displayed.
use ::bitcoin::hashes::{hash160, Hash};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{Chain, Pipeline, SignedTransaction, Stage};
use crate::{
    error::{KeyError, Result, SerializationError},
    keys::PrivateKey,
    sign::SigningEngine,
};

/// The largest count or length we accept while deserializing.
const MAX_SIZE: u64 = 0x0200_0000;

const SEGWIT_MARKER: u8 = 0x00;
const SEGWIT_FLAG: u8 = 0x01;

const OP_0: u8 = 0x00;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_DUP: u8 = 0x76;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_HASH160: u8 = 0xa9;
const OP_CODESEPARATOR: u8 = 0xab;
const OP_CHECKSIG: u8 = 0xac;

/// The digest legacy SIGHASH_SINGLE signs when there's no matching output.
const SIGHASH_SINGLE_BUG: [u8; 32] = {
    let mut out = [0u8; 32];
    out[0] = 1;
    out
};

pub fn sha256d(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// Append a CompactSize integer.
pub fn write_varint(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

fn write_bytes(out: &mut Vec<u8>, data: &[u8]) {
    write_varint(out, data.len() as u64);
    out.extend_from_slice(data);
}

/// Append a script push of some data.
fn push_data(out: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        n if n < OP_PUSHDATA1 as usize => out.push(n as u8),
        n if n <= 0xff => {
            out.push(OP_PUSHDATA1);
            out.push(n as u8);
        }
        n if n <= 0xffff => {
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        n => {
            out.push(OP_PUSHDATA4);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
    }
    out.extend_from_slice(data);
}

/// Remove every OP_CODESEPARATOR from a script, leaving pushed data alone.
///
/// If the script ends in a truncated push, the remainder is kept verbatim.
fn strip_codeseparators(script: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(script.len());
    let mut i = 0;
    while i < script.len() {
        let op = script[i];
        let (header, len) = match op {
            0x01..=0x4b => (1, op as usize),
            OP_PUSHDATA1 if i + 2 <= script.len() => (2, script[i + 1] as usize),
            OP_PUSHDATA2 if i + 3 <= script.len() => {
                (3, u16::from_le_bytes([script[i + 1], script[i + 2]]) as usize)
            }
            OP_PUSHDATA4 if i + 5 <= script.len() => (
                5,
                u32::from_le_bytes([script[i + 1], script[i + 2], script[i + 3], script[i + 4]])
                    as usize,
            ),
            OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4 => break,
            _ => (1, 0),
        };
        let end = i + header + len;
        if end > script.len() {
            break;
        }
        if op != OP_CODESEPARATOR {
            out.extend_from_slice(&script[i..end]);
        }
        i = end;
    }
    out.extend_from_slice(&script[i.min(script.len())..]);
    out
}

/// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut out = vec![OP_DUP, OP_HASH160, 20];
    out.extend_from_slice(pubkey_hash);
    out.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    out
}

/// `OP_0 <hash>`
pub fn p2wpkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut out = vec![OP_0, 20];
    out.extend_from_slice(pubkey_hash);
    out
}

/// The output scripts we know how to spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    P2pkh([u8; 20]),
    P2wpkh([u8; 20]),
}

impl ScriptKind {
    pub fn classify(script_pubkey: &[u8]) -> Option<Self> {
        let mut hash = [0u8; 20];
        match script_pubkey {
            [OP_DUP, OP_HASH160, 20, h @ .., OP_EQUALVERIFY, OP_CHECKSIG] if h.len() == 20 => {
                hash.copy_from_slice(h);
                Some(ScriptKind::P2pkh(hash))
            }
            [OP_0, 20, h @ ..] if h.len() == 20 => {
                hash.copy_from_slice(h);
                Some(ScriptKind::P2wpkh(hash))
            }
            _ => None,
        }
    }

    pub fn pubkey_hash(&self) -> &[u8; 20] {
        match self {
            ScriptKind::P2pkh(h) | ScriptKind::P2wpkh(h) => h,
        }
    }
}

/// The base part of a sighash flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SighashBase {
    All = 1,
    None = 2,
    Single = 3,
}

/// Which parts of a transaction a signature covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SighashType {
    pub base: SighashBase,
    pub anyone_can_pay: bool,
}

impl SighashType {
    pub const ALL: Self = Self::new(SighashBase::All, false);
    pub const NONE: Self = Self::new(SighashBase::None, false);
    pub const SINGLE: Self = Self::new(SighashBase::Single, false);

    const ANYONE_CAN_PAY: u8 = 0x80;

    pub const fn new(base: SighashBase, anyone_can_pay: bool) -> Self {
        Self {
            base,
            anyone_can_pay,
        }
    }

    pub fn to_byte(self) -> u8 {
        let acp = if self.anyone_can_pay {
            Self::ANYONE_CAN_PAY
        } else {
            0
        };
        self.base as u8 | acp
    }

    pub fn from_byte(byte: u8) -> std::result::Result<Self, SerializationError> {
        let base = match byte & !Self::ANYONE_CAN_PAY {
            1 => SighashBase::All,
            2 => SighashBase::None,
            3 => SighashBase::Single,
            _ => return Err(SerializationError::MalformedTransaction("unknown sighash type")),
        };
        Ok(Self::new(base, byte & Self::ANYONE_CAN_PAY != 0))
    }

    fn covers_all_outputs(self) -> bool {
        self.base == SighashBase::All
    }
}

impl Default for SighashType {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// The txid of the previous transaction, in internal byte order.
    pub txid: [u8; 32],
    pub vout: u32,
}

impl OutPoint {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.txid);
        out.extend_from_slice(&self.vout.to_le_bytes());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    pub witness: Vec<Vec<u8>>,
}

impl TxIn {
    /// An input with no script or witness yet.
    pub fn unsigned(previous_output: OutPoint, sequence: u32) -> Self {
        Self {
            previous_output,
            script_sig: Vec::new(),
            sequence,
            witness: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    /// The amount, in satoshis.
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

impl TxOut {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_le_bytes());
        write_bytes(out, &self.script_pubkey);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|i| !i.witness.is_empty())
    }

    fn encode(&self, with_witness: bool) -> Vec<u8> {
        let segwit = with_witness && self.has_witness();
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        if segwit {
            out.extend_from_slice(&[SEGWIT_MARKER, SEGWIT_FLAG]);
        }
        write_varint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            input.previous_output.encode(&mut out);
            write_bytes(&mut out, &input.script_sig);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }
        write_varint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode(&mut out);
        }
        if segwit {
            for input in &self.inputs {
                write_varint(&mut out, input.witness.len() as u64);
                for item in &input.witness {
                    write_bytes(&mut out, item);
                }
            }
        }
        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// The full serialization, including witness data if any input has some.
    pub fn serialize(&self) -> Vec<u8> {
        self.encode(true)
    }

    /// The serialization without marker, flag, or witnesses.
    pub fn serialize_without_witness(&self) -> Vec<u8> {
        self.encode(false)
    }

    /// The double SHA-256 of the serialization without witnesses, in internal byte order.
    ///
    /// This never depends on witness data.
    pub fn txid(&self) -> [u8; 32] {
        sha256d(&self.serialize_without_witness())
    }

    /// The double SHA-256 of the full serialization, in internal byte order.
    pub fn wtxid(&self) -> [u8; 32] {
        sha256d(&self.serialize())
    }

    /// The txid as block explorers display it.
    pub fn txid_hex(&self) -> String {
        let mut id = self.txid();
        id.reverse();
        hex::encode(id)
    }

    /// Parse a serialized transaction, with or without witness data.
    ///
    /// Parsing is strict: counts must be minimally encoded, a witness flag must be
    /// followed by at least one witness, and there may be no trailing bytes.
    pub fn deserialize(bytes: &[u8]) -> std::result::Result<Self, SerializationError> {
        let mut r = Reader::new(bytes);
        let version = i32::from_le_bytes(r.array::<4>("version")?);

        let mut segwit = false;
        let mut input_count = r.length("input count")?;
        if input_count == 0 {
            let flag = r.array::<1>("segwit flag")?[0];
            if flag != SEGWIT_FLAG {
                return Err(SerializationError::MalformedTransaction("unknown segwit flag"));
            }
            segwit = true;
            input_count = r.length("input count")?;
        }

        let mut inputs = Vec::with_capacity(input_count.min(r.remaining() / 41));
        for _ in 0..input_count {
            let txid = r.array::<32>("previous txid")?;
            let vout = u32::from_le_bytes(r.array::<4>("previous vout")?);
            let script_sig = r.bytes("script sig")?.to_vec();
            let sequence = u32::from_le_bytes(r.array::<4>("sequence")?);
            inputs.push(TxIn {
                previous_output: OutPoint { txid, vout },
                script_sig,
                sequence,
                witness: Vec::new(),
            });
        }

        let output_count = r.length("output count")?;
        let mut outputs = Vec::with_capacity(output_count.min(r.remaining() / 9));
        for _ in 0..output_count {
            let value = u64::from_le_bytes(r.array::<8>("output value")?);
            let script_pubkey = r.bytes("script pubkey")?.to_vec();
            outputs.push(TxOut {
                value,
                script_pubkey,
            });
        }

        if segwit {
            for (i, input) in inputs.iter_mut().enumerate() {
                input.witness = read_witness(&mut r).map_err(|e| match e {
                    SerializationError::Truncated(_) => SerializationError::TruncatedWitness(i),
                    e => e,
                })?;
            }
            if inputs.iter().all(|i| i.witness.is_empty()) {
                return Err(SerializationError::MalformedTransaction(
                    "witness flag without witness data",
                ));
            }
        }

        let lock_time = u32::from_le_bytes(r.array::<4>("lock time")?);
        if r.remaining() > 0 {
            return Err(SerializationError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    fn check_index(&self, index: usize) -> std::result::Result<(), SerializationError> {
        if index >= self.inputs.len() {
            return Err(SerializationError::InputIndexOutOfRange {
                index,
                count: self.inputs.len(),
            });
        }
        Ok(())
    }

    /// The data signed by a non-witness input, before hashing.
    ///
    /// This is `None` for SIGHASH_SINGLE without a matching output, where the
    /// historical digest `1` is signed instead.
    pub fn legacy_preimage(
        &self,
        index: usize,
        script_code: &[u8],
        sighash: SighashType,
    ) -> std::result::Result<Option<Vec<u8>>, SerializationError> {
        self.check_index(index)?;
        if sighash.base == SighashBase::Single && index >= self.outputs.len() {
            return Ok(None);
        }

        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());

        let signed_inputs: Vec<(usize, &TxIn)> = if sighash.anyone_can_pay {
            vec![(index, &self.inputs[index])]
        } else {
            self.inputs.iter().enumerate().collect()
        };
        write_varint(&mut out, signed_inputs.len() as u64);
        for (j, input) in signed_inputs {
            input.previous_output.encode(&mut out);
            if j == index {
                write_bytes(&mut out, &strip_codeseparators(script_code));
            } else {
                write_varint(&mut out, 0);
            }
            let sequence = if j != index && !sighash.covers_all_outputs() {
                0
            } else {
                input.sequence
            };
            out.extend_from_slice(&sequence.to_le_bytes());
        }

        match sighash.base {
            SighashBase::All => {
                write_varint(&mut out, self.outputs.len() as u64);
                for output in &self.outputs {
                    output.encode(&mut out);
                }
            }
            SighashBase::None => write_varint(&mut out, 0),
            SighashBase::Single => {
                write_varint(&mut out, index as u64 + 1);
                for _ in 0..index {
                    out.extend_from_slice(&u64::MAX.to_le_bytes());
                    write_varint(&mut out, 0);
                }
                self.outputs[index].encode(&mut out);
            }
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out.extend_from_slice(&u32::from(sighash.to_byte()).to_le_bytes());
        Ok(Some(out))
    }

    /// The digest signed by a non-witness input.
    pub fn legacy_sighash(
        &self,
        index: usize,
        script_code: &[u8],
        sighash: SighashType,
    ) -> std::result::Result<[u8; 32], SerializationError> {
        Ok(self
            .legacy_preimage(index, script_code, sighash)?
            .map(|p| sha256d(&p))
            .unwrap_or(SIGHASH_SINGLE_BUG))
    }

    /// The BIP 143 data signed by a witness v0 input, before hashing.
    ///
    /// `script_code` is given without its length prefix, and `amount` is the value
    /// of the output being spent.
    pub fn segwit_preimage(
        &self,
        index: usize,
        script_code: &[u8],
        amount: u64,
        sighash: SighashType,
    ) -> std::result::Result<Vec<u8>, SerializationError> {
        self.check_index(index)?;
        let zero = [0u8; 32];

        let hash_prevouts = if sighash.anyone_can_pay {
            zero
        } else {
            let mut data = Vec::with_capacity(36 * self.inputs.len());
            for input in &self.inputs {
                input.previous_output.encode(&mut data);
            }
            sha256d(&data)
        };

        let hash_sequence = if sighash.anyone_can_pay || !sighash.covers_all_outputs() {
            zero
        } else {
            let data: Vec<u8> = self
                .inputs
                .iter()
                .flat_map(|i| i.sequence.to_le_bytes())
                .collect();
            sha256d(&data)
        };

        let hash_outputs = match sighash.base {
            SighashBase::All => {
                let mut data = Vec::new();
                for output in &self.outputs {
                    output.encode(&mut data);
                }
                sha256d(&data)
            }
            SighashBase::Single if index < self.outputs.len() => {
                let mut data = Vec::new();
                self.outputs[index].encode(&mut data);
                sha256d(&data)
            }
            _ => zero,
        };

        let input = &self.inputs[index];
        let mut out = Vec::with_capacity(156 + script_code.len());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&hash_prevouts);
        out.extend_from_slice(&hash_sequence);
        input.previous_output.encode(&mut out);
        write_bytes(&mut out, script_code);
        out.extend_from_slice(&amount.to_le_bytes());
        out.extend_from_slice(&input.sequence.to_le_bytes());
        out.extend_from_slice(&hash_outputs);
        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out.extend_from_slice(&u32::from(sighash.to_byte()).to_le_bytes());
        Ok(out)
    }

    /// The BIP 143 digest signed by a witness v0 input.
    pub fn segwit_sighash(
        &self,
        index: usize,
        script_code: &[u8],
        amount: u64,
        sighash: SighashType,
    ) -> std::result::Result<[u8; 32], SerializationError> {
        Ok(sha256d(&self.segwit_preimage(index, script_code, amount, sighash)?))
    }
}

fn read_witness(r: &mut Reader) -> std::result::Result<Vec<Vec<u8>>, SerializationError> {
    let count = r.length("witness item count")?;
    let mut items = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        items.push(r.bytes("witness item")?.to_vec());
    }
    Ok(items)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(
        &mut self,
        n: usize,
        what: &'static str,
    ) -> std::result::Result<&'a [u8], SerializationError> {
        if n > self.remaining() {
            return Err(SerializationError::Truncated(what));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn array<const N: usize>(
        &mut self,
        what: &'static str,
    ) -> std::result::Result<[u8; N], SerializationError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn varint(&mut self, what: &'static str) -> std::result::Result<u64, SerializationError> {
        let (n, min) = match self.array::<1>(what)?[0] {
            0xfd => (u16::from_le_bytes(self.array(what)?) as u64, 0xfd),
            0xfe => (u32::from_le_bytes(self.array(what)?) as u64, 0x1_0000),
            0xff => (u64::from_le_bytes(self.array(what)?), 0x1_0000_0000),
            b => return Ok(b as u64),
        };
        if n < min {
            return Err(SerializationError::NonCanonicalVarInt);
        }
        Ok(n)
    }

    fn length(&mut self, what: &'static str) -> std::result::Result<usize, SerializationError> {
        let n = self.varint(what)?;
        if n > MAX_SIZE {
            return Err(SerializationError::VarIntOverflow(n));
        }
        Ok(n as usize)
    }

    fn bytes(&mut self, what: &'static str) -> std::result::Result<&'a [u8], SerializationError> {
        let n = self.length(what)?;
        self.take(n, what)
    }
}

/// Read a CompactSize integer from the start of some bytes, returning it and its length.
pub fn read_varint(bytes: &[u8]) -> std::result::Result<(u64, usize), SerializationError> {
    let mut r = Reader::new(bytes);
    let n = r.varint("varint")?;
    Ok((n, r.pos))
}

/// A transaction, along with the outputs its inputs spend.
///
/// The spent outputs are needed for their scripts, which tell us how to sign,
/// and for their amounts, which witness signatures commit to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedBitcoinTransaction {
    tx: Transaction,
    spent_outputs: Vec<TxOut>,
}

impl UnsignedBitcoinTransaction {
    pub fn new(
        tx: Transaction,
        spent_outputs: Vec<TxOut>,
    ) -> std::result::Result<Self, SerializationError> {
        if tx.inputs.len() != spent_outputs.len() {
            return Err(SerializationError::MalformedTransaction(
                "need one spent output per input",
            ));
        }
        if tx.inputs.is_empty() {
            return Err(SerializationError::MalformedTransaction("no inputs"));
        }
        Ok(Self { tx, spent_outputs })
    }

    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    pub fn spent_outputs(&self) -> &[TxOut] {
        &self.spent_outputs
    }
}

/// Sign every input of a transaction, with one key per input.
pub(crate) fn sign_transaction(
    engine: &SigningEngine,
    unsigned: &UnsignedBitcoinTransaction,
    keys: &[PrivateKey],
    sighash: SighashType,
) -> Result<SignedTransaction> {
    let tx = &unsigned.tx;
    if keys.len() != tx.inputs.len() {
        return Err(KeyError::KeyCountMismatch {
            expected: tx.inputs.len(),
            found: keys.len(),
        }
        .into());
    }

    let mut pipeline = Pipeline::default();
    let mut signed = tx.clone();
    for (i, (key, spent)) in keys.iter().zip(&unsigned.spent_outputs).enumerate() {
        pipeline.enter(Stage::BuildPreimage);
        let kind = ScriptKind::classify(&spent.script_pubkey)
            .ok_or(SerializationError::UnsupportedScript(i))?;
        let public_key = key.public_key().to_compressed();
        if &hash160(&public_key) != kind.pubkey_hash() {
            return Err(KeyError::KeyMismatch(i).into());
        }
        let preimage = match kind {
            ScriptKind::P2wpkh(h) => {
                Some(tx.segwit_preimage(i, &p2pkh_script(&h), spent.value, sighash)?)
            }
            ScriptKind::P2pkh(_) => tx.legacy_preimage(i, &spent.script_pubkey, sighash)?,
        };

        pipeline.enter(Stage::ComputeDigest);
        let digest = preimage
            .as_deref()
            .map(sha256d)
            .unwrap_or(SIGHASH_SINGLE_BUG);

        pipeline.enter(Stage::Sign);
        let signature = engine.sign(&digest, key)?;

        pipeline.enter(Stage::RecoverAndVerify);
        if !engine.verify_key(&signature, &digest, &key.public_key()) {
            return Err(crate::error::SignatureError::VerificationFailed.into());
        }

        let mut sig = signature.to_der();
        sig.push(sighash.to_byte());
        let input = &mut signed.inputs[i];
        match kind {
            ScriptKind::P2wpkh(_) => {
                input.script_sig.clear();
                input.witness = vec![sig, public_key.to_vec()];
            }
            ScriptKind::P2pkh(_) => {
                let mut script_sig = Vec::with_capacity(sig.len() + public_key.len() + 2);
                push_data(&mut script_sig, &sig);
                push_data(&mut script_sig, &public_key);
                input.script_sig = script_sig;
                input.witness.clear();
            }
        }
    }

    pipeline.enter(Stage::Serialize);
    let mut id = signed.txid();
    id.reverse();
    let mut witness_id = signed.wtxid();
    witness_id.reverse();
    debug!(
        txid = %hex::encode(id),
        inputs = signed.inputs.len(),
        "signed bitcoin transaction"
    );
    Ok(SignedTransaction {
        chain: Chain::Bitcoin,
        bytes: signed.serialize(),
        id,
        witness_id: Some(witness_id),
    })
}

/// The digest signed by `signmessage`.
pub fn signed_message_hash(message: &[u8]) -> [u8; 32] {
    const PREFIX: &[u8] = b"Bitcoin Signed Message:\n";
    let mut data = Vec::with_capacity(PREFIX.len() + message.len() + 10);
    write_bytes(&mut data, PREFIX);
    write_bytes(&mut data, message);
    sha256d(&data)
}
