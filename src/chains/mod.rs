//! Turning unsigned transactions into signed, broadcastable ones.
//!
//! Each chain has its own way of building the message to sign and of
//! serializing the result. The chain is picked by the [`SigningContext`],
//! which selects one of a closed set of [`SigningStrategy`] variants.
//!
//! Every signature goes through the same stages:
//! ```text
//! BuildPreimage -> ComputeDigest -> Sign -> RecoverAndVerify -> Serialize
//! ```
//! Bitcoin goes through the first four once per input.
use std::fmt;

use tracing::trace;

use crate::{
    error::{Result, SerializationError},
    keys::PrivateKey,
    sign::SigningEngine,
};

pub mod bitcoin;
pub mod ethereum;

use self::{
    bitcoin::{SighashType, UnsignedBitcoinTransaction},
    ethereum::EthereumTransaction,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Bitcoin,
    Ethereum,
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::Bitcoin => f.write_str("bitcoin"),
            Chain::Ethereum => f.write_str("ethereum"),
        }
    }
}

/// The per call parameters of a signing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningContext {
    pub chain: Chain,
    /// Which parts of a Bitcoin transaction each signature commits to.
    pub sighash: SighashType,
    /// The EIP-155 chain id. Without one, Ethereum legacy transactions are signed
    /// without replay protection.
    pub chain_id: Option<u64>,
}

impl SigningContext {
    pub fn bitcoin(sighash: SighashType) -> Self {
        Self {
            chain: Chain::Bitcoin,
            sighash,
            chain_id: None,
        }
    }

    pub fn ethereum(chain_id: u64) -> Self {
        Self {
            chain: Chain::Ethereum,
            sighash: SighashType::ALL,
            chain_id: Some(chain_id),
        }
    }

    /// Ethereum, without EIP-155 replay protection.
    pub fn ethereum_unprotected() -> Self {
        Self {
            chain: Chain::Ethereum,
            sighash: SighashType::ALL,
            chain_id: None,
        }
    }
}

/// A transaction as handed to us by a transaction builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsignedTransaction {
    Bitcoin(UnsignedBitcoinTransaction),
    Ethereum(EthereumTransaction),
}

impl UnsignedTransaction {
    pub fn chain(&self) -> Chain {
        match self {
            UnsignedTransaction::Bitcoin(_) => Chain::Bitcoin,
            UnsignedTransaction::Ethereum(_) => Chain::Ethereum,
        }
    }
}

/// A fully signed transaction, ready to be broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub chain: Chain,
    /// The raw serialized transaction.
    pub bytes: Vec<u8>,
    /// The transaction identifier, in the byte order block explorers display.
    pub id: [u8; 32],
    /// For Bitcoin, the identifier including witness data.
    pub witness_id: Option<[u8; 32]>,
}

impl SignedTransaction {
    pub fn id_hex(&self) -> String {
        hex::encode(self.id)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// One step in producing a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BuildPreimage,
    ComputeDigest,
    Sign,
    RecoverAndVerify,
    Serialize,
}

impl Stage {
    fn may_follow(self, prev: Option<Stage>) -> bool {
        use Stage::*;
        matches!(
            (prev, self),
            (None, BuildPreimage)
                | (Some(BuildPreimage), ComputeDigest)
                | (Some(ComputeDigest), Sign)
                | (Some(Sign), RecoverAndVerify | Serialize | BuildPreimage)
                | (Some(RecoverAndVerify), Serialize | BuildPreimage)
        )
    }
}

/// Tracks which stage a signing call is in.
#[derive(Debug, Default)]
pub(crate) struct Pipeline {
    stage: Option<Stage>,
}

impl Pipeline {
    pub fn enter(&mut self, next: Stage) {
        debug_assert!(
            next.may_follow(self.stage),
            "cannot go from {:?} to {next:?}",
            self.stage
        );
        trace!(stage = ?next, "signing stage");
        self.stage = Some(next);
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }
}

/// Signs Bitcoin transactions, one signature per input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitcoinSigningStrategy {
    pub sighash: SighashType,
}

/// Signs Ethereum transactions with a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthereumSigningStrategy {
    pub chain_id: Option<u64>,
}

/// The ways we know how to sign a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStrategy {
    Bitcoin(BitcoinSigningStrategy),
    Ethereum(EthereumSigningStrategy),
}

impl SigningStrategy {
    pub fn for_context(ctx: &SigningContext) -> Self {
        match ctx.chain {
            Chain::Bitcoin => SigningStrategy::Bitcoin(BitcoinSigningStrategy {
                sighash: ctx.sighash,
            }),
            Chain::Ethereum => SigningStrategy::Ethereum(EthereumSigningStrategy {
                chain_id: ctx.chain_id,
            }),
        }
    }

    pub fn chain(&self) -> Chain {
        match self {
            SigningStrategy::Bitcoin(_) => Chain::Bitcoin,
            SigningStrategy::Ethereum(_) => Chain::Ethereum,
        }
    }

    /// Sign a transaction.
    ///
    /// Bitcoin needs one key per input, in input order. Ethereum needs exactly one key.
    pub fn sign(
        &self,
        engine: &SigningEngine,
        tx: &UnsignedTransaction,
        keys: &[PrivateKey],
    ) -> Result<SignedTransaction> {
        match (self, tx) {
            (SigningStrategy::Bitcoin(s), UnsignedTransaction::Bitcoin(tx)) => {
                bitcoin::sign_transaction(engine, tx, keys, s.sighash)
            }
            (SigningStrategy::Ethereum(s), UnsignedTransaction::Ethereum(tx)) => {
                ethereum::sign_transaction(engine, tx, keys, s.chain_id)
            }
            _ => Err(SerializationError::ChainMismatch.into()),
        }
    }
}

/// Sign a transaction with the strategy selected by a context.
pub fn sign_transaction(
    engine: &SigningEngine,
    ctx: &SigningContext,
    tx: &UnsignedTransaction,
    keys: &[PrivateKey],
) -> Result<SignedTransaction> {
    SigningStrategy::for_context(ctx).sign(engine, tx, keys)
}
