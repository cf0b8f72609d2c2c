// SPDX-License-Identifier: CC0-1.0

//! Bitcoin transactions.
//!
//! A transaction describes a transfer of money. It consumes previously
//! unspent transaction outputs and produces new ones. This module provides
//! the structures and the consensus decoding needed to walk transactions as
//! they appear inside serialized blocks; no semantic validation is done.

use core::fmt;
use std::io;

use hashes::Hash;

use crate::blockdata::script::ScriptBuf;
use crate::blockdata::witness::Witness;
use crate::consensus::encode::{self, Decodable, Encodable};
use crate::hash_types::Txid;
use crate::internal_macros::impl_consensus_encoding;

/// The marker byte introducing a segwit-serialized transaction.
const SEGWIT_MARKER: u8 = 0x00;
/// The flag byte carrying the BIP-144 witness bit.
const SEGWIT_FLAG: u8 = 0x01;

/// A reference to a transaction output.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct OutPoint {
    /// The referenced transaction's txid.
    pub txid: Txid,
    /// The index of the referenced output in its transaction's vout.
    pub vout: u32,
}

impl OutPoint {
    /// Creates a new [`OutPoint`].
    #[inline]
    pub fn new(txid: Txid, vout: u32) -> OutPoint { OutPoint { txid, vout } }

    /// Creates a "null" `OutPoint`.
    ///
    /// This value is used for coinbase transactions because they don't have
    /// any previous outputs.
    #[inline]
    pub fn null() -> OutPoint { OutPoint { txid: Txid::all_zeros(), vout: u32::MAX } }

    /// Checks if an `OutPoint` is "null".
    #[inline]
    pub fn is_null(&self) -> bool { *self == OutPoint::null() }
}

impl Default for OutPoint {
    fn default() -> Self { OutPoint::null() }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl_consensus_encoding!(OutPoint, txid, vout);

/// Bitcoin transaction input sequence number.
///
/// Only carried through structurally; none of the lock-time semantics
/// encoded in it matter to address extraction.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Sequence(pub u32);

impl Sequence {
    /// The maximum allowable sequence number.
    pub const MAX: Self = Sequence(0xFFFFFFFF);
    /// Zero value sequence.
    pub const ZERO: Self = Sequence(0);

    /// Creates a sequence from a u32 value.
    #[inline]
    pub fn from_consensus(n: u32) -> Self { Sequence(n) }

    /// Returns the inner 32bit integer value of Sequence.
    #[inline]
    pub fn to_consensus_u32(self) -> u32 { self.0 }
}

impl Default for Sequence {
    /// The default value of sequence is 0xffffffff.
    fn default() -> Self { Sequence::MAX }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

impl Encodable for Sequence {
    fn consensus_encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
        self.0.consensus_encode(w)
    }
}

impl Decodable for Sequence {
    fn consensus_decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, encode::Error> {
        Decodable::consensus_decode(r).map(Sequence)
    }
}

/// Bitcoin transaction input.
///
/// It contains the location of the previous transaction's output that it
/// spends and the scripts that satisfy its spending conditions.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct TxIn {
    /// The reference to the previous output that is being used as an input.
    pub previous_output: OutPoint,
    /// The script which pushes values on the stack which will cause the
    /// referenced output's script to be accepted.
    pub script_sig: ScriptBuf,
    /// The sequence number, which suggests to miners which of two conflicting
    /// transactions should be preferred, or 0xFFFFFFFF to ignore this
    /// feature.
    pub sequence: Sequence,
    /// Witness data: an array of byte-arrays.
    ///
    /// Note that this field is *not* (de)serialized with the rest of the
    /// `TxIn`: witnesses sit at the end of the full transaction.
    pub witness: Witness,
}

impl Default for TxIn {
    fn default() -> TxIn {
        TxIn {
            previous_output: OutPoint::default(),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        }
    }
}

impl Encodable for TxIn {
    fn consensus_encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
        let mut len = 0;
        len += self.previous_output.consensus_encode(w)?;
        len += self.script_sig.consensus_encode(w)?;
        len += self.sequence.consensus_encode(w)?;
        Ok(len)
    }
}

impl Decodable for TxIn {
    fn consensus_decode_from_finite_reader<R: io::Read + ?Sized>(
        r: &mut R,
    ) -> Result<Self, encode::Error> {
        Ok(TxIn {
            previous_output: Decodable::consensus_decode_from_finite_reader(r)?,
            script_sig: Decodable::consensus_decode_from_finite_reader(r)?,
            sequence: Decodable::consensus_decode_from_finite_reader(r)?,
            witness: Witness::default(),
        })
    }
}

/// Bitcoin transaction output.
///
/// Defines new coins to be created as a result of the transaction, along
/// with the spending condition ("script", aka "output script") an input
/// spending it must satisfy.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct TxOut {
    /// The value of the output, in satoshis.
    pub value: u64,
    /// The script which must be satisfied for the output to be spent.
    pub script_pubkey: ScriptBuf,
}

impl_consensus_encoding!(TxOut, value, script_pubkey);

/// Bitcoin transaction.
///
/// ### Serialization notes
///
/// If any inputs have nonempty witnesses, the entire transaction is
/// serialized in the post-BIP141 segwit format which includes a list of
/// witnesses. If all inputs have empty witnesses, the transaction is
/// serialized in the pre-BIP141 format, except that a transaction with no
/// inputs is always segwit-serialized to avoid the marker ambiguity.
///
/// On decode the two layouts are told apart solely by the byte following a
/// zero "input count": a non-zero value there is the BIP-144 flag, a zero is
/// the output count of an inputless legacy transaction.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct Transaction {
    /// The protocol version, is currently expected to be 1 or 2 (BIP 68).
    pub version: i32,
    /// Block height or timestamp before which the transaction cannot be
    /// included in a block. Carried structurally, never interpreted.
    pub lock_time: u32,
    /// List of transaction inputs.
    pub input: Vec<TxIn>,
    /// List of transaction outputs.
    pub output: Vec<TxOut>,
}

impl Encodable for Transaction {
    fn consensus_encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
        let mut len = 0;
        len += self.version.consensus_encode(w)?;

        // To avoid serialization ambiguity, no inputs means we use BIP141
        // serialization.
        let have_witness =
            self.input.is_empty() || self.input.iter().any(|input| !input.witness.is_empty());

        if !have_witness {
            len += self.input.consensus_encode(w)?;
            len += self.output.consensus_encode(w)?;
        } else {
            len += SEGWIT_MARKER.consensus_encode(w)?;
            len += SEGWIT_FLAG.consensus_encode(w)?;
            len += self.input.consensus_encode(w)?;
            len += self.output.consensus_encode(w)?;
            for input in &self.input {
                len += input.witness.consensus_encode(w)?;
            }
        }
        len += self.lock_time.consensus_encode(w)?;
        Ok(len)
    }
}

impl Decodable for Transaction {
    fn consensus_decode_from_finite_reader<R: io::Read + ?Sized>(
        r: &mut R,
    ) -> Result<Self, encode::Error> {
        let version = i32::consensus_decode_from_finite_reader(r)?;
        let input = Vec::<TxIn>::consensus_decode_from_finite_reader(r)?;
        // segwit
        if input.is_empty() {
            let segwit_flag = u8::consensus_decode_from_finite_reader(r)?;
            match segwit_flag {
                // Not a flag at all: the zero byte pair is the input and
                // output count of an inputless legacy transaction.
                0 => Ok(Transaction {
                    version,
                    input,
                    output: vec![],
                    lock_time: Decodable::consensus_decode_from_finite_reader(r)?,
                }),
                // Any non-zero flag selects the BIP144 witness layout; its
                // value carries no further meaning here.
                _ => {
                    let mut input = Vec::<TxIn>::consensus_decode_from_finite_reader(r)?;
                    let output = Vec::<TxOut>::consensus_decode_from_finite_reader(r)?;
                    for txin in input.iter_mut() {
                        txin.witness = Decodable::consensus_decode_from_finite_reader(r)?;
                    }
                    if !input.is_empty() && input.iter().all(|input| input.witness.is_empty()) {
                        Err(encode::Error::ParseFailed("witness flag set but no witnesses present"))
                    } else {
                        Ok(Transaction {
                            version,
                            input,
                            output,
                            lock_time: Decodable::consensus_decode_from_finite_reader(r)?,
                        })
                    }
                }
            }
        // non-segwit
        } else {
            Ok(Transaction {
                version,
                input,
                output: Decodable::consensus_decode_from_finite_reader(r)?,
                lock_time: Decodable::consensus_decode_from_finite_reader(r)?,
            })
        }
    }
}
