// SPDX-License-Identifier: CC0-1.0

//! Bitcoin blocks.
//!
//! A block is a bundle of transactions with a proof-of-work attached, which
//! commits to an earlier block to form the blockchain. The scanner only
//! decodes blocks structurally; proof-of-work and merkle commitments are
//! never checked.

use hashes::sha256d;
use hashes::Hash as _;

use crate::blockdata::transaction::Transaction;
use crate::consensus::encode::Encodable;
use crate::hash_types::{BlockHash, TxMerkleNode};
use crate::internal_macros::impl_consensus_encoding;

/// Bitcoin block header.
///
/// Contains all the block's information except the actual transactions.
#[derive(Copy, PartialEq, Eq, Clone, Debug, Hash)]
pub struct Header {
    /// Block version, now repurposed for soft fork signalling.
    pub version: i32,
    /// Reference to the previous block in the chain.
    pub prev_blockhash: BlockHash,
    /// The root hash of the merkle tree of transactions in the block.
    pub merkle_root: TxMerkleNode,
    /// The timestamp of the block, as claimed by the miner.
    pub time: u32,
    /// The target value below which the blockhash must lie, encoded as a
    /// float (with well-defined rounding, of course).
    pub bits: u32,
    /// The nonce, selected to obtain a low enough blockhash.
    pub nonce: u32,
}

impl_consensus_encoding!(Header, version, prev_blockhash, merkle_root, time, bits, nonce);

impl Header {
    /// Returns the block hash.
    pub fn block_hash(&self) -> BlockHash {
        let mut engine = sha256d::Hash::engine();
        self.consensus_encode(&mut engine).expect("engines don't error");
        BlockHash::from(sha256d::Hash::from_engine(engine))
    }
}

/// A Bitcoin block, which is a collection of transactions with an attached
/// proof of work.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// List of transactions contained in the block.
    pub txdata: Vec<Transaction>,
}

impl_consensus_encoding!(Block, header, txdata);

impl Block {
    /// Returns the block hash.
    pub fn block_hash(&self) -> BlockHash { self.header.block_hash() }

    /// Returns the coinbase transaction, if one is present.
    pub fn coinbase(&self) -> Option<&Transaction> { self.txdata.first() }
}
