// SPDX-License-Identifier: CC0-1.0

//! # addrdump
//!
//! Extracts every receiving address from the `blk*.dat` block files written
//! by a Bitcoin full node and emits them as newline-delimited text.
//!
//! The library is organized around five pieces:
//!
//! * [`consensus`] — little-endian primitives, compact-size integers and the
//!   [`Encodable`]/[`Decodable`] traits used for consensus (de)serialization.
//! * [`blockdata`] — the structural model of blocks, transactions, scripts
//!   and witnesses.
//! * [`address`] — classification of output scripts into the standard
//!   templates and rendering of the corresponding address strings.
//! * [`blockfile`] — a ring-buffered stream with a bounded rewind guarantee
//!   and the scanner that walks block-file frames, resynchronizing on the
//!   network start marker after malformed data.
//! * [`network`] — the network selection (mainnet, testnet, regtest) threaded
//!   through the scanner and the address encoder.
//!
//! [`Encodable`]: consensus::Encodable
//! [`Decodable`]: consensus::Decodable

#![warn(missing_docs)]

/// Rust implementation of cryptographic hash function algorithms.
pub extern crate hashes;

/// Re-export of the `hex-conservative` crate.
pub extern crate hex;

pub mod address;
pub mod blockdata;
pub mod blockfile;
pub mod consensus;
pub mod hash_types;
mod internal_macros;
pub mod network;

pub use crate::address::{extract_addresses, Address};
pub use crate::blockdata::block::{Block, Header};
pub use crate::blockdata::script::{Script, ScriptBuf};
pub use crate::blockdata::transaction::{OutPoint, Sequence, Transaction, TxIn, TxOut};
pub use crate::blockdata::witness::Witness;
pub use crate::blockfile::{scan_block_dir, scan_block_file, BufferedFile, ScanSummary};
pub use crate::consensus::encode::VarInt;
pub use crate::hash_types::{BlockHash, PubkeyHash, ScriptHash, TxMerkleNode, Txid};
pub use crate::network::{Magic, Network, NetworkKind};
