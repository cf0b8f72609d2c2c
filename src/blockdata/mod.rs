// SPDX-License-Identifier: CC0-1.0

//! Bitcoin block data.
//!
//! Structures and consensus codecs for the data a block file carries: blocks,
//! transactions, scripts and witnesses.

pub mod block;
pub mod constants;
pub mod opcodes;
pub mod script;
pub mod transaction;
pub mod witness;
