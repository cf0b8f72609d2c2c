// SPDX-License-Identifier: CC0-1.0

//! Bitcoin consensus (de)serialization.
//!
//! This module defines the traits and primitives needed to decode data that
//! is laid out the way Bitcoin lays it out on disk and on the wire:
//! little-endian integers, compact-size length prefixes and nested
//! variable-length arrays.

pub mod encode;

pub use self::encode::{
    deserialize, deserialize_partial, serialize, Decodable, Encodable, ReadExt, WriteExt,
};
