// SPDX-License-Identifier: CC0-1.0

//! Witness.
//!
//! The witness is the data used to unlock bitcoin since the segwit upgrade:
//! logically an array of byte strings, serialized on the wire as a
//! compact-size count followed by compact-size-prefixed elements.
//!
//! The scanner decodes witnesses only to consume the right number of bytes;
//! addresses come from the output script, never from the spending witness.

use std::io;

use crate::consensus::encode::{self, Decodable, Encodable, VarInt, MAX_VEC_SIZE};

/// The witness stack of a transaction input.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Witness {
    stack: Vec<Vec<u8>>,
}

impl Witness {
    /// Creates a new empty [`Witness`].
    pub fn new() -> Self { Witness::default() }

    /// Creates a [`Witness`] from a slice of byte slices, one per element.
    pub fn from_slice<T: AsRef<[u8]>>(slice: &[T]) -> Self {
        Witness { stack: slice.iter().map(|e| e.as_ref().to_vec()).collect() }
    }

    /// Returns `true` if the witness contains no element.
    pub fn is_empty(&self) -> bool { self.stack.is_empty() }

    /// Returns the number of elements this witness holds.
    pub fn len(&self) -> usize { self.stack.len() }
}

impl Decodable for Witness {
    fn consensus_decode_from_finite_reader<R: io::Read + ?Sized>(
        r: &mut R,
    ) -> Result<Self, encode::Error> {
        let witness_elements = VarInt::consensus_decode_from_finite_reader(r)?.0 as usize;
        // Minimum size of a witness element is 1 byte, so a count above
        // MAX_VEC_SIZE can never be satisfied by a bounded reader.
        if witness_elements > MAX_VEC_SIZE {
            return Err(encode::Error::OversizedVectorAllocation {
                requested: witness_elements,
                max: MAX_VEC_SIZE,
            });
        }
        let mut stack = Vec::with_capacity(witness_elements.min(128));
        for _ in 0..witness_elements {
            stack.push(Vec::<u8>::consensus_decode_from_finite_reader(r)?);
        }
        Ok(Witness { stack })
    }
}

impl Encodable for Witness {
    fn consensus_encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
        let mut len = VarInt(self.stack.len() as u64).consensus_encode(w)?;
        for element in &self.stack {
            len += element.consensus_encode(w)?;
        }
        Ok(len)
    }
}
