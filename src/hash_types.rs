// SPDX-License-Identifier: CC0-1.0

//! Hash types used throughout the library.
//!
//! Newtypes keep hashes of the same format (e.g. SHA256d) but different
//! meaning (transaction id, block hash, ...) from being mixed up.

use std::io;

use hashes::{hash160, hash_newtype, sha256d, Hash};

use crate::consensus::encode::Error;

macro_rules! impl_hashencode {
    ($hashtype:ident) => {
        impl $crate::consensus::Encodable for $hashtype {
            fn consensus_encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
                self.as_byte_array().consensus_encode(w)
            }
        }

        impl $crate::consensus::Decodable for $hashtype {
            fn consensus_decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, Error> {
                Ok(Self::from_byte_array(<<$hashtype as Hash>::Bytes>::consensus_decode(r)?))
            }
        }
    };
}

hash_newtype! {
    /// A bitcoin transaction hash/transaction ID.
    pub struct Txid(sha256d::Hash);

    /// A bitcoin block hash.
    pub struct BlockHash(sha256d::Hash);

    /// A hash of the Merkle tree branch or root for transactions.
    pub struct TxMerkleNode(sha256d::Hash);

    /// A hash of a public key.
    pub struct PubkeyHash(hash160::Hash);

    /// A hash of Bitcoin Script bytecode.
    pub struct ScriptHash(hash160::Hash);
}

impl_hashencode!(Txid);
impl_hashencode!(BlockHash);
impl_hashencode!(TxMerkleNode);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::encode::{deserialize, serialize};

    #[test]
    fn hash_encode_decode() {
        let txid = Txid::from(sha256d::Hash::hash(&[]));
        let ser = serialize(&txid);
        // Consensus order is the raw digest, not the reversed display order.
        assert_eq!(ser, txid.as_byte_array());
        assert_eq!(deserialize::<Txid>(&ser).unwrap(), txid);
    }

    #[test]
    fn hash_display() {
        // sha256d-based types display backward, hash160-based ones forward.
        assert_eq!(
            Txid::from(sha256d::Hash::hash(&[])).to_string(),
            "56944c5d3f98413ef45cf54545538103cc9f298e0575820ad3591376e2e0f65d",
        );
        assert_eq!(
            PubkeyHash::from(hash160::Hash::hash(&[])).to_string(),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb",
        );
    }
}
