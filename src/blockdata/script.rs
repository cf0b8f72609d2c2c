// SPDX-License-Identifier: CC0-1.0

//! Bitcoin scripts.
//!
//! Scripts define Bitcoin's digital signature scheme: a spending condition
//! attached to every output. This module only inspects scripts, it never
//! executes them: [`Script`] carries the predicates that recognize the
//! standard output templates the address extractor understands.

use core::fmt;
use core::ops::Deref;
use std::io;

use hex::FromHex;

use crate::blockdata::opcodes::all::*;
use crate::consensus::encode::{self, Decodable, Encodable};

/// Bitcoin script slice.
///
/// This is a borrowed, unsized counterpart of [`ScriptBuf`], in the same
/// relationship as `str` and `String`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Script([u8]);

/// An owned, growable script.
#[derive(Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptBuf(Vec<u8>);

impl Script {
    /// Treat byte slice as `Script`.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> &Script {
        // SAFETY: Script is a transparent wrapper around [u8].
        unsafe { &*(bytes as *const [u8] as *const Script) }
    }

    /// Returns the script data as a byte slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] { &self.0 }

    /// Returns the length in bytes of the script.
    #[inline]
    pub fn len(&self) -> usize { self.0.len() }

    /// Returns whether the script is the empty script.
    #[inline]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Returns a copy of the script data.
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> { self.0.to_owned() }

    /// Checks whether a script pubkey is a P2PKH output.
    #[inline]
    pub fn is_p2pkh(&self) -> bool {
        self.0.len() == 25
            && self.0[0] == OP_DUP.to_u8()
            && self.0[1] == OP_HASH160.to_u8()
            && self.0[2] == OP_PUSHBYTES_20.to_u8()
            && self.0[23] == OP_EQUALVERIFY.to_u8()
            && self.0[24] == OP_CHECKSIG.to_u8()
    }

    /// Checks whether a script pubkey is a P2SH output.
    #[inline]
    pub fn is_p2sh(&self) -> bool {
        self.0.len() == 23
            && self.0[0] == OP_HASH160.to_u8()
            && self.0[1] == OP_PUSHBYTES_20.to_u8()
            && self.0[22] == OP_EQUAL.to_u8()
    }

    /// Checks whether a script pubkey is a P2PK output.
    #[inline]
    pub fn is_p2pk(&self) -> bool { self.p2pk_pubkey_bytes().is_some() }

    /// Returns the bytes of the (possibly invalid) public key if this script
    /// is P2PK.
    ///
    /// The key is not checked against the curve; the original data may carry
    /// unspendable garbage here and its hash is an address all the same.
    #[inline]
    pub fn p2pk_pubkey_bytes(&self) -> Option<&[u8]> {
        match self.len() {
            67 if self.0[0] == OP_PUSHBYTES_65.to_u8() && self.0[66] == OP_CHECKSIG.to_u8() => {
                Some(&self.0[1..66])
            }
            35 if self.0[0] == OP_PUSHBYTES_33.to_u8() && self.0[34] == OP_CHECKSIG.to_u8() => {
                Some(&self.0[1..34])
            }
            _ => None,
        }
    }

    /// Checks whether a script pubkey is a P2WPKH output.
    #[inline]
    pub fn is_p2wpkh(&self) -> bool {
        self.0.len() == 22
            && self.0[0] == OP_PUSHBYTES_0.to_u8()
            && self.0[1] == OP_PUSHBYTES_20.to_u8()
    }

    /// Checks whether a script pubkey is a P2WSH output.
    #[inline]
    pub fn is_p2wsh(&self) -> bool {
        self.0.len() == 34
            && self.0[0] == OP_PUSHBYTES_0.to_u8()
            && self.0[1] == OP_PUSHBYTES_32.to_u8()
    }

    /// Checks whether a script pubkey is a P2TR output.
    #[inline]
    pub fn is_p2tr(&self) -> bool {
        self.0.len() == 34
            && self.0[0] == OP_PUSHNUM_1.to_u8()
            && self.0[1] == OP_PUSHBYTES_32.to_u8()
    }

    /// Checks whether a script pubkey is a bare m-of-n multisignature output.
    #[inline]
    pub fn is_multisig(&self) -> bool { self.multisig_pubkey_bytes().is_some() }

    /// Returns the public keys contained in a bare multisignature script
    /// pubkey, in script order.
    ///
    /// The accepted shape is `OP_m <pubkey>... OP_n OP_CHECKMULTISIG` with
    /// `m <= n`, every key pushed directly as 33 or 65 bytes and exactly `n`
    /// keys present. Anything else is not a multisig output.
    pub fn multisig_pubkey_bytes(&self) -> Option<Vec<&[u8]>> {
        let b = &self.0;
        if b.len() < 3 || *b.last().expect("len checked") != OP_CHECKMULTISIG.to_u8() {
            return None;
        }
        let m = pushnum(b[0])?;
        let n = pushnum(b[b.len() - 2])?;
        if m > n {
            return None;
        }

        let mut keys = Vec::with_capacity(n);
        let mut i = 1;
        while i < b.len() - 2 {
            let push = b[i] as usize;
            if push != 33 && push != 65 {
                return None;
            }
            i += 1;
            if i + push > b.len() - 2 {
                return None;
            }
            keys.push(&b[i..i + push]);
            i += push;
        }
        if keys.len() != n {
            return None;
        }
        Some(keys)
    }

    /// Checks whether a script pubkey is an OP_RETURN output.
    #[inline]
    pub fn is_op_return(&self) -> bool {
        match self.0.first() {
            Some(b) => *b == OP_RETURN.to_u8(),
            None => false,
        }
    }
}

/// Decodes the value of one of the small-integer opcodes
/// `OP_PUSHNUM_1..=OP_PUSHNUM_16`.
fn pushnum(op: u8) -> Option<usize> {
    if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&op) {
        Some((op - OP_PUSHNUM_1.to_u8() + 1) as usize)
    } else {
        None
    }
}

impl ScriptBuf {
    /// Creates a new empty script.
    pub fn new() -> Self { ScriptBuf(Vec::new()) }

    /// Returns a reference to unsized script.
    pub fn as_script(&self) -> &Script { Script::from_bytes(&self.0) }

    /// Creates a [`ScriptBuf`] from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::HexToBytesError> {
        let v = Vec::from_hex(s)?;
        Ok(ScriptBuf(v))
    }
}

impl From<Vec<u8>> for ScriptBuf {
    fn from(v: Vec<u8>) -> Self { ScriptBuf(v) }
}

impl From<&Script> for ScriptBuf {
    fn from(s: &Script) -> Self { ScriptBuf(s.to_bytes()) }
}

impl Deref for ScriptBuf {
    type Target = Script;

    fn deref(&self) -> &Self::Target { self.as_script() }
}

impl AsRef<Script> for ScriptBuf {
    fn as_ref(&self) -> &Script { self.as_script() }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use hex::DisplayHex;

        write!(f, "Script({})", self.0.as_hex())
    }
}

impl fmt::Debug for ScriptBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { fmt::Debug::fmt(self.as_script(), f) }
}

impl Encodable for ScriptBuf {
    #[inline]
    fn consensus_encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
        self.0.consensus_encode(w)
    }
}

impl Decodable for ScriptBuf {
    #[inline]
    fn consensus_decode_from_finite_reader<R: io::Read + ?Sized>(
        r: &mut R,
    ) -> Result<Self, encode::Error> {
        Ok(ScriptBuf(Decodable::consensus_decode_from_finite_reader(r)?))
    }
}

#[cfg(test)]
mod tests {
    use hex_lit::hex;

    use super::*;

    #[test]
    fn classify_p2pkh() {
        let script = ScriptBuf::from_hex("76a914162c5ea71c0b23f5b9022ef047c4a86470a5b07088ac").unwrap();
        assert!(script.is_p2pkh());
        assert!(!script.is_p2sh());
        assert!(!script.is_p2wpkh());

        // One byte short.
        let script = ScriptBuf::from_hex("76a914162c5ea71c0b23f5b9022ef047c4a86470a5b088ac").unwrap();
        assert!(!script.is_p2pkh());
    }

    #[test]
    fn classify_p2sh() {
        let script = ScriptBuf::from_hex("a914162c5ea71c0b23f5b9022ef047c4a86470a5b07087").unwrap();
        assert!(script.is_p2sh());
        assert!(!script.is_p2pkh());
    }

    #[test]
    fn classify_p2pk() {
        let compressed =
            ScriptBuf::from_hex("210279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798ac")
                .unwrap();
        assert!(compressed.is_p2pk());
        assert_eq!(compressed.p2pk_pubkey_bytes().unwrap().len(), 33);

        let uncompressed = ScriptBuf::from_hex(
            "410479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8ac",
        )
        .unwrap();
        assert!(uncompressed.is_p2pk());
        assert_eq!(uncompressed.p2pk_pubkey_bytes().unwrap().len(), 65);

        // Push length and payload disagree.
        let bad = ScriptBuf::from_hex("220279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798ac")
            .unwrap();
        assert!(!bad.is_p2pk());
    }

    #[test]
    fn classify_witness_programs() {
        let p2wpkh = ScriptBuf::from_hex("001454d26dddb59c7073c6a197946ea1841951fa7a74").unwrap();
        assert!(p2wpkh.is_p2wpkh());
        assert!(!p2wpkh.is_p2wsh());

        let p2wsh =
            ScriptBuf::from_hex("00201863143c14c5166804bd19203356da136c985678cd4d27a1b8c6329604903262")
                .unwrap();
        assert!(p2wsh.is_p2wsh());
        assert!(!p2wsh.is_p2wpkh());

        let p2tr = ScriptBuf::from(
            [&hex!("5120")[..], &[0u8; 32][..]].concat(),
        );
        assert!(p2tr.is_p2tr());
        assert!(!p2tr.is_p2wsh());

        // Future witness version, not one of the templates we derive
        // addresses from.
        let v2 = ScriptBuf::from([&hex!("5214")[..], &[0u8; 20][..]].concat());
        assert!(!v2.is_p2wpkh());
        assert!(!v2.is_p2tr());
    }

    #[test]
    fn classify_multisig() {
        let key_a = hex!("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");
        let key_b = hex!("02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5");

        // OP_1 <A> <B> OP_2 OP_CHECKMULTISIG
        let mut raw = vec![0x51];
        raw.push(33);
        raw.extend_from_slice(&key_a);
        raw.push(33);
        raw.extend_from_slice(&key_b);
        raw.extend_from_slice(&[0x52, 0xae]);
        let script = ScriptBuf::from(raw.clone());

        assert!(script.is_multisig());
        let keys = script.multisig_pubkey_bytes().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], &key_a[..]);
        assert_eq!(keys[1], &key_b[..]);

        // m > n is nonsense.
        let mut bad = raw.clone();
        bad[0] = 0x53; // OP_3
        assert!(!ScriptBuf::from(bad).is_multisig());

        // Declared key count doesn't match the pushes.
        let mut bad = raw.clone();
        bad[raw.len() - 2] = 0x53; // OP_3
        assert!(!ScriptBuf::from(bad).is_multisig());

        // A push that isn't a plausible key demotes the whole script.
        let mut bad = raw;
        bad[1] = 32;
        assert!(!ScriptBuf::from(bad).is_multisig());
    }

    #[test]
    fn classify_op_return() {
        let script = ScriptBuf::from_hex("6a0548656c6c6f").unwrap();
        assert!(script.is_op_return());
        assert!(!script.is_p2pkh());
    }

    #[test]
    fn script_buf_codec() {
        use crate::consensus::encode::{deserialize, serialize};

        let script = ScriptBuf::from_hex("76a914162c5ea71c0b23f5b9022ef047c4a86470a5b07088ac").unwrap();
        let ser = serialize(&script);
        assert_eq!(ser[0], 25); // length prefix
        assert_eq!(deserialize::<ScriptBuf>(&ser).unwrap(), script);
    }
}
