// SPDX-License-Identifier: CC0-1.0

//! Bitcoin addresses.
//!
//! Support for segwit and legacy addresses (bech32 and base58 respectively),
//! and for turning output scripts into the addresses they pay.
//!
//! Rendering is done by the ecosystem crates: base58check through `base58ck`,
//! BIP-173/BIP-350 through `bech32` (which picks bech32 vs bech32m by witness
//! version).

use core::fmt;

use bech32::primitives::gf32::Fe32;
use bech32::primitives::hrp::Hrp;
use hashes::{hash160, Hash};

use crate::blockdata::constants::{
    PUBKEY_ADDRESS_PREFIX_MAIN, PUBKEY_ADDRESS_PREFIX_TEST, SCRIPT_ADDRESS_PREFIX_MAIN,
    SCRIPT_ADDRESS_PREFIX_TEST,
};
use crate::blockdata::script::Script;
use crate::hash_types::{PubkeyHash, ScriptHash};
use crate::network::{Network, NetworkKind};

/// Version of a segwit witness program.
///
/// Only the two versions with a defined address template are represented;
/// scripts carrying any other version are not turned into addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WitnessVersion {
    /// Initial version of witness program, used for P2WPKH and P2WSH outputs.
    V0,
    /// Version of witness program used for Taproot (P2TR) outputs.
    V1,
}

impl WitnessVersion {
    /// Returns the version number as it appears prepended to the 5-bit
    /// regrouped witness program.
    fn to_num(self) -> u8 {
        match self {
            WitnessVersion::V0 => 0,
            WitnessVersion::V1 => 1,
        }
    }
}

/// Known bech32 human-readable parts.
///
/// This is the human-readable part before the separator (`1`) in a bech32
/// encoded address e.g., the "bc" in "bc1q...".
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KnownHrp {
    /// The main Bitcoin network.
    Mainnet,
    /// The test network.
    Testnet,
    /// The regtest network.
    Regtest,
}

impl KnownHrp {
    /// Converts, infallibly, a known HRP to a [`bech32::Hrp`].
    fn to_hrp(self) -> Hrp {
        match self {
            Self::Mainnet => bech32::hrp::BC,
            Self::Testnet => bech32::hrp::TB,
            Self::Regtest => bech32::hrp::BCRT,
        }
    }
}

impl From<Network> for KnownHrp {
    fn from(n: Network) -> Self {
        match n {
            Network::Bitcoin => Self::Mainnet,
            Network::Testnet => Self::Testnet,
            Network::Regtest => Self::Regtest,
        }
    }
}

/// The inner representation of an address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum AddressInner {
    P2pkh { hash: PubkeyHash, network: NetworkKind },
    P2sh { hash: ScriptHash, network: NetworkKind },
    Segwit { version: WitnessVersion, program: Vec<u8>, hrp: KnownHrp },
}

/// A Bitcoin address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(AddressInner);

impl Address {
    /// Creates a pay-to-pubkey-hash (P2PKH) address from a pubkey hash.
    pub fn p2pkh(hash: PubkeyHash, network: impl Into<NetworkKind>) -> Address {
        Address(AddressInner::P2pkh { hash, network: network.into() })
    }

    /// Creates a pay-to-script-hash (P2SH) address from a script hash.
    pub fn p2sh_from_hash(hash: ScriptHash, network: impl Into<NetworkKind>) -> Address {
        Address(AddressInner::P2sh { hash, network: network.into() })
    }

    /// Creates a segwit address from a witness version and program.
    fn segwit(version: WitnessVersion, program: Vec<u8>, hrp: KnownHrp) -> Address {
        debug_assert!(program.len() == 20 || program.len() == 32);
        Address(AddressInner::Segwit { version, program, hrp })
    }

    /// Constructs an [`Address`] from an output script (`scriptPubkey`).
    ///
    /// Covers the templates that pay a single address directly: P2PKH, P2SH,
    /// P2WPKH, P2WSH and P2TR. Use [`extract_addresses`] for the full set
    /// the original data can pay, including P2PK and bare multisig.
    pub fn from_script(script: &Script, network: Network) -> Result<Address, FromScriptError> {
        if script.is_p2pkh() {
            let bytes = script.as_bytes()[3..23].try_into().expect("statically 20B long");
            Ok(Address::p2pkh(PubkeyHash::from_byte_array(bytes), network))
        } else if script.is_p2sh() {
            let bytes = script.as_bytes()[2..22].try_into().expect("statically 20B long");
            Ok(Address::p2sh_from_hash(ScriptHash::from_byte_array(bytes), network))
        } else if script.is_p2wpkh() {
            Ok(Address::segwit(
                WitnessVersion::V0,
                script.as_bytes()[2..22].to_vec(),
                network.into(),
            ))
        } else if script.is_p2wsh() {
            Ok(Address::segwit(
                WitnessVersion::V0,
                script.as_bytes()[2..34].to_vec(),
                network.into(),
            ))
        } else if script.is_p2tr() {
            Ok(Address::segwit(
                WitnessVersion::V1,
                script.as_bytes()[2..34].to_vec(),
                network.into(),
            ))
        } else {
            Err(FromScriptError::UnrecognizedScript)
        }
    }
}

/// Formats bech32 addresses lower case and base58 addresses mixed case.
impl fmt::Display for Address {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        use AddressInner::*;

        match self.0 {
            P2pkh { ref hash, network } => {
                let mut prefixed = [0; 21];
                prefixed[0] = match network {
                    NetworkKind::Main => PUBKEY_ADDRESS_PREFIX_MAIN,
                    NetworkKind::Test => PUBKEY_ADDRESS_PREFIX_TEST,
                };
                prefixed[1..].copy_from_slice(hash.as_byte_array());
                base58::encode_check_to_fmt(fmt, &prefixed[..])
            }
            P2sh { ref hash, network } => {
                let mut prefixed = [0; 21];
                prefixed[0] = match network {
                    NetworkKind::Main => SCRIPT_ADDRESS_PREFIX_MAIN,
                    NetworkKind::Test => SCRIPT_ADDRESS_PREFIX_TEST,
                };
                prefixed[1..].copy_from_slice(hash.as_byte_array());
                base58::encode_check_to_fmt(fmt, &prefixed[..])
            }
            Segwit { version, ref program, hrp } => {
                let version =
                    Fe32::try_from(version.to_num()).expect("versions 0 and 1 are valid fe32 values");
                bech32::segwit::encode_lower_to_fmt_unchecked(fmt, hrp.to_hrp(), version, program)
            }
        }
    }
}

/// Error constructing an [`Address`] from an output script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FromScriptError {
    /// Script is not one of the single-address output templates.
    UnrecognizedScript,
}

impl fmt::Display for FromScriptError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FromScriptError::UnrecognizedScript => write!(f, "script is not a p2pkh, p2sh or witness program"),
        }
    }
}

impl std::error::Error for FromScriptError {}

/// Returns every address an output script pays, in template order.
///
/// This is total: scripts that match none of the standard templates, and
/// scripts whose pushes are malformed, produce an empty list rather than an
/// error. A bare multisig pays one P2PKH-style address per contained public
/// key; a P2PK output pays the P2PKH address of the key's HASH160.
pub fn extract_addresses(script: &Script, network: Network) -> Vec<Address> {
    if let Some(pk) = script.p2pk_pubkey_bytes() {
        let hash = PubkeyHash::from(hash160::Hash::hash(pk));
        return vec![Address::p2pkh(hash, network)];
    }
    if let Some(keys) = script.multisig_pubkey_bytes() {
        return keys
            .into_iter()
            .map(|pk| Address::p2pkh(PubkeyHash::from(hash160::Hash::hash(pk)), network))
            .collect();
    }
    match Address::from_script(script, network) {
        Ok(address) => vec![address],
        Err(FromScriptError::UnrecognizedScript) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use hex_lit::hex;

    use super::*;
    use crate::blockdata::script::ScriptBuf;

    #[test]
    fn p2pkh_address_58() {
        let hash = PubkeyHash::from_byte_array(hex!("162c5ea71c0b23f5b9022ef047c4a86470a5b070"));
        let addr = Address::p2pkh(hash, NetworkKind::Main);
        assert_eq!(&addr.to_string(), "132F25rTsvBdp9JzLLBHP5mvGY66i1xdiM");

        let script = ScriptBuf::from_hex("76a914162c5ea71c0b23f5b9022ef047c4a86470a5b07088ac").unwrap();
        assert_eq!(Address::from_script(&script, Network::Bitcoin), Ok(addr));
    }

    #[test]
    fn p2sh_address_58() {
        let hash = ScriptHash::from_byte_array(hex!("162c5ea71c0b23f5b9022ef047c4a86470a5b070"));
        let addr = Address::p2sh_from_hash(hash, NetworkKind::Main);
        assert_eq!(&addr.to_string(), "33iFwdLuRpW1uK1RTRqsoi8rR4NpDzk66k");

        let script = ScriptBuf::from_hex("a914162c5ea71c0b23f5b9022ef047c4a86470a5b07087").unwrap();
        assert_eq!(Address::from_script(&script, Network::Bitcoin), Ok(addr));
    }

    #[test]
    fn zero_hash_legacy_addresses() {
        let zero = PubkeyHash::from_byte_array([0; 20]);
        assert_eq!(
            Address::p2pkh(zero, NetworkKind::Main).to_string(),
            "1111111111111111111114oLvT2"
        );
        assert_eq!(
            Address::p2pkh(zero, NetworkKind::Test).to_string(),
            "mfWxJ45yp2SFn7UciZyNpvDKrzbhyfKrY8"
        );
        assert_eq!(
            Address::p2sh_from_hash(ScriptHash::from_byte_array([0; 20]), NetworkKind::Test)
                .to_string(),
            "2MsFDzHRUAMpjHxKyoEHU3aMCMsVtMqs1PV"
        );
    }

    #[test]
    fn p2wpkh_bech32() {
        let script = ScriptBuf::from([&hex!("0014")[..], &[0u8; 20][..]].concat());
        let addr = Address::from_script(&script, Network::Bitcoin).unwrap();
        assert_eq!(&addr.to_string(), "bc1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq9e75rs");

        let script = ScriptBuf::from_hex("001454d26dddb59c7073c6a197946ea1841951fa7a74").unwrap();
        let addr = Address::from_script(&script, Network::Regtest).unwrap();
        assert_eq!(&addr.to_string(), "bcrt1q2nfxmhd4n3c8834pj72xagvyr9gl57n5r94fsl");
    }

    #[test]
    fn p2wsh_bech32() {
        let script = ScriptBuf::from_hex(
            "00201863143c14c5166804bd19203356da136c985678cd4d27a1b8c6329604903262",
        )
        .unwrap();
        let addr = Address::from_script(&script, Network::Testnet).unwrap();
        assert_eq!(
            &addr.to_string(),
            "tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q0sl5k7"
        );
    }

    #[test]
    fn p2tr_bech32m() {
        let script = ScriptBuf::from([&hex!("5120")[..], &[0u8; 32][..]].concat());
        let addr = Address::from_script(&script, Network::Bitcoin).unwrap();
        let s = addr.to_string();
        assert!(s.starts_with("bc1p"));

        // Round-trips through the checksum-validating decoder, which only
        // accepts bech32m for witness version 1.
        let (hrp, version, program) = bech32::segwit::decode(&s).unwrap();
        assert_eq!(hrp, bech32::hrp::BC);
        assert_eq!(version.to_u8(), 1);
        assert_eq!(program, vec![0u8; 32]);
    }

    #[test]
    fn extract_from_p2pk() {
        let compressed =
            ScriptBuf::from_hex("210279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798ac")
                .unwrap();
        let addrs = extract_addresses(&compressed, Network::Bitcoin);
        assert_eq!(addrs.len(), 1);
        assert_eq!(&addrs[0].to_string(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");

        let uncompressed = ScriptBuf::from_hex(
            "410479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8ac",
        )
        .unwrap();
        let addrs = extract_addresses(&uncompressed, Network::Bitcoin);
        assert_eq!(addrs.len(), 1);
        assert_eq!(&addrs[0].to_string(), "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm");
    }

    #[test]
    fn extract_from_multisig() {
        // OP_1 <key of 1> <key of 2> OP_2 OP_CHECKMULTISIG
        let mut raw = vec![0x51, 33];
        raw.extend_from_slice(&hex!(
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        ));
        raw.push(33);
        raw.extend_from_slice(&hex!(
            "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"
        ));
        raw.extend_from_slice(&[0x52, 0xae]);

        let addrs = extract_addresses(ScriptBuf::from(raw).as_script(), Network::Bitcoin);
        let strings: Vec<String> = addrs.iter().map(|a| a.to_string()).collect();
        assert_eq!(
            strings,
            ["1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH", "1cMh228HTCiwS8ZsaakH8A8wze1JR5ZsP"]
        );
    }

    #[test]
    fn unrecognized_scripts_yield_nothing() {
        for script in [
            ScriptBuf::new(),
            ScriptBuf::from_hex("6a0548656c6c6f").unwrap(), // OP_RETURN
            ScriptBuf::from([&hex!("5214")[..], &[0u8; 20][..]].concat()), // future witness version
            ScriptBuf::from_hex("76a914").unwrap(),         // truncated p2pkh
        ] {
            assert!(extract_addresses(&script, Network::Bitcoin).is_empty());
        }
    }
}
