// SPDX-License-Identifier: CC0-1.0

//! Bitcoin network selection.
//!
//! The network whose block files are being scanned is established once at
//! startup and threaded explicitly through the scanner (which needs the
//! start marker) and the address encoder (which needs the version bytes and
//! the bech32 human-readable part).

use core::fmt;

/// The cryptocurrency network to act on.
#[derive(Copy, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Debug)]
pub enum Network {
    /// Mainnet Bitcoin.
    Bitcoin,
    /// Bitcoin's testnet network.
    Testnet,
    /// Bitcoin's regtest network.
    Regtest,
}

impl Network {
    /// Returns the network's magic bytes, the start marker prefixing every
    /// frame in its block files.
    pub fn magic(self) -> Magic { Magic::from(self) }
}

/// What kind of network we are on, for the purpose of legacy (base58)
/// address version bytes.
///
/// Testnet and regtest share their legacy address format, so this split is
/// coarser than [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NetworkKind {
    /// The Bitcoin mainnet network.
    Main,
    /// Some kind of testnet network.
    Test,
}

impl From<Network> for NetworkKind {
    fn from(n: Network) -> Self {
        match n {
            Network::Bitcoin => NetworkKind::Main,
            Network::Testnet | Network::Regtest => NetworkKind::Test,
        }
    }
}

/// Network magic bytes to identify the network a block file belongs to.
///
/// The bytes are designed to be unlikely to occur in normal data: rarely
/// used upper ASCII, not valid as UTF-8.
#[derive(Copy, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct Magic([u8; 4]);

impl Magic {
    /// Bitcoin mainnet network magic bytes.
    pub const BITCOIN: Self = Self([0xF9, 0xBE, 0xB4, 0xD9]);
    /// Bitcoin testnet network magic bytes.
    pub const TESTNET: Self = Self([0x0B, 0x11, 0x09, 0x07]);
    /// Bitcoin regtest network magic bytes.
    pub const REGTEST: Self = Self([0xFA, 0xBF, 0xB5, 0xDA]);

    /// Creates network magic from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Magic { Magic(bytes) }

    /// Gets the network magic bytes.
    pub fn to_bytes(self) -> [u8; 4] { self.0 }
}

impl From<Network> for Magic {
    fn from(network: Network) -> Magic {
        match network {
            Network::Bitcoin => Magic::BITCOIN,
            Network::Testnet => Magic::TESTNET,
            Network::Regtest => Magic::REGTEST,
        }
    }
}

impl fmt::Display for Magic {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        hex::fmt_hex_exact!(f, 4, &self.0, hex::Case::Lower)?;
        Ok(())
    }
}

impl fmt::Debug for Magic {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> { fmt::Display::fmt(self, f) }
}

impl AsRef<[u8; 4]> for Magic {
    fn as_ref(&self) -> &[u8; 4] { &self.0 }
}
