// SPDX-License-Identifier: CC0-1.0

//! Block-file scanning.
//!
//! A block file is an append-only concatenation of frames, each a network
//! start marker, a little-endian length and a serialized block, possibly
//! interleaved with preallocation padding, truncated writes and other
//! garbage. The scanner walks a file by searching for the marker byte-wise,
//! validating the frame header, decoding the block under a read limit and
//! emitting every address its outputs pay. Whenever anything about a
//! candidate frame is wrong it resynchronizes one byte past the candidate
//! marker, so every iteration makes progress toward the end of the file.

mod buffered;

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub use self::buffered::BufferedFile;
use crate::address::extract_addresses;
use crate::blockdata::block::Block;
use crate::blockdata::constants::MAX_BLOCK_SERIALIZED_SIZE;
use crate::consensus::encode::{self, Decodable};
use crate::network::Network;

/// What a walk over a directory of block files covered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Number of block files processed.
    pub files: u32,
    /// Number of blocks successfully decoded.
    pub blocks: u64,
}

/// Returns the path of the `index`th block file in `db_path`.
pub fn block_file_path(db_path: &Path, index: u32) -> PathBuf {
    db_path.join(format!("blk{:05}.dat", index))
}

/// Scans the `blk00000.dat`, `blk00001.dat`, ... sequence under `db_path`,
/// writing every extracted address to `out`, one per line.
///
/// The walk stops at the first file that cannot be opened; gaps in the
/// numbering are not tolerated. The sink is flushed after each file. Only
/// I/O failures (on the sink, or non-EOF failures of a source file) abort
/// the walk with an error.
pub fn scan_block_dir<W: Write>(
    db_path: &Path,
    network: Network,
    out: &mut W,
) -> io::Result<ScanSummary> {
    let mut summary = ScanSummary::default();
    loop {
        let path = block_file_path(db_path, summary.files);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                log::info!("unable to open {}, stopping: {}", path.display(), e);
                break;
            }
        };
        log::info!("processing block file {}", path.display());
        scan_block_file(file, network, out, &mut summary.blocks)?;
        out.flush()?;
        summary.files += 1;
    }
    Ok(summary)
}

/// Scans one block file, writing every extracted address to `out`, one per
/// line.
///
/// `blocks_loaded` is incremented for every successfully decoded block and
/// carries across files for progress logging. Frames that fail validation or
/// decoding are logged and skipped; the scan resumes one byte past their
/// start marker.
pub fn scan_block_file<R: Read, W: Write>(
    src: R,
    network: Network,
    out: &mut W,
    blocks_loaded: &mut u64,
) -> io::Result<()> {
    let magic = network.magic().to_bytes();
    let mut blkdat = BufferedFile::new(
        src,
        2 * MAX_BLOCK_SERIALIZED_SIZE as u64,
        MAX_BLOCK_SERIALIZED_SIZE as u64 + 8,
    );
    let mut rewind = blkdat.pos();
    while !blkdat.eof() {
        blkdat.set_pos(rewind);
        rewind += 1; // start one byte further next time, in case of failure
        blkdat.clear_limit();

        let size = match locate_frame(&mut blkdat, magic, &mut rewind) {
            Ok(Some(size)) => size,
            // Marker or size check failed; hunt for the next candidate.
            Ok(None) => continue,
            // No valid frame start before the file ends.
            Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        };

        let block_pos = blkdat.pos();
        blkdat.set_limit(block_pos + u64::from(size));
        blkdat.set_pos(block_pos);
        match Block::consensus_decode_from_finite_reader(&mut blkdat) {
            Ok(block) => {
                rewind = blkdat.pos();
                for tx in &block.txdata {
                    for txout in &tx.output {
                        for address in extract_addresses(&txout.script_pubkey, network) {
                            writeln!(out, "{}", address)?;
                        }
                    }
                }
                *blocks_loaded += 1;
                log::debug!("loaded block {}", block.block_hash());
                if *blocks_loaded % 100 == 0 {
                    log::info!("{} blocks loaded", blocks_loaded);
                }
            }
            // A real I/O failure of the underlying file is fatal; running
            // into the frame's read limit or the end of the file is not.
            Err(encode::Error::Io(e)) if e.kind() != io::ErrorKind::UnexpectedEof => {
                return Err(e)
            }
            Err(e) => {
                log::info!("failed to decode block at offset {}: {}", block_pos, e);
            }
        }
    }
    Ok(())
}

/// Hunts for the next plausible frame: positions the stream on a marker
/// byte, validates the full marker and reads the frame length.
///
/// On entry into the body the resync cursor is moved one byte past the
/// located marker byte, before any validation, so the caller keeps making
/// progress no matter how the candidate turns out.
fn locate_frame<R: Read>(
    blkdat: &mut BufferedFile<R>,
    magic: [u8; 4],
    rewind: &mut u64,
) -> io::Result<Option<u32>> {
    blkdat.find_byte(magic[0])?;
    *rewind = blkdat.pos() + 1;

    let mut start = [0u8; 4];
    blkdat.read_exact(&mut start)?;
    if start != magic {
        return Ok(None);
    }

    let mut size = [0u8; 4];
    blkdat.read_exact(&mut size)?;
    let size = u32::from_le_bytes(size);
    if size < 80 || size as usize > MAX_BLOCK_SERIALIZED_SIZE {
        return Ok(None);
    }
    Ok(Some(size))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::consensus::encode::serialize;
    use crate::{Block, Header};

    fn header_only_block() -> Block {
        let raw = [1u8; 80];
        let header: Header = crate::consensus::encode::deserialize(&raw).unwrap();
        Block { header, txdata: vec![] }
    }

    fn frame(network: Network, block: &Block) -> Vec<u8> {
        let body = serialize(block);
        let mut out = Vec::with_capacity(body.len() + 8);
        out.extend_from_slice(&network.magic().to_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    fn scan(data: Vec<u8>, network: Network) -> (u64, String) {
        let mut out = Vec::new();
        let mut blocks = 0;
        scan_block_file(Cursor::new(data), network, &mut out, &mut blocks).unwrap();
        (blocks, String::from_utf8(out).unwrap())
    }

    #[test]
    fn finds_frames_between_garbage() {
        let block = header_only_block();
        let mut data = vec![0u8; 13];
        data.extend_from_slice(&frame(Network::Testnet, &block));
        data.extend_from_slice(&[0u8; 100]);
        data.push(0x0B); // stray first marker byte
        data.extend_from_slice(&frame(Network::Testnet, &block));
        data.extend_from_slice(&[0xAAu8; 5]);

        let (blocks, out) = scan(data, Network::Testnet);
        assert_eq!(blocks, 2);
        assert!(out.is_empty());
    }

    #[test]
    fn oversized_frame_is_skipped() {
        let block = header_only_block();
        let mut data = Vec::new();
        data.extend_from_slice(&Network::Bitcoin.magic().to_bytes());
        data.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        data.extend_from_slice(&[0u8; 64]);
        data.extend_from_slice(&frame(Network::Bitcoin, &block));

        let (blocks, _) = scan(data, Network::Bitcoin);
        assert_eq!(blocks, 1);
    }

    #[test]
    fn undersized_frame_is_skipped() {
        let mut data = Vec::new();
        data.extend_from_slice(&Network::Bitcoin.magic().to_bytes());
        data.extend_from_slice(&79u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 79]);

        let (blocks, _) = scan(data, Network::Bitcoin);
        assert_eq!(blocks, 0);
    }

    #[test]
    fn wrong_network_magic_is_ignored() {
        let block = header_only_block();
        let data = frame(Network::Bitcoin, &block);
        let (blocks, _) = scan(data, Network::Testnet);
        assert_eq!(blocks, 0);
    }

    #[test]
    fn truncated_frame_ends_scan() {
        let block = header_only_block();
        let mut data = frame(Network::Regtest, &block);
        let full = frame(Network::Regtest, &block);
        data.extend_from_slice(&full[..40]); // second frame cut short

        let (blocks, _) = scan(data, Network::Regtest);
        assert_eq!(blocks, 1);
    }

    #[test]
    fn decode_failure_resyncs_to_next_frame() {
        let block = header_only_block();
        let mut data = Vec::new();
        // Claimed frame whose payload is not a block: the transaction count
        // is a non-minimal compact int.
        data.extend_from_slice(&Network::Bitcoin.magic().to_bytes());
        data.extend_from_slice(&83u32.to_le_bytes());
        data.extend_from_slice(&[2u8; 80]);
        data.extend_from_slice(&[0xFD, 0x00, 0x00]);
        data.extend_from_slice(&frame(Network::Bitcoin, &block));

        let (blocks, _) = scan(data, Network::Bitcoin);
        assert_eq!(blocks, 1);
    }

    #[test]
    fn empty_file() {
        let (blocks, out) = scan(Vec::new(), Network::Testnet);
        assert_eq!(blocks, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn block_file_paths() {
        assert_eq!(
            block_file_path(Path::new("/tmp/blocks"), 0),
            PathBuf::from("/tmp/blocks/blk00000.dat")
        );
        assert_eq!(
            block_file_path(Path::new(""), 12345),
            PathBuf::from("blk12345.dat")
        );
    }
}
