// SPDX-License-Identifier: CC0-1.0

//! Bitcoin consensus-encodable types.
//!
//! Everything that crosses the disk or network boundary is encoded with the
//! [`Encodable`]/[`Decodable`] traits defined here: little-endian integers,
//! compact-size (`VarInt`) length prefixes and length-prefixed vectors.
//!
//! Decoding of length-prefixed data is split in two tiers. Types whose length
//! comes from the stream implement [`Decodable::consensus_decode_from_finite_reader`]
//! and rely on the reader being bounded (a [`std::io::Take`] or the block-file
//! stream's read limit) for memory-exhaustion protection; the plain
//! [`Decodable::consensus_decode`] wraps the reader in such a bound itself.

use core::{fmt, mem};
use std::error;
use std::io::{self, Cursor, Read, Write};

use crate::blockdata::transaction::{Transaction, TxIn, TxOut};

/// The maximum value a compact-size integer is allowed to decode to.
///
/// This is Bitcoin Core's `MAX_SIZE`: no length prefix in a well-formed
/// serialized structure can exceed it, so anything larger is rejected as soon
/// as it is read instead of when the doomed allocation or read is attempted.
pub const MAX_SIZE: u64 = 0x0200_0000; // 32 MiB

/// Maximum size, in bytes, of a vector we are allowed to decode.
pub const MAX_VEC_SIZE: usize = 4_000_000;

/// Encoding error.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// And I/O error.
    Io(io::Error),
    /// Tried to allocate an oversized vector.
    OversizedVectorAllocation {
        /// The capacity requested.
        requested: usize,
        /// The maximum capacity.
        max: usize,
    },
    /// A compact-size integer was not encoded minimally.
    NonMinimalVarInt,
    /// A compact-size integer exceeded [`MAX_SIZE`].
    VarIntTooLarge(u64),
    /// Parsing error.
    ParseFailed(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "IO error: {}", e),
            Error::OversizedVectorAllocation { requested: ref r, max: ref m } => {
                write!(f, "allocation of oversized vector: requested {}, maximum {}", r, m)
            }
            Error::NonMinimalVarInt => write!(f, "non-minimal varint"),
            Error::VarIntTooLarge(v) => write!(f, "compact int {} is too large", v),
            Error::ParseFailed(ref s) => write!(f, "parse failed: {}", s),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            Error::OversizedVectorAllocation { .. }
            | Error::NonMinimalVarInt
            | Error::VarIntTooLarge(..)
            | Error::ParseFailed(..) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self { Error::Io(error) }
}

/// Encodes an object into a vector.
pub fn serialize<T: Encodable + ?Sized>(data: &T) -> Vec<u8> {
    let mut encoder = Vec::new();
    let len = data.consensus_encode(&mut encoder).expect("in-memory writers don't error");
    debug_assert_eq!(len, encoder.len());
    encoder
}

/// Deserializes an object from a vector, will error if said deserialization
/// doesn't consume the entire vector.
pub fn deserialize<T: Decodable>(data: &[u8]) -> Result<T, Error> {
    let (rv, consumed) = deserialize_partial(data)?;

    // Fail if data are not consumed entirely.
    if consumed == data.len() {
        Ok(rv)
    } else {
        Err(Error::ParseFailed("data not consumed entirely when explicitly deserializing"))
    }
}

/// Deserializes an object from a vector, but will not report an error if said
/// deserialization doesn't consume the entire vector.
pub fn deserialize_partial<T: Decodable>(data: &[u8]) -> Result<(T, usize), Error> {
    let mut decoder = Cursor::new(data);
    let rv = Decodable::consensus_decode_from_finite_reader(&mut decoder)?;
    let consumed = decoder.position() as usize;

    Ok((rv, consumed))
}

/// Extensions of `Write` to encode data as per Bitcoin consensus.
pub trait WriteExt: Write {
    /// Outputs a 64-bit unsigned integer.
    fn emit_u64(&mut self, v: u64) -> Result<(), io::Error>;
    /// Outputs a 32-bit unsigned integer.
    fn emit_u32(&mut self, v: u32) -> Result<(), io::Error>;
    /// Outputs a 16-bit unsigned integer.
    fn emit_u16(&mut self, v: u16) -> Result<(), io::Error>;
    /// Outputs an 8-bit unsigned integer.
    fn emit_u8(&mut self, v: u8) -> Result<(), io::Error>;
    /// Outputs a 32-bit signed integer.
    fn emit_i32(&mut self, v: i32) -> Result<(), io::Error>;
    /// Outputs a byte slice.
    fn emit_slice(&mut self, v: &[u8]) -> Result<(), io::Error>;
}

/// Extensions of `Read` to decode data as per Bitcoin consensus.
pub trait ReadExt: Read {
    /// Reads a 64-bit unsigned integer.
    fn read_u64(&mut self) -> Result<u64, Error>;
    /// Reads a 32-bit unsigned integer.
    fn read_u32(&mut self) -> Result<u32, Error>;
    /// Reads a 16-bit unsigned integer.
    fn read_u16(&mut self) -> Result<u16, Error>;
    /// Reads an 8-bit unsigned integer.
    fn read_u8(&mut self) -> Result<u8, Error>;
    /// Reads a 32-bit signed integer.
    fn read_i32(&mut self) -> Result<i32, Error>;
    /// Reads a byte slice.
    fn read_slice(&mut self, slice: &mut [u8]) -> Result<(), Error>;
}

macro_rules! encoder_fn {
    ($name:ident, $val_type:ty) => {
        #[inline]
        fn $name(&mut self, v: $val_type) -> Result<(), io::Error> {
            self.write_all(&v.to_le_bytes())
        }
    };
}

macro_rules! decoder_fn {
    ($name:ident, $val_type:ty, $byte_len:expr) => {
        #[inline]
        fn $name(&mut self) -> Result<$val_type, Error> {
            let mut val = [0; $byte_len];
            self.read_exact(&mut val[..]).map_err(Error::Io)?;
            Ok(<$val_type>::from_le_bytes(val))
        }
    };
}

impl<W: Write + ?Sized> WriteExt for W {
    encoder_fn!(emit_u64, u64);
    encoder_fn!(emit_u32, u32);
    encoder_fn!(emit_u16, u16);
    encoder_fn!(emit_i32, i32);

    #[inline]
    fn emit_u8(&mut self, v: u8) -> Result<(), io::Error> { self.write_all(&[v]) }
    #[inline]
    fn emit_slice(&mut self, v: &[u8]) -> Result<(), io::Error> { self.write_all(v) }
}

impl<R: Read + ?Sized> ReadExt for R {
    decoder_fn!(read_u64, u64, 8);
    decoder_fn!(read_u32, u32, 4);
    decoder_fn!(read_u16, u16, 2);
    decoder_fn!(read_i32, i32, 4);

    #[inline]
    fn read_u8(&mut self) -> Result<u8, Error> {
        let mut slice = [0u8; 1];
        self.read_exact(&mut slice).map_err(Error::Io)?;
        Ok(slice[0])
    }
    #[inline]
    fn read_slice(&mut self, slice: &mut [u8]) -> Result<(), Error> {
        self.read_exact(slice).map_err(Error::Io)
    }
}

/// Data which can be encoded in a consensus-consistent way.
pub trait Encodable {
    /// Encodes an object with a well-defined format.
    ///
    /// Returns the number of bytes written on success. The only errors
    /// returned are errors propagated from the writer.
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error>;
}

/// Data which can be decoded in a consensus-consistent way.
pub trait Decodable: Sized {
    /// Decodes `Self` from a size-limited reader.
    ///
    /// Like [`Self::consensus_decode`] but relies on the reader being limited
    /// in the amount of data it returns, e.g. by being wrapped in
    /// [`std::io::Take`] or read through a stream with a read limit. Failing
    /// to abide by this requirement might lead to memory exhaustion caused by
    /// malicious inputs.
    #[inline]
    fn consensus_decode_from_finite_reader<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        // Types that don't read a length prefix don't care about the bound
        // and can just use the unlimited entry point.
        Self::consensus_decode(reader)
    }

    /// Decodes an object with a well-defined format.
    ///
    /// The default implementation bounds the reader to [`MAX_VEC_SIZE`] and
    /// forwards to [`Self::consensus_decode_from_finite_reader`], which is
    /// the method to override for length-prefixed types.
    #[inline]
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        Self::consensus_decode_from_finite_reader(&mut reader.take(MAX_VEC_SIZE as u64))
    }
}

// Primitive types.
macro_rules! impl_int_encodable {
    ($ty:ident, $meth_dec:ident, $meth_enc:ident) => {
        impl Decodable for $ty {
            #[inline]
            fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, Error> {
                ReadExt::$meth_dec(r)
            }
        }
        impl Encodable for $ty {
            #[inline]
            fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
                w.$meth_enc(*self)?;
                Ok(mem::size_of::<$ty>())
            }
        }
    };
}

impl_int_encodable!(u8, read_u8, emit_u8);
impl_int_encodable!(u16, read_u16, emit_u16);
impl_int_encodable!(u32, read_u32, emit_u32);
impl_int_encodable!(u64, read_u64, emit_u64);
impl_int_encodable!(i32, read_i32, emit_i32);

/// A variable-width unsigned integer as used for length prefixes
/// ("CompactSize").
///
/// Decoding enforces the minimal encoding and rejects values above
/// [`MAX_SIZE`]: a length prefix that large cannot occur in well-formed data,
/// so it is reported as [`Error::VarIntTooLarge`] at the point of the read.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone)]
pub struct VarInt(pub u64);

impl Encodable for VarInt {
    #[inline]
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
        match self.0 {
            0..=0xFC => {
                (self.0 as u8).consensus_encode(w)?;
                Ok(1)
            }
            0xFD..=0xFFFF => {
                w.emit_u8(0xFD)?;
                (self.0 as u16).consensus_encode(w)?;
                Ok(3)
            }
            0x10000..=0xFFFFFFFF => {
                w.emit_u8(0xFE)?;
                (self.0 as u32).consensus_encode(w)?;
                Ok(5)
            }
            _ => {
                w.emit_u8(0xFF)?;
                self.0.consensus_encode(w)?;
                Ok(9)
            }
        }
    }
}

impl Decodable for VarInt {
    #[inline]
    fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, Error> {
        let n = ReadExt::read_u8(r)?;
        let value = match n {
            0xFF => {
                let x = ReadExt::read_u64(r)?;
                if x < 0x1_0000_0000 {
                    return Err(Error::NonMinimalVarInt);
                }
                x
            }
            0xFE => {
                let x = ReadExt::read_u32(r)?;
                if x < 0x1_0000 {
                    return Err(Error::NonMinimalVarInt);
                }
                x as u64
            }
            0xFD => {
                let x = ReadExt::read_u16(r)?;
                if x < 0xFD {
                    return Err(Error::NonMinimalVarInt);
                }
                x as u64
            }
            n => n as u64,
        };
        if value > MAX_SIZE {
            return Err(Error::VarIntTooLarge(value));
        }
        Ok(VarInt(value))
    }
}

macro_rules! impl_array {
    ( $size:literal ) => {
        impl Encodable for [u8; $size] {
            #[inline]
            fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
                w.emit_slice(&self[..])?;
                Ok($size)
            }
        }

        impl Decodable for [u8; $size] {
            #[inline]
            fn consensus_decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, Error> {
                let mut ret = [0; $size];
                r.read_slice(&mut ret)?;
                Ok(ret)
            }
        }
    };
}

impl_array!(4);
impl_array!(32);

pub(crate) fn consensus_encode_with_size<W: Write + ?Sized>(
    data: &[u8],
    w: &mut W,
) -> Result<usize, io::Error> {
    let vi_len = VarInt(data.len() as u64).consensus_encode(w)?;
    w.emit_slice(data)?;
    Ok(vi_len + data.len())
}

struct ReadBytesFromFiniteReaderOpts {
    len: usize,
    chunk_size: usize,
}

/// Reads `opts.len` bytes from reader, where `opts.len` could potentially be
/// malicious.
///
/// Relies on the reader being bounded for memory-exhaustion protection, see
/// [`Decodable::consensus_decode_from_finite_reader`].
fn read_bytes_from_finite_reader<D: Read + ?Sized>(
    d: &mut D,
    mut opts: ReadBytesFromFiniteReaderOpts,
) -> Result<Vec<u8>, Error> {
    let mut ret = vec![];

    assert_ne!(opts.chunk_size, 0);

    while opts.len > 0 {
        let chunk_start = ret.len();
        let chunk_size = core::cmp::min(opts.len, opts.chunk_size);
        let chunk_end = chunk_start + chunk_size;
        ret.resize(chunk_end, 0u8);
        d.read_slice(&mut ret[chunk_start..chunk_end])?;
        opts.len -= chunk_size;
    }

    Ok(ret)
}

impl Encodable for Vec<u8> {
    #[inline]
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
        consensus_encode_with_size(self, w)
    }
}

impl Decodable for Vec<u8> {
    #[inline]
    fn consensus_decode_from_finite_reader<R: Read + ?Sized>(r: &mut R) -> Result<Self, Error> {
        let len = VarInt::consensus_decode(r)?.0 as usize;
        // Most real-world vec of bytes data wouldn't be larger than 128KiB.
        let opts = ReadBytesFromFiniteReaderOpts { len, chunk_size: 128 * 1024 };
        read_bytes_from_finite_reader(r, opts)
    }
}

macro_rules! impl_vec {
    ($type:ty) => {
        impl Encodable for Vec<$type> {
            #[inline]
            fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
                let mut len = 0;
                len += VarInt(self.len() as u64).consensus_encode(w)?;
                for c in self.iter() {
                    len += c.consensus_encode(w)?;
                }
                Ok(len)
            }
        }

        impl Decodable for Vec<$type> {
            #[inline]
            fn consensus_decode_from_finite_reader<R: Read + ?Sized>(
                r: &mut R,
            ) -> Result<Self, Error> {
                let len = VarInt::consensus_decode_from_finite_reader(r)?.0;
                // Do not allocate upfront more items than if the sequence of
                // type occupied roughly quarter a block. This should never be
                // the case for normal data, but even if that's not true,
                // `push` will just reallocate.
                // Note: OOM protection relies on reader eventually running
                // out of data to feed us.
                let max_capacity = MAX_VEC_SIZE / 4 / mem::size_of::<$type>();
                let mut ret = Vec::with_capacity(core::cmp::min(len as usize, max_capacity));
                for _ in 0..len {
                    ret.push(Decodable::consensus_decode_from_finite_reader(r)?);
                }
                Ok(ret)
            }
        }
    };
}

impl_vec!(TxIn);
impl_vec!(TxOut);
impl_vec!(Transaction);
impl_vec!(Vec<u8>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_int() {
        // u8
        assert_eq!(serialize(&1u8), [1u8]);
        assert_eq!(serialize(&0u8), [0u8]);
        assert_eq!(serialize(&255u8), [255u8]);
        // u16
        assert_eq!(serialize(&1u16), [1u8, 0]);
        assert_eq!(serialize(&256u16), [0u8, 1]);
        assert_eq!(serialize(&5000u16), [136u8, 19]);
        // u32
        assert_eq!(serialize(&256u32), [0u8, 1, 0, 0]);
        assert_eq!(serialize(&168430090u32), [10u8, 10, 10, 10]);
        // i32
        assert_eq!(serialize(&-1i32), [255u8, 255, 255, 255]);
        assert_eq!(serialize(&-168430090i32), [246u8, 245, 245, 245]);
        assert_eq!(serialize(&168430090i32), [10u8, 10, 10, 10]);
        // u64
        assert_eq!(serialize(&500000u64), [32u8, 161, 7, 0, 0, 0, 0, 0]);
        assert_eq!(serialize(&723401728380766730u64), [10u8, 10, 10, 10, 10, 10, 10, 10]);
    }

    #[test]
    fn deserialize_int() {
        assert_eq!(deserialize(&[58u8]).ok(), Some(58u8));
        assert_eq!(deserialize(&[0x01u8, 0x02]).ok(), Some(0x0201u16));
        assert_eq!(deserialize(&[0xA0u8, 0x0D, 0xAB, 0xCD]).ok(), Some(0xCDAB0DA0u32));
        assert_eq!(deserialize(&[0xA0u8, 0x0D, 0xAB, 0x2D]).ok(), Some(0x2DAB0DA0i32));
        assert_eq!(
            deserialize(&[0xA0u8, 0x0D, 0xAB, 0xCD, 0x99, 0, 0, 0x99]).ok(),
            Some(0x99000099CDAB0DA0u64)
        );

        let failure16: Result<u16, _> = deserialize(&[1u8]);
        assert!(failure16.is_err());
        let failure64: Result<u64, _> = deserialize(&[1u8, 2, 3, 4, 5, 6, 7]);
        assert!(failure64.is_err());
    }

    fn decode_varint(raw: &[u8]) -> Result<u64, Error> {
        deserialize::<VarInt>(raw).map(|v| v.0)
    }

    fn roundtrips(v: u64, len: usize) {
        let raw = serialize(&VarInt(v));
        assert_eq!(raw.len(), len);
        assert_eq!(decode_varint(&raw).unwrap(), v);
    }

    #[test]
    fn serialize_varint() {
        assert_eq!(serialize(&VarInt(10)), [10u8]);
        assert_eq!(serialize(&VarInt(0xFC)), [0xFCu8]);
        assert_eq!(serialize(&VarInt(0xFD)), [0xFDu8, 0xFD, 0]);
        assert_eq!(serialize(&VarInt(0xFFF)), [0xFDu8, 0xFF, 0xF]);
        assert_eq!(serialize(&VarInt(0xF0F0F0F)), [0xFEu8, 0xF, 0xF, 0xF, 0xF]);
        assert_eq!(
            serialize(&VarInt(0xF0F0F0F0F0E0)),
            [0xFFu8, 0xE0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0, 0]
        );
    }

    #[test]
    fn varint_roundtrip() {
        // Every encoding-width breakpoint up to the stream cap.
        roundtrips(0, 1);
        roundtrips(252, 1);
        roundtrips(253, 3);
        roundtrips(65535, 3);
        roundtrips(65536, 5);
        roundtrips(MAX_SIZE - 1, 5);
        roundtrips(MAX_SIZE, 5);
    }

    #[test]
    fn varint_too_large() {
        // Minimally encoded but above the cap every length prefix lives under.
        for v in [MAX_SIZE + 1, u32::MAX as u64, 0x1_0000_0000, u64::MAX] {
            let raw = serialize(&VarInt(v));
            assert!(matches!(decode_varint(&raw), Err(Error::VarIntTooLarge(x)) if x == v));
        }
    }

    #[test]
    fn non_minimal_varint() {
        assert!(matches!(decode_varint(&[0xFD, 0x00, 0x00]), Err(Error::NonMinimalVarInt)));
        assert!(matches!(decode_varint(&[0xFD, 0xFC, 0x00]), Err(Error::NonMinimalVarInt)));
        assert!(matches!(
            decode_varint(&[0xFE, 0xFF, 0xFF, 0x00, 0x00]),
            Err(Error::NonMinimalVarInt)
        ));
        assert!(matches!(
            decode_varint(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00]),
            Err(Error::NonMinimalVarInt)
        ));
    }

    #[test]
    fn serialize_vector() {
        assert_eq!(serialize(&vec![1u8, 2, 3]), [3u8, 1, 2, 3]);
    }

    #[test]
    fn deserialize_vec() {
        assert_eq!(deserialize(&[3u8, 2, 3, 4]).ok(), Some(vec![2u8, 3, 4]));
        // Trailing byte must be rejected.
        assert!((deserialize(&[4u8, 2, 3, 4, 5, 6]) as Result<Vec<u8>, _>).is_err());
        // Length prefix larger than the data runs into EOF, not an allocation.
        assert!(matches!(
            deserialize::<Vec<u8>>(&[0xFD, 0x00, 0x01]),
            Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn limit_read() {
        // A nested vector whose total claimed size blows past MAX_VEC_SIZE
        // must fail against the default bounded reader.
        let witness = vec![vec![0u8; 3_999_999]; 2];
        let ser = serialize(&witness);
        let mut reader = Cursor::new(ser);
        let err = Vec::<Vec<u8>>::consensus_decode(&mut reader);
        assert!(err.is_err());
    }

    #[test]
    fn test_read_bytes_from_finite_reader() {
        let data: Vec<u8> = (0..10).collect();

        for chunk_size in 1..20 {
            assert_eq!(
                read_bytes_from_finite_reader(
                    &mut Cursor::new(&data),
                    ReadBytesFromFiniteReaderOpts { len: data.len(), chunk_size }
                )
                .unwrap(),
                data
            );
        }
    }
}
