// SPDX-License-Identifier: CC0-1.0

//! Ring-buffered reader with a bounded rewind guarantee.

use std::io::{self, Read, Seek, SeekFrom};

/// Non-refcounted RAII wrapper around a reader that implements a ring buffer
/// to deserialize from. It guarantees the ability to rewind a given number of
/// bytes.
///
/// Two cursors track progress: `src_pos` counts bytes consumed from the
/// underlying reader, `read_pos` counts bytes surfaced through [`Read`]. The
/// ring holds the window `[src_pos - buf_size, src_pos)`, and refills never
/// overwrite the `rewind` bytes behind `read_pos`, so [`set_pos`] can always
/// step back at least that far over already-surfaced data.
///
/// Reads have exact semantics: a call either delivers all requested bytes or
/// fails, with [`io::ErrorKind::UnexpectedEof`] both when the source runs dry
/// mid-refill and when the request crosses the configured read limit.
///
/// [`set_pos`]: BufferedFile::set_pos
#[derive(Debug)]
pub struct BufferedFile<R> {
    /// Source reader.
    src: R,
    /// How many bytes have been read from the source.
    src_pos: u64,
    /// How many bytes have been read from this.
    read_pos: u64,
    /// Up to which position we're allowed to read.
    read_limit: u64,
    /// How many bytes we guarantee to rewind.
    rewind: u64,
    /// The ring buffer.
    buf: Vec<u8>,
    /// Whether the source has reported end of data.
    src_eof: bool,
}

impl<R: Read> BufferedFile<R> {
    /// Creates a buffered reader over `src`.
    ///
    /// # Panics
    ///
    /// Panics if `rewind >= buf_size`: a rewind window as large as the whole
    /// buffer would leave no capacity to refill.
    pub fn new(src: R, buf_size: u64, rewind: u64) -> BufferedFile<R> {
        assert!(rewind < buf_size, "rewind limit must be less than buffer size");
        BufferedFile {
            src,
            src_pos: 0,
            read_pos: 0,
            read_limit: u64::MAX,
            rewind,
            buf: vec![0; buf_size as usize],
            src_eof: false,
        }
    }

    /// Checks whether we're at the end of the source.
    ///
    /// Only true once a refill has actually run into the end of the data and
    /// everything buffered has been surfaced.
    pub fn eof(&self) -> bool { self.read_pos == self.src_pos && self.src_eof }

    /// Returns the current reading position.
    pub fn pos(&self) -> u64 { self.read_pos }

    /// Rewinds or advances to a given reading position within the buffered
    /// window.
    ///
    /// Returns `false` and clamps to the nearest reachable position if `pos`
    /// is outside `[src_pos - buf_size, src_pos]`. Rewinds of up to the
    /// configured rewind guarantee are always honored.
    pub fn set_pos(&mut self, pos: u64) -> bool {
        let buf_size = self.buf.len() as u64;
        if pos.saturating_add(buf_size) < self.src_pos {
            // Rewinding too far, rewind as far as possible.
            self.read_pos = self.src_pos - buf_size;
            false
        } else if pos > self.src_pos {
            // Can't go this far forward, go as far as possible.
            self.read_pos = self.src_pos;
            false
        } else {
            self.read_pos = pos;
            true
        }
    }

    /// Seeks the underlying reader, discarding the buffered window.
    ///
    /// Both cursors are reset to the position actually reached. Returns
    /// `false` if the seek fails, leaving the stream untouched.
    pub fn seek(&mut self, pos: u64) -> bool
    where
        R: Seek,
    {
        match self.src.seek(SeekFrom::Start(pos)) {
            Ok(reached) => {
                self.src_pos = reached;
                self.read_pos = reached;
                self.src_eof = false;
                true
            }
            Err(_) => false,
        }
    }

    /// Prevents reading beyond a certain position.
    ///
    /// Returns `false` and leaves the limit untouched if `pos` is below the
    /// current reading position.
    pub fn set_limit(&mut self, pos: u64) -> bool {
        if pos < self.read_pos {
            return false;
        }
        self.read_limit = pos;
        true
    }

    /// Removes the read limit.
    pub fn clear_limit(&mut self) { self.read_limit = u64::MAX; }

    /// Searches for a given byte in the stream, and remains positioned on it.
    ///
    /// The read limit is not consulted while searching. Fails with
    /// [`io::ErrorKind::UnexpectedEof`] if the source ends first.
    pub fn find_byte(&mut self, byte: u8) -> io::Result<()> {
        loop {
            if self.read_pos == self.src_pos {
                self.fill()?;
                if self.read_pos == self.src_pos {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "no refill capacity while searching",
                    ));
                }
            }
            let at = (self.read_pos % self.buf.len() as u64) as usize;
            if self.buf[at] == byte {
                return Ok(());
            }
            self.read_pos += 1;
        }
    }

    /// Reads data from the source to fill the buffer.
    ///
    /// Fills the contiguous region from `src_pos` forward, bounded by the
    /// wrap to the end of the buffer and by the free capacity that keeps the
    /// rewind window intact. Returns `Ok(false)` if there is no capacity to
    /// fill; fails with [`io::ErrorKind::UnexpectedEof`] if the source has no
    /// more data.
    fn fill(&mut self) -> io::Result<bool> {
        let buf_size = self.buf.len() as u64;
        let at = (self.src_pos % buf_size) as usize;
        let mut read_now = self.buf.len() - at;
        let avail = (buf_size - (self.src_pos - self.read_pos) - self.rewind) as usize;
        if avail < read_now {
            read_now = avail;
        }
        if read_now == 0 {
            return Ok(false);
        }
        let n = self.src.read(&mut self.buf[at..at + read_now])?;
        if n == 0 {
            self.src_eof = true;
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "end of data reached while refilling",
            ));
        }
        self.src_pos += n as u64;
        Ok(true)
    }
}

impl<R: Read> Read for BufferedFile<R> {
    /// Reads exactly `dst.len()` bytes; short reads never surface.
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if dst.len() as u64 > self.read_limit.saturating_sub(self.read_pos) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read attempted past buffer limit",
            ));
        }
        let total = dst.len();
        let mut dst = dst;
        while !dst.is_empty() {
            if self.read_pos == self.src_pos {
                self.fill()?;
            }
            let buf_size = self.buf.len() as u64;
            let at = (self.read_pos % buf_size) as usize;
            let mut now = dst.len();
            if now > self.buf.len() - at {
                now = self.buf.len() - at;
            }
            if now as u64 > self.src_pos - self.read_pos {
                now = (self.src_pos - self.read_pos) as usize;
            }
            if now == 0 {
                // A refill was a no-op; nothing left to surface.
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "buffered reader exhausted",
                ));
            }
            dst[..now].copy_from_slice(&self.buf[at..at + now]);
            self.read_pos += now as u64;
            let rest = dst;
            dst = &mut rest[now..];
        }
        Ok(total)
    }
}
