// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements byte-level, big-endian I/O for atom-structured files.
//!
//! The following nomenclature is used to denote where the data being read is sourced from:
//!  * A `Stream` consumes any source implementing [`MediaSource`] (aka. [`std::io::Read`] +
//!    [`std::io::Seek`]).
//!  * A `Reader` consumes a `&[u8]`.
//!
//! All `Reader`s and `Stream`s that read implement the [`ReadBytes`] trait. All sinks implement
//! the [`WriteBytes`] trait, which includes the ability to back-patch previously written bytes.

use std::io;
use std::mem;

mod buf_reader;
mod media_sink_stream;
mod media_source_stream;

pub use buf_reader::BufReader;
pub use media_sink_stream::MediaSinkStream;
pub use media_source_stream::{MediaSourceStream, MediaSourceStreamOptions};

/// `MediaSource` is a composite trait of [`std::io::Read`] and [`std::io::Seek`]. A source *must*
/// implement this trait to be used by [`MediaSourceStream`].
pub trait MediaSource: io::Read + io::Seek + Send + Sync {
    /// Returns the length in bytes, if available. This may be an expensive operation.
    fn byte_len(&self) -> Option<u64>;
}

impl MediaSource for std::fs::File {
    /// Returns the length in bytes of the `std::io::File` backing the `MediaSource`.
    ///
    /// Note: This operation involves querying the underlying file descriptor for information and
    /// may be moderately expensive.
    fn byte_len(&self) -> Option<u64> {
        match self.metadata() {
            Ok(metadata) => Some(metadata.len()),
            _ => None,
        }
    }
}

impl<T: std::convert::AsRef<[u8]> + Send + Sync> MediaSource for io::Cursor<T> {
    /// Returns the length in bytes of the `io::Cursor<u8>` backing the `MediaSource`.
    fn byte_len(&self) -> Option<u64> {
        let inner = self.get_ref();
        Some(inner.as_ref().len() as u64)
    }
}

/// `ReadBytes` provides methods to read bytes and interpret them as big-endian unsigned or signed
/// integers of the widths used by atom-structured files.
pub trait ReadBytes {
    /// Reads a single byte from the stream and returns it or an error.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Reads two bytes from the stream and returns them in read-order or an error.
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]>;

    /// Reads three bytes from the stream and returns them in read-order or an error.
    fn read_triple_bytes(&mut self) -> io::Result<[u8; 3]>;

    /// Reads four bytes from the stream and returns them in read-order or an error.
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]>;

    /// Reads exactly the number of bytes required to fill be provided buffer or returns an error.
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Ignores the specified number of bytes from the stream or returns an error.
    fn ignore_bytes(&mut self, count: u64) -> io::Result<()>;

    /// Gets the position of the stream.
    fn pos(&self) -> u64;

    /// Reads a single unsigned byte from the stream and returns it or an error.
    #[inline(always)]
    fn read_u8(&mut self) -> io::Result<u8> {
        self.read_byte()
    }

    /// Reads a single signed byte from the stream and returns it or an error.
    #[inline(always)]
    fn read_i8(&mut self) -> io::Result<i8> {
        Ok(self.read_byte()? as i8)
    }

    /// Reads two bytes from the stream and interprets them as an unsigned 16-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u16(&mut self) -> io::Result<u16> {
        Ok(u16::from_be_bytes(self.read_double_bytes()?))
    }

    /// Reads two bytes from the stream and interprets them as an signed 16-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_i16(&mut self) -> io::Result<i16> {
        Ok(i16::from_be_bytes(self.read_double_bytes()?))
    }

    /// Reads three bytes from the stream and interprets them as an unsigned 24-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u24(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; mem::size_of::<u32>()];
        buf[0..3].clone_from_slice(&self.read_triple_bytes()?);
        Ok(u32::from_be_bytes(buf) >> 8)
    }

    /// Reads four bytes from the stream and interprets them as an unsigned 32-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u32(&mut self) -> io::Result<u32> {
        Ok(u32::from_be_bytes(self.read_quad_bytes()?))
    }

    /// Reads four bytes from the stream and interprets them as a signed 32-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_i32(&mut self) -> io::Result<i32> {
        Ok(i32::from_be_bytes(self.read_quad_bytes()?))
    }

    /// Reads eight bytes from the stream and interprets them as an unsigned 64-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u64(&mut self) -> io::Result<u64> {
        let mut buf = [0u8; mem::size_of::<u64>()];
        self.read_buf_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    /// Reads exactly the number of bytes requested, and returns a boxed slice of the data or an
    /// error.
    fn read_boxed_slice_exact(&mut self, len: usize) -> io::Result<Box<[u8]>> {
        let mut buf = vec![0u8; len];
        self.read_buf_exact(&mut buf)?;
        Ok(buf.into_boxed_slice())
    }
}

impl<R: ReadBytes> ReadBytes for &mut R {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        (*self).read_byte()
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        (*self).read_double_bytes()
    }

    #[inline(always)]
    fn read_triple_bytes(&mut self) -> io::Result<[u8; 3]> {
        (*self).read_triple_bytes()
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        (*self).read_quad_bytes()
    }

    #[inline(always)]
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        (*self).read_buf_exact(buf)
    }

    #[inline(always)]
    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        (*self).ignore_bytes(count)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        (**self).pos()
    }
}

/// `WriteBytes` provides methods to write big-endian integers and raw bytes, and to overwrite
/// bytes that were previously written. Overwriting is what allows an atom's size to be written
/// after its children.
pub trait WriteBytes {
    /// Writes the entire buffer at the current position or returns an error.
    fn write_buf(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Overwrites previously written bytes starting at the absolute position `pos`. The current
    /// position is unchanged afterwards.
    fn patch_buf(&mut self, pos: u64, buf: &[u8]) -> io::Result<()>;

    /// Gets the position of the stream.
    fn pos(&self) -> u64;

    /// Writes a single unsigned byte or returns an error.
    #[inline(always)]
    fn write_u8(&mut self, val: u8) -> io::Result<()> {
        self.write_buf(&[val])
    }

    /// Writes an unsigned 16-bit big-endian integer or returns an error.
    #[inline(always)]
    fn write_be_u16(&mut self, val: u16) -> io::Result<()> {
        self.write_buf(&val.to_be_bytes())
    }

    /// Writes a signed 16-bit big-endian integer or returns an error.
    #[inline(always)]
    fn write_be_i16(&mut self, val: i16) -> io::Result<()> {
        self.write_buf(&val.to_be_bytes())
    }

    /// Writes the low 24 bits of `val` as a big-endian integer or returns an error.
    #[inline(always)]
    fn write_be_u24(&mut self, val: u32) -> io::Result<()> {
        self.write_buf(&val.to_be_bytes()[1..4])
    }

    /// Writes an unsigned 32-bit big-endian integer or returns an error.
    #[inline(always)]
    fn write_be_u32(&mut self, val: u32) -> io::Result<()> {
        self.write_buf(&val.to_be_bytes())
    }

    /// Writes a signed 32-bit big-endian integer or returns an error.
    #[inline(always)]
    fn write_be_i32(&mut self, val: i32) -> io::Result<()> {
        self.write_buf(&val.to_be_bytes())
    }

    /// Writes an unsigned 64-bit big-endian integer or returns an error.
    #[inline(always)]
    fn write_be_u64(&mut self, val: u64) -> io::Result<()> {
        self.write_buf(&val.to_be_bytes())
    }

    /// Writes `count` zero bytes or returns an error.
    fn write_zeros(&mut self, count: usize) -> io::Result<()> {
        const ZEROS: [u8; 16] = [0; 16];

        let mut remaining = count;

        while remaining > 0 {
            let len = remaining.min(ZEROS.len());
            self.write_buf(&ZEROS[..len])?;
            remaining -= len;
        }

        Ok(())
    }

    /// Overwrites a previously written unsigned 32-bit big-endian integer at `pos`.
    #[inline(always)]
    fn patch_be_u32(&mut self, pos: u64, val: u32) -> io::Result<()> {
        self.patch_buf(pos, &val.to_be_bytes())
    }

    /// Overwrites a previously written unsigned 64-bit big-endian integer at `pos`.
    #[inline(always)]
    fn patch_be_u64(&mut self, pos: u64, val: u64) -> io::Result<()> {
        self.patch_buf(pos, &val.to_be_bytes())
    }
}

impl<W: WriteBytes> WriteBytes for &mut W {
    #[inline(always)]
    fn write_buf(&mut self, buf: &[u8]) -> io::Result<()> {
        (*self).write_buf(buf)
    }

    #[inline(always)]
    fn patch_buf(&mut self, pos: u64, buf: &[u8]) -> io::Result<()> {
        (*self).patch_buf(pos, buf)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        (**self).pos()
    }
}

impl WriteBytes for Vec<u8> {
    fn write_buf(&mut self, buf: &[u8]) -> io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn patch_buf(&mut self, pos: u64, buf: &[u8]) -> io::Result<()> {
        let start = pos as usize;

        match self.get_mut(start..start + buf.len()) {
            Some(dest) => {
                dest.copy_from_slice(buf);
                Ok(())
            }
            None => Err(io::Error::new(io::ErrorKind::InvalidInput, "patch beyond end of buffer")),
        }
    }

    fn pos(&self) -> u64 {
        self.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::{BufReader, ReadBytes, WriteBytes};

    #[test]
    fn verify_write_then_read_integers() {
        let mut buf = Vec::new();

        buf.write_u8(0x12).unwrap();
        buf.write_be_u16(0x3456).unwrap();
        buf.write_be_u24(0x789abc).unwrap();
        buf.write_be_u32(0xdeadbeef).unwrap();
        buf.write_be_i16(-2).unwrap();
        buf.write_be_i32(-70000).unwrap();
        buf.write_be_u64(0x0102_0304_0506_0708).unwrap();
        buf.write_zeros(20).unwrap();

        assert_eq!(buf.len(), 1 + 2 + 3 + 4 + 2 + 4 + 8 + 20);
        assert_eq!(&buf[..6], &[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc]);

        let mut reader = BufReader::new(&buf);

        assert_eq!(reader.read_u8().unwrap(), 0x12);
        assert_eq!(reader.read_be_u16().unwrap(), 0x3456);
        assert_eq!(reader.read_be_u24().unwrap(), 0x789abc);
        assert_eq!(reader.read_be_u32().unwrap(), 0xdeadbeef);
        assert_eq!(reader.read_be_i16().unwrap(), -2);
        assert_eq!(reader.read_be_i32().unwrap(), -70000);
        assert_eq!(reader.read_be_u64().unwrap(), 0x0102_0304_0506_0708);
        reader.ignore_bytes(20).unwrap();
        assert_eq!(reader.pos(), buf.len() as u64);
        assert!(reader.read_u8().is_err());
    }

    #[test]
    fn verify_vec_patch() {
        let mut buf = Vec::new();
        buf.write_be_u32(0).unwrap();
        buf.write_buf(b"moov").unwrap();

        buf.patch_be_u32(0, 8).unwrap();
        assert_eq!(&buf, &[0, 0, 0, 8, b'm', b'o', b'o', b'v']);

        assert!(buf.patch_be_u64(4, 1).is_err());
    }
}
