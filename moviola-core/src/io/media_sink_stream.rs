// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;
use std::io::{Seek, SeekFrom, Write};

use super::WriteBytes;

/// `MediaSinkStream` is the main writer type for Moviola.
///
/// Writes are buffered. Back-patching seeks to the patch position, writes, and then returns to the
/// end of the stream, so patches must only target bytes that were already written.
pub struct MediaSinkStream<W: Write + Seek> {
    inner: io::BufWriter<W>,
    pos: u64,
}

impl<W: Write + Seek> MediaSinkStream<W> {
    /// Instantiate a new `MediaSinkStream`. Positions are absolute positions in `inner`.
    pub fn new(mut inner: W) -> io::Result<Self> {
        let pos = inner.stream_position()?;
        Ok(MediaSinkStream { inner: io::BufWriter::new(inner), pos })
    }

    /// Flushes all buffered data to the underlying sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Gets a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Flushes and unwraps this `MediaSinkStream`, returning the underlying sink.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|err| err.into_error())
    }
}

impl<W: Write + Seek> WriteBytes for MediaSinkStream<W> {
    fn write_buf(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn patch_buf(&mut self, pos: u64, buf: &[u8]) -> io::Result<()> {
        if pos + buf.len() as u64 > self.pos {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "patch beyond end of stream"));
        }

        // Seeking a BufWriter flushes it first.
        self.inner.seek(SeekFrom::Start(pos))?;
        self.inner.write_all(buf)?;
        self.inner.seek(SeekFrom::Start(self.pos))?;
        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{MediaSinkStream, WriteBytes};

    #[test]
    fn verify_sink_patch() {
        let mut sink = MediaSinkStream::new(Cursor::new(Vec::new())).unwrap();

        sink.write_be_u32(0).unwrap();
        sink.write_buf(b"free").unwrap();
        sink.write_zeros(4).unwrap();
        sink.patch_be_u32(0, 12).unwrap();
        sink.write_u8(0xff).unwrap();

        assert_eq!(sink.pos(), 13);
        assert!(sink.patch_be_u32(12, 0).is_err());

        let data = sink.into_inner().unwrap().into_inner();
        assert_eq!(&data, &[0, 0, 0, 12, b'f', b'r', b'e', b'e', 0, 0, 0, 0, 0xff]);
    }
}
