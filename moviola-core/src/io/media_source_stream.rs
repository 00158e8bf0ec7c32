// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;
use std::io::{Read, Seek, SeekFrom};

use super::{MediaSource, ReadBytes};

/// `MediaSourceStreamOptions` specifies the buffering behaviour of a `MediaSourceStream`.
#[derive(Copy, Clone, Debug)]
pub struct MediaSourceStreamOptions {
    /// The length of the read buffer in bytes. Large values reduce the number of system calls
    /// when walking an atom tree at the cost of memory.
    pub buffer_len: usize,
}

impl Default for MediaSourceStreamOptions {
    fn default() -> Self {
        MediaSourceStreamOptions { buffer_len: 64 * 1024 }
    }
}

/// `MediaSourceStream` is the main reader type for Moviola.
///
/// By using type erasure and dynamic dispatch, `MediaSourceStream` wraps and hides the inner
/// reader from the consumer, allowing any typical `Read`er to be used with Moviola in a generic
/// way, selectable at runtime.
///
/// `MediaSourceStream` buffers reads and tracks its absolute position so that atom boundaries can
/// be computed without querying the underlying source. Seeking backwards or forwards is always
/// possible since every `MediaSource` is seekable.
pub struct MediaSourceStream {
    /// The source reader.
    inner: io::BufReader<Box<dyn MediaSource>>,
    /// The length of the source in bytes, if known.
    byte_len: Option<u64>,
    /// The absolute position of the stream.
    pos: u64,
}

impl MediaSourceStream {
    /// Instantiate a new `MediaSourceStream`. The source is assumed to be positioned at its start.
    pub fn new(source: Box<dyn MediaSource>, options: MediaSourceStreamOptions) -> Self {
        let byte_len = source.byte_len();

        MediaSourceStream {
            inner: io::BufReader::with_capacity(options.buffer_len, source),
            byte_len,
            pos: 0,
        }
    }

    /// Returns the length of the source in bytes, if known.
    pub fn byte_len(&self) -> Option<u64> {
        self.byte_len
    }

    /// Unwraps this `MediaSourceStream`, returning the underlying source. Buffered data is lost.
    pub fn into_inner(self) -> Box<dyn MediaSource> {
        self.inner.into_inner()
    }
}

impl ReadBytes for MediaSourceStream {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut bytes = [0u8; 1];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes[0])
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        let mut bytes = [0u8; 2];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    #[inline(always)]
    fn read_triple_bytes(&mut self) -> io::Result<[u8; 3]> {
        let mut bytes = [0u8; 3];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        let mut bytes = [0u8; 4];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            Err(err) => {
                // A failed read may still have consumed part of the source.
                self.pos = self.inner.stream_position()?;
                Err(err)
            }
        }
    }

    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        let end = self.pos.saturating_add(count);

        // Seeking past the end of a source succeeds on most platforms, so check the known length
        // to report the truncation instead.
        if let Some(byte_len) = self.byte_len {
            if end > byte_len {
                self.seek(SeekFrom::Start(byte_len))?;
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of stream"));
            }
        }

        match i64::try_from(count) {
            Ok(delta) => self.inner.seek_relative(delta)?,
            Err(_) => {
                self.inner.seek(SeekFrom::Start(end))?;
            }
        }

        self.pos = end;
        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.pos
    }
}

impl io::Read for MediaSourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.inner.read(buf)?;
        self.pos += len as u64;
        Ok(len)
    }
}

impl io::Seek for MediaSourceStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.pos = self.inner.seek(pos)?;
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Seek, SeekFrom};

    use super::{MediaSourceStream, ReadBytes};

    /// Generate a vector of bytes of the specified length using a PRNG.
    fn generate_bytes(len: usize) -> Vec<u8> {
        let mut lcg: u32 = 0xec57c4bf;

        let mut bytes = vec![0; len];

        for quad in bytes.chunks_mut(4) {
            lcg = lcg.wrapping_mul(1664525).wrapping_add(1013904223);
            for (src, dest) in quad.iter_mut().zip(&lcg.to_ne_bytes()) {
                *src = *dest;
            }
        }

        bytes
    }

    #[test]
    fn verify_mss_read_and_ignore() {
        let data = generate_bytes(3 * 64 * 1024);

        let source = Box::new(Cursor::new(data.clone()));
        let mut mss = MediaSourceStream::new(source, Default::default());

        for byte in &data[..70 * 1024] {
            assert_eq!(*byte, mss.read_byte().unwrap());
        }

        mss.ignore_bytes(11).unwrap();
        assert_eq!(mss.pos(), 70 * 1024 + 11);

        let pos = mss.pos() as usize;
        assert_eq!(&data[pos..pos + 4], &mss.read_quad_bytes().unwrap());
    }

    #[test]
    fn verify_mss_seek() {
        let data = generate_bytes(1024);

        let source = Box::new(Cursor::new(data.clone()));
        let mut mss = MediaSourceStream::new(source, Default::default());

        mss.ignore_bytes(512).unwrap();
        assert_eq!(mss.seek(SeekFrom::Start(100)).unwrap(), 100);
        assert_eq!(mss.pos(), 100);
        assert_eq!(mss.read_byte().unwrap(), data[100]);
    }

    #[test]
    fn verify_mss_ignore_past_end() {
        let data = generate_bytes(64);

        let mut mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

        assert!(mss.ignore_bytes(65).is_err());
        assert_eq!(mss.pos(), 64);
        assert!(mss.read_byte().is_err());
    }

    #[test]
    fn verify_mss_short_read_tracks_pos() {
        let data = generate_bytes(10);

        let mut mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

        mss.ignore_bytes(8).unwrap();
        assert!(mss.read_quad_bytes().is_err());
        assert_eq!(mss.pos(), 10);
    }
}
