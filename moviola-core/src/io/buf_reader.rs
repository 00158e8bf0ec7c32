// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;

use super::ReadBytes;

#[inline(always)]
fn underrun_error<T>() -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::UnexpectedEof, "buffer underrun"))
}

/// A `BufReader` reads bytes from a byte buffer.
pub struct BufReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BufReader<'a> {
    /// Instantiate a new `BufReader` with a given byte buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        BufReader { buf, pos: 0 }
    }

    /// Returns a reference to the next `len` bytes in the buffer and advances past them.
    pub fn read_buf_bytes_ref(&mut self, len: usize) -> io::Result<&'a [u8]> {
        match self.buf.get(self.pos..self.pos.saturating_add(len)) {
            Some(bytes) => {
                self.pos += len;
                Ok(bytes)
            }
            None => underrun_error(),
        }
    }

    /// Returns the number of bytes remaining in the buffer.
    pub fn bytes_available(&self) -> u64 {
        (self.buf.len() - self.pos) as u64
    }

    fn read_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut bytes = [0; N];
        bytes.copy_from_slice(self.read_buf_bytes_ref(N)?);
        Ok(bytes)
    }
}

impl ReadBytes for BufReader<'_> {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        Ok(self.read_buf_bytes_ref(1)?[0])
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        self.read_array()
    }

    #[inline(always)]
    fn read_triple_bytes(&mut self) -> io::Result<[u8; 3]> {
        self.read_array()
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        self.read_array()
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        buf.copy_from_slice(self.read_buf_bytes_ref(buf.len())?);
        Ok(())
    }

    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        if self.bytes_available() < count {
            self.pos = self.buf.len();
            return underrun_error();
        }

        self.pos += count as usize;
        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.pos as u64
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::BufReader;
    use crate::io::ReadBytes;

    #[test]
    fn verify_underrun() {
        let mut reader = BufReader::new(&[0, 1, 2, 3, 4, 5]);

        assert_eq!(reader.read_be_u32().unwrap(), 0x0001_0203);

        let err = reader.read_be_u32().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        // A failed read consumes nothing.
        assert_eq!(reader.pos(), 4);
        assert_eq!(reader.read_be_u16().unwrap(), 0x0405);

        assert!(reader.ignore_bytes(1).is_err());
        assert_eq!(reader.bytes_available(), 0);
    }
}
