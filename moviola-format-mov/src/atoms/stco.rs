// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::{decode_error, Result};
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_line, Atom, AtomHeader, AtomType, AtomWriter};

/// Chunk offset atom. Reads both `stco` and `co64`, and writes `co64` only when an offset does
/// not fit in 32 bits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StcoAtom {
    pub chunk_offsets: Vec<u64>,
}

impl StcoAtom {
    fn is_large(&self) -> bool {
        self.chunk_offsets.iter().any(|&offset| offset > u64::from(u32::MAX))
    }
}

impl Atom for StcoAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (_, _) = header.read_extended_header(reader)?;

        let entry_len = match header.atom_type() {
            AtomType::ChunkOffset64 => 8,
            _ => 4,
        };

        // minimum data size is 4 bytes
        let len = match header.data_len() {
            Some(len) if len >= 4 => len,
            Some(_) => return decode_error("mov (stco): atom size is less than 16 bytes"),
            None => return decode_error("mov (stco): expected atom size to be known"),
        };

        let entry_count = reader.read_be_u32()?;
        if u64::from(entry_count) != (len - 4) / entry_len {
            return decode_error("mov (stco): invalid entry count");
        }

        let mut chunk_offsets = Vec::new();
        chunk_offsets.try_reserve_exact(entry_count as usize)?;

        for _ in 0..entry_count {
            let offset = match entry_len {
                8 => reader.read_be_u64()?,
                _ => u64::from(reader.read_be_u32()?),
            };
            chunk_offsets.push(offset);
        }

        Ok(StcoAtom { chunk_offsets })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        let large = self.is_large();

        writer.begin_full(if large { *b"co64" } else { *b"stco" }, 0, 0)?;
        writer.write_be_u32(self.chunk_offsets.len() as u32)?;

        for &offset in &self.chunk_offsets {
            if large {
                writer.write_be_u64(offset)?;
            }
            else {
                writer.write_be_u32(offset as u32)?;
            }
        }

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        let name = if self.is_large() { "chunk offset (co64)" } else { "chunk offset (stco)" };

        dump_line!(out, indent, "{}", name)?;
        dump_line!(out, indent + 1, "entries {}", self.chunk_offsets.len())?;

        for (i, offset) in self.chunk_offsets.iter().enumerate() {
            dump_line!(out, indent + 2, "{} {:#x}", i, offset)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use moviola_core::io::BufReader;

    use super::StcoAtom;
    use crate::atoms::{Atom, AtomHeader, AtomWriter};

    fn round_trip(stco: &StcoAtom) -> (Vec<u8>, StcoAtom) {
        let mut writer = AtomWriter::new(Vec::new());
        stco.write(&mut writer).unwrap();
        let buf = writer.into_inner();

        let mut reader = BufReader::new(&buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        let read = StcoAtom::read(&mut reader, header).unwrap();
        (buf, read)
    }

    #[test]
    fn verify_small_offsets_use_stco() {
        let stco = StcoAtom { chunk_offsets: vec![48, 1000, u64::from(u32::MAX)] };

        let (buf, read) = round_trip(&stco);

        assert_eq!(&buf[4..8], b"stco");
        assert_eq!(buf.len(), 16 + 3 * 4);
        assert_eq!(read, stco);
    }

    #[test]
    fn verify_large_offsets_use_co64() {
        let stco = StcoAtom { chunk_offsets: vec![48, 1 << 33] };

        let (buf, read) = round_trip(&stco);

        assert_eq!(&buf[4..8], b"co64");
        assert_eq!(buf.len(), 16 + 2 * 8);
        assert_eq!(read, stco);
    }
}
