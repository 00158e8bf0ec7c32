// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::Result;
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_line, Atom, AtomHeader, AtomWriter};
use crate::fp::FpI8;

/// Sound media header atom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SmhdAtom {
    pub version: u8,
    pub flags: u32,
    /// Stereo balance. -1.0 is fully left, 1.0 is fully right.
    pub balance: FpI8,
}

impl Atom for SmhdAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let balance = FpI8::parse_raw(reader.read_be_i16()?);

        // Reserved
        let _ = reader.read_be_u16()?;

        Ok(SmhdAtom { version, flags, balance })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin_full(*b"smhd", self.version, self.flags)?;
        writer.write_be_i16(self.balance.raw())?;
        writer.write_be_u16(0)?;
        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "sound media header (smhd)")?;
        dump_line!(out, indent + 1, "version {}", self.version)?;
        dump_line!(out, indent + 1, "flags {}", self.flags)?;
        dump_line!(out, indent + 1, "balance {}", self.balance)
    }
}

#[cfg(test)]
mod tests {
    use moviola_core::io::BufReader;

    use super::SmhdAtom;
    use crate::atoms::{Atom, AtomHeader, AtomWriter};
    use crate::fp::FpI8;

    #[test]
    fn verify_negative_balance() {
        let smhd = SmhdAtom { balance: FpI8::from_f64(-0.25), ..Default::default() };

        let mut writer = AtomWriter::new(Vec::new());
        smhd.write(&mut writer).unwrap();
        let buf = writer.into_inner();

        assert_eq!(buf, [0, 0, 0, 16, b's', b'm', b'h', b'd', 0, 0, 0, 0, 0xff, 0xc0, 0, 0]);

        let mut reader = BufReader::new(&buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        let read = SmhdAtom::read(&mut reader, header).unwrap();

        assert_eq!(read, smhd);
        assert_eq!(f64::from(read.balance), -0.25);
    }
}
