// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::{decode_error, Result};
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_line, Atom, AtomHeader, AtomWriter};
use crate::fourcc::FourCc;

/// The brand of QuickTime movies.
pub const QUICKTIME_BRAND: FourCc = FourCc::new(*b"qt  ");

/// The most compatible brands read.
const MAX_COMPAT_BRANDS: u64 = 1024;

/// File type atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FtypAtom {
    pub major: FourCc,
    pub minor: u32,
    pub compatible: Vec<FourCc>,
}

impl FtypAtom {
    pub fn new(brand: FourCc) -> Self {
        FtypAtom { major: brand, minor: 0x0000_0200, compatible: vec![brand] }
    }
}

impl Default for FtypAtom {
    fn default() -> Self {
        FtypAtom::new(QUICKTIME_BRAND)
    }
}

impl Atom for FtypAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        // The major brand, minor version, and at least one compatible brand are required.
        let data_len = match header.data_len() {
            Some(len) if len >= 12 && len % 4 == 0 => len,
            _ => return decode_error("mov (ftyp): invalid atom size"),
        };

        let major = FourCc::new(reader.read_quad_bytes()?);
        let minor = reader.read_be_u32()?;

        let n_brands = (data_len - 8) / 4;

        if n_brands > MAX_COMPAT_BRANDS {
            return decode_error("mov (ftyp): too many compatible brands");
        }

        let mut compatible = Vec::with_capacity(n_brands as usize);

        for _ in 0..n_brands {
            compatible.push(FourCc::new(reader.read_quad_bytes()?));
        }

        Ok(FtypAtom { major, minor, compatible })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(*b"ftyp")?;
        writer.write_buf(&self.major.get())?;
        writer.write_be_u32(self.minor)?;

        for brand in &self.compatible {
            writer.write_buf(&brand.get())?;
        }

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "file type (ftyp)")?;
        dump_line!(out, indent + 1, "major {}", self.major)?;
        dump_line!(out, indent + 1, "minor {:#010x}", self.minor)?;

        for brand in &self.compatible {
            dump_line!(out, indent + 1, "compatible {}", brand)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use moviola_core::io::BufReader;

    use super::FtypAtom;
    use crate::atoms::{Atom, AtomHeader, AtomWriter};

    #[test]
    fn verify_ftyp_bytes() {
        let mut writer = AtomWriter::new(Vec::new());
        FtypAtom::default().write(&mut writer).unwrap();
        let buf = writer.into_inner();

        assert_eq!(&buf[..], b"\0\0\0\x14ftypqt  \0\0\x02\0qt  ");

        let mut reader = BufReader::new(&buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        assert_eq!(FtypAtom::read(&mut reader, header).unwrap(), FtypAtom::default());
    }

    #[test]
    fn verify_ftyp_without_brands_rejected() {
        let buf = b"\0\0\0\x10ftypqt  \0\0\x02\0";

        let mut reader = BufReader::new(buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        assert!(FtypAtom::read(&mut reader, header).is_err());
    }
}
