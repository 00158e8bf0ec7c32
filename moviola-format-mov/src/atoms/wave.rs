// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::Result;
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_line, Atom, AtomHeader, AtomIterator, AtomType, AtomWriter, EsdsAtom};
use crate::atoms::{FrmaAtom, ReadLimits};

/// Sound description extension atom. Only the original format and elementary stream descriptor
/// children are retained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaveAtom {
    pub frma: Option<FrmaAtom>,
    pub esds: Option<EsdsAtom>,
}

impl Atom for WaveAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        Self::read_limited(reader, header, &ReadLimits::default())
    }

    fn read_limited<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let mut iter = AtomIterator::new(reader, header).with_limits(*limits);

        let mut frma = None;
        let mut esds = None;

        while let Some(header) = iter.next()? {
            match header.atom_type() {
                AtomType::Format => {
                    frma = iter.read_optional_atom::<FrmaAtom>()?;
                }
                AtomType::EsDescriptor => match header.data_len() {
                    Some(len) if len > limits.max_codec_config_len => iter.skip_atom(),
                    _ => esds = iter.read_optional_atom::<EsdsAtom>()?,
                },
                _ => iter.skip_atom(),
            }
        }

        Ok(WaveAtom { frma, esds })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(*b"wave")?;

        if let Some(frma) = &self.frma {
            frma.write(writer)?;
        }

        if let Some(esds) = &self.esds {
            esds.write(writer)?;
        }

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "sound extension (wave)")?;

        if let Some(frma) = &self.frma {
            frma.dump(out, indent + 1)?;
        }

        if let Some(esds) = &self.esds {
            esds.dump(out, indent + 1)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use moviola_core::io::BufReader;

    use super::WaveAtom;
    use crate::atoms::{Atom, AtomHeader};

    #[test]
    fn verify_children_found_after_unknown_child() {
        let buf: Vec<u8> = [
            &[0, 0, 0, 44, b'w', b'a', b'v', b'e'][..],
            &[0, 0, 0, 10, b'c', b'h', b'a', b'n', 0, 0][..],
            &[0, 0, 0, 14, b'e', b's', b'd', b's', 0, 0, 0, 0, 9, 9][..],
            &[0, 0, 0, 12, b'f', b'r', b'm', b'a', b'Q', b'D', b'M', b'2'][..],
        ]
        .concat();

        let mut reader = BufReader::new(&buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        let wave = WaveAtom::read(&mut reader, header).unwrap();

        assert_eq!(&*wave.frma.unwrap().data, b"QDM2");
        assert_eq!(wave.esds.unwrap().descriptors(), &[9, 9]);
        assert_eq!(reader.bytes_available(), 0);
    }
}
