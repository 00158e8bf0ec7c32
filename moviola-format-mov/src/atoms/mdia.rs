// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::Result;
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_line, Atom, AtomHeader, AtomIterator, AtomType, AtomWriter, ReadLimits};
use crate::atoms::{HdlrAtom, MdhdAtom, MinfAtom};

/// Media atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MdiaAtom {
    pub mdhd: MdhdAtom,
    pub hdlr: HdlrAtom,
    pub minf: MinfAtom,
}

impl Atom for MdiaAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        Self::read_limited(reader, header, &ReadLimits::default())
    }

    fn read_limited<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let mut iter = AtomIterator::new(reader, header).with_limits(*limits);

        let mut mdhd = None;
        let mut hdlr = None;
        let mut minf = None;

        while let Some(header) = iter.next()? {
            match header.atom_type() {
                AtomType::MediaHeader => {
                    mdhd = Some(iter.read_atom::<MdhdAtom>()?);
                }
                AtomType::Handler => {
                    hdlr = Some(iter.read_atom::<HdlrAtom>()?);
                }
                AtomType::MediaInfo => {
                    minf = Some(iter.read_atom::<MinfAtom>()?);
                }
                _ => iter.skip_atom(),
            }
        }

        let mdhd = match mdhd {
            Some(mdhd) => mdhd,
            None => return iter.missing_atom("mov (mdia): missing mdhd atom"),
        };

        let hdlr = match hdlr {
            Some(hdlr) => hdlr,
            None => return iter.missing_atom("mov (mdia): missing hdlr atom"),
        };

        let mut minf = match minf {
            Some(minf) => minf,
            None => return iter.missing_atom("mov (mdia): missing minf atom"),
        };

        // The handler may follow the sample descriptions, so they are interpreted last.
        minf.stbl.stsd.resolve(hdlr.handler_type, limits)?;

        Ok(MdiaAtom { mdhd, hdlr, minf })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(*b"mdia")?;
        self.mdhd.write(writer)?;
        self.hdlr.write(writer)?;
        self.minf.write(writer)?;
        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "media (mdia)")?;
        self.mdhd.dump(out, indent + 1)?;
        self.hdlr.dump(out, indent + 1)?;
        self.minf.dump(out, indent + 1)
    }
}
