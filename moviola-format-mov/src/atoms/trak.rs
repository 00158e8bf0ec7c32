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
use crate::atoms::{HandlerType, MdiaAtom, StblAtom, TkhdAtom};

/// Track atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrakAtom {
    pub tkhd: TkhdAtom,
    pub mdia: MdiaAtom,
}

impl TrakAtom {
    /// The handler type of the track media.
    pub fn handler_type(&self) -> HandlerType {
        self.mdia.hdlr.handler_type
    }

    /// The sample table of the track.
    pub fn sample_table(&self) -> &StblAtom {
        &self.mdia.minf.stbl
    }

    /// The time scale of the track media in units per second.
    pub fn time_scale(&self) -> u32 {
        self.mdia.mdhd.time_scale
    }
}

impl Atom for TrakAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        Self::read_limited(reader, header, &ReadLimits::default())
    }

    fn read_limited<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let mut iter = AtomIterator::new(reader, header).with_limits(*limits);

        let mut tkhd = None;
        let mut mdia = None;

        while let Some(header) = iter.next()? {
            match header.atom_type() {
                AtomType::TrackHeader => {
                    tkhd = Some(iter.read_atom::<TkhdAtom>()?);
                }
                AtomType::Media => {
                    mdia = Some(iter.read_atom::<MdiaAtom>()?);
                }
                _ => iter.skip_atom(),
            }
        }

        let tkhd = match tkhd {
            Some(tkhd) => tkhd,
            None => return iter.missing_atom("mov (trak): missing tkhd atom"),
        };

        let mdia = match mdia {
            Some(mdia) => mdia,
            None => return iter.missing_atom("mov (trak): missing mdia atom"),
        };

        Ok(TrakAtom { tkhd, mdia })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(*b"trak")?;
        self.tkhd.write(writer)?;
        self.mdia.write(writer)?;
        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "track (trak)")?;
        self.tkhd.dump(out, indent + 1)?;
        self.mdia.dump(out, indent + 1)
    }
}
