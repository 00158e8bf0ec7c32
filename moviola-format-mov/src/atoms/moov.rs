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
use crate::atoms::{MvhdAtom, TrakAtom};

/// Movie atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoovAtom {
    /// Movie header atom.
    pub mvhd: MvhdAtom,
    /// Track atoms.
    pub traks: Vec<TrakAtom>,
}

impl Atom for MoovAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        Self::read_limited(reader, header, &ReadLimits::default())
    }

    fn read_limited<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let mut iter = AtomIterator::new(reader, header).with_limits(*limits);

        let mut mvhd = None;
        let mut traks = Vec::new();

        while let Some(header) = iter.next()? {
            match header.atom_type() {
                AtomType::MovieHeader => {
                    mvhd = Some(iter.read_atom::<MvhdAtom>()?);
                }
                AtomType::Track => {
                    // A track cut short by the end of the file is dropped.
                    if let Some(trak) = iter.read_optional_atom::<TrakAtom>()? {
                        traks.push(trak);
                    }
                }
                _ => iter.skip_atom(),
            }
        }

        match mvhd {
            Some(mvhd) => Ok(MoovAtom { mvhd, traks }),
            None => iter.missing_atom("mov (moov): missing mvhd atom"),
        }
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(*b"moov")?;
        self.mvhd.write(writer)?;

        for trak in &self.traks {
            trak.write(writer)?;
        }

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "movie (moov)")?;
        self.mvhd.dump(out, indent + 1)?;

        for trak in &self.traks {
            trak.dump(out, indent + 1)?;
        }

        Ok(())
    }
}
