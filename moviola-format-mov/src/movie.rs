// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::Result;
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{Atom, AtomIterator, AtomType, AtomWriter, FtypAtom, MoovAtom, ReadLimits};

/// The metadata of a movie: the file type and the movie atom tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Movie {
    pub ftyp: Option<FtypAtom>,
    pub moov: MoovAtom,
}

impl Movie {
    /// Read the top-level atoms of a movie until the movie atom has been read.
    ///
    /// Fails if the file has no movie atom, or if the movie header is missing or truncated.
    pub fn read<B: ReadBytes>(reader: &mut B) -> Result<Movie> {
        Movie::read_limited(reader, &ReadLimits::default())
    }

    /// Read the top-level atoms of a movie, applying `limits` to the movie atom tree.
    pub fn read_limited<B: ReadBytes>(reader: &mut B, limits: &ReadLimits) -> Result<Movie> {
        let mut iter = AtomIterator::new_root(reader, None).with_limits(*limits);

        let mut ftyp = None;

        while let Some(header) = iter.next()? {
            match header.atom_type() {
                AtomType::FileType => {
                    ftyp = iter.read_optional_atom::<FtypAtom>()?;
                }
                AtomType::Movie => {
                    let moov = iter.read_atom::<MoovAtom>()?;
                    return Ok(Movie { ftyp, moov });
                }
                _ => iter.skip_atom(),
            }
        }

        iter.missing_atom("mov: missing moov atom")
    }

    /// Write the file type and movie atoms.
    pub fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        if let Some(ftyp) = &self.ftyp {
            ftyp.write(writer)?;
        }
        self.moov.write(writer)
    }

    /// Render the atom tree as indented text.
    pub fn dump(&self) -> String {
        let mut out = String::new();

        // Writing to a string cannot fail.
        let _ = self.dump_to(&mut out);

        out
    }

    fn dump_to(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        if let Some(ftyp) = &self.ftyp {
            ftyp.dump(out, 0)?;
        }
        self.moov.dump(out, 0)
    }
}
