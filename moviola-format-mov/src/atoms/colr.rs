// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::Result;
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_line, dump_payload, read_remaining, Atom, AtomHeader, AtomWriter};
use crate::fourcc::FourCc;

/// Colour parameter atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColrAtom {
    /// The colour parameter type, `nclc` in QuickTime.
    pub colour_type: FourCc,
    /// Colour primaries, transfer characteristics, and matrix coefficients for `nclc` and `nclx`.
    pub primaries: u16,
    pub transfer: u16,
    pub matrix: u16,
    /// Any payload following the fields above, such as the `nclx` range flag or an ICC profile.
    pub extra: Box<[u8]>,
}

impl ColrAtom {
    /// BT.709 primaries, transfer function, and matrix.
    pub fn bt709() -> Self {
        ColrAtom {
            colour_type: FourCc::new(*b"nclc"),
            primaries: 1,
            transfer: 1,
            matrix: 1,
            extra: Box::default(),
        }
    }

    fn has_coefficients(&self) -> bool {
        matches!(&self.colour_type.get(), b"nclc" | b"nclx")
    }
}

impl Atom for ColrAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        let mut colr = ColrAtom {
            colour_type: FourCc::new(reader.read_quad_bytes()?),
            primaries: 0,
            transfer: 0,
            matrix: 0,
            extra: Box::default(),
        };

        if colr.has_coefficients() {
            colr.primaries = reader.read_be_u16()?;
            colr.transfer = reader.read_be_u16()?;
            colr.matrix = reader.read_be_u16()?;
        }

        colr.extra = read_remaining(reader, &header, 1 << 20, "mov (colr): payload too large")?;

        Ok(colr)
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(*b"colr")?;
        writer.write_buf(&self.colour_type.get())?;

        if self.has_coefficients() {
            writer.write_be_u16(self.primaries)?;
            writer.write_be_u16(self.transfer)?;
            writer.write_be_u16(self.matrix)?;
        }

        writer.write_buf(&self.extra)?;
        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "colour parameters (colr)")?;
        dump_line!(out, indent + 1, "colour_type {}", self.colour_type)?;

        if self.has_coefficients() {
            dump_line!(out, indent + 1, "primaries {}", self.primaries)?;
            dump_line!(out, indent + 1, "transfer {}", self.transfer)?;
            dump_line!(out, indent + 1, "matrix {}", self.matrix)?;
        }

        if !self.extra.is_empty() {
            dump_payload(out, indent + 1, "extra", &self.extra)?;
        }

        Ok(())
    }
}
