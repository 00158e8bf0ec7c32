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

/// Video media header atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmhdAtom {
    pub version: u8,
    pub flags: u32,
    /// The transfer mode used to composite the track.
    pub graphics_mode: u16,
    /// The red, green, and blue colour used by some transfer modes.
    pub opcolor: [u16; 3],
}

impl Default for VmhdAtom {
    fn default() -> Self {
        // Flags must be 1 for QuickTime compatibility. Graphics mode 0x40 is dither copy.
        VmhdAtom { version: 0, flags: 1, graphics_mode: 0x40, opcolor: [0x8000; 3] }
    }
}

impl Atom for VmhdAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let graphics_mode = reader.read_be_u16()?;

        let mut opcolor = [0; 3];
        for color in opcolor.iter_mut() {
            *color = reader.read_be_u16()?;
        }

        Ok(VmhdAtom { version, flags, graphics_mode, opcolor })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin_full(*b"vmhd", self.version, self.flags)?;
        writer.write_be_u16(self.graphics_mode)?;
        for color in self.opcolor {
            writer.write_be_u16(color)?;
        }
        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "video media header (vmhd)")?;
        dump_line!(out, indent + 1, "version {}", self.version)?;
        dump_line!(out, indent + 1, "flags {}", self.flags)?;
        dump_line!(out, indent + 1, "graphics_mode {:#x}", self.graphics_mode)?;
        dump_line!(
            out,
            indent + 1,
            "opcolor {:#x} {:#x} {:#x}",
            self.opcolor[0],
            self.opcolor[1],
            self.opcolor[2]
        )
    }
}
