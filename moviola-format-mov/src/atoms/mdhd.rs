// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::{decode_error, Result};
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{current_time, dump_line, Atom, AtomHeader, AtomWriter};

/// Media header atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MdhdAtom {
    pub version: u8,
    pub flags: u32,
    /// Creation time in seconds since 1904-01-01.
    pub creation_time: u64,
    /// Modification time in seconds since 1904-01-01.
    pub modification_time: u64,
    /// The number of media time units per second.
    pub time_scale: u32,
    /// The duration of the media in `time_scale` units.
    pub duration: u64,
    /// Packed language code.
    pub language: u16,
    pub quality: u16,
}

impl MdhdAtom {
    pub fn new(time_scale: u32) -> Self {
        let now = current_time();

        MdhdAtom {
            version: 0,
            flags: 0,
            creation_time: now,
            modification_time: now,
            time_scale,
            duration: 0,
            language: 0,
            quality: 100,
        }
    }
}

impl Atom for MdhdAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let mut mdhd = MdhdAtom { version, flags, ..MdhdAtom::new(0) };

        match version {
            0 => {
                mdhd.creation_time = u64::from(reader.read_be_u32()?);
                mdhd.modification_time = u64::from(reader.read_be_u32()?);
                mdhd.time_scale = reader.read_be_u32()?;
                mdhd.duration = u64::from(reader.read_be_u32()?);
            }
            1 => {
                mdhd.creation_time = reader.read_be_u64()?;
                mdhd.modification_time = reader.read_be_u64()?;
                mdhd.time_scale = reader.read_be_u32()?;
                mdhd.duration = reader.read_be_u64()?;
            }
            _ => return decode_error("mov (mdhd): invalid version"),
        }

        mdhd.language = reader.read_be_u16()?;
        mdhd.quality = reader.read_be_u16()?;

        Ok(mdhd)
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        let large = self.version == 1
            || self.creation_time > u64::from(u32::MAX)
            || self.modification_time > u64::from(u32::MAX)
            || self.duration > u64::from(u32::MAX);

        if large {
            writer.begin_full(*b"mdhd", 1, self.flags)?;
            writer.write_be_u64(self.creation_time)?;
            writer.write_be_u64(self.modification_time)?;
            writer.write_be_u32(self.time_scale)?;
            writer.write_be_u64(self.duration)?;
        }
        else {
            writer.begin_full(*b"mdhd", 0, self.flags)?;
            writer.write_be_u32(self.creation_time as u32)?;
            writer.write_be_u32(self.modification_time as u32)?;
            writer.write_be_u32(self.time_scale)?;
            writer.write_be_u32(self.duration as u32)?;
        }

        writer.write_be_u16(self.language)?;
        writer.write_be_u16(self.quality)?;
        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "media header (mdhd)")?;
        dump_line!(out, indent + 1, "version {}", self.version)?;
        dump_line!(out, indent + 1, "flags {}", self.flags)?;
        dump_line!(out, indent + 1, "creation_time {}", self.creation_time)?;
        dump_line!(out, indent + 1, "modification_time {}", self.modification_time)?;
        dump_line!(out, indent + 1, "time_scale {}", self.time_scale)?;
        dump_line!(out, indent + 1, "duration {}", self.duration)?;
        dump_line!(out, indent + 1, "language {}", self.language)?;
        dump_line!(out, indent + 1, "quality {}", self.quality)
    }
}
