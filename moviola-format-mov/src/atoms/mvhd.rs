// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::{decode_error, Result};
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{current_time, dump_line, Atom, AtomHeader, AtomWriter, Matrix};
use crate::fp::{FpU16, FpU8};

/// Movie header atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MvhdAtom {
    /// Atom version. Version 1 stores the times and duration as 64-bit values.
    pub version: u8,
    pub flags: u32,
    /// The creation time in seconds since 1904-01-01.
    pub creation_time: u64,
    /// The modification time in seconds since 1904-01-01.
    pub modification_time: u64,
    /// Timescale for the movie expressed as the number of units per second.
    pub time_scale: u32,
    /// The duration of the movie in `time_scale` units.
    pub duration: u64,
    /// The preferred playback rate.
    pub preferred_rate: FpU16,
    /// The preferred volume to play the movie.
    pub preferred_volume: FpU8,
    pub matrix: Matrix,
    pub preview_time: u32,
    pub preview_duration: u32,
    pub poster_time: u32,
    pub selection_time: u32,
    pub selection_duration: u32,
    pub current_time: u32,
    /// The track identifier to assign to the next new track.
    pub next_track_id: u32,
}

impl Default for MvhdAtom {
    fn default() -> Self {
        let now = current_time();

        MvhdAtom {
            version: 0,
            flags: 0,
            creation_time: now,
            modification_time: now,
            time_scale: 600,
            duration: 0,
            preferred_rate: FpU16::new(1),
            preferred_volume: FpU8::new(1),
            matrix: Matrix::identity(),
            preview_time: 0,
            preview_duration: 0,
            poster_time: 0,
            selection_time: 0,
            selection_duration: 0,
            current_time: 0,
            next_track_id: 1,
        }
    }
}

impl MvhdAtom {
    pub fn new() -> Self {
        Default::default()
    }

    /// The duration of the movie in seconds, or 0 if the time scale is 0.
    pub fn duration_seconds(&self) -> f64 {
        if self.time_scale == 0 {
            return 0.0;
        }
        self.duration as f64 / f64::from(self.time_scale)
    }

    fn needs_version_1(&self) -> bool {
        self.version == 1
            || self.creation_time > u64::from(u32::MAX)
            || self.modification_time > u64::from(u32::MAX)
            || self.duration > u64::from(u32::MAX)
    }
}

impl Atom for MvhdAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let mut mvhd = MvhdAtom { version, flags, ..Default::default() };

        // Version 0 uses 32-bit time values, verion 1 used 64-bit values.
        match version {
            0 => {
                mvhd.creation_time = u64::from(reader.read_be_u32()?);
                mvhd.modification_time = u64::from(reader.read_be_u32()?);
                mvhd.time_scale = reader.read_be_u32()?;
                mvhd.duration = u64::from(reader.read_be_u32()?);
            }
            1 => {
                mvhd.creation_time = reader.read_be_u64()?;
                mvhd.modification_time = reader.read_be_u64()?;
                mvhd.time_scale = reader.read_be_u32()?;
                mvhd.duration = reader.read_be_u64()?;
            }
            _ => return decode_error("mov (mvhd): invalid version"),
        }

        mvhd.preferred_rate = FpU16::parse_raw(reader.read_be_u32()?);
        mvhd.preferred_volume = FpU8::parse_raw(reader.read_be_u16()?);

        // Reserved
        reader.ignore_bytes(10)?;

        mvhd.matrix = Matrix::read(reader)?;
        mvhd.preview_time = reader.read_be_u32()?;
        mvhd.preview_duration = reader.read_be_u32()?;
        mvhd.poster_time = reader.read_be_u32()?;
        mvhd.selection_time = reader.read_be_u32()?;
        mvhd.selection_duration = reader.read_be_u32()?;
        mvhd.current_time = reader.read_be_u32()?;
        mvhd.next_track_id = reader.read_be_u32()?;

        Ok(mvhd)
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        if self.needs_version_1() {
            writer.begin_full(*b"mvhd", 1, self.flags)?;
            writer.write_be_u64(self.creation_time)?;
            writer.write_be_u64(self.modification_time)?;
            writer.write_be_u32(self.time_scale)?;
            writer.write_be_u64(self.duration)?;
        }
        else {
            writer.begin_full(*b"mvhd", 0, self.flags)?;
            writer.write_be_u32(self.creation_time as u32)?;
            writer.write_be_u32(self.modification_time as u32)?;
            writer.write_be_u32(self.time_scale)?;
            writer.write_be_u32(self.duration as u32)?;
        }

        writer.write_be_u32(self.preferred_rate.raw())?;
        writer.write_be_u16(self.preferred_volume.raw())?;
        writer.write_zeros(10)?;

        self.matrix.write(writer)?;

        writer.write_be_u32(self.preview_time)?;
        writer.write_be_u32(self.preview_duration)?;
        writer.write_be_u32(self.poster_time)?;
        writer.write_be_u32(self.selection_time)?;
        writer.write_be_u32(self.selection_duration)?;
        writer.write_be_u32(self.current_time)?;
        writer.write_be_u32(self.next_track_id)?;

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "movie header (mvhd)")?;
        dump_line!(out, indent + 1, "version {}", self.version)?;
        dump_line!(out, indent + 1, "flags {}", self.flags)?;
        dump_line!(out, indent + 1, "creation_time {}", self.creation_time)?;
        dump_line!(out, indent + 1, "modification_time {}", self.modification_time)?;
        dump_line!(out, indent + 1, "time_scale {}", self.time_scale)?;
        dump_line!(out, indent + 1, "duration {}", self.duration)?;
        dump_line!(out, indent + 1, "preferred_rate {}", self.preferred_rate)?;
        dump_line!(out, indent + 1, "preferred_volume {}", self.preferred_volume)?;
        self.matrix.dump(out, indent + 1)?;
        dump_line!(out, indent + 1, "preview_time {}", self.preview_time)?;
        dump_line!(out, indent + 1, "preview_duration {}", self.preview_duration)?;
        dump_line!(out, indent + 1, "poster_time {}", self.poster_time)?;
        dump_line!(out, indent + 1, "selection_time {}", self.selection_time)?;
        dump_line!(out, indent + 1, "selection_duration {}", self.selection_duration)?;
        dump_line!(out, indent + 1, "current_time {}", self.current_time)?;
        dump_line!(out, indent + 1, "next_track_id {}", self.next_track_id)
    }
}

#[cfg(test)]
mod tests {
    use moviola_core::errors::Error;
    use moviola_core::io::BufReader;

    use super::MvhdAtom;
    use crate::atoms::{Atom, AtomHeader, AtomWriter};
    use crate::fp::{FpU16, FpU8};

    fn round_trip(mvhd: &MvhdAtom) -> (Vec<u8>, MvhdAtom) {
        let mut writer = AtomWriter::new(Vec::new());
        mvhd.write(&mut writer).unwrap();
        let buf = writer.into_inner();

        let mut reader = BufReader::new(&buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        let read = MvhdAtom::read(&mut reader, header).unwrap();
        assert_eq!(reader.bytes_available(), 0);

        (buf, read)
    }

    #[test]
    fn verify_defaults() {
        let mvhd = MvhdAtom::new();

        assert_eq!(mvhd.time_scale, 600);
        assert_eq!(mvhd.preferred_rate.raw(), 0x0001_0000);
        assert_eq!(mvhd.preferred_volume.raw(), 0x0100);
        assert_eq!(mvhd.next_track_id, 1);
        // Some time after 2020-01-01.
        assert!(mvhd.creation_time > 3_660_000_000);
    }

    #[test]
    fn verify_round_trip_version_0() {
        let mvhd = MvhdAtom {
            creation_time: 3_700_000_000,
            modification_time: 3_700_000_001,
            duration: 6000,
            preferred_rate: FpU16::parse_raw(0x0001_8000),
            preferred_volume: FpU8::parse_raw(0x00c0),
            poster_time: 12,
            next_track_id: 3,
            ..MvhdAtom::new()
        };

        let (buf, read) = round_trip(&mvhd);

        assert_eq!(buf.len(), 108);
        assert_eq!(read, mvhd);
        assert_eq!(read.duration_seconds(), 10.0);
    }

    #[test]
    fn verify_round_trip_version_1() {
        let mvhd = MvhdAtom { duration: 1 << 40, ..MvhdAtom::new() };

        let (buf, read) = round_trip(&mvhd);

        assert_eq!(buf.len(), 120);
        assert_eq!(read.version, 1);
        assert_eq!(read.duration, 1 << 40);
        assert_eq!(read.creation_time, mvhd.creation_time);
    }

    #[test]
    fn verify_zero_time_scale() {
        let mvhd = MvhdAtom { time_scale: 0, duration: 100, ..MvhdAtom::new() };
        assert_eq!(mvhd.duration_seconds(), 0.0);
    }

    #[test]
    fn verify_truncated() {
        let mut writer = AtomWriter::new(Vec::new());
        MvhdAtom::new().write(&mut writer).unwrap();
        let buf = writer.into_inner();

        let mut reader = BufReader::new(&buf[..60]);
        let header = AtomHeader::read(&mut reader).unwrap();
        assert!(matches!(MvhdAtom::read(&mut reader, header), Err(Error::TruncatedFile)));
    }
}
