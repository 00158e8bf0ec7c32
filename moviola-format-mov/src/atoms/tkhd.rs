// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use bitflags::bitflags;

use moviola_core::errors::{decode_error, Result};
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{current_time, dump_line, Atom, AtomHeader, AtomWriter, Matrix};
use crate::fp::{FpU16, FpU8};

bitflags! {
    /// Track header flags.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct TrackFlags: u32 {
        /// The track is enabled.
        const ENABLED    = 0x1;
        /// The track is used in the movie.
        const IN_MOVIE   = 0x2;
        /// The track is used in the movie's preview.
        const IN_PREVIEW = 0x4;
        /// The track is used in the movie's poster.
        const IN_POSTER  = 0x8;
    }
}

/// Track header atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TkhdAtom {
    pub version: u8,
    /// Track header flags. Unknown bits are retained.
    pub flags: TrackFlags,
    /// Creation time in seconds since 1904-01-01.
    pub creation_time: u64,
    /// Modification time in seconds since 1904-01-01.
    pub modification_time: u64,
    /// Track identifier.
    pub track_id: u32,
    /// Track duration in the time scale units of the movie header.
    pub duration: u64,
    pub layer: u16,
    pub alternate_group: u16,
    /// Preferred volume for track playback.
    pub volume: FpU8,
    pub matrix: Matrix,
    /// Visual width in pixels.
    pub track_width: FpU16,
    /// Visual height in pixels.
    pub track_height: FpU16,
}

impl TkhdAtom {
    /// Instantiate a track header for an audio track.
    pub fn new_audio(track_id: u32) -> Self {
        let now = current_time();

        TkhdAtom {
            version: 0,
            flags: TrackFlags::all(),
            creation_time: now,
            modification_time: now,
            track_id,
            duration: 0,
            layer: 0,
            alternate_group: 0,
            volume: FpU8::new(1),
            matrix: Matrix::identity(),
            track_width: FpU16::default(),
            track_height: FpU16::default(),
        }
    }

    /// Instantiate a track header for a video track of the given dimensions.
    pub fn new_video(track_id: u32, width: u16, height: u16) -> Self {
        TkhdAtom {
            volume: FpU8::default(),
            track_width: FpU16::new(width),
            track_height: FpU16::new(height),
            ..TkhdAtom::new_audio(track_id)
        }
    }

    fn needs_version_1(&self) -> bool {
        self.version == 1
            || self.creation_time > u64::from(u32::MAX)
            || self.modification_time > u64::from(u32::MAX)
            || self.duration > u64::from(u32::MAX)
    }
}

impl Atom for TkhdAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let mut tkhd = TkhdAtom {
            version,
            flags: TrackFlags::from_bits_retain(flags),
            ..TkhdAtom::new_audio(0)
        };

        // Version 0 uses 32-bit time values, verion 1 used 64-bit values.
        match version {
            0 => {
                tkhd.creation_time = u64::from(reader.read_be_u32()?);
                tkhd.modification_time = u64::from(reader.read_be_u32()?);
                tkhd.track_id = reader.read_be_u32()?;
                let _ = reader.read_be_u32()?; // Reserved
                tkhd.duration = u64::from(reader.read_be_u32()?);
            }
            1 => {
                tkhd.creation_time = reader.read_be_u64()?;
                tkhd.modification_time = reader.read_be_u64()?;
                tkhd.track_id = reader.read_be_u32()?;
                let _ = reader.read_be_u32()?; // Reserved
                tkhd.duration = reader.read_be_u64()?;
            }
            _ => return decode_error("mov (tkhd): invalid version"),
        }

        // Reserved
        let _ = reader.read_be_u64()?;

        tkhd.layer = reader.read_be_u16()?;
        tkhd.alternate_group = reader.read_be_u16()?;
        tkhd.volume = FpU8::parse_raw(reader.read_be_u16()?);

        // Reserved
        let _ = reader.read_be_u16()?;

        tkhd.matrix = Matrix::read(reader)?;
        tkhd.track_width = FpU16::parse_raw(reader.read_be_u32()?);
        tkhd.track_height = FpU16::parse_raw(reader.read_be_u32()?);

        Ok(tkhd)
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        if self.needs_version_1() {
            writer.begin_full(*b"tkhd", 1, self.flags.bits())?;
            writer.write_be_u64(self.creation_time)?;
            writer.write_be_u64(self.modification_time)?;
            writer.write_be_u32(self.track_id)?;
            writer.write_be_u32(0)?;
            writer.write_be_u64(self.duration)?;
        }
        else {
            writer.begin_full(*b"tkhd", 0, self.flags.bits())?;
            writer.write_be_u32(self.creation_time as u32)?;
            writer.write_be_u32(self.modification_time as u32)?;
            writer.write_be_u32(self.track_id)?;
            writer.write_be_u32(0)?;
            writer.write_be_u32(self.duration as u32)?;
        }

        writer.write_zeros(8)?;
        writer.write_be_u16(self.layer)?;
        writer.write_be_u16(self.alternate_group)?;
        writer.write_be_u16(self.volume.raw())?;
        writer.write_zeros(2)?;

        self.matrix.write(writer)?;

        writer.write_be_u32(self.track_width.raw())?;
        writer.write_be_u32(self.track_height.raw())?;

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "track header (tkhd)")?;
        dump_line!(out, indent + 1, "version {}", self.version)?;
        dump_line!(out, indent + 1, "flags {:?}", self.flags)?;
        dump_line!(out, indent + 1, "creation_time {}", self.creation_time)?;
        dump_line!(out, indent + 1, "modification_time {}", self.modification_time)?;
        dump_line!(out, indent + 1, "track_id {}", self.track_id)?;
        dump_line!(out, indent + 1, "duration {}", self.duration)?;
        dump_line!(out, indent + 1, "layer {}", self.layer)?;
        dump_line!(out, indent + 1, "alternate_group {}", self.alternate_group)?;
        dump_line!(out, indent + 1, "volume {}", self.volume)?;
        self.matrix.dump(out, indent + 1)?;
        dump_line!(out, indent + 1, "track_width {}", self.track_width)?;
        dump_line!(out, indent + 1, "track_height {}", self.track_height)
    }
}

#[cfg(test)]
mod tests {
    use moviola_core::io::BufReader;

    use super::{TkhdAtom, TrackFlags};
    use crate::atoms::{Atom, AtomHeader, AtomWriter};

    fn round_trip(tkhd: &TkhdAtom) -> (usize, TkhdAtom) {
        let mut writer = AtomWriter::new(Vec::new());
        tkhd.write(&mut writer).unwrap();
        let buf = writer.into_inner();

        let mut reader = BufReader::new(&buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        (buf.len(), TkhdAtom::read(&mut reader, header).unwrap())
    }

    #[test]
    fn verify_round_trip() {
        let mut tkhd = TkhdAtom::new_video(2, 1920, 1080);
        tkhd.duration = 6000;
        tkhd.layer = 0xffff;
        tkhd.flags = TrackFlags::ENABLED | TrackFlags::IN_MOVIE;

        let (len, read) = round_trip(&tkhd);

        assert_eq!(len, 92);
        assert_eq!(read, tkhd);
        assert_eq!(f64::from(read.track_width), 1920.0);
    }

    #[test]
    fn verify_unknown_flags_retained() {
        let mut tkhd = TkhdAtom::new_audio(1);
        tkhd.flags = TrackFlags::from_bits_retain(0x10f);
        tkhd.creation_time = u64::from(u32::MAX) + 1;

        let (len, read) = round_trip(&tkhd);

        assert_eq!(len, 104);
        assert_eq!(read.version, 1);
        assert_eq!(read.flags.bits(), 0x10f);
        assert!(read.flags.contains(TrackFlags::IN_POSTER));
    }
}
