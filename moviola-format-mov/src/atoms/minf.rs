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
use crate::atoms::{SmhdAtom, StblAtom, VmhdAtom};

/// The media-specific header of a track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaHeader {
    Sound(SmhdAtom),
    Video(VmhdAtom),
}

/// Media information atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinfAtom {
    /// The media header, if the media is sound or video.
    pub header: Option<MediaHeader>,
    /// Sample table atom.
    pub stbl: StblAtom,
}

impl MinfAtom {
    /// Write a data information atom whose single data reference is the file itself.
    fn write_self_reference<W: WriteBytes>(writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(*b"dinf")?;
        writer.begin_full(*b"dref", 0, 0)?;
        writer.write_be_u32(1)?;
        // Flag 1 marks the data as being in the same file.
        writer.begin_full(*b"alis", 0, 1)?;
        writer.end()?;
        writer.end()?;
        writer.end()
    }
}

impl Atom for MinfAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        Self::read_limited(reader, header, &ReadLimits::default())
    }

    fn read_limited<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let mut iter = AtomIterator::new(reader, header).with_limits(*limits);

        let mut media_header = None;
        let mut stbl = None;

        while let Some(header) = iter.next()? {
            match header.atom_type() {
                AtomType::SoundMediaHeader => {
                    media_header = Some(MediaHeader::Sound(iter.read_atom::<SmhdAtom>()?));
                }
                AtomType::VideoMediaHeader => {
                    media_header = Some(MediaHeader::Video(iter.read_atom::<VmhdAtom>()?));
                }
                AtomType::SampleTable => {
                    stbl = Some(iter.read_atom::<StblAtom>()?);
                }
                _ => iter.skip_atom(),
            }
        }

        match stbl {
            Some(stbl) => Ok(MinfAtom { header: media_header, stbl }),
            None => iter.missing_atom("mov (minf): missing stbl atom"),
        }
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(*b"minf")?;

        match &self.header {
            Some(MediaHeader::Sound(smhd)) => smhd.write(writer)?,
            Some(MediaHeader::Video(vmhd)) => vmhd.write(writer)?,
            None => (),
        }

        MinfAtom::write_self_reference(writer)?;
        self.stbl.write(writer)?;
        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "media information (minf)")?;

        match &self.header {
            Some(MediaHeader::Sound(smhd)) => smhd.dump(out, indent + 1)?,
            Some(MediaHeader::Video(vmhd)) => vmhd.dump(out, indent + 1)?,
            None => (),
        }

        self.stbl.dump(out, indent + 1)
    }
}
