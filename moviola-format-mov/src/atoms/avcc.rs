// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::Result;
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_payload, read_remaining, Atom, AtomHeader, AtomType, AtomWriter};
use crate::atoms::{ColrAtom, ReadLimits};

/// The largest codec configuration record that is read by default.
pub const MAX_CODEC_CONFIG_LEN: u64 = 1 << 20;

/// The kind of codec configuration record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CodecConfigKind {
    /// An `AVCDecoderConfigurationRecord`, stored in an `avcC` atom.
    Avc,
    /// An `HEVCDecoderConfigurationRecord`, stored in an `hvcC` atom.
    Hevc,
}

/// Codec configuration atom (`avcC` or `hvcC`).
///
/// The record is kept as an opaque blob. An HEVC configuration is always written followed by a
/// `colr` atom declaring BT.709 colour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvcCAtom {
    pub kind: CodecConfigKind,
    data: Box<[u8]>,
}

impl AvcCAtom {
    pub fn new(kind: CodecConfigKind, data: &[u8]) -> Self {
        AvcCAtom { kind, data: data.into() }
    }

    /// The configuration record.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replace the configuration record.
    pub fn set_data(&mut self, data: &[u8]) {
        self.data = data.into();
    }

    fn tag(&self) -> [u8; 4] {
        match self.kind {
            CodecConfigKind::Avc => *b"avcC",
            CodecConfigKind::Hevc => *b"hvcC",
        }
    }
}

impl Atom for AvcCAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        Self::read_limited(reader, header, &ReadLimits::default())
    }

    fn read_limited<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let kind = match header.atom_type() {
            AtomType::HevcConfiguration => CodecConfigKind::Hevc,
            _ => CodecConfigKind::Avc,
        };

        let max_len = limits.max_codec_config_len;
        let data = read_remaining(reader, &header, max_len, "mov (avcC): record too large")?;

        Ok(AvcCAtom { kind, data })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(self.tag())?;
        writer.write_buf(&self.data)?;
        writer.end()?;

        if self.kind == CodecConfigKind::Hevc {
            ColrAtom::bt709().write(writer)?;
        }

        Ok(())
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        let name = match self.kind {
            CodecConfigKind::Avc => "avc configuration (avcC)",
            CodecConfigKind::Hevc => "hevc configuration (hvcC)",
        };

        dump_payload(out, indent, name, &self.data)
    }
}
