// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use log::warn;

use moviola_core::errors::{decode_error, Result};
use moviola_core::io::{BufReader, ReadBytes, WriteBytes};

use crate::atoms::{dump_line, dump_payload, read_remaining, Atom, AtomHeader, AtomIterator};
use crate::atoms::{AtomType, AtomWriter, AvcCAtom, CodecConfigKind, EsdsAtom, HandlerType};
use crate::atoms::{ReadLimits, WaveAtom};
use crate::fourcc::FourCc;
use crate::fp::FpU16;

/// The largest sample description body kept opaque.
const MAX_OPAQUE_ENTRY_LEN: u64 = 1 << 20;

/// The fields of a version 1 sound description.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SoundFieldsV1 {
    pub samples_per_packet: u32,
    pub bytes_per_packet: u32,
    pub bytes_per_frame: u32,
    pub bytes_per_sample: u32,
}

/// The fields of a version 2 sound description. The version 0 fields of such a description hold
/// fixed values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SoundFieldsV2 {
    /// The size of the description up to its extension atoms.
    pub struct_size: u32,
    /// The sample rate, as the bits of a double.
    sample_rate_bits: u64,
    pub channels: u32,
    pub reserved: u32,
    pub bits_per_channel: u32,
    pub format_flags: u32,
    pub bytes_per_packet: u32,
    pub frames_per_packet: u32,
}

impl SoundFieldsV2 {
    /// The size of a version 2 description, header included, without extension atoms.
    const STRUCT_SIZE: u32 = 72;

    pub fn new(channels: u32, bits_per_channel: u32, sample_rate: f64) -> Self {
        SoundFieldsV2 {
            struct_size: Self::STRUCT_SIZE,
            sample_rate_bits: sample_rate.to_bits(),
            channels,
            reserved: 0x7f00_0000,
            bits_per_channel,
            format_flags: 0,
            bytes_per_packet: 0,
            frames_per_packet: 0,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        f64::from_bits(self.sample_rate_bits)
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate_bits = sample_rate.to_bits();
    }

    fn read<B: ReadBytes>(reader: &mut B) -> Result<Self> {
        Ok(SoundFieldsV2 {
            struct_size: reader.read_be_u32()?,
            sample_rate_bits: reader.read_be_u64()?,
            channels: reader.read_be_u32()?,
            reserved: reader.read_be_u32()?,
            bits_per_channel: reader.read_be_u32()?,
            format_flags: reader.read_be_u32()?,
            bytes_per_packet: reader.read_be_u32()?,
            frames_per_packet: reader.read_be_u32()?,
        })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.write_be_u32(self.struct_size)?;
        writer.write_be_u64(self.sample_rate_bits)?;
        writer.write_be_u32(self.channels)?;
        writer.write_be_u32(self.reserved)?;
        writer.write_be_u32(self.bits_per_channel)?;
        writer.write_be_u32(self.format_flags)?;
        writer.write_be_u32(self.bytes_per_packet)?;
        writer.write_be_u32(self.frames_per_packet)?;
        Ok(())
    }
}

/// The version of a sound description, and the fields added by that version.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SoundVersion {
    V0,
    V1(SoundFieldsV1),
    V2(SoundFieldsV2),
}

impl SoundVersion {
    pub fn number(&self) -> u16 {
        match self {
            SoundVersion::V0 => 0,
            SoundVersion::V1(_) => 1,
            SoundVersion::V2(_) => 2,
        }
    }
}

/// Sound description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundDescription {
    pub version: SoundVersion,
    pub revision: u16,
    pub vendor: FourCc,
    pub channels: u16,
    /// Bits per sample.
    pub sample_size: u16,
    pub compression_id: i16,
    pub packet_size: u16,
    /// The sample rate as stored. Use [`SoundDescription::sample_rate_hz`] to interpret it.
    pub sample_rate: FpU16,
    /// Sound extension holding the original format.
    pub wave: Option<WaveAtom>,
    /// Elementary stream descriptor of MPEG-4 audio.
    pub esds: Option<EsdsAtom>,
}

impl SoundDescription {
    pub fn new(channels: u16, sample_size: u16, sample_rate: u32) -> Self {
        SoundDescription {
            version: SoundVersion::V0,
            revision: 0,
            vendor: FourCc::new(*b"mvla"),
            channels,
            sample_size,
            compression_id: 0,
            packet_size: 0,
            // The integer part only has 16 bits. 88.2 kHz and 96 kHz wrap around, and are
            // recovered by `sample_rate_hz`.
            sample_rate: FpU16::parse_raw((sample_rate & 0xffff) << 16),
            wave: None,
            esds: None,
        }
    }

    /// A version 2 description, which stores the sample rate and channel count without the
    /// limits of the version 0 fields.
    pub fn new_v2(channels: u32, bits_per_channel: u32, sample_rate: f64) -> Self {
        SoundDescription {
            version: SoundVersion::V2(SoundFieldsV2::new(channels, bits_per_channel, sample_rate)),
            channels: 3,
            sample_size: 16,
            compression_id: -2,
            sample_rate: FpU16::new(1),
            ..SoundDescription::new(0, 0, 0)
        }
    }

    /// The sample rate in Hz.
    pub fn sample_rate_hz(&self) -> f64 {
        if let SoundVersion::V2(fields) = &self.version {
            return fields.sample_rate();
        }

        let rate = f64::from(self.sample_rate);

        if self.sample_rate.raw() == 0 {
            44100.0
        }
        else if rate + 65536.0 == 96000.0 || rate + 65536.0 == 88200.0 {
            rate + 65536.0
        }
        else {
            rate
        }
    }

    /// The number of channels.
    pub fn channel_count(&self) -> u32 {
        match &self.version {
            SoundVersion::V2(fields) => fields.channels,
            _ => u32::from(self.channels),
        }
    }

    /// The original format payload, if any.
    pub fn frma(&self) -> Option<&[u8]> {
        self.wave.as_ref().and_then(|wave| wave.frma.as_ref()).map(|frma| &*frma.data)
    }

    /// The elementary stream descriptor, either of the description or of its sound extension.
    pub fn elementary_stream(&self) -> Option<&EsdsAtom> {
        self.esds.as_ref().or_else(|| self.wave.as_ref().and_then(|wave| wave.esds.as_ref()))
    }

    /// Set the elementary stream descriptors, replacing any previous descriptors.
    pub fn set_esds(&mut self, descriptors: &[u8]) {
        self.esds = Some(EsdsAtom::new(descriptors));
    }

    fn read<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let version = reader.read_be_u16()?;

        let mut sound = SoundDescription {
            revision: reader.read_be_u16()?,
            vendor: FourCc::new(reader.read_quad_bytes()?),
            channels: reader.read_be_u16()?,
            sample_size: reader.read_be_u16()?,
            compression_id: reader.read_be_i16()?,
            packet_size: reader.read_be_u16()?,
            sample_rate: FpU16::parse_raw(reader.read_be_u32()?),
            ..SoundDescription::new(0, 0, 0)
        };

        sound.version = match version {
            0 => SoundVersion::V0,
            2 => SoundVersion::V2(SoundFieldsV2::read(reader)?),
            // Later versions extend version 1.
            _ => SoundVersion::V1(SoundFieldsV1 {
                samples_per_packet: reader.read_be_u32()?,
                bytes_per_packet: reader.read_be_u32()?,
                bytes_per_frame: reader.read_be_u32()?,
                bytes_per_sample: reader.read_be_u32()?,
            }),
        };

        let mut iter = AtomIterator::new(reader, header).with_limits(*limits);

        while let Some(header) = iter.next()? {
            match header.atom_type() {
                AtomType::Wave => {
                    sound.wave = iter.read_optional_atom::<WaveAtom>()?;
                }
                AtomType::EsDescriptor => match header.data_len() {
                    Some(len) if len > limits.max_codec_config_len => {
                        warn!("mov (stsd): skipping an esds atom of {} bytes", len);
                        iter.skip_atom();
                    }
                    _ => sound.esds = iter.read_optional_atom::<EsdsAtom>()?,
                },
                _ => iter.skip_atom(),
            }
        }

        Ok(sound)
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.write_be_u16(self.version.number())?;
        writer.write_be_u16(self.revision)?;
        writer.write_buf(&self.vendor.get())?;
        writer.write_be_u16(self.channels)?;
        writer.write_be_u16(self.sample_size)?;
        writer.write_be_i16(self.compression_id)?;
        writer.write_be_u16(self.packet_size)?;
        writer.write_be_u32(self.sample_rate.raw())?;

        match &self.version {
            SoundVersion::V0 => (),
            SoundVersion::V1(fields) => {
                writer.write_be_u32(fields.samples_per_packet)?;
                writer.write_be_u32(fields.bytes_per_packet)?;
                writer.write_be_u32(fields.bytes_per_frame)?;
                writer.write_be_u32(fields.bytes_per_sample)?;
            }
            SoundVersion::V2(fields) => fields.write(writer)?,
        }

        if let Some(wave) = &self.wave {
            wave.write(writer)?;
        }

        if let Some(esds) = &self.esds {
            esds.write(writer)?;
        }

        Ok(())
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "version {}", self.version.number())?;
        dump_line!(out, indent, "revision {}", self.revision)?;
        dump_line!(out, indent, "vendor {}", self.vendor)?;
        dump_line!(out, indent, "channels {}", self.channel_count())?;
        dump_line!(out, indent, "sample_size {}", self.sample_size)?;
        dump_line!(out, indent, "compression_id {}", self.compression_id)?;
        dump_line!(out, indent, "packet_size {}", self.packet_size)?;
        dump_line!(out, indent, "sample_rate {}", self.sample_rate_hz())?;

        match &self.version {
            SoundVersion::V0 => (),
            SoundVersion::V1(fields) => {
                dump_line!(out, indent, "samples_per_packet {}", fields.samples_per_packet)?;
                dump_line!(out, indent, "bytes_per_packet {}", fields.bytes_per_packet)?;
                dump_line!(out, indent, "bytes_per_frame {}", fields.bytes_per_frame)?;
                dump_line!(out, indent, "bytes_per_sample {}", fields.bytes_per_sample)?;
            }
            SoundVersion::V2(fields) => {
                dump_line!(out, indent, "struct_size {}", fields.struct_size)?;
                dump_line!(out, indent, "bits_per_channel {}", fields.bits_per_channel)?;
                dump_line!(out, indent, "format_flags {:#x}", fields.format_flags)?;
                dump_line!(out, indent, "bytes_per_packet {}", fields.bytes_per_packet)?;
                dump_line!(out, indent, "frames_per_packet {}", fields.frames_per_packet)?;
            }
        }

        if let Some(wave) = &self.wave {
            wave.dump(out, indent)?;
        }

        if let Some(esds) = &self.esds {
            esds.dump(out, indent)?;
        }

        Ok(())
    }
}

/// Visual sample description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualDescription {
    pub version: u16,
    pub revision: u16,
    pub vendor: FourCc,
    pub temporal_quality: u32,
    pub spatial_quality: u32,
    pub width: u16,
    pub height: u16,
    /// Horizontal resolution in pixels per inch.
    pub horizontal_resolution: FpU16,
    /// Vertical resolution in pixels per inch.
    pub vertical_resolution: FpU16,
    pub data_size: u32,
    pub frames_per_sample: u16,
    /// At most 31 bytes are stored.
    pub compressor_name: String,
    /// Pixel depth in bits.
    pub depth: u16,
    /// Colour table identifier. -1 for the default table.
    pub ctab_id: i16,
    /// Codec configuration record.
    pub codec_config: Option<AvcCAtom>,
}

impl VisualDescription {
    pub fn new(width: u16, height: u16) -> Self {
        VisualDescription {
            version: 0,
            revision: 0,
            vendor: FourCc::new(*b"mvla"),
            temporal_quality: 100,
            spatial_quality: 258,
            width,
            height,
            horizontal_resolution: FpU16::new(72),
            vertical_resolution: FpU16::new(72),
            data_size: 0,
            frames_per_sample: 1,
            compressor_name: "Moviola".to_string(),
            depth: 24,
            ctab_id: -1,
            codec_config: None,
        }
    }

    /// Set the codec configuration record, replacing any previous record.
    pub fn set_codec_config(&mut self, kind: CodecConfigKind, data: &[u8]) {
        self.codec_config = Some(AvcCAtom::new(kind, data));
    }

    fn read<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let mut visual = VisualDescription {
            version: reader.read_be_u16()?,
            revision: reader.read_be_u16()?,
            vendor: FourCc::new(reader.read_quad_bytes()?),
            temporal_quality: reader.read_be_u32()?,
            spatial_quality: reader.read_be_u32()?,
            width: reader.read_be_u16()?,
            height: reader.read_be_u16()?,
            horizontal_resolution: FpU16::parse_raw(reader.read_be_u32()?),
            vertical_resolution: FpU16::parse_raw(reader.read_be_u32()?),
            data_size: reader.read_be_u32()?,
            frames_per_sample: reader.read_be_u16()?,
            ..VisualDescription::new(0, 0)
        };

        let mut name = [0; 32];
        reader.read_buf_exact(&mut name)?;
        let len = usize::from(name[0]).min(31);
        visual.compressor_name = String::from_utf8_lossy(&name[1..1 + len]).into_owned();

        visual.depth = reader.read_be_u16()?;
        visual.ctab_id = reader.read_be_i16()?;

        let mut iter = AtomIterator::new(reader, header).with_limits(*limits);

        while let Some(header) = iter.next()? {
            match header.atom_type() {
                AtomType::AvcConfiguration | AtomType::HevcConfiguration => {
                    match header.data_len() {
                        Some(len) if len > limits.max_codec_config_len => {
                            warn!("mov (stsd): skipping a codec configuration of {} bytes", len);
                            iter.skip_atom();
                        }
                        _ => visual.codec_config = iter.read_optional_atom::<AvcCAtom>()?,
                    }
                }
                // The colour parameters written with an HEVC configuration are implied by it.
                _ => iter.skip_atom(),
            }
        }

        Ok(visual)
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.write_be_u16(self.version)?;
        writer.write_be_u16(self.revision)?;
        writer.write_buf(&self.vendor.get())?;
        writer.write_be_u32(self.temporal_quality)?;
        writer.write_be_u32(self.spatial_quality)?;
        writer.write_be_u16(self.width)?;
        writer.write_be_u16(self.height)?;
        writer.write_be_u32(self.horizontal_resolution.raw())?;
        writer.write_be_u32(self.vertical_resolution.raw())?;
        writer.write_be_u32(self.data_size)?;
        writer.write_be_u16(self.frames_per_sample)?;

        let mut name = [0; 32];
        let bytes = self.compressor_name.as_bytes();
        let len = bytes.len().min(31);
        name[0] = len as u8;
        name[1..1 + len].copy_from_slice(&bytes[..len]);
        writer.write_buf(&name)?;

        writer.write_be_u16(self.depth)?;
        writer.write_be_i16(self.ctab_id)?;

        if let Some(codec_config) = &self.codec_config {
            codec_config.write(writer)?;
        }

        Ok(())
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "version {}", self.version)?;
        dump_line!(out, indent, "revision {}", self.revision)?;
        dump_line!(out, indent, "vendor {}", self.vendor)?;
        dump_line!(out, indent, "temporal_quality {}", self.temporal_quality)?;
        dump_line!(out, indent, "spatial_quality {}", self.spatial_quality)?;
        dump_line!(out, indent, "width {}", self.width)?;
        dump_line!(out, indent, "height {}", self.height)?;
        dump_line!(out, indent, "horizontal_resolution {}", self.horizontal_resolution)?;
        dump_line!(out, indent, "vertical_resolution {}", self.vertical_resolution)?;
        dump_line!(out, indent, "data_size {}", self.data_size)?;
        dump_line!(out, indent, "frames_per_sample {}", self.frames_per_sample)?;
        dump_line!(out, indent, "compressor_name {}", self.compressor_name)?;
        dump_line!(out, indent, "depth {}", self.depth)?;
        dump_line!(out, indent, "ctab_id {}", self.ctab_id)?;

        if let Some(codec_config) = &self.codec_config {
            codec_config.dump(out, indent)?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleEntry {
    Sound(SoundDescription),
    Visual(VisualDescription),
    /// A description of an unknown kind, kept opaque.
    Other(Box<[u8]>),
}

/// A sample description: the media format, and the format-specific description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleDescription {
    pub format: FourCc,
    pub data_reference: u16,
    pub entry: SampleEntry,
}

/// Guess the kind of a sample description from its format.
fn classify(format: &[u8; 4]) -> Option<HandlerType> {
    match format {
        b".mp3" | b"ac-3" | b"alac" | b"alaw" | b"fl32" | b"fl64" | b"ima4" | b"in24" | b"in32"
        | b"lpcm" | b"mp4a" | b"NONE" | b"Opus" | b"QDM2" | b"QDMC" | b"sowt" | b"twos"
        | b"ulaw" => Some(HandlerType::Sound),
        b"2vuy" | b"ap4h" | b"apch" | b"apcn" | b"av01" | b"avc1" | b"dvc " | b"dvcp" | b"hev1"
        | b"hvc1" | b"jpeg" | b"mjpa" | b"mjpb" | b"mp4v" | b"png " | b"rle " | b"v210"
        | b"vp09" | b"yuv2" => Some(HandlerType::Video),
        // Notably "raw " is used for both uncompressed audio and video.
        _ => None,
    }
}

impl SampleDescription {
    pub fn new_sound(format: [u8; 4], sound: SoundDescription) -> Self {
        SampleDescription {
            format: FourCc::new(format),
            data_reference: 1,
            entry: SampleEntry::Sound(sound),
        }
    }

    pub fn new_visual(format: [u8; 4], visual: VisualDescription) -> Self {
        SampleDescription {
            format: FourCc::new(format),
            data_reference: 1,
            entry: SampleEntry::Visual(visual),
        }
    }

    /// Read a sample description. The handler of the track, if known, decides how the description
    /// is interpreted. Otherwise the format is used.
    fn read<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        handler: Option<HandlerType>,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let format = header.tag();

        // Reserved
        reader.ignore_bytes(6)?;

        let data_reference = reader.read_be_u16()?;

        let entry = match handler.or_else(|| classify(&format.get())) {
            Some(HandlerType::Sound) => {
                SampleEntry::Sound(SoundDescription::read(reader, header, limits)?)
            }
            Some(HandlerType::Video) => {
                SampleEntry::Visual(VisualDescription::read(reader, header, limits)?)
            }
            _ => {
                let what = "mov (stsd): sample description too large";
                SampleEntry::Other(read_remaining(reader, &header, MAX_OPAQUE_ENTRY_LEN, what)?)
            }
        };

        Ok(SampleDescription { format, data_reference, entry })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(self.format.get())?;
        writer.write_zeros(6)?;
        writer.write_be_u16(self.data_reference)?;

        match &self.entry {
            SampleEntry::Sound(sound) => sound.write(writer)?,
            SampleEntry::Visual(visual) => visual.write(writer)?,
            SampleEntry::Other(body) => writer.write_buf(body)?,
        }

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "sample description ({})", self.format)?;
        dump_line!(out, indent + 1, "data_reference {}", self.data_reference)?;

        match &self.entry {
            SampleEntry::Sound(sound) => sound.dump(out, indent + 1),
            SampleEntry::Visual(visual) => visual.dump(out, indent + 1),
            SampleEntry::Other(body) => dump_payload(out, indent + 1, "opaque", body),
        }
    }

    /// Reinterpret an opaque description as the kind given by the track handler.
    fn resolve(&mut self, handler: HandlerType, limits: &ReadLimits) -> Result<()> {
        if !matches!(self.entry, SampleEntry::Other(_)) || matches!(handler, HandlerType::Other(_))
        {
            return Ok(());
        }

        let mut writer = AtomWriter::new(Vec::new());
        self.write(&mut writer)?;
        let buf = writer.into_inner();

        let mut reader = BufReader::new(&buf);
        let header = AtomHeader::read(&mut reader)?;

        match SampleDescription::read(&mut reader, header, Some(handler), limits) {
            Ok(desc) => *self = desc,
            Err(err) => {
                warn!("mov (stsd): keeping '{}' description opaque: {:?}", self.format, err);
            }
        }

        Ok(())
    }
}

/// Sample description atom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StsdAtom {
    pub entries: Vec<SampleDescription>,
}

impl StsdAtom {
    /// Interpret any descriptions whose kind could not be told from their format using the track
    /// handler.
    pub(crate) fn resolve(&mut self, handler: HandlerType, limits: &ReadLimits) -> Result<()> {
        for entry in self.entries.iter_mut() {
            entry.resolve(handler, limits)?;
        }
        Ok(())
    }

    /// The first sound description, if any.
    pub fn sound(&self) -> Option<&SoundDescription> {
        self.entries.iter().find_map(|desc| match &desc.entry {
            SampleEntry::Sound(sound) => Some(sound),
            _ => None,
        })
    }

    /// The first visual description, if any.
    pub fn visual(&self) -> Option<&VisualDescription> {
        self.entries.iter().find_map(|desc| match &desc.entry {
            SampleEntry::Visual(visual) => Some(visual),
            _ => None,
        })
    }

    /// The first visual description, if any, for modification.
    pub fn visual_mut(&mut self) -> Option<&mut VisualDescription> {
        self.entries.iter_mut().find_map(|desc| match &mut desc.entry {
            SampleEntry::Visual(visual) => Some(visual),
            _ => None,
        })
    }
}

impl Atom for StsdAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        Self::read_limited(reader, header, &ReadLimits::default())
    }

    fn read_limited<B: ReadBytes>(
        reader: &mut B,
        mut header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let (_, _) = header.read_extended_header(reader)?;

        let entry_count = reader.read_be_u32()?;

        // Each entry is at least 16 bytes.
        if let Some(len) = header.data_len() {
            if u64::from(entry_count) > len.saturating_sub(4) / 16 {
                return decode_error("mov (stsd): invalid entry count");
            }
        }

        let mut entries = Vec::new();
        entries.try_reserve_exact(entry_count as usize)?;

        for _ in 0..entry_count {
            let entry_header = AtomHeader::read(reader)?;

            if entry_header.atom_len().is_none() {
                return decode_error("mov (stsd): expected entry size to be known");
            }

            entries.push(SampleDescription::read(reader, entry_header, None, limits)?);

            // Skip any unread trailing data of the entry.
            entry_header.skip(reader)?;
        }

        Ok(StsdAtom { entries })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin_full(*b"stsd", 0, 0)?;
        writer.write_be_u32(self.entries.len() as u32)?;

        for entry in &self.entries {
            entry.write(writer)?;
        }

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "sample description (stsd)")?;

        for entry in &self.entries {
            entry.dump(out, indent + 1)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::avcc::MAX_CODEC_CONFIG_LEN;
    use crate::atoms::FrmaAtom;

    fn round_trip(stsd: &StsdAtom) -> StsdAtom {
        let mut writer = AtomWriter::new(Vec::new());
        stsd.write(&mut writer).unwrap();
        let buf = writer.into_inner();

        let mut reader = BufReader::new(&buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        let stsd = StsdAtom::read(&mut reader, header).unwrap();
        assert_eq!(reader.bytes_available(), 0);
        stsd
    }

    #[test]
    fn verify_sound_round_trip() {
        let mut sound = SoundDescription::new(2, 16, 48000);
        sound.version =
            SoundVersion::V1(SoundFieldsV1 { samples_per_packet: 1024, ..Default::default() });
        sound.wave = Some(WaveAtom { frma: Some(FrmaAtom::new(b"mp4a")), esds: None });

        let stsd = StsdAtom { entries: vec![SampleDescription::new_sound(*b"mp4a", sound)] };
        let read = round_trip(&stsd);

        assert_eq!(read, stsd);

        let sound = read.sound().unwrap();
        assert_eq!(sound.sample_rate_hz(), 48000.0);
        assert_eq!(sound.frma(), Some(&b"mp4a"[..]));
    }

    #[test]
    fn verify_v2_sound_layout() {
        let stsd = StsdAtom {
            entries: vec![SampleDescription::new_sound(
                *b"lpcm",
                SoundDescription::new_v2(6, 24, 192000.0),
            )],
        };

        let mut writer = AtomWriter::new(Vec::new());
        stsd.write(&mut writer).unwrap();
        let buf = writer.into_inner();

        // The entry follows the 16 byte full atom header and entry count.
        let entry = &buf[16..];
        assert_eq!(&entry[0..4], &[0, 0, 0, 72]);
        assert_eq!(&entry[16..18], &[0, 2]);
        assert_eq!(&entry[36..40], &[0, 0, 0, 72]);
        assert_eq!(&entry[40..48], &192000f64.to_bits().to_be_bytes());
        assert_eq!(&entry[48..52], &[0, 0, 0, 6]);
        assert_eq!(&entry[52..56], &[0x7f, 0, 0, 0]);
        assert_eq!(&entry[56..60], &[0, 0, 0, 24]);

        let read = round_trip(&stsd);
        assert_eq!(read, stsd);

        let sound = read.sound().unwrap();
        assert_eq!(sound.version.number(), 2);
        assert_eq!(sound.channel_count(), 6);
        assert_eq!(sound.sample_rate_hz(), 192000.0);
    }

    #[test]
    fn verify_mp4a_esds_round_trip() {
        let mut sound = SoundDescription::new(2, 16, 44100);
        sound.set_esds(&[0x06, 0x01, 0x02]);

        let esds = EsdsAtom::with_decoder_config(0x40, &[0x12, 0x10]).unwrap();
        sound.set_esds(esds.descriptors());

        let stsd = StsdAtom { entries: vec![SampleDescription::new_sound(*b"mp4a", sound)] };
        let read = round_trip(&stsd);

        assert_eq!(read, stsd);

        let esds = read.sound().unwrap().elementary_stream().unwrap();
        assert_eq!(esds.object_type(), Some(0x40));
        assert_eq!(esds.decoder_specific_info(), Some(&[0x12, 0x10][..]));
    }

    #[test]
    fn verify_codec_config_limit_raised() {
        let record = vec![0x5a; (MAX_CODEC_CONFIG_LEN + 1) as usize];

        let mut visual = VisualDescription::new(64, 48);
        visual.set_codec_config(CodecConfigKind::Hevc, &record);

        let stsd = StsdAtom { entries: vec![SampleDescription::new_visual(*b"hvc1", visual)] };

        let mut writer = AtomWriter::new(Vec::new());
        stsd.write(&mut writer).unwrap();
        let buf = writer.into_inner();

        // Skipped with the default limit.
        let read = round_trip(&stsd);
        assert!(read.visual().unwrap().codec_config.is_none());

        // Kept with a raised limit.
        let limits = ReadLimits { max_codec_config_len: 2 * MAX_CODEC_CONFIG_LEN };

        let mut reader = BufReader::new(&buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        let read = StsdAtom::read_limited(&mut reader, header, &limits).unwrap();

        assert_eq!(read, stsd);
    }

    #[test]
    fn verify_high_sample_rates() {
        assert_eq!(SoundDescription::new(2, 16, 96000).sample_rate_hz(), 96000.0);
        assert_eq!(SoundDescription::new(2, 16, 88200).sample_rate_hz(), 88200.0);
        assert_eq!(SoundDescription::new(2, 16, 0).sample_rate_hz(), 44100.0);
    }

    #[test]
    fn verify_visual_round_trip() {
        let mut visual = VisualDescription::new(1280, 720);
        visual.set_codec_config(CodecConfigKind::Avc, &[1, 2, 3]);
        visual.set_codec_config(CodecConfigKind::Hevc, &[4, 5, 6, 7]);

        let stsd = StsdAtom { entries: vec![SampleDescription::new_visual(*b"hvc1", visual)] };
        let read = round_trip(&stsd);

        assert_eq!(read, stsd);

        let visual = read.visual().unwrap();
        assert_eq!(visual.compressor_name, "Moviola");
        assert_eq!(visual.ctab_id, -1);
        assert_eq!(visual.codec_config.as_ref().unwrap().data(), &[4, 5, 6, 7]);
    }

    #[test]
    fn verify_raw_resolved_by_handler() {
        let visual = VisualDescription::new(64, 48);

        let stsd = StsdAtom { entries: vec![SampleDescription::new_visual(*b"raw ", visual)] };
        let mut read = round_trip(&stsd);

        assert!(matches!(read.entries[0].entry, SampleEntry::Other(_)));

        read.resolve(HandlerType::Video, &ReadLimits::default()).unwrap();
        assert_eq!(read, stsd);
    }
}
