// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::{limit_error, Result};
use moviola_core::io::{BufReader, ReadBytes, WriteBytes};

use crate::atoms::{dump_line, dump_payload, read_remaining, Atom, AtomHeader, AtomWriter};
use crate::atoms::ReadLimits;

const ES_DESCRIPTOR: u8 = 0x03;
const DECODER_CONFIG_DESCRIPTOR: u8 = 0x04;
const DECODER_SPECIFIC_DESCRIPTOR: u8 = 0x05;
const SL_CONFIG_DESCRIPTOR: u8 = 0x06;

/// Audio stream type, shifted into place with the reserved bit set.
const STREAM_TYPE_AUDIO: u8 = (0x05 << 2) | 0x01;

/// The largest descriptor length that can be encoded.
const MAX_DESCRIPTOR_LEN: usize = (1 << 28) - 1;

/// Elementary stream descriptor atom.
///
/// The descriptors are kept as an opaque blob. [`EsdsAtom::decoder_specific_info`] finds the
/// decoder configuration within them, such as an MPEG-4 `AudioSpecificConfig`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EsdsAtom {
    pub version: u8,
    pub flags: u32,
    descriptors: Box<[u8]>,
}

fn read_descriptor_header(reader: &mut BufReader<'_>) -> Option<(u8, usize)> {
    let tag = reader.read_u8().ok()?;

    let mut len = 0;

    for _ in 0..4 {
        let val = reader.read_u8().ok()?;
        len = (len << 7) | usize::from(val & 0x7f);
        if val & 0x80 == 0 {
            break;
        }
    }

    Some((tag, len))
}

fn push_descriptor(out: &mut Vec<u8>, tag: u8, body: &[u8]) {
    out.push(tag);

    let len = body.len();
    let mut shift = 21;

    // Use the shortest encoding of the length.
    while shift > 0 && len >> shift == 0 {
        shift -= 7;
    }

    while shift > 0 {
        out.push(0x80 | ((len >> shift) & 0x7f) as u8);
        shift -= 7;
    }

    out.push((len & 0x7f) as u8);
    out.extend_from_slice(body);
}

impl EsdsAtom {
    pub fn new(descriptors: &[u8]) -> Self {
        EsdsAtom { version: 0, flags: 0, descriptors: descriptors.into() }
    }

    /// Build the descriptors of an audio stream of `object_type` decoded with `config`. For
    /// MPEG-4 audio, `object_type` is 0x40 and `config` is the `AudioSpecificConfig`.
    pub fn with_decoder_config(object_type: u8, config: &[u8]) -> Result<Self> {
        if config.len() > MAX_DESCRIPTOR_LEN - 32 {
            return limit_error("mov (esds): decoder configuration too large");
        }

        let mut dec_config = vec![object_type, STREAM_TYPE_AUDIO];
        // Buffer size, maximum bitrate, and average bitrate are unknown.
        dec_config.extend_from_slice(&[0; 11]);
        push_descriptor(&mut dec_config, DECODER_SPECIFIC_DESCRIPTOR, config);

        // Elementary stream ID 1, with no dependencies, URL, or OCR stream.
        let mut es = vec![0, 1, 0];
        push_descriptor(&mut es, DECODER_CONFIG_DESCRIPTOR, &dec_config);
        push_descriptor(&mut es, SL_CONFIG_DESCRIPTOR, &[0x02]);

        let mut descriptors = Vec::new();
        push_descriptor(&mut descriptors, ES_DESCRIPTOR, &es);

        Ok(EsdsAtom::new(&descriptors))
    }

    /// The descriptors.
    pub fn descriptors(&self) -> &[u8] {
        &self.descriptors
    }

    /// Replace the descriptors.
    pub fn set_descriptors(&mut self, descriptors: &[u8]) {
        self.descriptors = descriptors.into();
    }

    /// The object type indication of the decoder configuration, if present.
    pub fn object_type(&self) -> Option<u8> {
        let mut reader = self.decoder_config_reader()?;
        reader.read_u8().ok()
    }

    /// The decoder specific configuration, if present.
    pub fn decoder_specific_info(&self) -> Option<&[u8]> {
        let mut reader = self.decoder_config_reader()?;

        // Object type, stream type, buffer size, maximum bitrate, and average bitrate.
        reader.ignore_bytes(13).ok()?;

        match read_descriptor_header(&mut reader)? {
            (DECODER_SPECIFIC_DESCRIPTOR, len) => reader.read_buf_bytes_ref(len).ok(),
            _ => None,
        }
    }

    /// Position a reader at the body of the decoder configuration descriptor.
    fn decoder_config_reader(&self) -> Option<BufReader<'_>> {
        let mut reader = BufReader::new(&self.descriptors);

        if read_descriptor_header(&mut reader)?.0 != ES_DESCRIPTOR {
            return None;
        }

        let _es_id = reader.read_be_u16().ok()?;
        let es_flags = reader.read_u8().ok()?;

        // Stream dependence flag.
        if es_flags & 0x80 != 0 {
            reader.ignore_bytes(2).ok()?;
        }

        // URL flag.
        if es_flags & 0x40 != 0 {
            let url_len = reader.read_u8().ok()?;
            reader.ignore_bytes(u64::from(url_len)).ok()?;
        }

        // OCR stream flag.
        if es_flags & 0x20 != 0 {
            reader.ignore_bytes(2).ok()?;
        }

        match read_descriptor_header(&mut reader)? {
            (DECODER_CONFIG_DESCRIPTOR, _) => Some(reader),
            _ => None,
        }
    }
}

impl Atom for EsdsAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        Self::read_limited(reader, header, &ReadLimits::default())
    }

    fn read_limited<B: ReadBytes>(
        reader: &mut B,
        mut header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let (version, flags) = header.read_extended_header(reader)?;

        let max_len = limits.max_codec_config_len;
        let descriptors =
            read_remaining(reader, &header, max_len, "mov (esds): descriptors too large")?;

        Ok(EsdsAtom { version, flags, descriptors })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin_full(*b"esds", self.version, self.flags)?;
        writer.write_buf(&self.descriptors)?;
        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_payload(out, indent, "elementary stream descriptor (esds)", &self.descriptors)?;

        if let Some(object_type) = self.object_type() {
            dump_line!(out, indent + 1, "object_type {:#04x}", object_type)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use moviola_core::io::BufReader;

    use super::EsdsAtom;
    use crate::atoms::{Atom, AtomHeader, AtomWriter};

    /// AAC-LC, 44.1 kHz, stereo.
    const AUDIO_SPECIFIC_CONFIG: [u8; 2] = [0x12, 0x10];

    #[test]
    fn verify_decoder_config_round_trip() {
        let esds = EsdsAtom::with_decoder_config(0x40, &AUDIO_SPECIFIC_CONFIG).unwrap();

        assert_eq!(esds.object_type(), Some(0x40));
        assert_eq!(esds.decoder_specific_info(), Some(&AUDIO_SPECIFIC_CONFIG[..]));

        let mut writer = AtomWriter::new(Vec::new());
        esds.write(&mut writer).unwrap();
        let buf = writer.into_inner();

        assert_eq!(&buf[4..8], b"esds");

        let mut reader = BufReader::new(&buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        let read = EsdsAtom::read(&mut reader, header).unwrap();

        assert_eq!(read, esds);
        assert_eq!(reader.bytes_available(), 0);
    }

    #[test]
    fn verify_extended_length_and_flags() {
        // An ES descriptor with a four byte length, a dependency, and an OCR stream.
        let descriptors = [
            0x03, 0x80, 0x80, 0x80, 0x19, 0x00, 0x02, 0xa0, 0x00, 0x01, 0x00, 0x03, 0x04, 0x10,
            0x6b, 0x15, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05,
            0x01, 0xaa,
        ];

        let esds = EsdsAtom::new(&descriptors);
        assert_eq!(esds.object_type(), Some(0x6b));
        assert_eq!(esds.decoder_specific_info(), Some(&[0xaa][..]));
    }

    #[test]
    fn verify_set_descriptors_replaces() {
        let mut esds = EsdsAtom::with_decoder_config(0x40, &AUDIO_SPECIFIC_CONFIG).unwrap();
        esds.set_descriptors(&[0x06, 0x01, 0x02]);

        assert_eq!(esds.descriptors(), &[0x06, 0x01, 0x02]);
        assert_eq!(esds.decoder_specific_info(), None);
    }
}
