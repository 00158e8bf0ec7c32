// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use log::warn;

use moviola_core::errors::{Error, Result};
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_line, Atom, AtomHeader, AtomWriter};
use crate::fourcc::FourCc;

/// The longest handler name that is read. Longer names are skipped.
const MAX_NAME_LEN: u64 = 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HandlerType {
    /// Video handler.
    Video,
    /// Audio handler.
    Sound,
    /// Unknown handler type.
    Other([u8; 4]),
}

impl HandlerType {
    fn fourcc(&self) -> [u8; 4] {
        match self {
            HandlerType::Video => *b"vide",
            HandlerType::Sound => *b"soun",
            HandlerType::Other(val) => *val,
        }
    }
}

/// Handler reference atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HdlrAtom {
    /// Component type. `mhlr` for media handlers, `dhlr` for data handlers, and 0 in MP4.
    pub component_type: FourCc,
    /// Handler type.
    pub handler_type: HandlerType,
    pub manufacturer: FourCc,
    pub component_flags: u32,
    pub component_flags_mask: u32,
    /// Human-readable handler name.
    pub name: String,
}

impl HdlrAtom {
    pub fn new(handler_type: HandlerType) -> Self {
        let name = match handler_type {
            HandlerType::Video => "Moviola Video Media Handler",
            HandlerType::Sound => "Moviola Sound Media Handler",
            HandlerType::Other(_) => "Moviola Media Handler",
        };

        HdlrAtom {
            component_type: FourCc::new(*b"mhlr"),
            handler_type,
            manufacturer: FourCc::default(),
            component_flags: 0,
            component_flags_mask: 0,
            name: name.to_string(),
        }
    }
}

impl Atom for HdlrAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (_, _) = header.read_extended_header(reader)?;

        let component_type = FourCc::new(reader.read_quad_bytes()?);

        let handler_type = match &reader.read_quad_bytes()? {
            b"vide" => HandlerType::Video,
            b"soun" => HandlerType::Sound,
            &hdlr => HandlerType::Other(hdlr),
        };

        let manufacturer = FourCc::new(reader.read_quad_bytes()?);
        let component_flags = reader.read_be_u32()?;
        let component_flags_mask = reader.read_be_u32()?;

        let size = header
            .data_unread_at(reader.pos())
            .ok_or(Error::DecodeError("mov (hdlr): expected atom size to be known"))?;

        let name = if size > MAX_NAME_LEN {
            warn!("mov (hdlr): ignoring a handler name of {} bytes", size);
            String::new()
        }
        else {
            let buf = reader.read_boxed_slice_exact(size as usize)?;

            // QuickTime uses a Pascal string, MP4 uses a null-terminated string.
            let name = match buf.split_first() {
                Some((&len, rest)) if usize::from(len) == rest.len() => rest,
                _ => buf.split(|&b| b == 0).next().unwrap_or(&[]),
            };

            String::from_utf8_lossy(name).into_owned()
        };

        Ok(HdlrAtom {
            component_type,
            handler_type,
            manufacturer,
            component_flags,
            component_flags_mask,
            name,
        })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin_full(*b"hdlr", 0, 0)?;
        writer.write_buf(&self.component_type.get())?;
        writer.write_buf(&self.handler_type.fourcc())?;
        writer.write_buf(&self.manufacturer.get())?;
        writer.write_be_u32(self.component_flags)?;
        writer.write_be_u32(self.component_flags_mask)?;

        // Pascal string, truncated to fit a single length byte.
        let name = self.name.as_bytes();
        let len = name.len().min(usize::from(u8::MAX));
        writer.write_u8(len as u8)?;
        writer.write_buf(&name[..len])?;

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        let subtype = FourCc::new(self.handler_type.fourcc());

        dump_line!(out, indent, "handler reference (hdlr)")?;
        dump_line!(out, indent + 1, "component_type {}", self.component_type)?;
        dump_line!(out, indent + 1, "component_subtype {}", subtype)?;
        dump_line!(out, indent + 1, "manufacturer {}", self.manufacturer)?;
        dump_line!(out, indent + 1, "name {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use moviola_core::io::BufReader;

    use super::{HandlerType, HdlrAtom};
    use crate::atoms::{Atom, AtomHeader, AtomWriter};

    fn read_hdlr(buf: &[u8]) -> HdlrAtom {
        let mut reader = BufReader::new(buf);
        let header = AtomHeader::read(&mut reader).unwrap();
        HdlrAtom::read(&mut reader, header).unwrap()
    }

    #[test]
    fn verify_pascal_name_round_trip() {
        let hdlr = HdlrAtom::new(HandlerType::Sound);

        let mut writer = AtomWriter::new(Vec::new());
        hdlr.write(&mut writer).unwrap();

        assert_eq!(read_hdlr(&writer.into_inner()), hdlr);
    }

    #[test]
    fn verify_c_string_name() {
        let mut buf = vec![0, 0, 0, 0, b'h', b'd', b'l', b'r', 0, 0, 0, 0];
        buf.extend_from_slice(&[0; 4]);
        buf.extend_from_slice(b"vide");
        buf.extend_from_slice(&[0; 12]);
        buf.extend_from_slice(b"VideoHandler\0");
        buf[3] = buf.len() as u8;

        let hdlr = read_hdlr(&buf);
        assert_eq!(hdlr.handler_type, HandlerType::Video);
        assert_eq!(hdlr.name, "VideoHandler");
    }
}
