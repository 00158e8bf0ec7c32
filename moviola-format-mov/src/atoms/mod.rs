// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::num::NonZeroU64;

use log::{debug, warn};
use smallvec::SmallVec;

use moviola_core::errors::{decode_error, limit_error, truncated_error, Error, Result};
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::fourcc::FourCc;

pub(crate) mod avcc;
pub(crate) mod colr;
pub(crate) mod esds;
pub(crate) mod frma;
pub(crate) mod ftyp;
pub(crate) mod hdlr;
pub(crate) mod matrix;
pub(crate) mod mdhd;
pub(crate) mod mdia;
pub(crate) mod minf;
pub(crate) mod moov;
pub(crate) mod mvhd;
pub(crate) mod smhd;
pub(crate) mod stbl;
pub(crate) mod stco;
pub(crate) mod stsc;
pub(crate) mod stsd;
pub(crate) mod stsz;
pub(crate) mod stts;
pub(crate) mod tkhd;
pub(crate) mod trak;
pub(crate) mod vmhd;
pub(crate) mod wave;

pub use avcc::{AvcCAtom, CodecConfigKind};
pub use colr::ColrAtom;
pub use esds::EsdsAtom;
pub use frma::FrmaAtom;
pub use ftyp::{FtypAtom, QUICKTIME_BRAND};
pub use hdlr::{HdlrAtom, HandlerType};
pub use matrix::Matrix;
pub use mdhd::MdhdAtom;
pub use mdia::MdiaAtom;
pub use minf::{MediaHeader, MinfAtom};
pub use moov::MoovAtom;
pub use mvhd::MvhdAtom;
pub use smhd::SmhdAtom;
pub use stbl::StblAtom;
pub use stco::StcoAtom;
pub use stsc::{StscAtom, StscEntry};
pub use stsd::{SampleDescription, SampleEntry, SoundDescription, SoundVersion, StsdAtom};
pub use stsd::{SoundFieldsV1, SoundFieldsV2, VisualDescription};
pub use stsz::{SampleSize, StszAtom};
pub use stts::{SttsAtom, SttsEntry};
pub use tkhd::{TkhdAtom, TrackFlags};
pub use trak::TrakAtom;
pub use vmhd::VmhdAtom;
pub use wave::WaveAtom;

/// Seconds between the QuickTime epoch (1904-01-01) and the Unix epoch.
const QUICKTIME_EPOCH_OFFSET: u64 = 2_082_844_800;

/// The current wall-clock time in seconds since the QuickTime epoch.
pub(crate) fn current_time() -> u64 {
    let unix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    unix + QUICKTIME_EPOCH_OFFSET
}

/// Write a line of dump output indented by `indent` levels.
macro_rules! dump_line {
    ($out:expr, $indent:expr, $($arg:tt)*) => {
        ::std::fmt::Write::write_fmt(
            $out,
            format_args!("{:width$}{}\n", "", format_args!($($arg)*), width = 2 * $indent),
        )
    };
}

pub(crate) use dump_line;

/// Atom types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AtomType {
    AvcConfiguration,
    ChunkOffset,
    ChunkOffset64,
    ColorParameters,
    EsDescriptor,
    FileType,
    Format,
    Free,
    Handler,
    HevcConfiguration,
    Media,
    MediaData,
    MediaHeader,
    MediaInfo,
    Movie,
    MovieHeader,
    SampleDescription,
    SampleSize,
    SampleTable,
    SampleToChunk,
    Skip,
    SoundMediaHeader,
    TimeToSample,
    Track,
    TrackHeader,
    VideoMediaHeader,
    Wave,
    Wide,
    Other([u8; 4]),
}

impl From<[u8; 4]> for AtomType {
    fn from(val: [u8; 4]) -> Self {
        match &val {
            b"avcC" => AtomType::AvcConfiguration,
            b"co64" => AtomType::ChunkOffset64,
            b"colr" => AtomType::ColorParameters,
            b"esds" => AtomType::EsDescriptor,
            b"free" => AtomType::Free,
            b"frma" => AtomType::Format,
            b"ftyp" => AtomType::FileType,
            b"hdlr" => AtomType::Handler,
            b"hvcC" => AtomType::HevcConfiguration,
            b"mdat" => AtomType::MediaData,
            b"mdhd" => AtomType::MediaHeader,
            b"mdia" => AtomType::Media,
            b"minf" => AtomType::MediaInfo,
            b"moov" => AtomType::Movie,
            b"mvhd" => AtomType::MovieHeader,
            b"skip" => AtomType::Skip,
            b"smhd" => AtomType::SoundMediaHeader,
            b"stbl" => AtomType::SampleTable,
            b"stco" => AtomType::ChunkOffset,
            b"stsc" => AtomType::SampleToChunk,
            b"stsd" => AtomType::SampleDescription,
            b"stsz" => AtomType::SampleSize,
            b"stts" => AtomType::TimeToSample,
            b"tkhd" => AtomType::TrackHeader,
            b"trak" => AtomType::Track,
            b"vmhd" => AtomType::VideoMediaHeader,
            b"wave" => AtomType::Wave,
            b"wide" => AtomType::Wide,
            _ => AtomType::Other(val),
        }
    }
}

/// Common atom header.
#[derive(Copy, Clone, Debug)]
pub struct AtomHeader {
    /// The atom type.
    atom_type: AtomType,
    /// The four character code the atom type was read from.
    tag: FourCc,
    /// The size of all read headers.
    header_len: u8,
    /// The position of the atom.
    atom_pos: u64,
    /// The total size of the atom including all headers.
    atom_len: Option<NonZeroU64>,
}

impl AtomHeader {
    /// Size of a standard atom header.
    pub const HEADER_SIZE: u8 = 8;
    /// Size of a standard atom header with a 64-bit size.
    pub const LARGE_HEADER_SIZE: u8 = AtomHeader::HEADER_SIZE + 8;

    /// Reads an atom header from the provided reader.
    pub fn read<B: ReadBytes>(reader: &mut B) -> Result<AtomHeader> {
        let atom_pos = reader.pos();

        let atom_len = u64::from(reader.read_be_u32()?);
        let tag = reader.read_quad_bytes()?;

        let (header_len, atom_len) = match atom_len {
            0 => {
                // An atom size of 0 indicates the atom spans the remainder of its parent.
                (AtomHeader::HEADER_SIZE, None)
            }
            1 => {
                // An atom size of 1 indicates a 64-bit atom size follows the tag.
                let large_atom_len = reader.read_be_u64()?;

                if large_atom_len < u64::from(AtomHeader::LARGE_HEADER_SIZE) {
                    return decode_error("mov: atom size is invalid");
                }

                (AtomHeader::LARGE_HEADER_SIZE, NonZeroU64::new(large_atom_len))
            }
            _ => {
                if atom_len < u64::from(AtomHeader::HEADER_SIZE) {
                    return decode_error("mov: atom size is invalid");
                }

                (AtomHeader::HEADER_SIZE, NonZeroU64::new(atom_len))
            }
        };

        Ok(AtomHeader {
            atom_type: AtomType::from(tag),
            tag: FourCc::new(tag),
            atom_pos,
            atom_len,
            header_len,
        })
    }

    /// Get the atom type.
    pub fn atom_type(&self) -> AtomType {
        self.atom_type
    }

    /// Get the four character code of the atom.
    pub fn tag(&self) -> FourCc {
        self.tag
    }

    /// Get the atom position.
    pub fn atom_pos(&self) -> u64 {
        self.atom_pos
    }

    /// If known, get the total atom size.
    pub fn atom_len(&self) -> Option<u64> {
        self.atom_len.map(NonZeroU64::get)
    }

    /// Get the size of the headers read so far.
    pub fn header_len(&self) -> u64 {
        u64::from(self.header_len)
    }

    /// If the atom size is known, get the total payload data size.
    pub fn data_len(&self) -> Option<u64> {
        self.atom_len.map(|atom_len| atom_len.get() - u64::from(self.header_len))
    }

    /// If the atom size is known, get the position one-past the end of the atom.
    pub fn end_pos(&self) -> Option<u64> {
        self.atom_len.map(|atom_len| self.atom_pos + atom_len.get())
    }

    /// Given a position, and if the atom size is known, calculate the amount of unread payload
    /// data.
    ///
    /// Panics if the position is before the atom payload. This is a coding error.
    pub fn data_unread_at(&self, pos: u64) -> Option<u64> {
        self.atom_len.map(|atom_len| {
            let data_pos = self.atom_pos + u64::from(self.header_len);
            let data_len = atom_len.get() - u64::from(self.header_len);

            if pos >= data_pos + data_len {
                0
            }
            else if pos >= data_pos {
                data_len - (pos - data_pos)
            }
            else {
                panic!("mov: current position preceeds atom payload");
            }
        })
    }

    /// Read the version and flags extended atom header fields.
    ///
    /// On success, consumes 4 bytes from the payload size.
    pub fn read_extended_header<B: ReadBytes>(&mut self, reader: &mut B) -> Result<(u8, u32)> {
        if let Some(data_len) = self.data_len() {
            if data_len < 4 {
                return decode_error("mov: atom too small for an extended header");
            }
        }

        let header = (reader.read_u8()?, reader.read_be_u24()?);
        self.header_len += 4;

        Ok(header)
    }

    /// Move the reader past the end of the atom, whether or not its payload was read.
    pub fn skip<B: ReadBytes>(&self, reader: &mut B) -> Result<()> {
        match self.end_pos() {
            Some(end) if reader.pos() <= end => {
                reader.ignore_bytes(end - reader.pos())?;
                Ok(())
            }
            Some(_) => decode_error("mov: overread atom"),
            None => decode_error("mov: cannot skip an atom of unknown size"),
        }
    }
}

/// Limits applied to variable-length payloads while reading atoms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReadLimits {
    /// The largest codec configuration record kept, in bytes. Larger records are skipped.
    pub max_codec_config_len: u64,
}

impl Default for ReadLimits {
    fn default() -> Self {
        ReadLimits { max_codec_config_len: avcc::MAX_CODEC_CONFIG_LEN }
    }
}

/// A structured atom that can be read, written, and dumped as text.
pub trait Atom: Sized {
    /// Read the atom payload following `header`.
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self>;

    /// Read the atom payload following `header`, applying `limits` to it and to its children.
    fn read_limited<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        _limits: &ReadLimits,
    ) -> Result<Self> {
        Self::read(reader, header)
    }

    /// Write the complete atom, header included.
    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()>;

    /// Render every field as text, indented by `indent` levels.
    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result;
}

/// Iterates over the child atoms of a parent atom, or over the top-level atoms of a file.
///
/// Any part of the current atom that was not read is skipped when advancing. A file that ends
/// partway through a trailing child ends the iteration instead of failing it.
pub struct AtomIterator<B: ReadBytes> {
    reader: B,
    len: Option<u64>,
    cur_atom: Option<AtomHeader>,
    base_pos: u64,
    next_atom_pos: u64,
    truncated: bool,
    limits: ReadLimits,
}

impl<B: ReadBytes> AtomIterator<B> {
    pub fn new_root(reader: B, len: Option<u64>) -> Self {
        let base_pos = reader.pos();

        AtomIterator {
            reader,
            len,
            cur_atom: None,
            base_pos,
            next_atom_pos: base_pos,
            truncated: false,
            limits: ReadLimits::default(),
        }
    }

    pub fn new(reader: B, parent: AtomHeader) -> Self {
        let base_pos = reader.pos();

        AtomIterator {
            reader,
            len: parent.data_unread_at(base_pos),
            cur_atom: None,
            base_pos,
            next_atom_pos: base_pos,
            truncated: false,
            limits: ReadLimits::default(),
        }
    }

    /// Apply `limits` to every child read by this iterator.
    pub fn with_limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &ReadLimits {
        &self.limits
    }

    pub fn into_inner(self) -> B {
        self.reader
    }

    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.reader
    }

    /// Returns true if the iteration ended because the file was truncated.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Report a missing mandatory child. The child is reported as truncated if the iteration
    /// ended early because the file was truncated.
    pub fn missing_atom<T>(&self, desc: &'static str) -> Result<T> {
        if self.truncated {
            truncated_error()
        }
        else {
            decode_error(desc)
        }
    }

    fn end_truncated(&mut self) -> Result<Option<AtomHeader>> {
        if !self.truncated {
            warn!("mov: file truncated at {}, ignoring the trailing atom", self.next_atom_pos);
        }
        self.truncated = true;
        self.cur_atom = None;
        Ok(None)
    }

    pub fn next(&mut self) -> Result<Option<AtomHeader>> {
        // Iteration ends after a truncation, or after an atom spanning the rest of the file.
        if self.truncated || self.next_atom_pos == u64::MAX {
            return Ok(None);
        }

        // Skip any remaining data in the current atom that was not read.
        let cur_pos = self.reader.pos();

        if cur_pos < self.next_atom_pos {
            match self.reader.ignore_bytes(self.next_atom_pos - cur_pos).map_err(Error::from) {
                Ok(()) => (),
                Err(Error::TruncatedFile) => return self.end_truncated(),
                Err(err) => return Err(err),
            }
        }
        else if cur_pos > self.next_atom_pos {
            // Either the atom's length was incorrect or an atom was overread.
            return decode_error("mov: overread atom");
        }

        // If len is specified, then do not read more than len bytes. Trailing bytes too short to
        // hold an atom header are padding.
        if let Some(len) = self.len {
            if self.next_atom_pos - self.base_pos + u64::from(AtomHeader::HEADER_SIZE) > len {
                return Ok(None);
            }
        }

        let atom = match AtomHeader::read(&mut self.reader) {
            Ok(atom) => atom,
            // A root iteration without a known length ends at the end of the file.
            Err(Error::TruncatedFile)
                if self.len.is_none() && self.reader.pos() == self.next_atom_pos =>
            {
                return Ok(None)
            }
            Err(Error::TruncatedFile) => return self.end_truncated(),
            Err(err) => return Err(err),
        };

        // Calculate the start position for the next atom (the exclusive end of the current atom).
        self.next_atom_pos = match atom.atom_len {
            // An atom with a length of zero spans the remainder of the parent. If the length of the
            // parent is unknown, use u64 max which ends the iteration on the next call.
            None => self.len.map(|l| self.base_pos + l).unwrap_or(u64::MAX),
            Some(atom_len) => {
                let end = self.next_atom_pos + atom_len.get();

                if let Some(len) = self.len {
                    if end > self.base_pos + len {
                        return decode_error("mov: child atom overruns its parent");
                    }
                }

                end
            }
        };

        self.cur_atom = Some(atom);

        Ok(self.cur_atom)
    }

    /// Read the current atom.
    ///
    /// Panics if there is no current atom, or if the current atom was already read.
    pub fn read_atom<A: Atom>(&mut self) -> Result<A> {
        match self.cur_atom.take() {
            Some(header) => A::read_limited(&mut self.reader, header, &self.limits),
            None => panic!("mov: no current atom to read"),
        }
    }

    /// Read the current atom. An atom that is cut short by the end of the file is ignored, and
    /// ends the iteration.
    pub fn read_optional_atom<A: Atom>(&mut self) -> Result<Option<A>> {
        match self.read_atom::<A>() {
            Ok(atom) => Ok(Some(atom)),
            Err(Error::TruncatedFile) => {
                self.end_truncated()?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Skip the current atom without reading it.
    pub fn skip_atom(&mut self) {
        if let Some(header) = self.cur_atom.take() {
            debug!("mov: skipping atom '{}' at position {}", header.tag(), header.atom_pos());
        }
    }
}

struct OpenAtom {
    pos: u64,
    large: bool,
}

/// `AtomWriter` writes nested atoms, back-patching each atom's size once its contents are written.
pub struct AtomWriter<W: WriteBytes> {
    writer: W,
    open: SmallVec<[OpenAtom; 8]>,
}

impl<W: WriteBytes> AtomWriter<W> {
    pub fn new(writer: W) -> Self {
        AtomWriter { writer, open: SmallVec::new() }
    }

    /// Begin an atom with a 32-bit size.
    pub fn begin(&mut self, tag: [u8; 4]) -> Result<()> {
        let pos = self.writer.pos();
        self.writer.write_be_u32(0)?;
        self.writer.write_buf(&tag)?;
        self.open.push(OpenAtom { pos, large: false });
        Ok(())
    }

    /// Begin an atom with a 64-bit size.
    pub fn begin_large(&mut self, tag: [u8; 4]) -> Result<()> {
        let pos = self.writer.pos();
        self.writer.write_be_u32(1)?;
        self.writer.write_buf(&tag)?;
        self.writer.write_be_u64(0)?;
        self.open.push(OpenAtom { pos, large: true });
        Ok(())
    }

    /// Begin an atom with a 32-bit size followed by the version and flags fields.
    pub fn begin_full(&mut self, tag: [u8; 4], version: u8, flags: u32) -> Result<()> {
        self.begin(tag)?;
        self.writer.write_u8(version)?;
        self.writer.write_be_u24(flags)?;
        Ok(())
    }

    /// End the most recently begun atom by writing its final size.
    ///
    /// Panics if there is no open atom. This is a coding error.
    pub fn end(&mut self) -> Result<()> {
        let atom = match self.open.pop() {
            Some(atom) => atom,
            None => panic!("mov: no open atom to end"),
        };
        let size = self.writer.pos() - atom.pos;

        if atom.large {
            self.writer.patch_be_u64(atom.pos + 8, size)?;
        }
        else {
            let size = match u32::try_from(size) {
                Ok(size) => size,
                Err(_) => return limit_error("mov: atom too large for a 32-bit size"),
            };
            self.writer.patch_be_u32(atom.pos, size)?;
        }

        Ok(())
    }

    /// The number of atoms begun but not yet ended.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: WriteBytes> WriteBytes for AtomWriter<W> {
    #[inline(always)]
    fn write_buf(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.writer.write_buf(buf)
    }

    #[inline(always)]
    fn patch_buf(&mut self, pos: u64, buf: &[u8]) -> std::io::Result<()> {
        self.writer.patch_buf(pos, buf)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.writer.pos()
    }
}

/// Read the unread remainder of an atom's payload, failing if it is longer than `max_len`.
pub(crate) fn read_remaining<B: ReadBytes>(
    reader: &mut B,
    header: &AtomHeader,
    max_len: u64,
    what: &'static str,
) -> Result<Box<[u8]>> {
    match header.data_unread_at(reader.pos()) {
        Some(len) if len <= max_len => Ok(reader.read_boxed_slice_exact(len as usize)?),
        Some(_) => limit_error(what),
        None => decode_error("mov: expected atom size to be known"),
    }
}

/// Dump an opaque payload as its length and leading bytes.
pub(crate) fn dump_payload(
    out: &mut dyn fmt::Write,
    indent: usize,
    name: &str,
    data: &[u8],
) -> fmt::Result {
    const PREVIEW_LEN: usize = 16;

    let mut hex = String::with_capacity(3 * PREVIEW_LEN);

    for (i, byte) in data.iter().take(PREVIEW_LEN).enumerate() {
        if i > 0 {
            hex.push(' ');
        }
        fmt::Write::write_fmt(&mut hex, format_args!("{:02x}", byte))?;
    }

    if data.len() > PREVIEW_LEN {
        hex.push_str(" ...");
    }

    dump_line!(out, indent, "{} ({} bytes) {}", name, data.len(), hex)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use moviola_core::errors::Error;
    use moviola_core::io::{BufReader, MediaSourceStream, ReadBytes};

    use super::{AtomHeader, AtomIterator, AtomType, AtomWriter};

    #[test]
    fn verify_header_sizes() {
        let buf = [0, 0, 0, 16, b'f', b'r', b'e', b'e'];
        let header = AtomHeader::read(&mut BufReader::new(&buf)).unwrap();
        assert_eq!(header.atom_type(), AtomType::Free);
        assert_eq!(header.atom_len(), Some(16));
        assert_eq!(header.data_len(), Some(8));

        let buf = [0, 0, 0, 1, b'm', b'd', b'a', b't', 0, 0, 0, 1, 0, 0, 0, 0];
        let header = AtomHeader::read(&mut BufReader::new(&buf)).unwrap();
        assert_eq!(header.atom_type(), AtomType::MediaData);
        assert_eq!(header.atom_len(), Some(0x1_0000_0000));
        assert_eq!(header.header_len(), 16);

        let buf = [0, 0, 0, 0, b'm', b'd', b'a', b't'];
        let header = AtomHeader::read(&mut BufReader::new(&buf)).unwrap();
        assert_eq!(header.atom_len(), None);

        let buf = [0, 0, 0, 7, b'f', b'r', b'e', b'e'];
        assert!(matches!(
            AtomHeader::read(&mut BufReader::new(&buf)),
            Err(Error::DecodeError(_))
        ));

        let buf = [0, 0, 0, 16, b'f', b'r'];
        assert!(matches!(AtomHeader::read(&mut BufReader::new(&buf)), Err(Error::TruncatedFile)));
    }

    #[test]
    fn verify_writer_back_patches_sizes() {
        let mut writer = AtomWriter::new(Vec::new());

        writer.begin(*b"moov").unwrap();
        writer.begin_full(*b"free", 0, 0).unwrap();
        writer.end().unwrap();
        writer.begin_large(*b"mdat").unwrap();
        moviola_core::io::WriteBytes::write_buf(&mut writer, &[1, 2, 3]).unwrap();
        writer.end().unwrap();
        writer.end().unwrap();

        assert_eq!(writer.depth(), 0);

        let buf = writer.into_inner();
        assert_eq!(buf.len(), 8 + 12 + 19);
        assert_eq!(&buf[0..8], &[0, 0, 0, 39, b'm', b'o', b'o', b'v']);
        assert_eq!(&buf[8..16], &[0, 0, 0, 12, b'f', b'r', b'e', b'e']);
        assert_eq!(&buf[20..28], &[0, 0, 0, 1, b'm', b'd', b'a', b't']);
        assert_eq!(&buf[28..36], &[0, 0, 0, 0, 0, 0, 0, 19]);
    }

    #[test]
    fn verify_iterator_skips_unread_children() {
        let buf: Vec<u8> = [
            &[0, 0, 0, 12, b'f', b'r', b'e', b'e', 1, 2, 3, 4][..],
            &[0, 0, 0, 9, b'x', b'y', b'z', b'w', 5][..],
            &[0, 0, 0, 8, b's', b'k', b'i', b'p'][..],
        ]
        .concat();

        let mss = MediaSourceStream::new(Box::new(Cursor::new(buf)), Default::default());
        let mut iter = AtomIterator::new_root(mss, None);

        let mut types = Vec::new();

        while let Some(header) = iter.next().unwrap() {
            types.push(header.atom_type());
        }

        assert_eq!(
            types,
            vec![AtomType::Free, AtomType::Other(*b"xyzw"), AtomType::Skip]
        );
        assert!(!iter.is_truncated());
        assert_eq!(iter.inner_mut().pos(), 29);
    }

    #[test]
    fn verify_iterator_tolerates_truncated_trailing_atom() {
        let buf: Vec<u8> = [
            &[0, 0, 0, 12, b'f', b'r', b'e', b'e', 1, 2, 3, 4][..],
            &[0, 0, 0, 64, b'f', b'r', b'e', b'e', 5, 6][..],
        ]
        .concat();

        let mss = MediaSourceStream::new(Box::new(Cursor::new(buf)), Default::default());
        let mut iter = AtomIterator::new_root(mss, None);

        assert!(iter.next().unwrap().is_some());
        assert!(iter.next().unwrap().is_some());
        assert!(iter.next().unwrap().is_none());
        assert!(iter.is_truncated());
    }

    #[test]
    fn verify_iterator_clean_end_after_skipped_payload() {
        let buf: Vec<u8> = [
            &[0, 0, 0, 12, b'f', b'r', b'e', b'e', 1, 2, 3, 4][..],
            &[0, 0, 0, 1, b'm', b'd', b'a', b't', 0, 0, 0, 0, 0, 0, 0, 20][..],
            &[5, 6, 7, 8][..],
        ]
        .concat();

        let mss = MediaSourceStream::new(Box::new(Cursor::new(buf)), Default::default());
        let mut iter = AtomIterator::new_root(mss, None);

        assert_eq!(iter.next().unwrap().map(|h| h.atom_type()), Some(AtomType::Free));
        assert_eq!(iter.next().unwrap().map(|h| h.atom_type()), Some(AtomType::MediaData));
        assert!(iter.next().unwrap().is_none());
        assert!(!iter.is_truncated());
        assert!(matches!(iter.missing_atom::<()>("missing"), Err(Error::DecodeError(_))));
    }
}
