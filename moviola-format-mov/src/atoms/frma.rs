// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::Result;
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_payload, read_remaining, Atom, AtomHeader, AtomWriter};

/// The largest format wrapper payload that is read.
const MAX_FRMA_LEN: u64 = 1 << 16;

/// Original format atom. The payload is kept opaque.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrmaAtom {
    pub data: Box<[u8]>,
}

impl FrmaAtom {
    pub fn new(data: &[u8]) -> Self {
        FrmaAtom { data: data.into() }
    }
}

impl Atom for FrmaAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        let data = read_remaining(reader, &header, MAX_FRMA_LEN, "mov (frma): atom too large")?;
        Ok(FrmaAtom { data })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(*b"frma")?;
        writer.write_buf(&self.data)?;
        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_payload(out, indent, "original format (frma)", &self.data)
    }
}
