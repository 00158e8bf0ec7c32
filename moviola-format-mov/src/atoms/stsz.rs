// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::{decode_error, Result};
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_line, Atom, AtomHeader, AtomWriter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleSize {
    Constant(u32),
    Variable(Vec<u32>),
}

/// Sample size atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StszAtom {
    /// The total number of samples.
    pub sample_count: u32,
    /// A vector of `sample_count` sample sizes, or a constant size for all samples.
    pub sample_sizes: SampleSize,
}

impl Default for StszAtom {
    fn default() -> Self {
        StszAtom { sample_count: 0, sample_sizes: SampleSize::Variable(Vec::new()) }
    }
}

impl StszAtom {
    /// Get the size of a sample, or `None` if the sample does not exist.
    pub fn sample_size(&self, sample: u64) -> Option<u32> {
        if sample >= u64::from(self.sample_count) {
            return None;
        }

        match &self.sample_sizes {
            SampleSize::Constant(size) => Some(*size),
            SampleSize::Variable(sizes) => sizes.get(sample as usize).copied(),
        }
    }

    /// Append a sample of `size` bytes.
    pub fn push_sample(&mut self, size: u32) {
        match &mut self.sample_sizes {
            SampleSize::Constant(constant) if *constant == size => (),
            SampleSize::Constant(constant) => {
                let sizes = vec![*constant; self.sample_count as usize];
                self.sample_sizes = SampleSize::Variable(sizes);
                self.push_sample(size);
                return;
            }
            SampleSize::Variable(sizes) => sizes.push(size),
        }

        self.sample_count += 1;
    }
}

impl Atom for StszAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (_, _) = header.read_extended_header(reader)?;

        // minimum data size is 8 bytes
        let len = match header.data_len() {
            Some(len) if len >= 8 => len,
            Some(_) => return decode_error("mov (stsz): atom size is less than 20 bytes"),
            None => return decode_error("mov (stsz): expected atom size to be known"),
        };

        let sample_size = reader.read_be_u32()?;
        let sample_count = reader.read_be_u32()?;

        let sample_sizes = if sample_size == 0 {
            if u64::from(sample_count) != (len - 8) / 4 {
                return decode_error("mov (stsz): invalid sample count");
            }

            let mut entries = Vec::new();
            entries.try_reserve_exact(sample_count as usize)?;

            for _ in 0..sample_count {
                entries.push(reader.read_be_u32()?);
            }

            SampleSize::Variable(entries)
        }
        else {
            SampleSize::Constant(sample_size)
        };

        Ok(StszAtom { sample_count, sample_sizes })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin_full(*b"stsz", 0, 0)?;

        match &self.sample_sizes {
            SampleSize::Constant(size) => {
                writer.write_be_u32(*size)?;
                writer.write_be_u32(self.sample_count)?;
            }
            SampleSize::Variable(sizes) => {
                writer.write_be_u32(0)?;
                writer.write_be_u32(self.sample_count)?;

                for size in sizes {
                    writer.write_be_u32(*size)?;
                }
            }
        }

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "sample size (stsz)")?;
        dump_line!(out, indent + 1, "sample_count {}", self.sample_count)?;

        match &self.sample_sizes {
            SampleSize::Constant(size) => dump_line!(out, indent + 1, "sample_size {}", size),
            SampleSize::Variable(sizes) => {
                for (i, size) in sizes.iter().enumerate() {
                    dump_line!(out, indent + 2, "{} {}", i, size)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SampleSize, StszAtom};

    #[test]
    fn verify_sample_size_lookup() {
        let stsz = StszAtom { sample_count: 3, sample_sizes: SampleSize::Constant(417) };

        assert_eq!(stsz.sample_size(2), Some(417));
        assert_eq!(stsz.sample_size(3), None);

        let mut stsz = StszAtom::default();
        stsz.push_sample(10);
        stsz.push_sample(20);

        assert_eq!(stsz.sample_size(1), Some(20));
        assert_eq!(stsz.sample_size(2), None);
    }

    #[test]
    fn verify_push_onto_constant() {
        let mut stsz = StszAtom { sample_count: 2, sample_sizes: SampleSize::Constant(8) };

        stsz.push_sample(8);
        assert_eq!(stsz.sample_sizes, SampleSize::Constant(8));

        stsz.push_sample(9);
        assert_eq!(stsz.sample_sizes, SampleSize::Variable(vec![8, 8, 8, 9]));
        assert_eq!(stsz.sample_count, 4);
    }
}
