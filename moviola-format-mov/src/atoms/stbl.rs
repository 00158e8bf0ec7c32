// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use log::warn;

use moviola_core::errors::Result;
use moviola_core::formats::SampleTable;
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::{dump_line, Atom, AtomHeader, AtomIterator, AtomType, AtomWriter, ReadLimits};
use crate::atoms::{StcoAtom, StscAtom, StsdAtom, StszAtom, SttsAtom};

/// Sample table atom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StblAtom {
    pub stsd: StsdAtom,
    pub stts: SttsAtom,
    pub stsc: StscAtom,
    pub stsz: StszAtom,
    pub stco: StcoAtom,
}

impl StblAtom {
    /// The number of samples in the table.
    pub fn sample_count(&self) -> u64 {
        u64::from(self.stsz.sample_count)
    }

    /// Append a sample of `size` bytes and `duration` media time units, stored as a chunk of its
    /// own at `offset`.
    pub fn push_sample_chunk(&mut self, offset: u64, size: u32, duration: u32) {
        self.stco.chunk_offsets.push(offset);
        let chunk = self.stco.chunk_offsets.len() as u32;

        self.stsc.push_chunk(chunk, 1);
        self.stsz.push_sample(size);
        self.stts.push_sample(duration);
    }
}

impl SampleTable for StblAtom {
    fn time_to_sample(&self, time: u64) -> (u64, u64) {
        self.stts.find_sample_for_time(time)
    }

    fn sample_to_offset(&self, sample: u64) -> Option<u64> {
        if sample >= self.sample_count() {
            return None;
        }

        let num_chunks = self.stco.chunk_offsets.len() as u64;
        let (chunk, first_sample) = self.stsc.find_chunk_for_sample(sample, num_chunks)?;

        let mut offset = *self.stco.chunk_offsets.get(chunk as usize)?;

        // Samples within a chunk are stored contiguously.
        for prev in first_sample..sample {
            offset += u64::from(self.stsz.sample_size(prev)?);
        }

        Some(offset)
    }

    fn sample_size(&self, sample: u64) -> Option<u32> {
        self.stsz.sample_size(sample)
    }
}

impl Atom for StblAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        Self::read_limited(reader, header, &ReadLimits::default())
    }

    fn read_limited<B: ReadBytes>(
        reader: &mut B,
        header: AtomHeader,
        limits: &ReadLimits,
    ) -> Result<Self> {
        let mut iter = AtomIterator::new(reader, header).with_limits(*limits);

        let mut stsd = None;
        let mut stts = None;
        let mut stsc = None;
        let mut stsz = None;
        let mut stco = None;

        while let Some(header) = iter.next()? {
            match header.atom_type() {
                AtomType::SampleDescription => {
                    stsd = Some(iter.read_atom::<StsdAtom>()?);
                }
                AtomType::TimeToSample => {
                    stts = Some(iter.read_atom::<SttsAtom>()?);
                }
                AtomType::SampleToChunk => {
                    stsc = Some(iter.read_atom::<StscAtom>()?);
                }
                AtomType::SampleSize => {
                    stsz = Some(iter.read_atom::<StszAtom>()?);
                }
                AtomType::ChunkOffset | AtomType::ChunkOffset64 => {
                    stco = Some(iter.read_atom::<StcoAtom>()?);
                }
                _ => iter.skip_atom(),
            }
        }

        let stsd = match stsd {
            Some(stsd) => stsd,
            None => return iter.missing_atom("mov (stbl): missing stsd atom"),
        };

        let stts = match stts {
            Some(stts) => stts,
            None => return iter.missing_atom("mov (stbl): missing stts atom"),
        };

        let stsc = match stsc {
            Some(stsc) => stsc,
            None => return iter.missing_atom("mov (stbl): missing stsc atom"),
        };

        let stsz = match stsz {
            Some(stsz) => stsz,
            None => return iter.missing_atom("mov (stbl): missing stsz atom"),
        };

        let stco = stco.unwrap_or_else(|| {
            warn!("mov (stbl): missing stco or co64 atom");
            Default::default()
        });

        Ok(StblAtom { stsd, stts, stsc, stsz, stco })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin(*b"stbl")?;
        self.stsd.write(writer)?;
        self.stts.write(writer)?;
        self.stsc.write(writer)?;
        self.stsz.write(writer)?;
        self.stco.write(writer)?;
        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "sample table (stbl)")?;
        self.stsd.dump(out, indent + 1)?;
        self.stts.dump(out, indent + 1)?;
        self.stsc.dump(out, indent + 1)?;
        self.stsz.dump(out, indent + 1)?;
        self.stco.dump(out, indent + 1)
    }
}

#[cfg(test)]
mod tests {
    use moviola_core::formats::SampleTable;

    use super::StblAtom;
    use crate::atoms::{SampleSize, StscEntry, SttsEntry};

    #[test]
    fn verify_single_sample_chunks() {
        let mut stbl = StblAtom::default();
        stbl.push_sample_chunk(100, 10, 1024);
        stbl.push_sample_chunk(150, 20, 1024);
        stbl.push_sample_chunk(400, 30, 512);

        assert_eq!(stbl.sample_count(), 3);
        assert_eq!(stbl.stsc.entries.len(), 1);

        assert_eq!(stbl.sample_to_offset(0), Some(100));
        assert_eq!(stbl.sample_to_offset(1), Some(150));
        assert_eq!(stbl.sample_to_offset(2), Some(400));
        assert_eq!(stbl.sample_to_offset(3), None);

        assert_eq!(stbl.sample_size(2), Some(30));
        assert_eq!(stbl.time_to_sample(2047), (1, 1024));
        assert_eq!(stbl.time_to_sample(2048), (2, 2048));
    }

    #[test]
    fn verify_multi_sample_chunks() {
        let mut stbl = StblAtom::default();

        // Two chunks of 3 samples, then one chunk of 2 samples.
        stbl.stco.chunk_offsets = vec![1000, 2000, 3000];
        stbl.stsc.entries = vec![
            StscEntry { first_chunk: 1, samples_per_chunk: 3, sample_desc_id: 1 },
            StscEntry { first_chunk: 3, samples_per_chunk: 2, sample_desc_id: 1 },
        ];
        stbl.stsz.sample_count = 8;
        stbl.stsz.sample_sizes = SampleSize::Constant(7);
        stbl.stts.entries = vec![SttsEntry { sample_count: 8, sample_delta: 10 }];

        assert_eq!(stbl.sample_to_offset(0), Some(1000));
        assert_eq!(stbl.sample_to_offset(2), Some(1014));
        assert_eq!(stbl.sample_to_offset(3), Some(2000));
        assert_eq!(stbl.sample_to_offset(7), Some(3007));
        assert_eq!(stbl.sample_to_offset(8), None);
    }
}
