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

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StscEntry {
    /// The first chunk of the run, indexed from 1.
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_desc_id: u32,
}

/// Sample-to-chunk atom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StscAtom {
    pub entries: Vec<StscEntry>,
}

impl StscAtom {
    /// Record that chunk `chunk` (indexed from 1) holds `samples` samples. Chunks must be
    /// recorded in order. A new entry is only added when the samples per chunk changes.
    pub fn push_chunk(&mut self, chunk: u32, samples: u32) {
        match self.entries.last() {
            Some(last) if last.samples_per_chunk == samples => (),
            _ => self.entries.push(StscEntry {
                first_chunk: chunk,
                samples_per_chunk: samples,
                sample_desc_id: 1,
            }),
        }
    }

    /// Get the chunk (indexed from 0) containing `sample`, and the first sample of that chunk.
    /// `num_chunks` bounds the final run of chunks. Complexity is O(N).
    pub fn find_chunk_for_sample(&self, sample: u64, num_chunks: u64) -> Option<(u64, u64)> {
        let mut first_sample = 0;

        for (i, entry) in self.entries.iter().enumerate() {
            let first_chunk = u64::from(entry.first_chunk) - 1;

            let end_chunk = match self.entries.get(i + 1) {
                Some(next) => u64::from(next.first_chunk) - 1,
                None => num_chunks,
            };

            let per_chunk = u64::from(entry.samples_per_chunk);
            let run_samples = end_chunk.saturating_sub(first_chunk) * per_chunk;

            if sample < first_sample + run_samples {
                let chunk_offset = (sample - first_sample) / per_chunk;

                return Some((first_chunk + chunk_offset, first_sample + chunk_offset * per_chunk));
            }

            first_sample += run_samples;
        }

        None
    }
}

impl Atom for StscAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (_, _) = header.read_extended_header(reader)?;

        // minimum data size is 4 bytes
        let len = match header.data_len() {
            Some(len) if len >= 4 => len,
            Some(_) => return decode_error("mov (stsc): atom size is less than 16 bytes"),
            None => return decode_error("mov (stsc): expected atom size to be known"),
        };

        let entry_count = reader.read_be_u32()?;
        if u64::from(entry_count) != (len - 4) / 12 {
            return decode_error("mov (stsc): invalid entry count");
        }

        let mut entries: Vec<StscEntry> = Vec::new();
        entries.try_reserve_exact(entry_count as usize)?;

        for _ in 0..entry_count {
            let entry = StscEntry {
                first_chunk: reader.read_be_u32()?,
                samples_per_chunk: reader.read_be_u32()?,
                sample_desc_id: reader.read_be_u32()?,
            };

            if entry.first_chunk == 0 {
                return decode_error("mov (stsc): entry's first chunk should be indexed from 1");
            }

            if let Some(prev) = entries.last() {
                if entry.first_chunk <= prev.first_chunk {
                    return decode_error("mov (stsc): entry's first chunk not monotonic");
                }
            }

            entries.push(entry);
        }

        Ok(StscAtom { entries })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin_full(*b"stsc", 0, 0)?;
        writer.write_be_u32(self.entries.len() as u32)?;

        for entry in &self.entries {
            writer.write_be_u32(entry.first_chunk)?;
            writer.write_be_u32(entry.samples_per_chunk)?;
            writer.write_be_u32(entry.sample_desc_id)?;
        }

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "sample to chunk (stsc)")?;
        dump_line!(out, indent + 1, "entries {}", self.entries.len())?;

        for entry in &self.entries {
            dump_line!(
                out,
                indent + 2,
                "first_chunk {} samples_per_chunk {} sample_desc_id {}",
                entry.first_chunk,
                entry.samples_per_chunk,
                entry.sample_desc_id
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{StscAtom, StscEntry};

    fn entry(first_chunk: u32, samples_per_chunk: u32) -> StscEntry {
        StscEntry { first_chunk, samples_per_chunk, sample_desc_id: 1 }
    }

    #[test]
    fn verify_find_chunk_for_sample() {
        // Chunks 0-1 hold 3 samples, chunks 2-4 hold 1 sample.
        let stsc = StscAtom { entries: vec![entry(1, 3), entry(3, 1)] };

        assert_eq!(stsc.find_chunk_for_sample(0, 5), Some((0, 0)));
        assert_eq!(stsc.find_chunk_for_sample(4, 5), Some((1, 3)));
        assert_eq!(stsc.find_chunk_for_sample(6, 5), Some((2, 6)));
        assert_eq!(stsc.find_chunk_for_sample(8, 5), Some((4, 8)));
        assert_eq!(stsc.find_chunk_for_sample(9, 5), None);
    }

    #[test]
    fn verify_push_chunk_merges_runs() {
        let mut stsc = StscAtom::default();

        stsc.push_chunk(1, 1);
        stsc.push_chunk(2, 1);
        stsc.push_chunk(3, 4);

        assert_eq!(stsc.entries, vec![entry(1, 1), entry(3, 4)]);
    }
}
