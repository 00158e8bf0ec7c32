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
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

/// Time-to-sample atom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SttsAtom {
    pub entries: Vec<SttsEntry>,
}

impl SttsAtom {
    /// Append one sample of duration `delta`, extending the last entry if it has the same delta.
    pub fn push_sample(&mut self, delta: u32) {
        match self.entries.last_mut() {
            Some(last) if last.sample_delta == delta && last.sample_count < u32::MAX => {
                last.sample_count += 1;
            }
            _ => self.entries.push(SttsEntry { sample_count: 1, sample_delta: delta }),
        }
    }

    /// The total number of samples.
    pub fn sample_count(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.sample_count)).sum()
    }

    /// The sum of all sample durations.
    pub fn total_duration(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.sample_count) * u64::from(e.sample_delta)).sum()
    }

    /// Get the sample containing time `time`, and the time at which that sample starts. If `time`
    /// is beyond the last sample, the returned sample is one-past the last sample. Complexity is
    /// O(N).
    pub fn find_sample_for_time(&self, time: u64) -> (u64, u64) {
        let mut time_accum = 0;
        let mut sample_accum = 0;

        for entry in &self.entries {
            let delta = u64::from(entry.sample_delta);
            let entry_duration = u64::from(entry.sample_count) * delta;

            if time < time_accum + entry_duration {
                // The entry duration is non-zero here, so the delta is too.
                let offset = (time - time_accum) / delta;
                return (sample_accum + offset, time_accum + offset * delta);
            }

            time_accum += entry_duration;
            sample_accum += u64::from(entry.sample_count);
        }

        (sample_accum, time_accum)
    }
}

impl Atom for SttsAtom {
    fn read<B: ReadBytes>(reader: &mut B, mut header: AtomHeader) -> Result<Self> {
        let (_, _) = header.read_extended_header(reader)?;

        // minimum data size is 4 bytes
        let len = match header.data_len() {
            Some(len) if len >= 4 => len,
            Some(_) => return decode_error("mov (stts): atom size is less than 16 bytes"),
            None => return decode_error("mov (stts): expected atom size to be known"),
        };

        let entry_count = reader.read_be_u32()?;
        if u64::from(entry_count) != (len - 4) / 8 {
            return decode_error("mov (stts): invalid entry count");
        }

        let mut entries = Vec::new();
        entries.try_reserve_exact(entry_count as usize)?;

        for _ in 0..entry_count {
            let sample_count = reader.read_be_u32()?;
            let sample_delta = reader.read_be_u32()?;

            entries.push(SttsEntry { sample_count, sample_delta });
        }

        Ok(SttsAtom { entries })
    }

    fn write<W: WriteBytes>(&self, writer: &mut AtomWriter<W>) -> Result<()> {
        writer.begin_full(*b"stts", 0, 0)?;
        writer.write_be_u32(self.entries.len() as u32)?;

        for entry in &self.entries {
            writer.write_be_u32(entry.sample_count)?;
            writer.write_be_u32(entry.sample_delta)?;
        }

        writer.end()
    }

    fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "time to sample (stts)")?;
        dump_line!(out, indent + 1, "entries {}", self.entries.len())?;

        for entry in &self.entries {
            dump_line!(
                out,
                indent + 2,
                "sample_count {} sample_delta {}",
                entry.sample_count,
                entry.sample_delta
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SttsAtom, SttsEntry};

    #[test]
    fn verify_find_sample_for_time() {
        let stts = SttsAtom {
            entries: vec![
                SttsEntry { sample_count: 4, sample_delta: 1024 },
                SttsEntry { sample_count: 0, sample_delta: 7 },
                SttsEntry { sample_count: 2, sample_delta: 512 },
            ],
        };

        assert_eq!(stts.find_sample_for_time(0), (0, 0));
        assert_eq!(stts.find_sample_for_time(1023), (0, 0));
        assert_eq!(stts.find_sample_for_time(3000), (2, 2048));
        assert_eq!(stts.find_sample_for_time(4096), (4, 4096));
        assert_eq!(stts.find_sample_for_time(4700), (5, 4608));
        assert_eq!(stts.find_sample_for_time(9999), (6, 5120));
        assert_eq!(stts.total_duration(), 5120);
    }

    #[test]
    fn verify_push_sample_merges_runs() {
        let mut stts = SttsAtom::default();

        for delta in [20, 20, 20, 40, 20] {
            stts.push_sample(delta);
        }

        assert_eq!(stts.entries.len(), 3);
        assert_eq!(stts.entries[0], SttsEntry { sample_count: 3, sample_delta: 20 });
        assert_eq!(stts.sample_count(), 5);
    }
}
