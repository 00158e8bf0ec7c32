// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `formats` module defines the services a container provides to the buffers in this crate.

/// A `SampleTable` maps media time and compressed sample (frame) indicies to positions within a
/// track's stored data.
///
/// A container's track model implements this trait. Buffers such as
/// [`VbrBuffer`](crate::audio::vbr::VbrBuffer) only ever query it.
pub trait SampleTable {
    /// Find the compressed sample containing the media time `time`. Returns the index of the
    /// sample and the media time at which that sample starts, which is always less-than or
    /// equal-to `time`. Times past the end of the table resolve to one-past the last sample.
    fn time_to_sample(&self, time: u64) -> (u64, u64);

    /// Get the absolute byte offset of the compressed sample with index `sample`, or `None` if
    /// the index is invalid.
    fn sample_to_offset(&self, sample: u64) -> Option<u64>;

    /// Get the size in bytes of the compressed sample with index `sample`, or `None` if the index
    /// is invalid.
    fn sample_size(&self, sample: u64) -> Option<u32>;
}

impl<T: SampleTable + ?Sized> SampleTable for &T {
    fn time_to_sample(&self, time: u64) -> (u64, u64) {
        (**self).time_to_sample(time)
    }

    fn sample_to_offset(&self, sample: u64) -> Option<u64> {
        (**self).sample_to_offset(sample)
    }

    fn sample_size(&self, sample: u64) -> Option<u32> {
        (**self).sample_size(sample)
    }
}
