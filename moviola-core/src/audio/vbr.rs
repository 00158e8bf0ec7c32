// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A variable-bitrate audio buffer that bridges frame-granular compressed storage and
//! sample-granular, randomly seekable playback.

use std::cmp;
use std::io::{Seek, SeekFrom};

use log::info;

use crate::errors::{capacity_error, Error, Result};
use crate::formats::SampleTable;
use crate::io::ReadBytes;

/// The number of decoded samples, per channel, held by a [`VbrBuffer`].
pub const MAX_VBR_BUFFER: usize = 0x10_0000;

/// Step `ptr` by `delta` slots around a ring of `capacity` slots.
#[inline(always)]
fn ring_index(ptr: usize, delta: isize, capacity: usize) -> usize {
    (ptr as isize + delta).rem_euclid(capacity as isize) as usize
}

/// A `VbrBuffer` holds the compressed bytes of one audio track that are waiting to be decoded, and
/// a ring of the most recently decoded samples.
///
/// Compressed audio can only be decoded a whole frame at a time, so a request for an arbitrary
/// sample position is served in three steps:
///
///  1. [`VbrBuffer::align`] checks if the ring already covers the requested position. If not, the
///     buffer snaps to the frame at or before the position and discards the ring.
///  2. The caller alternates [`VbrBuffer::read_next_frame`], its decoder, [`VbrBuffer::shift`],
///     and [`VbrBuffer::store_decoded_f32`] until [`VbrBuffer::end`] reaches the end of the
///     request.
///  3. [`VbrBuffer::copy_out_f32`] copies one channel out of the ring.
///
/// The ring always holds the `size()` samples ending at `end()`. Older samples are overwritten.
pub struct VbrBuffer {
    channels: usize,
    capacity: usize,
    /// Compressed bytes not yet consumed by the decoder.
    input: Vec<u8>,
    /// One plane of decoded samples per channel, each `capacity` samples long.
    output: Vec<Vec<f32>>,
    /// The sample position one-past the newest sample in the ring.
    buffer_end: u64,
    /// The number of valid samples in the ring.
    buffer_size: usize,
    /// The ring slot the next decoded sample is written to.
    buffer_ptr: usize,
    /// The index of the next compressed frame to read.
    sample: u64,
}

impl Default for VbrBuffer {
    fn default() -> Self {
        VbrBuffer::new()
    }
}

impl VbrBuffer {
    /// Instantiate a new `VbrBuffer` with a ring of [`MAX_VBR_BUFFER`] samples per channel. No
    /// ring is allocated until [`VbrBuffer::init`] is called.
    pub fn new() -> Self {
        VbrBuffer::with_capacity(MAX_VBR_BUFFER)
    }

    /// Instantiate a new `VbrBuffer` with a ring of `capacity` samples per channel.
    ///
    /// Panics if `capacity` is 0.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "vbr: ring capacity must be non-zero");

        VbrBuffer {
            channels: 0,
            capacity,
            input: Vec::new(),
            output: Vec::new(),
            buffer_end: 0,
            buffer_size: 0,
            buffer_ptr: 0,
            sample: 0,
        }
    }

    /// Allocate the ring for `channels` channels. The ring is only reallocated, and its contents
    /// discarded, if the channel count changes.
    pub fn init(&mut self, channels: usize) -> Result<()> {
        if channels == self.channels {
            return Ok(());
        }

        let mut output = Vec::new();
        output.try_reserve_exact(channels)?;

        for _ in 0..channels {
            let mut plane = Vec::new();
            plane.try_reserve_exact(self.capacity)?;
            plane.resize(self.capacity, 0.0);
            output.push(plane);
        }

        self.output = output;
        self.channels = channels;
        self.buffer_size = 0;
        self.buffer_ptr = 0;

        Ok(())
    }

    /// The number of channels the ring was allocated for.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// The ring capacity in samples per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The sample position one-past the newest sample in the ring.
    pub fn end(&self) -> u64 {
        self.buffer_end
    }

    /// The sample position of the oldest sample in the ring.
    pub fn start(&self) -> u64 {
        self.buffer_end - self.buffer_size as u64
    }

    /// The number of valid samples in the ring.
    pub fn size(&self) -> usize {
        self.buffer_size
    }

    /// The index of the next compressed frame [`VbrBuffer::read_next_frame`] will read.
    pub fn sample(&self) -> u64 {
        self.sample
    }

    /// The compressed bytes waiting to be decoded.
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    /// The number of compressed bytes waiting to be decoded.
    pub fn input_size(&self) -> usize {
        self.input.len()
    }

    /// The allocated size of the compressed staging buffer.
    pub fn input_allocation(&self) -> usize {
        self.input.capacity()
    }

    /// Prepare to serve `count` samples starting at sample position `start`.
    ///
    /// If `start` is already covered by the ring, nothing changes and `false` is returned.
    /// Otherwise the buffer snaps to the compressed frame at or before `start`, discards the ring
    /// and any staged input, and returns `true`. Decoding then resumes from that frame.
    pub fn align<T: SampleTable>(&mut self, table: &T, start: u64, count: usize) -> Result<bool> {
        if count > self.capacity {
            return capacity_error(count, self.capacity);
        }

        if start >= self.start() && start <= self.buffer_end {
            return Ok(false);
        }

        let (sample, sample_start) = table.time_to_sample(start);

        info!(
            "vbr: seeking to frame {} at sample {} for a request at sample {}",
            sample, sample_start, start
        );

        self.sample = sample;
        self.buffer_end = sample_start;
        self.buffer_size = 0;
        self.input.clear();

        Ok(true)
    }

    /// Append the next compressed frame to the staging buffer and advance to the following frame.
    /// Returns the number of bytes read.
    ///
    /// Fails with [`Error::InvalidSample`] if the sample table cannot resolve the frame, which
    /// usually means the end of the track was reached. On any failure the staging buffer is left
    /// as it was.
    pub fn read_next_frame<R, T>(&mut self, reader: &mut R, table: &T) -> Result<usize>
    where
        R: ReadBytes + Seek,
        T: SampleTable,
    {
        let size = table.sample_size(self.sample).ok_or(Error::InvalidSample(self.sample))?;
        let offset = table.sample_to_offset(self.sample).ok_or(Error::InvalidSample(self.sample))?;

        let size = size as usize;
        let start = self.input.len();

        self.input.try_reserve(size)?;

        reader.seek(SeekFrom::Start(offset))?;

        self.input.resize(start + size, 0);

        if let Err(err) = reader.read_buf_exact(&mut self.input[start..]) {
            self.input.truncate(start);
            return Err(err.into());
        }

        self.sample += 1;

        Ok(size)
    }

    /// Discard the first `consumed` bytes of the staging buffer after the decoder consumed them.
    /// The allocation is kept for the next frame.
    pub fn shift(&mut self, consumed: usize) {
        if consumed >= self.input.len() {
            self.input.clear();
        }
        else {
            self.input.copy_within(consumed.., 0);
            self.input.truncate(self.input.len() - consumed);
        }
    }

    /// Store interleaved decoded samples into the ring. A trailing partial frame is ignored.
    pub fn store_decoded_f32(&mut self, samples: &[f32]) {
        self.store_with(samples, |s| s);
    }

    /// Store interleaved decoded 16-bit samples into the ring, normalizing them by 1/32768. A
    /// trailing partial frame is ignored.
    pub fn store_decoded_i16(&mut self, samples: &[i16]) {
        self.store_with(samples, |s| f32::from(s) / 32768.0);
    }

    fn store_with<S: Copy, F: Fn(S) -> f32>(&mut self, samples: &[S], conv: F) {
        if self.channels == 0 {
            return;
        }

        let mut frames = 0;

        for frame in samples.chunks_exact(self.channels) {
            for (plane, &sample) in self.output.iter_mut().zip(frame) {
                plane[self.buffer_ptr] = conv(sample);
            }
            self.buffer_ptr = ring_index(self.buffer_ptr, 1, self.capacity);
            frames += 1;
        }

        self.buffer_end += frames as u64;
        self.buffer_size = cmp::min(self.buffer_size + frames, self.capacity);
    }

    /// Copy `out.len()` samples of `channel`, starting at sample position `start`, out of the ring.
    ///
    /// Only samples resident in the ring are copied. The remainder of `out` is filled with
    /// silence. Returns the number of resident samples copied.
    ///
    /// Fails with [`Error::CapacityExceeded`] without writing anything if `out` is longer than the
    /// ring. Panics if `channel` is out of range.
    pub fn copy_out_f32(&self, start: u64, out: &mut [f32], channel: usize) -> Result<usize> {
        self.copy_with(start, out, channel, 0.0, |s| s)
    }

    /// Copy `out.len()` samples of `channel` out of the ring as 16-bit samples, scaling by 32767.
    /// Behaves like [`VbrBuffer::copy_out_f32`] otherwise.
    pub fn copy_out_i16(&self, start: u64, out: &mut [i16], channel: usize) -> Result<usize> {
        self.copy_with(start, out, channel, 0, |s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16)
    }

    fn copy_with<S: Copy, F: Fn(f32) -> S>(
        &self,
        start: u64,
        out: &mut [S],
        channel: usize,
        silence: S,
        conv: F,
    ) -> Result<usize> {
        if out.len() > self.capacity {
            return capacity_error(out.len(), self.capacity);
        }

        assert!(channel < self.channels, "vbr: channel index out of range");

        let available = if start >= self.start() && start <= self.buffer_end {
            (self.buffer_end - start) as usize
        }
        else {
            0
        };

        let count = cmp::min(out.len(), available);

        if count > 0 {
            let plane = &self.output[channel];
            let mut ptr = ring_index(self.buffer_ptr, -(available as isize), self.capacity);

            for dest in &mut out[..count] {
                *dest = conv(plane[ptr]);
                ptr = ring_index(ptr, 1, self.capacity);
            }
        }

        out[count..].fill(silence);

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::{VbrBuffer, MAX_VBR_BUFFER};
    use crate::errors::Error;
    use crate::formats::SampleTable;
    use crate::io::MediaSourceStream;

    /// A track of fixed-duration frames with varying sizes, stored back-to-back.
    struct FrameTable {
        frame_len: u64,
        sizes: Vec<u32>,
    }

    impl FrameTable {
        fn new(frame_len: u64, sizes: &[u32]) -> Self {
            FrameTable { frame_len, sizes: sizes.to_vec() }
        }

        fn stream(&self) -> MediaSourceStream {
            let total: u32 = self.sizes.iter().sum();
            let data: Vec<u8> = (0..total).map(|i| i as u8).collect();
            MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default())
        }
    }

    impl SampleTable for FrameTable {
        fn time_to_sample(&self, time: u64) -> (u64, u64) {
            let sample = std::cmp::min(time / self.frame_len, self.sizes.len() as u64);
            (sample, sample * self.frame_len)
        }

        fn sample_to_offset(&self, sample: u64) -> Option<u64> {
            let sample = usize::try_from(sample).ok().filter(|&s| s < self.sizes.len())?;
            Some(self.sizes[..sample].iter().map(|&s| u64::from(s)).sum())
        }

        fn sample_size(&self, sample: u64) -> Option<u32> {
            self.sizes.get(usize::try_from(sample).ok()?).copied()
        }
    }

    fn ramp(start: u64, frames: usize, channels: usize) -> Vec<f32> {
        let mut samples = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            for c in 0..channels {
                samples.push((start + i as u64) as f32 + c as f32 * 0.5);
            }
        }
        samples
    }

    #[test]
    fn verify_store_and_copy() {
        let mut vbr = VbrBuffer::with_capacity(16);
        vbr.init(2).unwrap();

        vbr.store_decoded_f32(&ramp(0, 6, 2));

        assert_eq!(vbr.end(), 6);
        assert_eq!(vbr.size(), 6);

        let mut out = [9.0f32; 4];
        assert_eq!(vbr.copy_out_f32(2, &mut out, 1).unwrap(), 4);
        assert_eq!(out, [2.5, 3.5, 4.5, 5.5]);

        // Requests running past the newest sample are padded with silence.
        assert_eq!(vbr.copy_out_f32(4, &mut out, 0).unwrap(), 2);
        assert_eq!(out, [4.0, 5.0, 0.0, 0.0]);
    }

    #[test]
    fn verify_ring_wraps() {
        let mut vbr = VbrBuffer::with_capacity(8);
        vbr.init(1).unwrap();

        vbr.store_decoded_f32(&ramp(0, 5, 1));
        vbr.store_decoded_f32(&ramp(5, 5, 1));

        assert_eq!(vbr.end(), 10);
        assert_eq!(vbr.size(), 8);
        assert_eq!(vbr.start(), 2);

        let mut out = [0.0f32; 8];
        assert_eq!(vbr.copy_out_f32(2, &mut out, 0).unwrap(), 8);
        assert_eq!(out, [2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);

        // Sample 1 was overwritten.
        assert_eq!(vbr.copy_out_f32(1, &mut out, 0).unwrap(), 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn verify_monotonic_end_and_bounded_size() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);

        let mut vbr = VbrBuffer::with_capacity(64);
        vbr.init(2).unwrap();

        let mut last_end = vbr.end();

        for _ in 0..500 {
            let frames = rng.random_range(0..100usize);
            vbr.store_decoded_f32(&vec![0.25; frames * 2]);

            assert!(vbr.end() >= last_end);
            assert_eq!(vbr.end(), last_end + frames as u64);
            assert!(vbr.size() <= vbr.capacity());
            last_end = vbr.end();
        }
    }

    #[test]
    fn verify_i16_scaling() {
        let mut vbr = VbrBuffer::with_capacity(8);
        vbr.init(1).unwrap();

        vbr.store_decoded_i16(&[16384, -32768, 32767, 0]);

        let mut out_f = [0.0f32; 4];
        vbr.copy_out_f32(0, &mut out_f, 0).unwrap();
        assert_eq!(out_f[0], 0.5);
        assert_eq!(out_f[1], -1.0);

        let mut out_i = [0i16; 4];
        vbr.copy_out_i16(0, &mut out_i, 0).unwrap();
        assert_eq!(out_i, [16383, -32767, 32766, 0]);
    }

    #[test]
    fn verify_capacity_exceeded() {
        let table = FrameTable::new(4, &[10, 10]);

        let mut vbr = VbrBuffer::with_capacity(8);
        vbr.init(1).unwrap();
        vbr.store_decoded_f32(&ramp(0, 4, 1));

        match vbr.align(&table, 0, 9) {
            Err(Error::CapacityExceeded { requested: 9, capacity: 8 }) => (),
            _ => panic!("expected a capacity error"),
        }

        let mut out = [7.0f32; 9];
        assert!(vbr.copy_out_f32(0, &mut out, 0).is_err());
        assert!(out.iter().all(|&s| s == 7.0));

        assert_eq!(MAX_VBR_BUFFER, VbrBuffer::new().capacity());
    }

    #[test]
    fn verify_align_within_range_keeps_buffer() {
        let table = FrameTable::new(4, &[3, 5, 7, 2]);
        let mut stream = table.stream();

        let mut vbr = VbrBuffer::with_capacity(32);
        vbr.init(1).unwrap();

        assert!(!vbr.align(&table, 0, 4).unwrap());
        vbr.read_next_frame(&mut stream, &table).unwrap();
        vbr.read_next_frame(&mut stream, &table).unwrap();
        vbr.store_decoded_f32(&ramp(0, 8, 1));

        assert_eq!(vbr.sample(), 2);

        // Inside [end - size, end], including both bounds.
        assert!(!vbr.align(&table, 0, 4).unwrap());
        assert!(!vbr.align(&table, 5, 4).unwrap());
        assert!(!vbr.align(&table, 8, 4).unwrap());
        assert_eq!(vbr.sample(), 2);
        assert_eq!(vbr.input_size(), 8);
    }

    #[test]
    fn verify_align_outside_range_snaps_to_frame() {
        let table = FrameTable::new(4, &[3, 5, 7, 2]);

        let mut vbr = VbrBuffer::with_capacity(32);
        vbr.init(1).unwrap();
        vbr.store_decoded_f32(&ramp(0, 4, 1));

        assert!(vbr.align(&table, 10, 2).unwrap());
        assert_eq!(vbr.sample(), 2);
        assert_eq!(vbr.end(), 8);
        assert_eq!(vbr.size(), 0);
        assert_eq!(vbr.input_size(), 0);

        // Nothing is decoded yet, so the request is silence.
        let mut out = [1.0f32; 2];
        assert_eq!(vbr.copy_out_f32(10, &mut out, 0).unwrap(), 0);
        assert_eq!(out, [0.0, 0.0]);

        // Decoding frame 2 covers samples 8..12.
        vbr.store_decoded_f32(&ramp(8, 4, 1));
        assert_eq!(vbr.copy_out_f32(10, &mut out, 0).unwrap(), 2);
        assert_eq!(out, [10.0, 11.0]);

        // Seeking backwards discards the ring again.
        assert!(vbr.align(&table, 1, 2).unwrap());
        assert_eq!(vbr.sample(), 0);
        assert_eq!(vbr.end(), 0);
    }

    #[test]
    fn verify_read_next_frame_and_shift() {
        let table = FrameTable::new(4, &[3, 5]);
        let mut stream = table.stream();

        let mut vbr = VbrBuffer::new();

        assert_eq!(vbr.read_next_frame(&mut stream, &table).unwrap(), 3);
        assert_eq!(vbr.read_next_frame(&mut stream, &table).unwrap(), 5);
        assert_eq!(vbr.input(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(vbr.sample(), 2);

        match vbr.read_next_frame(&mut stream, &table) {
            Err(Error::InvalidSample(2)) => (),
            _ => panic!("expected an invalid sample error"),
        }
        assert_eq!(vbr.input_size(), 8);

        vbr.shift(3);
        assert_eq!(vbr.input(), &[3, 4, 5, 6, 7]);

        let allocation = vbr.input_allocation();
        vbr.shift(5);
        assert_eq!(vbr.input_size(), 0);
        assert_eq!(vbr.input_allocation(), allocation);
    }

    #[test]
    fn verify_reinit_only_on_channel_change() {
        let mut vbr = VbrBuffer::with_capacity(8);
        vbr.init(2).unwrap();
        vbr.store_decoded_f32(&ramp(0, 3, 2));

        vbr.init(2).unwrap();
        assert_eq!(vbr.size(), 3);

        vbr.init(1).unwrap();
        assert_eq!(vbr.channels(), 1);
        assert_eq!(vbr.size(), 0);
        assert_eq!(vbr.end(), 3);
    }
}
