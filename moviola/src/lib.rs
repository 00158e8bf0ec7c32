// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Moviola
//!
//! Moviola is a pure Rust movie-container core. It reads and writes QuickTime (MOV) atom trees,
//! buffers variable-bitrate audio for sample-accurate playback, and caches decoded video frames.
//!
//! # Formats
//!
//! | Format    | Feature Flag | Default |
//! |-----------|--------------|---------|
//! | QuickTime | `mov`        | Yes     |
//!
//! # Usage
//!
//! 1.  Wrap a [`MediaSource`][core::io::MediaSource], such as a `std::fs::File`, in a
//!     [`MediaSourceStream`][core::io::MediaSourceStream].
//! 2.  Open the movie with [`MovReader::try_new`][formats::MovReader::try_new].
//! 3.  For an audio track, call [`align_audio`][formats::MovReader::align_audio] with the range
//!     of samples wanted. While the [`VbrBuffer`][core::audio::vbr::VbrBuffer] of the track does
//!     not cover the range, read a compressed frame with
//!     [`read_audio_frame`][formats::MovReader::read_audio_frame], decode it, and store the
//!     decoded samples in the buffer.
//! 4.  Copy each channel out of the buffer with
//!     [`copy_out_f32`][core::audio::vbr::VbrBuffer::copy_out_f32].
//! 5.  Store decoded video frames in the [`FrameCache`][core::video::cache::FrameCache] of the
//!     track to avoid decoding them again.
//!
//! Decoders are not part of Moviola.

pub mod formats {
    //! The `formats` module re-exports all enabled container readers and writers.

    #[cfg(feature = "mov")]
    pub use moviola_format_mov::{Movie, MovOptions, MovReader, MovWriter, MovWriterOptions};

    #[cfg(feature = "mov")]
    pub mod mov {
        //! QuickTime atoms and fixed-point types.

        pub use moviola_format_mov::atoms;
        pub use moviola_format_mov::fp;
        pub use moviola_format_mov::FourCc;
    }
}

pub use moviola_core as core;
