// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! A QuickTime (MOV) movie reader and writer.
//!
//! [`MovReader`] reads the atom tree of a movie and serves the compressed frames of its tracks.
//! [`MovWriter`] appends compressed frames to a new movie and writes its atom tree on completion.
//! The atoms themselves live in the [`atoms`] module.

pub mod atoms;
pub mod fp;

mod fourcc;
mod movie;
mod reader;
mod writer;

pub use fourcc::FourCc;
pub use movie::Movie;
pub use reader::{MovOptions, MovReader, DEFAULT_FRAME_CACHE_BYTES};
pub use writer::{MovWriter, MovWriterOptions};
