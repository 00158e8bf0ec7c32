// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `audio` module provides buffers for decoded audio.

pub mod vbr;
