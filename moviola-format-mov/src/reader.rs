// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::{info, warn};

use moviola_core::audio::vbr::VbrBuffer;
use moviola_core::errors::Result;
use moviola_core::io::MediaSourceStream;
use moviola_core::video::cache::FrameCache;

use crate::atoms::{HandlerType, ReadLimits, StblAtom, TrakAtom};
use crate::movie::Movie;

/// The default frame cache budget of each video track, in bytes.
pub const DEFAULT_FRAME_CACHE_BYTES: usize = 64 * 1024 * 1024;

/// `MovOptions` is a common set of options that the movie reader uses.
#[derive(Copy, Clone, Debug)]
pub struct MovOptions {
    /// The largest codec configuration record kept, in bytes. Larger records are skipped.
    ///
    /// Default: 1 MiB.
    pub max_codec_config_len: u64,
    /// The frame cache budget of each video track, in bytes.
    ///
    /// Default: 64 MiB.
    pub frame_cache_bytes: usize,
}

impl Default for MovOptions {
    fn default() -> Self {
        MovOptions {
            max_codec_config_len: ReadLimits::default().max_codec_config_len,
            frame_cache_bytes: DEFAULT_FRAME_CACHE_BYTES,
        }
    }
}

/// The playback state of a track.
enum TrackState {
    Audio(VbrBuffer),
    Video(FrameCache),
    Other,
}

/// QuickTime movie reader.
///
/// `MovReader` reads the movie atom tree, then serves the compressed frames of its tracks. Each
/// audio track gets a [`VbrBuffer`], and each video track gets a [`FrameCache`].
pub struct MovReader {
    reader: MediaSourceStream,
    movie: Movie,
    tracks: Vec<TrackState>,
}

impl MovReader {
    pub fn try_new(mut source: MediaSourceStream, options: &MovOptions) -> Result<Self> {
        let limits = ReadLimits { max_codec_config_len: options.max_codec_config_len };
        let movie = Movie::read_limited(&mut source, &limits)?;

        let mut tracks = Vec::new();

        for (i, trak) in movie.moov.traks.iter().enumerate() {
            let state = match trak.handler_type() {
                HandlerType::Sound => {
                    let channels = match trak.sample_table().stsd.sound() {
                        Some(sound) if sound.channel_count() > 0 => sound.channel_count() as usize,
                        _ => {
                            warn!("mov: track {} has no usable sound description, using mono", i);
                            1
                        }
                    };

                    let mut vbr = VbrBuffer::new();
                    vbr.init(channels)?;
                    TrackState::Audio(vbr)
                }
                HandlerType::Video => TrackState::Video(FrameCache::new(options.frame_cache_bytes)),
                HandlerType::Other(_) => TrackState::Other,
            };

            tracks.push(state);
        }

        info!(
            "mov: opened movie with {} tracks, duration {}s",
            tracks.len(),
            movie.moov.mvhd.duration_seconds()
        );

        Ok(MovReader { reader: source, movie, tracks })
    }

    /// The movie metadata.
    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    /// The number of tracks.
    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// The sample table of a track, or `None` if the track does not exist.
    pub fn sample_table(&self, track: usize) -> Option<&StblAtom> {
        self.movie.moov.traks.get(track).map(TrakAtom::sample_table)
    }

    /// The VBR buffer of an audio track, or `None` if the track is not an audio track.
    pub fn audio_buffer(&self, track: usize) -> Option<&VbrBuffer> {
        match self.tracks.get(track) {
            Some(TrackState::Audio(vbr)) => Some(vbr),
            _ => None,
        }
    }

    /// The VBR buffer of an audio track for storing decoded samples, or `None` if the track is
    /// not an audio track.
    pub fn audio_buffer_mut(&mut self, track: usize) -> Option<&mut VbrBuffer> {
        match self.tracks.get_mut(track) {
            Some(TrackState::Audio(vbr)) => Some(vbr),
            _ => None,
        }
    }

    /// Prepare an audio track to serve `count` samples starting at media time `start`. Returns
    /// true if the track repositioned and decoding must restart.
    ///
    /// Panics if the track is not an audio track.
    pub fn align_audio(&mut self, track: usize, start: u64, count: usize) -> Result<bool> {
        let (vbr, trak) = self.audio_track(track);
        vbr.align(trak.sample_table(), start, count)
    }

    /// Read the next compressed frame of an audio track into its staging buffer. Returns the size
    /// of the frame in bytes.
    ///
    /// Panics if the track is not an audio track.
    pub fn read_audio_frame(&mut self, track: usize) -> Result<usize> {
        let (vbr, trak) = match (self.tracks.get_mut(track), self.movie.moov.traks.get(track)) {
            (Some(TrackState::Audio(vbr)), Some(trak)) => (vbr, trak),
            _ => panic!("mov: track {} is not an audio track", track),
        };
        vbr.read_next_frame(&mut self.reader, trak.sample_table())
    }

    fn audio_track(&mut self, track: usize) -> (&mut VbrBuffer, &TrakAtom) {
        match (self.tracks.get_mut(track), self.movie.moov.traks.get(track)) {
            (Some(TrackState::Audio(vbr)), Some(trak)) => (vbr, trak),
            _ => panic!("mov: track {} is not an audio track", track),
        }
    }

    /// The frame cache of a video track, or `None` if the track is not a video track.
    pub fn frame_cache(&self, track: usize) -> Option<&FrameCache> {
        match self.tracks.get(track) {
            Some(TrackState::Video(cache)) => Some(cache),
            _ => None,
        }
    }

    /// The frame cache of a video track for storing decoded frames, or `None` if the track is
    /// not a video track.
    pub fn frame_cache_mut(&mut self, track: usize) -> Option<&mut FrameCache> {
        match self.tracks.get_mut(track) {
            Some(TrackState::Video(cache)) => Some(cache),
            _ => None,
        }
    }

    /// Set the frame cache budget of every video track. Entries are evicted on the next insertion.
    pub fn set_cache_budget(&mut self, bytes: usize) {
        for state in self.tracks.iter_mut() {
            if let TrackState::Video(cache) = state {
                cache.set_budget(bytes);
            }
        }
    }

    /// The total size of all decoded frames held by the frame caches, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.tracks
            .iter()
            .map(|state| match state {
                TrackState::Video(cache) => cache.current_usage(),
                _ => 0,
            })
            .sum()
    }

    pub fn into_inner(self) -> MediaSourceStream {
        self.reader
    }
}
