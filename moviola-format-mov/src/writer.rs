// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;

use moviola_core::errors::{limit_error, Result};
use moviola_core::io::WriteBytes;

use crate::atoms::{Atom, AtomWriter, FtypAtom, HandlerType, HdlrAtom, MdhdAtom, MdiaAtom};
use crate::atoms::{MediaHeader, MinfAtom, MoovAtom, MvhdAtom, SampleDescription, SmhdAtom};
use crate::atoms::{SoundDescription, StblAtom, TkhdAtom, TrakAtom, VisualDescription, VmhdAtom};
use crate::atoms::QUICKTIME_BRAND;
use crate::fourcc::FourCc;

/// `MovWriterOptions` is a common set of options that the movie writer uses.
#[derive(Copy, Clone, Debug)]
pub struct MovWriterOptions {
    /// The movie time scale in units per second.
    ///
    /// Default: 600.
    pub time_scale: u32,
    /// The major brand written to the file type atom.
    ///
    /// Default: `qt  `.
    pub brand: FourCc,
}

impl Default for MovWriterOptions {
    fn default() -> Self {
        MovWriterOptions { time_scale: 600, brand: QUICKTIME_BRAND }
    }
}

/// QuickTime movie writer.
///
/// Compressed frames are appended to the media data atom as they are written, each frame forming
/// a chunk of its own. The movie atom is written by [`MovWriter::finish`].
pub struct MovWriter<W: WriteBytes> {
    writer: AtomWriter<W>,
    mvhd: MvhdAtom,
    traks: Vec<TrakAtom>,
}

impl<W: WriteBytes> MovWriter<W> {
    /// Begin a movie by writing the file type atom and the start of the media data atom.
    pub fn try_new(sink: W, options: &MovWriterOptions) -> Result<Self> {
        let mut writer = AtomWriter::new(sink);

        FtypAtom::new(options.brand).write(&mut writer)?;

        // The media data may exceed 4 GiB, so always use a 64-bit size.
        writer.begin_large(*b"mdat")?;

        let mvhd = MvhdAtom { time_scale: options.time_scale, ..Default::default() };

        Ok(MovWriter { writer, mvhd, traks: Vec::new() })
    }

    fn add_track(&mut self, tkhd: TkhdAtom, handler: HandlerType, minf: MinfAtom, scale: u32) {
        let mdia = MdiaAtom { mdhd: MdhdAtom::new(scale), hdlr: HdlrAtom::new(handler), minf };
        self.traks.push(TrakAtom { tkhd, mdia });
    }

    fn next_track_id(&self) -> u32 {
        self.traks.len() as u32 + 1
    }

    /// Add an audio track whose samples have the given format and description, timed in units of
    /// `time_scale` per second. Returns the track index.
    pub fn add_audio_track(
        &mut self,
        format: [u8; 4],
        sound: SoundDescription,
        time_scale: u32,
    ) -> usize {
        let mut stbl = StblAtom::default();
        stbl.stsd.entries.push(SampleDescription::new_sound(format, sound));

        let minf = MinfAtom { header: Some(MediaHeader::Sound(SmhdAtom::default())), stbl };

        let tkhd = TkhdAtom::new_audio(self.next_track_id());
        self.add_track(tkhd, HandlerType::Sound, minf, time_scale);
        self.traks.len() - 1
    }

    /// Add a video track whose frames have the given format and description, timed in units of
    /// `time_scale` per second. Returns the track index.
    pub fn add_video_track(
        &mut self,
        format: [u8; 4],
        visual: VisualDescription,
        time_scale: u32,
    ) -> usize {
        let tkhd = TkhdAtom::new_video(self.next_track_id(), visual.width, visual.height);

        let mut stbl = StblAtom::default();
        stbl.stsd.entries.push(SampleDescription::new_visual(format, visual));

        let minf = MinfAtom { header: Some(MediaHeader::Video(VmhdAtom::default())), stbl };

        self.add_track(tkhd, HandlerType::Video, minf, time_scale);
        self.traks.len() - 1
    }

    /// Append one compressed frame of `duration` media time units to a track.
    ///
    /// Panics if the track does not exist.
    pub fn write_frame(&mut self, track: usize, data: &[u8], duration: u32) -> Result<()> {
        let size = match u32::try_from(data.len()) {
            Ok(size) => size,
            Err(_) => return limit_error("mov: frame too large"),
        };

        let offset = self.writer.pos();

        let trak = match self.traks.get_mut(track) {
            Some(trak) => trak,
            None => panic!("mov: track {} does not exist", track),
        };

        self.writer.write_buf(data)?;

        trak.mdia.minf.stbl.push_sample_chunk(offset, size, duration);

        Ok(())
    }

    /// Complete the media data atom, then write the movie atom. Returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.end()?;

        let movie_scale = u64::from(self.mvhd.time_scale);

        let mut duration = 0;

        for trak in self.traks.iter_mut() {
            let media_duration = trak.mdia.minf.stbl.stts.total_duration();
            let media_scale = u64::from(trak.mdia.mdhd.time_scale);

            trak.mdia.mdhd.duration = media_duration;

            trak.tkhd.duration = if media_scale > 0 {
                let scaled = u128::from(media_duration) * u128::from(movie_scale)
                    / u128::from(media_scale);
                u64::try_from(scaled).unwrap_or(u64::MAX)
            }
            else {
                0
            };

            duration = duration.max(trak.tkhd.duration);
        }

        self.mvhd.duration = duration;
        self.mvhd.next_track_id = self.next_track_id();

        debug!("mov: finishing movie with {} tracks, duration {}", self.traks.len(), duration);

        let moov = MoovAtom { mvhd: self.mvhd, traks: self.traks };
        moov.write(&mut self.writer)?;

        Ok(self.writer.into_inner())
    }
}
