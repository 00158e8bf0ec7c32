// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::fs::File;
use std::path::Path;

use moviola::core::errors::Result;
use moviola::core::formats::SampleTable;
use moviola::core::io::MediaSourceStream;
use moviola::formats::mov::atoms::HandlerType;
use moviola::formats::{MovOptions, MovReader};

use clap::{value_parser, Arg, ArgAction, ArgMatches};
use log::error;

fn main() {
    pretty_env_logger::init();

    let args = clap::Command::new("Moviola Dump")
        .version("1.0")
        .about("Print the atom tree of a QuickTime movie")
        .arg(
            Arg::new("summary")
                .long("summary")
                .short('s')
                .action(ArgAction::SetTrue)
                .help("Print a summary of each track instead of the atom tree"),
        )
        .arg(
            Arg::new("max-codec-config-len")
                .long("max-codec-config-len")
                .value_name("BYTES")
                .value_parser(value_parser!(u64))
                .help("Drop codec configurations larger than this many bytes"),
        )
        .arg(Arg::new("INPUT").help("The input file path").required(true).index(1))
        .get_matches();

    let code = match run(&args) {
        Ok(()) => 0,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}

fn run(args: &ArgMatches) -> Result<()> {
    let path = match args.get_one::<String>("INPUT") {
        Some(path) => Path::new(path),
        None => return Ok(()),
    };

    let mut opts = MovOptions::default();

    if let Some(&len) = args.get_one::<u64>("max-codec-config-len") {
        opts.max_codec_config_len = len;
    }

    let mss = MediaSourceStream::new(Box::new(File::open(path)?), Default::default());

    let reader = MovReader::try_new(mss, &opts)?;

    if args.get_flag("summary") {
        print_summary(path, &reader);
    }
    else {
        print!("{}", reader.movie().dump());
    }

    Ok(())
}

fn print_summary(path: &Path, reader: &MovReader) {
    let moov = &reader.movie().moov;

    println!("{}", path.display());
    println!("  duration: {:.3}s", moov.mvhd.duration_seconds());
    println!("  time scale: {}", moov.mvhd.time_scale);

    for (i, trak) in moov.traks.iter().enumerate() {
        let stbl = trak.sample_table();

        let kind = match trak.handler_type() {
            HandlerType::Sound => "audio",
            HandlerType::Video => "video",
            HandlerType::Other(_) => "other",
        };

        let format = match stbl.stsd.entries.first() {
            Some(desc) => desc.format.to_string(),
            None => "none".to_string(),
        };

        println!("  track {} (id {}): {} '{}'", i, trak.tkhd.track_id, kind, format);
        println!("    samples: {}", stbl.sample_count());

        if let Some(offset) = stbl.sample_to_offset(0) {
            println!("    first sample: {} bytes at {}", stbl.sample_size(0).unwrap_or(0), offset);
        }

        if let Some(sound) = stbl.stsd.sound() {
            println!("    channels: {}", sound.channel_count());
            println!("    sample rate: {}", sound.sample_rate_hz());
        }

        if let Some(visual) = stbl.stsd.visual() {
            println!("    dimensions: {}x{}", visual.width, visual.height);
        }
    }
}
