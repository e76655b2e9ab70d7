/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Run configuration derived from the command line. The only positional
//! argument is the input APK; `config.json` is looked up beside it and the
//! output artifact is written beside it.

use crate::{error::PatcherError, CONFIG_FILE_NAME};
use clap::ArgMatches;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Config {
    /// Path to the input APK
    pub input_path: PathBuf,
    /// Path to the endpoint config, `<input dir>/config.json`
    pub config_path: PathBuf,
    /// Directory the output artifact is written into
    pub output_dir: PathBuf,
    /// Pause for a keypress before exiting
    pub pause: bool,
    /// Suppress all output except errors
    pub quiet: bool,
    /// Verbosity level (0 = off, 1 = verbose, 2 = very verbose, 3+ = debug)
    pub verbosity_level: u8,
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, PatcherError> {
        let input = matches
            .get_one::<String>("apk")
            .ok_or_else(|| {
                PatcherError::Usage(
                    "No APK given. Drag and drop the Echo VR APK onto the executable or pass \
                     its path as the first argument."
                        .into(),
                )
            })?;
        let input_path = PathBuf::from(input);

        let base_dir = input_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE_NAME);

        Ok(Self {
            input_path,
            config_path,
            output_dir: base_dir,
            pause: matches.get_flag("pause"),
            quiet: matches.get_flag("quiet"),
            verbosity_level: matches.get_count("verbose"),
        })
    }

    /// Final artifact path for a given output file name.
    pub fn output_path(&self, output_name: &str) -> PathBuf {
        self.output_dir.join(output_name)
    }
}
