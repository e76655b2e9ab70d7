/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

use crate::{
    config::Config, error::PatcherError, patcher::Patcher, profile::BuildProfile, ui::Ui, *,
};
use clap::{Arg, ArgAction, Command};

pub fn build_command() -> Command {
    Command::new(APP_NAME)
        .bin_name(APP_BIN_NAME)
        .version(APP_VERSION)
        .about(APP_ABOUT)
        .help_template("{about-with-newline}{usage-heading} {usage}\n\n{all-args}\n")
        .arg_required_else_help(true)
        .arg(
            Arg::new("apk")
                .required(true)
                .help("Path to the Echo VR APK (goldmaster store build, version 4987566)")
                .index(1),
        )
        .arg(
            Arg::new("pause")
                .long("pause")
                .action(ArgAction::SetTrue)
                .help("Wait for a keypress before exiting (drag-and-drop parity)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Set verbosity level (-v for verbose, -vv for more verbose, -vvv for debug)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppress all output except errors"),
        )
}

/// Run the tool. On failure, returns the error together with whether the
/// caller should pause before exiting.
pub fn run() -> Result<(), (PatcherError, bool)> {
    let matches = build_command().get_matches();

    let config = match Config::from_matches(&matches) {
        Ok(c) => c,
        Err(e) => return Err((e, matches.get_flag("pause"))),
    };
    let pause = config.pause;

    let mut ui = Ui::from_verbosity_level(config.verbosity_level, config.quiet, true);
    ui.enable_colors_if_supported();
    ui.print_banner();

    let result = BuildProfile::goldmaster()
        .and_then(|profile| Patcher::new(&config, &profile, &ui).run());

    match result {
        Ok(output) => {
            ui.success(&format!(
                "Finished creating patched APK: {}",
                output.display()
            ));
            if ui.verbose {
                eprintln!();
                ui.print_summary(
                    "Patch Report",
                    &[
                        ("Status", "Success".to_string()),
                        ("Input", config.input_path.display().to_string()),
                        ("Config", config.config_path.display().to_string()),
                        ("Output", output.display().to_string()),
                    ],
                );
            }
            if pause {
                Ui::wait_for_enter();
            }
            Ok(())
        }
        Err(e) => Err((e, pause)),
    }
}
