/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

use echopatch::cli;
use echopatch::ui::Ui;

fn main() {
    match cli::run() {
        Ok(()) => {}
        Err((e, pause)) => {
            let mut ui = Ui::default();
            ui.enable_colors_if_supported();
            ui.error(&format!("{}", e));
            if pause {
                Ui::wait_for_enter();
            }
            std::process::exit(e.exit_code());
        }
    }
}
