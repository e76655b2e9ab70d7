/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Console reporting. All output goes to stderr so the console stays usable
//! when the tool is wrapped by other scripts; there is no log file or
//! structured sink.

use crate::{APP_NAME, APP_VERSION};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};

pub struct Ui {
    pub verbose: bool,
    pub very_verbose: bool,
    pub debug: bool,
    silent: bool,
    colors: bool,
    progress_bar: Arc<Mutex<Option<ProgressBar>>>,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new(false, false, false, false, true)
    }
}

impl Ui {
    pub fn new(v: bool, vv: bool, d: bool, s: bool, c: bool) -> Self {
        Self {
            verbose: v,
            very_verbose: vv,
            debug: d,
            silent: s,
            colors: c,
            progress_bar: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_verbosity_level(level: u8, silent: bool, colors: bool) -> Self {
        Self::new(level >= 1, level >= 2, level >= 3, silent, colors)
    }

    /// Step announcement, printed even without -v. The pipeline calls this
    /// once per state so a watching human can follow progress.
    pub fn step(&self, msg: &str) {
        if !self.silent {
            self.paint("[*]", msg, "36", false, false);
        }
    }

    pub fn info(&self, msg: &str) {
        if self.verbose {
            self.paint("[i]", msg, "34", false, false);
        }
    }

    pub fn verbose(&self, msg: &str) {
        if self.verbose {
            self.paint("[v]", msg, "2", false, true);
        }
    }

    pub fn very_verbose(&self, msg: &str) {
        if self.very_verbose {
            self.paint("[vv]", msg, "2", false, true);
        }
    }

    pub fn debug(&self, msg: &str) {
        if self.debug {
            self.paint("[dbg]", msg, "2", false, true);
        }
    }

    pub fn success(&self, msg: &str) {
        if !self.silent {
            self.paint("[+]", msg, "32", false, false);
        }
    }

    pub fn warn(&self, msg: &str) {
        if !self.silent {
            self.paint("[!]", msg, "33", true, false);
        }
    }

    pub fn error(&self, msg: &str) {
        self.paint("[x]", msg, "31", true, false);
    }

    fn paint(&self, icon: &str, msg: &str, color: &str, is_error: bool, is_dim: bool) {
        if self.silent && !is_error {
            return;
        }
        let line = if self.supports_color() {
            let ic = match color {
                "31" => icon.red().bold().to_string(),
                "32" => icon.green().bold().to_string(),
                "33" => icon.yellow().bold().to_string(),
                "34" => icon.blue().bold().to_string(),
                "36" => icon.cyan().bold().to_string(),
                _ => icon.bold().to_string(),
            };
            if is_dim {
                format!("{} {}", ic.dimmed(), msg.dimmed())
            } else {
                format!("{} {}", ic, msg.normal())
            }
        } else {
            format!("{} {}", icon, msg)
        };
        eprintln!("{}", line);
    }

    pub fn print_banner(&self) {
        if self.silent || !self.verbose {
            return;
        }
        let title = format!(" {} v{} ", APP_NAME, APP_VERSION);
        let border = "-".repeat(title.len());
        if self.colors {
            let tb = format!("+-{}-+", border).magenta().bold();
            let mid = format!("| {} |", title.cyan().bold());
            eprintln!("{}\n{}\n{}", tb, mid, tb);
        } else {
            eprintln!("+-{}-+\n| {} |\n+-{}-+", border, title, border);
        }
    }

    pub fn print_summary(&self, title: &str, fields: &[(&str, String)]) {
        if self.silent {
            return;
        }
        if self.colors {
            eprintln!("{}", format!("{}:", title).green().bold());
        } else {
            eprintln!("{}:", title);
        }
        let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, val) in fields {
            if self.colors {
                eprintln!("  {:>width$}: {}", key.cyan(), val, width = width);
            } else {
                eprintln!("  {:>width$}: {}", key, val, width = width);
            }
        }
    }

    pub fn show_progress_bar(&self, len: u64, msg: &str) {
        let pb = ProgressBar::new(len);
        let template = format!(
            "{{spinner:.green}} {} {{wide_bar:.green/red}} {{pos}}/{{len}} ({{eta}})",
            msg
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_strings(&["[|]", "[/]", "[-]", "[\\]"])
            .progress_chars("#>-");
        pb.set_style(style);
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        if let Ok(mut g) = self.progress_bar.lock() {
            *g = Some(pb);
        }
    }

    pub fn update_progress(&self, pos: u64) {
        let _ = self.progress_bar.lock().map(|g| {
            if let Some(ref pb) = *g {
                pb.set_position(pos);
            }
        });
    }

    pub fn finish_progress(&self) {
        let _ = self.progress_bar.lock().map(|g| {
            if let Some(ref pb) = *g {
                pb.finish_and_clear();
            }
        });
    }

    pub fn has_progress_bar(&self) -> bool {
        self.progress_bar
            .lock()
            .map(|g| g.is_some())
            .unwrap_or(false)
    }

    fn supports_color(&self) -> bool {
        std::env::var("NO_COLOR").is_err() && self.colors
    }

    pub fn enable_colors_if_supported(&mut self) {
        #[cfg(windows)]
        if self.colors {
            colored::control::set_override(true);
        }
    }

    /// Interactive pause before exit, kept for drag-and-drop parity with the
    /// original tool. Only active behind the --pause flag.
    pub fn wait_for_enter() {
        eprint!("Press enter to exit");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
    }
}
