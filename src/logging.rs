// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Logger setup for programs driving the calibration.
//!
//! The library itself only emits `log` records; this is a convenience for
//! executables that want the same output format everywhere.

use std::io::Write;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::LevelFilter;

/// The most detailed level printed at a verbosity.
fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialise a global `env_logger` writing to stdout. Each increase in
/// verbosity prints more detail; from 3 onwards, each line also carries a
/// millisecond timestamp and its source location. `RUST_LOG` overrides the
/// level.
pub fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::new();
    builder
        .target(env_logger::Target::Stdout)
        .filter_level(level_for(verbosity))
        .format_target(false)
        .parse_default_env();
    if verbosity >= 3 {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.module_path().unwrap_or_default(),
                record.line().unwrap_or(0),
                record.args()
            )
        });
    }
    builder.try_init()
}

/// A progress bar over time steps. It is hidden unless `draw` is true.
pub(crate) fn make_progress_bar(num_timesteps: usize, message: String, draw: bool) -> ProgressBar {
    ProgressBar::with_draw_target(
        Some(num_timesteps as _),
        if draw {
            // Use stdout, like the log messages.
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template("{msg:17}: [{wide_bar:.blue}] {pos:3}/{len:3} timesteps ({elapsed_precise}<{eta_precise})")
            .unwrap()
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message(message)
}
