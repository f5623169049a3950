// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Resolve a configured level name, case-insensitively.
/// Falls back to INFO if the name is missing or unknown.
pub fn parse_level(log_level: Option<&str>) -> Level {
    log_level
        .map(str::trim)
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}

/// Install the global fmt subscriber. A second call is ignored.
pub fn init_logging(log_level: Option<&str>) {
    let level = parse_level(log_level);
    let result = FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(level)
        .try_init();
    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}
