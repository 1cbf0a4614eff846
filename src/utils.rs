use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeZone};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::{catalog::WalkReport, types::SummaryRow};

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn generate_code_verifier() -> String {
    random_alphanumeric(128)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Fresh OAuth `state`, one per login attempt.
pub fn generate_state() -> String {
    random_alphanumeric(32)
}

/// Default playlist name: the run's start time, `YYYY-MM-DD HH:MM`.
pub fn playlist_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%d %H:%M").to_string()
}

pub fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

pub fn summary_rows(report: &WalkReport) -> Vec<SummaryRow> {
    let row = |metric: &'static str, value: usize| SummaryRow {
        metric,
        value: value.to_string(),
    };
    vec![
        row("artists", report.artists),
        row("albums seen", report.albums_seen),
        row("albums kept", report.albums_kept),
        row("duplicates dropped", report.duplicates_dropped),
        row("tracks seen", report.tracks_seen),
        row("remixes excluded", report.tracks_excluded),
        row("tracks written", report.tracks_written),
        row("append calls", report.write_calls),
        row("retry waits", report.retry_waits as usize),
        row("skipped chunks", report.skipped_chunks.len()),
    ]
}
