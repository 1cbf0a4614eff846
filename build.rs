//! Build script for playall.
//!
//! Installs the `.env.example` template next to the location where the binary
//! later looks for its `.env` file, so a fresh install has a ready-made
//! starting point:
//! - Linux: `~/.local/share/playall/.env.example`
//! - macOS: `~/Library/Application Support/playall/.env.example`
//! - Windows: `%LOCALAPPDATA%/playall/.env.example`
//!
//! A missing template only produces a cargo warning; failing to create the
//! directory or write the file fails the build.

use std::{env, fs, path::PathBuf};

const TEMPLATE: &str = ".env.example";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={TEMPLATE}");

    let template = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join(TEMPLATE);

    let mut target_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    target_dir.push("playall");
    fs::create_dir_all(&target_dir)?;

    if !template.is_file() {
        println!(
            "cargo:warning={TEMPLATE} not found at {}",
            template.display()
        );
        return Ok(());
    }

    fs::copy(&template, target_dir.join(TEMPLATE))?;
    Ok(())
}
