//! Create a shared key file.

use anyhow::{Context, Result};
use clip_core::KeyMaterial;
use std::path::Path;

use crate::config;

/// Run the keygen command.
pub async fn run(key_file: &Path, force: bool) -> Result<()> {
    // Refuse to clobber an existing key
    if !force && tokio::fs::try_exists(key_file).await.unwrap_or(false) {
        anyhow::bail!(
            "Key file {} already exists. Use --force to replace it.",
            key_file.display()
        );
    }

    let key = KeyMaterial::generate().context("Failed to generate key")?;
    config::save_key(key_file, &key).await?;

    println!("Key written to {}", key_file.display());
    println!();
    println!("Next steps:");
    println!("  1. Copy this file to the same path on the other machine");
    println!("  2. On one machine:   netclipper --listen 0.0.0.0:7777");
    println!("  3. On the other:     netclipper --connect <first-machine>:7777");

    Ok(())
}
