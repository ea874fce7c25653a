use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the ledger home directory and an initial `config.json` that points at `api_url`.
///
/// # Arguments
/// - `ledger_home` - The directory that will hold the configuration, e.g. `$HOME/ledger`
/// - `api_url` - The base URL of the tracker API, e.g. `https://api.example.com`
///
/// # Errors
/// - Returns an error if `api_url` is invalid or if any file operations fail.
pub async fn init(ledger_home: &Path, api_url: &str) -> Result<Out<()>> {
    let config = Config::create(ledger_home, api_url)
        .await
        .context("Unable to create the ledger directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Created the ledger config at {}",
        config.config_path().display()
    )
    .into())
}
