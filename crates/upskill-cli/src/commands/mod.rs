pub mod generate;
pub mod history;
pub mod init;
pub mod list_models;
pub mod parse;
pub mod quiz;

use std::path::{Path, PathBuf};

use upskill_providers::config::load_config_from;

/// Pick the store file: explicit flag first, then the config's `store_path`.
pub(crate) fn store_path(explicit: Option<PathBuf>, config: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(load_config_from(config)?.store_path),
    }
}
