use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};

/// Environment variable prefix; `__` separates nested keys
/// (e.g. `SPREAD_EXECUTION__DRY_RUN=true`).
pub const ENV_PREFIX: &str = "SPREAD_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates configuration from a TOML or JSON file, with
    /// environment overrides merged on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be parsed, or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        Self::extract(Self::base(path)?)
    }

    /// Loads configuration with a profile overlay read from
    /// `<stem>.<profile>.<ext>` next to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base file is missing, any file cannot be
    /// parsed, or the merged result fails validation.
    pub fn load_with_profile(path: impl AsRef<Path>, profile: &str) -> Result<AppConfig> {
        let path = path.as_ref();
        let overlay = profile_path(path, profile);
        let figment = Self::base(path)?.merge(file_provider(&overlay));
        Self::extract(figment)
    }

    fn base(path: &Path) -> Result<Figment> {
        if !path.exists() {
            bail!("configuration file not found: {}", path.display());
        }
        Ok(Figment::new().merge(file_provider(path)))
    }

    fn extract(figment: Figment) -> Result<AppConfig> {
        let config: AppConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to parse configuration")?;

        config.validate().context("invalid configuration")?;

        tracing::debug!(
            symbols = ?config.strategy.symbols,
            execution_day = %config.schedule.execution_day,
            dry_run = config.execution.dry_run,
            "Configuration loaded"
        );

        Ok(config)
    }
}

fn file_provider(path: &Path) -> Figment {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Figment::from(Json::file(path))
    } else {
        Figment::from(Toml::file(path))
    }
}

fn profile_path(path: &Path, profile: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Config");
    let file_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.{profile}.{ext}"),
        None => format!("{stem}.{profile}"),
    };
    path.with_file_name(file_name)
}
