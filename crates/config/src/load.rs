use crate::error::{ErrorKind, Result};
use crate::model::Config;
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use std::path::{Path, PathBuf};

/// Environment variables with this prefix override file values. Nested keys
/// are separated by a double underscore: `SNUFFLE_RULES__EXTEND_DEFAULTS`.
/// Only variables naming a top-level configuration key are read; others
/// (`SNUFFLE_CONFIG`, `SNUFFLE_LOG`, ...) are left alone.
pub const ENV_PREFIX: &str = "SNUFFLE_";
const ENV_KEYS: &[&str] = &["concurrency", "max_depth", "rules", "resources"];

/// The per-user configuration file, whether or not it exists.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "snuffle").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load and validate configuration.
///
/// Layers, later ones winning:
/// 1. built-in defaults,
/// 2. `path` if given (it must exist), otherwise the per-user file from
///    [`default_path`] if there is one,
/// 3. `SNUFFLE_*` environment variables.
#[tracing::instrument(level = "debug")]
pub fn load(path: Option<&Path>) -> Result<Config> {
    let file = match path {
        Some(path) => {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.display().to_string()));
            }
            Some(path.to_path_buf())
        },
        None => default_path().filter(|path| path.is_file()),
    };
    extract(&figment(file.as_deref())?.merge(env()))
}

fn env() -> Env {
    Env::prefixed(ENV_PREFIX).split("__").filter(|key| {
        let top = key.as_str().split('.').next().unwrap_or_default();
        ENV_KEYS.iter().any(|known| known.eq_ignore_ascii_case(top))
    })
}

/// Defaults plus one optional file, without the environment layer.
fn figment(file: Option<&Path>) -> Result<Figment> {
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let Some(file) = file else {
        return Ok(figment);
    };
    tracing::debug!(file = %file.display(), "Reading configuration file");
    let extension = file.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    let figment = match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(file)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(file)),
        Some("json") => figment.merge(Json::file_exact(file)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(file.display().to_string())),
    };
    Ok(figment)
}

fn extract(figment: &Figment) -> Result<Config> {
    let config: Config = figment.extract().or_raise(|| ErrorKind::Parse)?;
    config.validate()?;
    tracing::debug!(resources = config.resources.len(), "Configuration loaded");
    Ok(config)
}
