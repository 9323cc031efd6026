//! Configuration loading for taskloom: `$XDG_CONFIG_HOME/<app>/config.toml` `[env]`
//! table plus a project `.env`, applied to the process environment with priority
//! **existing env > .env > XDG**.
//!
//! Taskloom reads its endpoint settings (`OPENAI_API_KEY`, `OPENAI_MODEL`,
//! `TASKLOOM_PROVIDER`, ...) from the environment, so this is the only place
//! config files are touched.

mod dotenv;
#[cfg(feature = "tracing-init")]
pub mod logging;
mod xdg_toml;

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Key/value pairs from both config sources, before they touch the environment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvSources {
    pub dotenv: HashMap<String, String>,
    pub xdg: HashMap<String, String>,
}

impl EnvSources {
    /// Reads `.env` (from `override_dir` or the current directory) and the XDG
    /// `config.toml` for `app_name`. Missing files yield empty maps.
    pub fn read(app_name: &str, override_dir: Option<&Path>) -> Result<Self, LoadError> {
        Ok(Self {
            xdg: xdg_toml::load_env_map(app_name)?,
            dotenv: dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?,
        })
    }

    /// Values to set: for every key missing from `is_set`, `.env` wins over XDG.
    pub fn resolve(&self, is_set: impl Fn(&str) -> bool) -> HashMap<String, String> {
        let mut out = HashMap::new();
        for (key, value) in self.xdg.iter().chain(self.dotenv.iter()) {
            if is_set(key) {
                continue;
            }
            let chosen = self.dotenv.get(key).unwrap_or(value);
            out.insert(key.clone(), chosen.clone());
        }
        out
    }
}

/// Loads both sources and sets every key that is **not** already in the process
/// environment.
///
/// * `app_name`: e.g. `"taskloom"`, used for `~/.config/<app_name>/config.toml`.
/// * `override_dir`: if `Some`, look for `.env` there instead of the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let sources = EnvSources::read(app_name, override_dir)?;
    for (key, value) in sources.resolve(|k| std::env::var_os(k).is_some()) {
        std::env::set_var(key, value);
    }
    Ok(())
}
