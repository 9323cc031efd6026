//! `[env]` table of `$XDG_CONFIG_HOME/<app>/config.toml`.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::LoadError;

/// Path of the app's config file if it exists.
fn config_file(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let base = dirs::config_dir()
        .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".to_string()))?;
    let path = base.join(app_name).join("config.toml");
    Ok(path.is_file().then_some(path))
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
}

fn parse(content: &str) -> Result<HashMap<String, String>, LoadError> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.env)
}

/// Key/value pairs of the `[env]` section; empty when the file or section is missing.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = config_file(app_name)? else {
        return Ok(HashMap::new());
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    parse(&content)
}
