use crate::error::App;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BUS_NAME: &str = "org.frameplay.Player";
pub const DEFAULT_BUS_PATH: &str = "/org/frameplay/Player";
pub const DEFAULT_PARENT_NAME: &str = "org.frameplay.Parent";

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub bus: Bus,
    pub parent: Parent,
    pub player: Player,
}

/// Where the player host is exported on the session bus.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Bus {
    pub name: String,
    pub path: String,
}

/// The embedder; without a name the host runs top-level and posts nothing.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Parent {
    pub name: Option<String>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Player {
    pub source: Option<String>,
    pub volume: f64,
    pub muted: bool,
    pub autoplay: bool,
    pub time_update_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            bus: Bus::default(),
            parent: Parent::default(),
            player: Player::default(),
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            name: DEFAULT_BUS_NAME.to_string(),
            path: DEFAULT_BUS_PATH.to_string(),
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self {
            source: None,
            volume: 1.0,
            muted: false,
            autoplay: false,
            time_update_ms: 250,
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, App> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load_from_file(file_path: &Path) -> Result<Self, App> {
        let content = tokio::fs::read_to_string(file_path).await?;
        Self::from_toml(&content)
    }

    pub fn is_embedded(&self) -> bool {
        self.parent.name.is_some()
    }

    fn validate(&self) -> Result<(), App> {
        if !(0.0..=1.0).contains(&self.player.volume) {
            return Err(App::InvalidInput(format!(
                "player.volume must be within 0..=1, got {}",
                self.player.volume
            )));
        }
        if self.player.time_update_ms == 0 {
            return Err(App::InvalidInput(
                "player.time_update_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// `~/.config/frameplay`.
pub fn config_dir() -> Result<PathBuf, App> {
    let home_dir = std::env::var("HOME")
        .map_err(|e| App::Io(format!("Failed to get HOME environment variable: {e}")))?;
    Ok(PathBuf::from(home_dir).join(".config").join("frameplay"))
}

/// Creates the config and log directories and an empty config file when
/// missing, returning the config file path.
pub async fn ensure_layout(dir: &Path) -> Result<PathBuf, App> {
    tokio::fs::create_dir_all(dir.join("logs")).await?;
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        tokio::fs::write(&config_path, "").await?;
    }
    Ok(config_path)
}
