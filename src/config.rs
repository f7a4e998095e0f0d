//! User facing configuration.
//!
//! Options are read from `config.toml` under the user's config directory
//! and every field has a sensible default, so running without a config file
//! is fine. The file is read once at startup and never re-read.
use crate::{Error, Result};
use serde::Deserialize;
use std::{collections::HashMap, env, fs, path::PathBuf};
use tracing::warn;

/// The main user facing configuration details.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WmConfig {
    /// The number of user desktops (at least 1)
    pub num_desktops: usize,
    /// The window border width in pixels; 0 disables border rendering
    pub border_width: u32,
    /// The width of icon surrogate windows in pixels
    pub icon_width: u32,
    /// The height of icon surrogate windows in pixels
    pub icon_height: u32,
    /// The log destination: a file path, or the literal `"syslog"` to write
    /// to stderr for a supervisor to collect
    pub log_file: String,
    /// The lowest severity that gets logged
    pub log_level: String,
    /// Where SIGUSR1-triggered model dumps are appended
    pub dump_file: String,
    /// The terminal launched by the launch mouse binding
    pub shell: String,
    /// Key and mouse bindings
    pub bindings: BindingConfig,
}

impl Default for WmConfig {
    fn default() -> Self {
        Self {
            num_desktops: 5,
            border_width: 2,
            icon_width: 75,
            icon_height: 20,
            log_file: "syslog".to_owned(),
            log_level: "warn".to_owned(),
            dump_file: "/tmp/driftwm.dump".to_owned(),
            shell: "xterm".to_owned(),
            bindings: BindingConfig::default(),
        }
    }
}

/// The binding table: modifiers, per-action key names and the mouse buttons
/// used for interactive move/resize and launching a terminal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// The modifier held for every keyboard action (e.g. `mod4`)
    pub primary_mod: String,
    /// The extra modifier held for screen-targeting actions
    pub secondary_mod: String,
    /// Overrides of the default key for an action, keyed by action name
    pub keys: HashMap<String, String>,
    /// The button that starts an interactive move
    pub move_button: u8,
    /// The button that starts an interactive resize
    pub resize_button: u8,
    /// The button that launches the configured shell
    pub launch_button: u8,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            primary_mod: "mod4".to_owned(),
            secondary_mod: "control".to_owned(),
            keys: HashMap::new(),
            move_button: 1,
            resize_button: 3,
            launch_button: 2,
        }
    }
}

impl WmConfig {
    /// Read the config file, falling back to the defaults if it is missing
    /// or malformed. A malformed file is logged, not fatal.
    pub fn load() -> Self {
        let path = Self::path();
        match fs::read_to_string(&path) {
            Ok(raw) => match Self::from_toml(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!(%e, ?path, "ignoring malformed config file");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Parse and validate a config from its TOML representation.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.num_desktops = config.num_desktops.max(1);

        Ok(config)
    }

    /// The lowest severity that should be logged.
    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::WARN)
    }

    fn path() -> PathBuf {
        let base = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
            .unwrap_or_default();

        base.join("driftwm").join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = WmConfig::default();

        assert_eq!(config.num_desktops, 5);
        assert_eq!(config.bindings.move_button, 1);
        assert_eq!(config.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn partial_files_override_only_what_they_set() {
        let config = WmConfig::from_toml(
            r#"
            num_desktops = 9
            log_level = "debug"

            [bindings]
            primary_mod = "mod1"
            "#,
        )
        .unwrap();

        assert_eq!(config.num_desktops, 9);
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
        assert_eq!(config.bindings.primary_mod, "mod1");
        // untouched fields keep their defaults
        assert_eq!(config.border_width, 2);
        assert_eq!(config.bindings.resize_button, 3);
    }

    #[test]
    fn zero_desktops_is_clamped_to_one() {
        let config = WmConfig::from_toml("num_desktops = 0").unwrap();

        assert_eq!(config.num_desktops, 1);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            WmConfig::from_toml("num_desktops = \"many\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn key_overrides_are_exposed() {
        let config = WmConfig::from_toml(
            r#"
            [bindings.keys]
            iconify = "z"
            "#,
        )
        .unwrap();

        assert_eq!(config.bindings.keys.get("iconify").unwrap(), "z");
    }
}
