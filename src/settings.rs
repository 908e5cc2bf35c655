use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Store};

const SETTINGS_KEY: &str = "settings";

/// Map and app color scheme.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        };
        f.write_str(name)
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Theme> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(Error::UnknownTheme(s.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    /// Ask for biometrics when the app comes back to the foreground.
    pub app_lock: bool,
}

pub fn load_settings(store: &Store) -> Result<Settings> {
    Ok(store.read(SETTINGS_KEY)?.unwrap_or_default())
}

pub fn save_settings(store: &Store, settings: &Settings) -> Result<()> {
    store.write(SETTINGS_KEY, settings)
}
