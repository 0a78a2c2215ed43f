use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Id;

/// Settings for the command-line converter.
///
/// The file is optional; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The operator id written to generated CATMAID records.
    ///
    /// If unset the operator is asked for it interactively.
    user: Option<Id>,

    /// Radius written to every generated tree-node.
    ///
    /// CATMAID uses `-1` for "no radius".
    radius: f64,

    /// Confidence written to every generated tree-node (1 to 5).
    confidence: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            radius: default_radius(),
            confidence: default_confidence(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The configured operator id, if any.
    #[must_use]
    pub const fn user(&self) -> Option<Id> {
        self.user
    }

    /// Sets the operator id.
    pub const fn set_user(&mut self, user: Id) {
        self.user = Some(user);
    }

    /// The tree-node radius.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// The tree-node confidence.
    #[must_use]
    pub const fn confidence(&self) -> u8 {
        self.confidence
    }
}

const fn default_radius() -> f64 {
    -1.0
}

const fn default_confidence() -> u8 {
    5
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<Id>,

        #[serde(default = "default_radius")]
        radius: f64,

        #[serde(default = "default_confidence")]
        confidence: u8,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                user,
                radius,
                confidence,
            } => Self {
                user,
                radius,
                confidence,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            user: config.user,
            radius: config.radius,
            confidence: config.confidence,
        }
    }
}
