//=========================================================================
// Scene Configuration
//=========================================================================
//
// JSON description of every page's mechanics, combinators and effects.
//
// ```text
// {
//   "0": {
//     "mechanics":   [{ "id": "heart", "type": "pull", "options": {...} }],
//     "combinators": [{ "id": "both", "type": "all", "mechanicIds": [...] }],
//     "effects":     [{ "id": "sparks", "type": "burst",
//                       "triggerMechanicId": "heart", "options": {...} }]
//   }
// }
// ```
//
// Options stay as raw JSON here; each builder decodes them into its own
// typed options struct, so one bad entry never spoils the page.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

//=== ConfigError =========================================================

/// Errors raised while loading or interpreting scene configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io { path: PathBuf, source: std::io::Error },

    /// The document is not valid scene JSON.
    Parse(serde_json::Error),

    UnknownMechanicType { id: String, kind: String },

    UnknownEffectType { id: String, kind: String },

    UnknownCombinatorPolicy { id: String, policy: String },

    /// An entry's options could not be decoded or are inconsistent.
    InvalidOptions { id: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "Cannot read {}: {}", path.display(), source),
            Self::Parse(e) => write!(f, "Invalid scene configuration: {}", e),
            Self::UnknownMechanicType { id, kind } => {
                write!(f, "Mechanic '{}' has unknown type '{}'", id, kind)
            }
            Self::UnknownEffectType { id, kind } => {
                write!(f, "Effect '{}' has unknown type '{}'", id, kind)
            }
            Self::UnknownCombinatorPolicy { id, policy } => {
                write!(f, "Combinator '{}' has unknown policy '{}'", id, policy)
            }
            Self::InvalidOptions { id, reason } => write!(f, "Invalid options for '{}': {}", id, reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

//=== Entries =============================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MechanicConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CombinatorConfig {
    /// Generated as `combinator_<page>_<n>` when empty.
    #[serde(default)]
    pub id: String,
    /// Policy name: `all`, `any` or `sequence`.
    #[serde(rename = "type", default = "default_policy")]
    pub policy: String,
    #[serde(rename = "mechanicIds", default)]
    pub mechanic_ids: Vec<String>,
    #[serde(default)]
    pub options: Value,
}

fn default_policy() -> String {
    "all".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EffectConfig {
    /// Generated as `effect_<page>_<n>` when empty.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: Value,
    #[serde(rename = "triggerMechanicId", default)]
    pub trigger_mechanic_id: Option<String>,
}

/// Everything configured for a single page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub mechanics: Vec<MechanicConfig>,
    pub combinators: Vec<CombinatorConfig>,
    pub effects: Vec<EffectConfig>,
}

//=== SceneConfig =========================================================

/// Page index → page configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SceneConfig {
    pages: BTreeMap<usize, PageConfig>,
}

impl SceneConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Parse)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&text)?;
        info!("Loaded scene configuration for {} page(s) from {}", config.len(), path.display());
        Ok(config)
    }

    pub fn page(&self, index: usize) -> Option<&PageConfig> {
        self.pages.get(&index)
    }

    pub fn insert_page(&mut self, index: usize, page: PageConfig) {
        self.pages.insert(index, page);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Highest configured page index, if any.
    pub fn last_page(&self) -> Option<usize> {
        self.pages.keys().next_back().copied()
    }
}

//=== Option Decoding =====================================================

/// Decodes an entry's `options`, treating a missing value as all defaults.
pub fn decode_options<T>(id: &str, options: &Value) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    T::deserialize(options).map_err(|e| ConfigError::InvalidOptions {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "0": {
            "mechanics": [
                { "id": "heart", "type": "pull", "options": { "distance": 40 } },
                { "id": "lock", "type": "rotate" }
            ],
            "combinators": [
                { "id": "both", "type": "sequence", "mechanicIds": ["heart", "lock"] }
            ],
            "effects": [
                { "id": "sparks", "type": "burst", "triggerMechanicId": "heart" }
            ]
        },
        "2": {}
    }"#;

    #[test]
    fn parses_pages_and_entries() {
        let config = SceneConfig::from_json(SAMPLE).expect("sample parses");
        assert_eq!(config.len(), 2);
        assert_eq!(config.last_page(), Some(2));

        let page = config.page(0).expect("page 0");
        assert_eq!(page.mechanics.len(), 2);
        assert_eq!(page.mechanics[0].kind, "pull");
        assert!(page.mechanics[1].options.is_null());
        assert_eq!(page.combinators[0].policy, "sequence");
        assert_eq!(page.combinators[0].mechanic_ids, vec!["heart", "lock"]);
        assert_eq!(page.effects[0].trigger_mechanic_id.as_deref(), Some("heart"));

        assert_eq!(config.page(2), Some(&PageConfig::default()));
        assert!(config.page(1).is_none());
    }

    #[test]
    fn combinator_policy_defaults_to_all() {
        let config = SceneConfig::from_json(r#"{ "0": { "combinators": [{ "id": "c" }] } }"#)
            .expect("parses");
        assert_eq!(config.page(0).map(|p| p.combinators[0].policy.as_str()), Some("all"));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(matches!(SceneConfig::from_json("[1, 2"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SceneConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("not/here.json"));
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        count: u32,
    }

    #[test]
    fn decode_options_handles_null_and_errors() {
        let decoded: Sample = decode_options("x", &Value::Null).expect("null means defaults");
        assert_eq!(decoded.count, 0);

        let err = decode_options::<Sample>("x", &serde_json::json!({ "count": "many" })).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOptions { .. }));
    }
}
