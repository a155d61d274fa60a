//! Scenario files.
//!
//! A scenario is a TOML document describing the entities in a fight and a
//! timeline of actions against them:
//!
//! ```toml
//! format = "1.0"
//!
//! [settings]
//! step_ms = 100
//! end_ms = 6000
//!
//! [[entities]]
//! name = "knight"
//! health = 120
//!
//! [[actions]]
//! at = 0
//! entity = "knight"
//! op = "apply"
//! kind = "poison"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use aegis_common::{Millis, SchemaVersion};
use aegis_effects::{CombatantStats, EffectKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while loading a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Failed to read the file.
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse scenario TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Written for an incompatible format version.
    #[error("Scenario format {found} is not readable by this build (supports {supported})")]
    Version {
        /// Version declared by the file
        found: SchemaVersion,
        /// Version this build reads
        supported: SchemaVersion,
    },

    /// An action or entity refers to an entity that isn't declared.
    #[error("Action {index} refers to unknown entity {name:?}")]
    UnknownEntity {
        /// Position of the action in the file
        index: usize,
        /// Name that failed to resolve
        name: String,
    },

    /// Any other validation failure.
    #[error("Scenario validation error: {0}")]
    Invalid(String),
}

/// Result type for scenario operations.
pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Simulation clock settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Milliseconds per simulation step
    pub step_ms: Millis,
    /// Last simulated timestamp (inclusive)
    pub end_ms: Millis,
    /// Print the final report as JSON
    pub report_json: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            step_ms: 100,
            end_ms: 10_000,
            report_json: false,
        }
    }
}

/// One combatant in the scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    /// Unique name used by actions
    pub name: String,
    /// Starting and maximum health
    #[serde(default = "default_health")]
    pub health: f32,
    /// Base movement speed
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_health() -> f32 {
    CombatantStats::default().max_health
}

fn default_speed() -> f32 {
    CombatantStats::default().base_speed
}

impl EntitySpec {
    /// Combatant attributes for this entity.
    #[must_use]
    pub fn stats(&self) -> CombatantStats {
        CombatantStats {
            max_health: self.health,
            base_speed: self.speed,
        }
    }
}

/// What an action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOp {
    /// Apply one stack of `kind`
    Apply,
    /// Remove `kind`
    Remove,
    /// Remove every effect
    Clear,
    /// Remove every harmful effect
    Cleanse,
    /// Deal `amount` damage
    Hit,
}

/// One timeline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Timestamp the action becomes due
    pub at: Millis,
    /// Target entity name
    pub entity: String,
    /// Operation
    pub op: ActionOp,
    /// Effect, for `apply` and `remove`
    #[serde(default)]
    pub kind: Option<EffectKind>,
    /// Acting entity name, if any
    #[serde(default)]
    pub source: Option<String>,
    /// Damage, for `hit`
    #[serde(default)]
    pub amount: Option<f32>,
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// File format version
    pub format: SchemaVersion,
    /// Clock settings
    #[serde(default)]
    pub settings: SimSettings,
    /// Combatants
    pub entities: Vec<EntitySpec>,
    /// Timeline
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

impl Scenario {
    /// Loads and validates a scenario file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> ScenarioResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let scenario = Self::from_toml_str(&contents)?;
        info!(
            "Loaded scenario from {} ({} entities, {} actions)",
            path.display(),
            scenario.entities.len(),
            scenario.actions.len()
        );
        Ok(scenario)
    }

    /// Parses and validates a scenario from TOML text.
    pub fn from_toml_str(contents: &str) -> ScenarioResult<Self> {
        let scenario: Self = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Checks version, settings, entity names and every action.
    pub fn validate(&self) -> ScenarioResult<()> {
        if !SchemaVersion::SCENARIO.can_read(&self.format) {
            return Err(ScenarioError::Version {
                found: self.format,
                supported: SchemaVersion::SCENARIO,
            });
        }
        if self.settings.step_ms == 0 {
            return Err(ScenarioError::Invalid("step_ms must be positive".into()));
        }
        if self.entities.is_empty() {
            return Err(ScenarioError::Invalid("no entities declared".into()));
        }

        let mut names = HashSet::new();
        for entity in &self.entities {
            if !names.insert(entity.name.as_str()) {
                return Err(ScenarioError::Invalid(format!(
                    "duplicate entity name {:?}",
                    entity.name
                )));
            }
            if !(entity.health.is_finite() && entity.health > 0.0) {
                return Err(ScenarioError::Invalid(format!(
                    "entity {:?} needs positive health",
                    entity.name
                )));
            }
        }

        for (index, action) in self.actions.iter().enumerate() {
            let known = |name: &str| names.contains(name);
            if !known(&action.entity) {
                return Err(ScenarioError::UnknownEntity {
                    index,
                    name: action.entity.clone(),
                });
            }
            if let Some(source) = action.source.as_deref() {
                if !known(source) {
                    return Err(ScenarioError::UnknownEntity {
                        index,
                        name: source.to_string(),
                    });
                }
            }

            match action.op {
                ActionOp::Apply | ActionOp::Remove if action.kind.is_none() => {
                    return Err(ScenarioError::Invalid(format!(
                        "action {index}: {:?} needs a kind",
                        action.op
                    )));
                },
                ActionOp::Hit => match action.amount {
                    Some(amount) if amount.is_finite() && amount >= 0.0 => {},
                    _ => {
                        return Err(ScenarioError::Invalid(format!(
                            "action {index}: hit needs a non-negative amount"
                        )));
                    },
                },
                _ => {},
            }
        }

        Ok(())
    }

    /// Position of the entity called `name`.
    #[must_use]
    pub fn entity_index(&self, name: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DUEL: &str = r#"
format = "1.0"

[settings]
step_ms = 50

[[entities]]
name = "knight"
health = 120

[[entities]]
name = "witch"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "poison"
source = "witch"

[[actions]]
at = 250
entity = "witch"
op = "hit"
amount = 12.5
source = "knight"
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml_str(DUEL).expect("valid scenario");

        assert_eq!(scenario.format, SchemaVersion::new(1, 0, 0));
        assert_eq!(scenario.settings.step_ms, 50);
        assert_eq!(scenario.settings.end_ms, 10_000);
        assert_eq!(scenario.entities[0].health, 120.0);
        assert_eq!(scenario.entities[1].health, 100.0);
        assert_eq!(scenario.actions[0].kind, Some(EffectKind::Poison));
        assert_eq!(scenario.actions[1].op, ActionOp::Hit);
        assert_eq!(scenario.entity_index("witch"), Some(1));
    }

    #[test]
    fn test_bundled_duel_is_valid() {
        let scenario = Scenario::from_toml_str(include_str!("../scenarios/duel.toml"))
            .expect("bundled scenario");
        assert_eq!(scenario.entities.len(), 2);
        assert!(!scenario.actions.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(DUEL.as_bytes()).expect("write scenario");

        let scenario = Scenario::load_from(file.path()).expect("load scenario");
        assert_eq!(scenario.entities.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = Scenario::load_from("/nonexistent/scenario.toml").expect_err("missing file");
        assert!(matches!(err, ScenarioError::Io(_)));
    }

    #[test]
    fn test_rejects_newer_format() {
        let text = DUEL.replace("format = \"1.0\"", "format = \"2.0\"");
        let err = Scenario::from_toml_str(&text).expect_err("newer format");
        assert!(matches!(err, ScenarioError::Version { .. }));
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let text = DUEL.replace("kind = \"poison\"", "kind = \"confusion\"");
        let err = Scenario::from_toml_str(&text).expect_err("unknown kind");
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn test_rejects_unknown_entity() {
        let text = DUEL.replace("source = \"witch\"", "source = \"dragon\"");
        let err = Scenario::from_toml_str(&text).expect_err("unknown source");
        assert!(matches!(
            err,
            ScenarioError::UnknownEntity { index: 0, ref name } if name == "dragon"
        ));
    }

    #[test]
    fn test_rejects_incomplete_actions() {
        let text = DUEL.replace("kind = \"poison\"\n", "");
        assert!(matches!(
            Scenario::from_toml_str(&text),
            Err(ScenarioError::Invalid(_))
        ));

        let text = DUEL.replace("amount = 12.5\n", "");
        assert!(matches!(
            Scenario::from_toml_str(&text),
            Err(ScenarioError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let text = DUEL.replace("name = \"witch\"", "name = \"knight\"");
        assert!(matches!(
            Scenario::from_toml_str(&text),
            Err(ScenarioError::Invalid(_))
        ));
    }
}
