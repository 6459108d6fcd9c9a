//! Engine configuration. The only tunable is the exploration bound for subset construction,
//! whose state count can grow exponentially in the size of the input automaton.

use crate::types::AutomatonError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The default maximum number of states subset construction may create.
pub const DEFAULT_MAX_DFA_STATES: usize = 10_000;

/// Tunables shared by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on states created by subset construction, trap state included.
    pub max_dfa_states: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_dfa_states: DEFAULT_MAX_DFA_STATES,
        }
    }
}

impl EngineConfig {
    pub fn with_max_dfa_states(mut self, limit: usize) -> Self {
        self.max_dfa_states = limit;
        self
    }

    /// Parses a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(content: &str) -> Result<Self, AutomatonError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| AutomatonError::Config(format!("Invalid configuration: {}", e)))?;

        if config.max_dfa_states == 0 {
            return Err(AutomatonError::Config(
                "max_dfa_states must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    /// Loads a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, AutomatonError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AutomatonError::File(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();

        assert_eq!(config.max_dfa_states, DEFAULT_MAX_DFA_STATES);
        assert_eq!(EngineConfig::from_json("{}").unwrap(), config);
    }

    #[test]
    fn test_override() {
        let config = EngineConfig::from_json(r#"{"max_dfa_states": 64}"#).unwrap();

        assert_eq!(config.max_dfa_states, 64);
        assert_eq!(config.with_max_dfa_states(8).max_dfa_states, 8);
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let result = EngineConfig::from_json(r#"{"max_dfa_states": 0}"#);

        assert!(matches!(result, Err(AutomatonError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"max_dfa_states": 12}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();

        assert_eq!(config.max_dfa_states, 12);
    }

    #[test]
    fn test_load_missing_file() {
        let result = EngineConfig::load(Path::new("/nonexistent/engine.json"));

        assert!(matches!(result, Err(AutomatonError::File(_))));
    }
}
