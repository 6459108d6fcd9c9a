//! A catalogue of automata embedded in the binary, loaded on first use.

use crate::classifier::{classify, Kind};
use crate::parser::parse;
use crate::types::{AutomatonDefinition, AutomatonError};
use crate::validator::validate;
use log::warn;
use serde::Serialize;

// Default embedded definitions
const DEFINITION_TEXTS: [&str; 6] = [
    include_str!("../demos/even-zeros.fa"),
    include_str!("../demos/binary-div3.fa"),
    include_str!("../demos/ends-with-01.fa"),
    include_str!("../demos/epsilon-chain.fa"),
    include_str!("../demos/contains-ab.fa"),
    include_str!("../demos/redundant-dfa.fa"),
];

lazy_static::lazy_static! {
    pub static ref DEFINITIONS: Vec<AutomatonDefinition> = DEFINITION_TEXTS
        .iter()
        .enumerate()
        .filter_map(|(index, text)| match parse(text) {
            Ok(definition) => Some(definition),
            Err(e) => {
                warn!("Failed to parse embedded automaton #{}: {}", index, e);
                None
            }
        })
        .collect();
}

/// Summary of one catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutomatonInfo {
    pub index: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub state_count: usize,
    pub symbol_count: usize,
    pub transition_count: usize,
}

pub struct AutomatonLibrary;

impl AutomatonLibrary {
    /// Get the number of available automata
    pub fn count() -> usize {
        DEFINITIONS.len()
    }

    /// List all automaton names
    pub fn names() -> Vec<String> {
        DEFINITIONS.iter().map(display_name).collect()
    }

    /// Get an automaton by its index
    pub fn get_by_index(index: usize) -> Result<AutomatonDefinition, AutomatonError> {
        DEFINITIONS.get(index).cloned().ok_or_else(|| {
            AutomatonError::Request(format!("Automaton index {} out of range", index))
        })
    }

    /// Get an automaton by its name, ignoring ASCII case
    pub fn get_by_name(name: &str) -> Result<AutomatonDefinition, AutomatonError> {
        DEFINITIONS
            .iter()
            .find(|definition| display_name(definition).eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| AutomatonError::Request(format!("Automaton '{}' not found", name)))
    }

    /// Get information about an automaton by its index
    pub fn info(index: usize) -> Result<AutomatonInfo, AutomatonError> {
        let definition = Self::get_by_index(index)?;
        let automaton = validate(&definition)?;

        Ok(AutomatonInfo {
            index,
            name: display_name(&definition),
            kind: classify(&automaton),
            state_count: automaton.state_count(),
            symbol_count: automaton.alphabet().len(),
            transition_count: definition.transition_count(),
        })
    }
}

fn display_name(definition: &AutomatonDefinition) -> String {
    definition.name.clone().unwrap_or_default()
}
