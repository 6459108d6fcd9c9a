//! This module turns a raw `AutomatonDefinition` into a validated `Automaton`. Every structural
//! check is run, and all violations are reported together rather than stopping at the first.

use crate::types::{
    is_epsilon, Automaton, AutomatonDefinition, AutomatonError, State, StateSet, Symbol,
};
use log::debug;
use std::collections::BTreeSet;
use thiserror::Error;

/// A single structural problem found in an `AutomatonDefinition`.
///
/// Each variant lists every offending item, sorted, so the report is reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// The state list is empty.
    #[error("No states defined")]
    NoStates,
    /// The start state is not in the state list.
    #[error("Start state '{0}' is not a defined state")]
    UnknownStartState(State),
    /// Accepting states that are not in the state list.
    #[error("Accepting states are not defined states: {0:?}")]
    UnknownAcceptingStates(Vec<State>),
    /// Transition sources that are not in the state list.
    #[error("Transitions leave from undefined states: {0:?}")]
    UnknownSourceStates(Vec<State>),
    /// Transition symbols that are neither in the alphabet nor ε.
    #[error("Transitions use symbols outside the alphabet: {0:?}")]
    UnknownSymbols(Vec<Symbol>),
    /// Transition targets that are not in the state list.
    #[error("Transitions reference undefined states: {0:?}")]
    UnknownTargetStates(Vec<State>),
}

impl From<Violation> for AutomatonError {
    fn from(violation: Violation) -> Self {
        AutomatonError::Malformed(vec![violation])
    }
}

/// Validates a raw definition and builds the canonical `Automaton`.
///
/// Duplicate entries in the state and symbol lists are merged, and ε in the symbol list is
/// ignored. Missing transition entries mean "no targets".
///
/// # Returns
///
/// * `Ok(Automaton)` if every check passes.
/// * `Err(AutomatonError::Malformed)` carrying every violation found.
pub fn validate(definition: &AutomatonDefinition) -> Result<Automaton, AutomatonError> {
    let violations = [
        check_states,
        check_start_state,
        check_accepting_states,
        check_transition_sources,
        check_transition_symbols,
        check_transition_targets,
    ]
    .iter()
    .filter_map(|check| check(definition).err())
    .collect::<Vec<_>>();

    if !violations.is_empty() {
        debug!("rejected automaton with {} violation(s)", violations.len());
        return Err(AutomatonError::Malformed(violations));
    }

    build(definition)
}

fn check_states(definition: &AutomatonDefinition) -> Result<(), Violation> {
    if definition.states.is_empty() {
        return Err(Violation::NoStates);
    }

    Ok(())
}

fn check_start_state(definition: &AutomatonDefinition) -> Result<(), Violation> {
    if !definition.states.contains(&definition.start_state) {
        return Err(Violation::UnknownStartState(
            definition.start_state.clone(),
        ));
    }

    Ok(())
}

fn check_accepting_states(definition: &AutomatonDefinition) -> Result<(), Violation> {
    let unknown = unknown_states(definition, definition.end_states.iter());

    if !unknown.is_empty() {
        return Err(Violation::UnknownAcceptingStates(unknown));
    }

    Ok(())
}

fn check_transition_sources(definition: &AutomatonDefinition) -> Result<(), Violation> {
    let unknown = unknown_states(definition, definition.transitions.keys());

    if !unknown.is_empty() {
        return Err(Violation::UnknownSourceStates(unknown));
    }

    Ok(())
}

fn check_transition_symbols(definition: &AutomatonDefinition) -> Result<(), Violation> {
    let alphabet: BTreeSet<&Symbol> = definition.symbols.iter().collect();

    let unknown: BTreeSet<Symbol> = definition
        .transitions
        .values()
        .flat_map(|row| row.keys())
        .filter(|symbol| !is_epsilon(symbol) && !alphabet.contains(symbol))
        .cloned()
        .collect();

    if !unknown.is_empty() {
        return Err(Violation::UnknownSymbols(unknown.into_iter().collect()));
    }

    Ok(())
}

fn check_transition_targets(definition: &AutomatonDefinition) -> Result<(), Violation> {
    let targets = definition
        .transitions
        .values()
        .flat_map(|row| row.values())
        .flatten();
    let unknown = unknown_states(definition, targets);

    if !unknown.is_empty() {
        return Err(Violation::UnknownTargetStates(unknown));
    }

    Ok(())
}

/// Collects the states from `candidates` missing from the definition's state list.
fn unknown_states<'a>(
    definition: &AutomatonDefinition,
    candidates: impl Iterator<Item = &'a State>,
) -> Vec<State> {
    let known: BTreeSet<&State> = definition.states.iter().collect();

    candidates
        .filter(|state| !known.contains(state))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Builds the indexed representation of a definition that passed every check.
fn build(definition: &AutomatonDefinition) -> Result<Automaton, AutomatonError> {
    let states: Vec<State> = definition
        .states
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let alphabet: Vec<Symbol> = definition
        .symbols
        .iter()
        .filter(|symbol| !is_epsilon(symbol))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let state_id = |name: &State| states.binary_search(name).ok();

    let start = state_id(&definition.start_state).ok_or_else(|| {
        AutomatonError::Internal(format!(
            "start state '{}' vanished during construction",
            definition.start_state
        ))
    })?;
    let accepting: StateSet = definition.end_states.iter().filter_map(state_id).collect();

    let mut transitions = vec![vec![StateSet::new(); alphabet.len()]; states.len()];
    let mut epsilon = vec![StateSet::new(); states.len()];

    for (source, row) in &definition.transitions {
        let Some(source) = state_id(source) else {
            continue;
        };

        for (symbol, targets) in row {
            let targets: StateSet = targets.iter().filter_map(state_id).collect();
            if is_epsilon(symbol) {
                epsilon[source].union_with(&targets);
            } else if let Ok(symbol) = alphabet.binary_search(symbol) {
                transitions[source][symbol].union_with(&targets);
            }
        }
    }

    Ok(Automaton {
        states,
        alphabet,
        start,
        accepting,
        transitions,
        epsilon,
    })
}
